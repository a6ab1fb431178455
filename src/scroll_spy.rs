use super::*;

#[derive(Debug, Clone, Default)]
pub(crate) struct ScrollSpyState {
    pub(crate) active: String,
    pub(crate) runs: u64,
}

/// Picks the section whose top edge was last passed by `position`.
///
/// `sections` holds `(id, offset_top)` pairs in document order. Before any
/// section is reached the first one stays current; with no sections, or a
/// first section without an id, `fallback` is returned.
pub fn current_section(sections: &[(String, i64)], position: i64, fallback: &str) -> String {
    let mut current = match sections.first() {
        Some((id, _)) if !id.is_empty() => id.as_str(),
        _ => fallback,
    };
    for (id, top) in sections {
        if *top <= position {
            current = id.as_str();
        }
    }
    current.to_string()
}

impl Page {
    pub(crate) fn install_scroll_spy(&mut self) -> Result<()> {
        self.run_scroll_spy()?;
        let root = self.dom.root;
        self.listeners.add(
            root,
            "scroll",
            Listener {
                capture: false,
                handler: Handler::ScheduleScrollSpy,
            },
        );
        Ok(())
    }

    pub(crate) fn schedule_scroll_spy(&mut self) {
        if !self.request_animation_frame(FrameCallback::ScrollSpy) {
            self.trace_behavior_line("[spy] recompute already pending".into());
        }
    }

    pub(crate) fn run_scroll_spy(&mut self) -> Result<()> {
        let sections = self
            .bindings
            .sections
            .iter()
            .map(|node| {
                (
                    self.dom.attr(*node, "id").unwrap_or_default(),
                    self.dom.offset_top(*node),
                )
            })
            .collect::<Vec<_>>();
        let position = self.viewport.scroll_y + self.config.header_offset;
        let current = current_section(&sections, position, &self.config.fallback_section);

        let target_href = format!("#{current}");
        for link in self.bindings.nav_links.clone() {
            let is_current = self.dom.attr(link, "href").as_deref() == Some(target_href.as_str());
            self.dom
                .set_attr(link, "aria-current", if is_current { "page" } else { "false" })?;
        }

        self.scroll_spy.runs += 1;
        if self.scroll_spy.active != current {
            self.trace_behavior_line(format!("[spy] active section {current:?} at {position}"));
        }
        self.scroll_spy.active = current;
        Ok(())
    }

    /// Section id the navigation currently marks as the page.
    pub fn active_section(&self) -> &str {
        &self.scroll_spy.active
    }

    /// Number of scroll-spy recomputations so far, including the initial one.
    pub fn spy_runs(&self) -> u64 {
        self.scroll_spy.runs
    }
}
