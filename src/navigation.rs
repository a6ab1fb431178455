use super::*;

const OPEN_CLASS: &str = "open";

impl Page {
    pub(crate) fn install_navigation(&mut self) {
        let Some((toggle, panel)) = self.bindings.navigation() else {
            self.trace_behavior_line("[nav] toggle or panel missing, menu not wired".into());
            return;
        };
        self.listeners.add(
            toggle,
            "click",
            Listener {
                capture: false,
                handler: Handler::ToggleNav,
            },
        );
        self.listeners.add(
            panel,
            "click",
            Listener {
                capture: false,
                handler: Handler::CloseNavOnLinkClick,
            },
        );
    }

    pub(crate) fn install_smooth_scroll(&mut self) {
        for anchor in self.bindings.anchors.clone() {
            self.listeners.add(
                anchor,
                "click",
                Listener {
                    capture: false,
                    handler: Handler::SmoothScrollToFragment,
                },
            );
        }
    }

    /// Whether the navigation panel is currently shown.
    pub fn nav_open(&self) -> bool {
        self.bindings
            .nav_panel
            .is_some_and(|panel| self.dom.has_class(panel, OPEN_CLASS))
    }

    pub(crate) fn toggle_nav(&mut self) -> Result<()> {
        let Some((toggle, panel)) = self.bindings.navigation() else {
            return Ok(());
        };
        let open = self.dom.toggle_class(panel, OPEN_CLASS)?;
        self.dom
            .set_attr(toggle, "aria-expanded", if open { "true" } else { "false" })?;
        self.trace_behavior_line(format!("[nav] toggled open={open}"));
        Ok(())
    }

    /// Picking a link inside the open menu closes it. Clicks on the panel
    /// background leave it alone.
    pub(crate) fn close_nav_on_link_click(&mut self, event: &EventState) -> Result<()> {
        let Some((toggle, panel)) = self.bindings.navigation() else {
            return Ok(());
        };
        if self.dom.closest_by_tag(event.target, "a").is_none() {
            return Ok(());
        }
        if !self.dom.has_class(panel, OPEN_CLASS) {
            return Ok(());
        }
        self.dom.remove_class(panel, OPEN_CLASS)?;
        self.dom.set_attr(toggle, "aria-expanded", "false")?;
        self.trace_behavior_line("[nav] closed after link selection".into());
        Ok(())
    }

    pub(crate) fn smooth_scroll_to_fragment(&mut self, event: &mut EventState) -> Result<()> {
        let anchor = event.current_target;
        let href = self.dom.attr(anchor, "href").unwrap_or_default();
        let fragment = href.chars().skip(1).collect::<String>();
        if fragment.is_empty() {
            return Ok(());
        }

        // Ids may hold any character; escaped lookups never fail on them.
        let selector = format!("#{}", css_escape(&fragment));
        let Ok(Some(target)) = self.dom.query_selector(&selector) else {
            self.trace_behavior_line(format!("[nav] no target for {href:?}, default navigation"));
            return Ok(());
        };

        event.prevent_default();
        let top = self.dom.offset_top(target);
        self.scroll_viewport_to(top, ScrollBehavior::Smooth)?;
        if !self.dom.is_focusable(target) {
            self.dom.set_attr(target, "tabindex", "-1")?;
        }
        self.focus_node(target)?;
        self.trace_behavior_line(format!("[nav] smooth scroll to #{fragment} top={top}"));
        Ok(())
    }
}
