use super::*;
use crate::intersection::IntersectionObserver;

const IN_VIEW_CLASS: &str = "in-view";

impl Page {
    pub(crate) fn install_reveal(&mut self) -> Result<()> {
        let animated = self.bindings.animated.clone();
        for node in &animated {
            self.reveal.states.insert(*node, RevealState::Unrevealed);
        }
        if animated.is_empty() {
            return Ok(());
        }

        if !self.config.intersection_observer {
            for node in animated {
                self.reveal_element(node)?;
            }
            self.trace_behavior_line("[reveal] no observer support, revealed all".into());
            return Ok(());
        }

        let mut observer = IntersectionObserver::new(self.config.reveal_root_margin);
        for node in &animated {
            observer.observe(*node);
        }
        self.reveal.observer = Some(observer);
        self.trace_behavior_line(format!("[reveal] observing {} elements", animated.len()));
        self.request_rendering();
        Ok(())
    }

    /// Runs during each animation frame, after frame callbacks.
    pub(crate) fn update_reveal_observations(&mut self) -> Result<()> {
        let viewport = self.viewport.rect();
        let width = self.viewport.width;
        let now = self.scheduler.now_ms;
        let Some(observer) = self.reveal.observer.as_mut() else {
            return Ok(());
        };
        let dom = &self.dom;
        let entries =
            observer.check_intersections(viewport, |node| dom.layout_box(node).to_rect(width), now);

        for entry in entries {
            if !entry.is_intersecting {
                continue;
            }
            if self.reveal_element(entry.target)? {
                let label = self.trace_node_label(entry.target);
                self.trace_behavior_line(format!(
                    "[reveal] {} ratio={:.2} top={} root=[{}, {}] at={}",
                    label,
                    entry.intersection_ratio,
                    entry.bounding_rect.top(),
                    entry.root_bounds.top(),
                    entry.root_bounds.bottom(),
                    entry.time
                ));
            }
        }
        Ok(())
    }

    fn reveal_element(&mut self, node: NodeId) -> Result<bool> {
        if !self.reveal.mark_revealed(node) {
            return Ok(false);
        }
        self.dom.add_class(node, IN_VIEW_CLASS)?;
        Ok(true)
    }

    /// Reveal state of the first element matching `selector`, or `None` when it
    /// is not an animated element.
    pub fn reveal_state(&self, selector: &str) -> Result<Option<RevealState>> {
        let target = self.select_one(selector)?;
        Ok(self.reveal.state(target))
    }
}
