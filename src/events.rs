use super::*;

impl Page {
    pub(crate) fn dispatch_event(&mut self, target: NodeId, event_type: &str) -> Result<EventState> {
        let mut event = EventState::new(event_type, target, self.scheduler.now_ms);
        self.dispatch_prepared_event(&mut event)?;
        Ok(event)
    }

    /// Capture from the document down, target phase, then bubble back up.
    pub(crate) fn dispatch_prepared_event(&mut self, event: &mut EventState) -> Result<()> {
        let target = event.target;
        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.dom.parent(node);
        }
        path.reverse();

        for node in &path[..path.len() - 1] {
            event.current_target = *node;
            self.invoke_listeners(*node, event, true)?;
            if event.propagation_stopped {
                self.trace_event_done(event, "propagation_stopped");
                return Ok(());
            }
        }

        event.current_target = target;
        self.invoke_listeners(target, event, true)?;
        if !event.propagation_stopped {
            self.invoke_listeners(target, event, false)?;
        }
        if event.propagation_stopped {
            self.trace_event_done(event, "propagation_stopped");
            return Ok(());
        }

        for node in path[..path.len() - 1].iter().rev() {
            event.current_target = *node;
            self.invoke_listeners(*node, event, false)?;
            if event.propagation_stopped {
                self.trace_event_done(event, "propagation_stopped");
                return Ok(());
            }
        }

        self.trace_event_done(event, "completed");
        Ok(())
    }

    fn invoke_listeners(&mut self, node_id: NodeId, event: &mut EventState, capture: bool) -> Result<()> {
        let listeners = self.listeners.get(node_id, &event.event_type, capture);
        for listener in listeners {
            if self.trace_state.enabled {
                let phase = if capture { "capture" } else { "bubble" };
                let target_label = self.trace_node_label(event.target);
                let current_label = self.trace_node_label(event.current_target);
                self.trace_event_line(format!(
                    "[event] {} target={} current={} phase={} handler={:?}",
                    event.event_type, target_label, current_label, phase, listener.handler
                ));
            }
            self.run_handler(listener.handler, event)?;
        }
        Ok(())
    }

    fn run_handler(&mut self, handler: Handler, event: &mut EventState) -> Result<()> {
        match handler {
            Handler::ToggleNav => self.toggle_nav(),
            Handler::CloseNavOnLinkClick => self.close_nav_on_link_click(event),
            Handler::SmoothScrollToFragment => self.smooth_scroll_to_fragment(event),
            Handler::ScheduleScrollSpy => {
                self.schedule_scroll_spy();
                Ok(())
            }
            Handler::SubmitContactForm => self.submit_contact_form(event),
        }
    }

    fn trace_event_done(&mut self, event: &EventState, outcome: &str) {
        if !self.trace_state.enabled {
            return;
        }
        let target_label = self.trace_node_label(event.target);
        self.trace_event_line(format!(
            "[event] done {} target={} at={} outcome={} default_prevented={}",
            event.event_type, target_label, event.time_stamp_ms, outcome, event.default_prevented
        ));
    }

    pub(crate) fn click_node(&mut self, target: NodeId) -> Result<()> {
        if self.dom.disabled(target) {
            return Ok(());
        }

        let outcome = self.dispatch_event(target, "click")?;
        if outcome.default_prevented {
            return Ok(());
        }

        if let Some(anchor) = self.dom.closest_by_tag(target, "a") {
            if let Some(href) = self.dom.attr(anchor, "href") {
                self.follow_link(&href)?;
                return Ok(());
            }
        }

        if self.is_submit_control(target) {
            if let Some(form) = self.dom.closest_by_tag(target, "form") {
                self.submit_form(form)?;
            }
        }
        Ok(())
    }

    fn is_submit_control(&self, node: NodeId) -> bool {
        let kind = self
            .dom
            .attr(node, "type")
            .unwrap_or_default()
            .to_ascii_lowercase();
        if self.dom.has_tag(node, "button") {
            return kind.is_empty() || kind == "submit";
        }
        self.dom.has_tag(node, "input") && (kind == "submit" || kind == "image")
    }

    pub(crate) fn submit_form(&mut self, form: NodeId) -> Result<()> {
        let outcome = self.dispatch_event(form, "submit")?;
        if !outcome.default_prevented {
            self.native_submissions += 1;
            let label = self.trace_node_label(form);
            self.trace_behavior_line(format!("[form] native submission of {label}"));
        }
        Ok(())
    }

    /// Default action of an uncancelled link activation. Only same-document
    /// fragments are modeled: the hash changes and the page jumps to the target.
    fn follow_link(&mut self, href: &str) -> Result<()> {
        let Some(fragment) = href.strip_prefix('#') else {
            self.trace_behavior_line(format!("[nav] ignored cross-document link {href}"));
            return Ok(());
        };

        self.location_hash = if fragment.is_empty() {
            String::new()
        } else {
            format!("#{fragment}")
        };
        self.trace_behavior_line(format!("[nav] default fragment navigation to {href:?}"));

        if let Some(target) = self.dom.by_id(fragment).filter(|_| !fragment.is_empty()) {
            let top = self.dom.offset_top(target);
            return self.scroll_viewport_to(top, ScrollBehavior::Instant);
        }
        if fragment.is_empty() || fragment.eq_ignore_ascii_case("top") {
            return self.scroll_viewport_to(0, ScrollBehavior::Instant);
        }
        Ok(())
    }
}
