use super::*;
use crate::contact_form::ContactFormMachine;
use crate::intersection::RevealTracker;
use crate::scroll_spy::ScrollSpyState;

/// A parsed page with the interaction controller attached.
#[derive(Debug)]
pub struct Page {
    pub(crate) dom: Dom,
    pub(crate) listeners: ListenerStore,
    pub(crate) scheduler: SchedulerState,
    pub(crate) viewport: Viewport,
    pub(crate) config: PageConfig,
    pub(crate) bindings: PageBindings,
    pub(crate) active_element: Option<NodeId>,
    pub(crate) location_hash: String,
    pub(crate) last_scroll_behavior: ScrollBehavior,
    pub(crate) native_submissions: usize,
    pub(crate) scroll_spy: ScrollSpyState,
    pub(crate) reveal: RevealTracker,
    pub(crate) contact: ContactFormMachine,
    pub(crate) trace_state: TraceState,
}

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        Self::from_html_with_config(html, PageConfig::default())
    }

    pub fn from_html_with_config(html: &str, config: PageConfig) -> Result<Self> {
        config.validate()?;
        let dom = html::parse_html(html)?;
        let mut page = Self {
            dom,
            listeners: ListenerStore::default(),
            scheduler: SchedulerState::default(),
            viewport: config.viewport,
            bindings: PageBindings::default(),
            active_element: None,
            location_hash: String::new(),
            last_scroll_behavior: ScrollBehavior::Instant,
            native_submissions: 0,
            scroll_spy: ScrollSpyState::default(),
            reveal: RevealTracker::default(),
            contact: ContactFormMachine::new()?,
            trace_state: TraceState::default(),
            config,
        };
        page.initialize_controller()?;
        Ok(page)
    }

    /// Runs once the content is ready: resolve the markup, then attach each
    /// behavior independently.
    fn initialize_controller(&mut self) -> Result<()> {
        for (selector, layout) in self.config.initial_layout.clone() {
            let target = self.select_one(&selector)?;
            self.dom.set_layout_box(target, layout)?;
        }
        self.bindings = PageBindings::discover(&self.dom, &self.config.markup)?;
        self.stamp_footer_year()?;
        self.install_navigation();
        self.install_smooth_scroll();
        self.install_reveal()?;
        self.install_scroll_spy()?;
        self.install_contact_form();
        self.trace_behavior_line(format!(
            "[page] controller ready listeners={}",
            self.listeners.count()
        ));
        Ok(())
    }

    pub fn bindings(&self) -> &PageBindings {
        &self.bindings
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) || self.dom.has_attr(target, "readonly") {
            return Ok(());
        }
        if !self.dom.is_text_control(target) {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: self.dom.tag_name(target).unwrap_or("non-element").to_string(),
            });
        }
        self.dom.set_value(target, text)?;
        self.dispatch_event(target, "input")?;
        Ok(())
    }

    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.click_node(target)
    }

    pub fn submit(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if let Some(form) = self.dom.closest_by_tag(target, "form") {
            self.submit_form(form)?;
        }
        Ok(())
    }

    pub fn focus(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.focus_node(target)
    }

    pub fn blur(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.blur_node(target)
    }

    pub fn dispatch(&mut self, selector: &str, event: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.dispatch_event(target, event)?;
        Ok(())
    }

    /// User scroll to an absolute vertical position.
    pub fn scroll_to(&mut self, scroll_y: i64) -> Result<()> {
        if scroll_y < 0 {
            return Err(Error::Runtime(format!(
                "scroll_to requires a non-negative position, got {scroll_y}"
            )));
        }
        self.scroll_viewport_to(scroll_y, ScrollBehavior::Instant)
    }

    pub fn set_viewport(&mut self, width: i64, height: i64) -> Result<()> {
        if width <= 0 || height <= 0 {
            return Err(Error::Runtime(format!(
                "viewport must have a positive size, got {width}x{height}"
            )));
        }
        self.viewport.width = width;
        self.viewport.height = height;
        self.request_rendering();
        Ok(())
    }

    /// Places the first element matching `selector` in document coordinates.
    /// Section offsets may move, so scroll-spy recomputes at the next frame.
    pub fn set_layout(&mut self, selector: &str, top: i64, height: i64) -> Result<()> {
        if height < 0 {
            return Err(Error::Runtime(format!(
                "layout height must be non-negative, got {height}"
            )));
        }
        let target = self.select_one(selector)?;
        self.dom.set_layout_box(target, LayoutBox::new(top, height))?;
        self.schedule_scroll_spy();
        self.request_rendering();
        Ok(())
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn scroll_y(&self) -> i64 {
        self.viewport.scroll_y
    }

    pub fn last_scroll_behavior(&self) -> ScrollBehavior {
        self.last_scroll_behavior
    }

    /// Current `location.hash`, including the leading `#`, or empty.
    pub fn location_hash(&self) -> &str {
        &self.location_hash
    }

    /// Form submissions that were not cancelled and would have left the page.
    pub fn native_submissions(&self) -> usize {
        self.native_submissions
    }

    pub fn active_element_id(&self) -> Option<String> {
        self.active_element
            .and_then(|node| self.dom.attr(node, "id"))
    }

    pub fn text(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.text_content(target))
    }

    pub fn attr(&self, selector: &str, name: &str) -> Result<Option<String>> {
        let target = self.select_one(selector)?;
        Ok(self.dom.attr(target, name))
    }

    pub fn has_class(&self, selector: &str, class_name: &str) -> Result<bool> {
        let target = self.select_one(selector)?;
        Ok(self.dom.has_class(target, class_name))
    }

    pub fn value(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        self.dom.value(target).map_err(|_| Error::TypeMismatch {
            selector: selector.to_string(),
            expected: "input or textarea".into(),
            actual: self.dom.tag_name(target).unwrap_or("non-element").to_string(),
        })
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.text_content(target);
        self.check_assertion(selector, target, expected, &actual)
    }

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.value(selector)?;
        self.check_assertion(selector, target, expected, &actual)
    }

    /// `expected` of `None` asserts the attribute is absent.
    pub fn assert_attr<'a>(
        &self,
        selector: &str,
        name: &str,
        expected: impl Into<Option<&'a str>>,
    ) -> Result<()> {
        let target = self.select_one(selector)?;
        let expected = expected.into();
        let actual = self.dom.attr(target, name);
        if actual.as_deref() != expected {
            return Err(Error::AssertionFailed {
                selector: format!("{selector}[{name}]"),
                expected: format!("{expected:?}"),
                actual: format!("{actual:?}"),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_class(&self, selector: &str, class_name: &str, expected: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.has_class(target, class_name);
        self.check_assertion(
            &format!("{selector}.{class_name}"),
            target,
            &expected.to_string(),
            &actual.to_string(),
        )
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        let _ = self.select_one(selector)?;
        Ok(())
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.dump_node(target))
    }

    fn check_assertion(
        &self,
        selector: &str,
        target: NodeId,
        expected: &str,
        actual: &str,
    ) -> Result<()> {
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual: actual.to_string(),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub(crate) fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.dom.dump_node(node_id), 200)
    }

    /// Writes text into an element the markup may not provide.
    pub(crate) fn set_optional_text(&mut self, node: Option<NodeId>, text: &str) -> Result<()> {
        match node {
            Some(node) => self.dom.set_text_content(node, text),
            None => Ok(()),
        }
    }

    pub(crate) fn scroll_viewport_to(&mut self, scroll_y: i64, behavior: ScrollBehavior) -> Result<()> {
        let scroll_y = scroll_y.max(0);
        self.last_scroll_behavior = behavior;
        if self.viewport.scroll_y == scroll_y {
            return Ok(());
        }
        self.viewport.scroll_y = scroll_y;
        let mut event = EventState::new("scroll", self.dom.root, self.scheduler.now_ms);
        event.cancelable = false;
        self.dispatch_prepared_event(&mut event)?;
        self.request_rendering();
        Ok(())
    }

    pub(crate) fn focus_node(&mut self, node: NodeId) -> Result<()> {
        if self.dom.disabled(node) || !self.dom.is_focusable(node) {
            return Ok(());
        }
        if self.active_element == Some(node) {
            return Ok(());
        }
        if let Some(current) = self.active_element {
            self.blur_node(current)?;
        }
        self.active_element = Some(node);
        self.dispatch_event(node, "focusin")?;
        self.dispatch_event(node, "focus")?;
        Ok(())
    }

    pub(crate) fn blur_node(&mut self, node: NodeId) -> Result<()> {
        if self.active_element != Some(node) {
            return Ok(());
        }
        self.dispatch_event(node, "focusout")?;
        self.dispatch_event(node, "blur")?;
        self.active_element = None;
        Ok(())
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace_state.enabled = enabled;
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        self.trace_state.logs.drain(..).collect()
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_state.to_stderr = enabled;
    }

    pub fn set_trace_events(&mut self, enabled: bool) {
        self.trace_state.events = enabled;
    }

    pub fn set_trace_timers(&mut self, enabled: bool) {
        self.trace_state.timers = enabled;
    }

    pub fn set_trace_behaviors(&mut self, enabled: bool) {
        self.trace_state.behaviors = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::Runtime(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace_state.log_limit = max_entries;
        while self.trace_state.logs.len() > self.trace_state.log_limit {
            self.trace_state.logs.pop_front();
        }
        Ok(())
    }

    pub fn set_timer_step_limit(&mut self, max_steps: usize) -> Result<()> {
        if max_steps == 0 {
            return Err(Error::Runtime(
                "set_timer_step_limit requires at least 1 step".into(),
            ));
        }
        self.scheduler.timer_step_limit = max_steps;
        Ok(())
    }

    pub(crate) fn trace_event_line(&mut self, line: String) {
        if self.trace_state.enabled && self.trace_state.events {
            self.trace_line(line);
        }
    }

    pub(crate) fn trace_timer_line(&mut self, line: String) {
        if self.trace_state.enabled && self.trace_state.timers {
            self.trace_line(line);
        }
    }

    pub(crate) fn trace_behavior_line(&mut self, line: String) {
        if self.trace_state.enabled && self.trace_state.behaviors {
            self.trace_line(line);
        }
    }

    fn trace_line(&mut self, line: String) {
        if self.trace_state.to_stderr {
            eprintln!("{line}");
        }
        while self.trace_state.logs.len() >= self.trace_state.log_limit {
            self.trace_state.logs.pop_front();
        }
        self.trace_state.logs.push_back(line);
    }

    pub(crate) fn trace_node_label(&self, node: NodeId) -> String {
        if node == self.dom.root {
            return "document".into();
        }
        let Some(tag) = self.dom.tag_name(node) else {
            return format!("#node{}", node.0);
        };
        match self.dom.attr(node, "id") {
            Some(id) if !id.is_empty() => format!("{tag}#{id}"),
            _ => tag.to_string(),
        }
    }
}
