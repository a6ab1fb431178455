use super::*;

pub(crate) const DEFAULT_HEADER_OFFSET: i64 = 120;
pub(crate) const DEFAULT_FALLBACK_SECTION: &str = "home";
pub(crate) const DEFAULT_SUBMIT_DELAY_MS: i64 = 900;

/// Selectors for the elements the controller binds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupSelectors {
    pub nav_toggle: String,
    pub nav_panel: String,
    pub anchors: String,
    pub animated: String,
    pub sections: String,
    pub nav_links: String,
    pub contact_form: String,
    pub form_status: String,
    pub name_field: String,
    pub email_field: String,
    pub message_field: String,
    pub name_error: String,
    pub email_error: String,
    pub message_error: String,
    pub year: String,
}

impl Default for MarkupSelectors {
    fn default() -> Self {
        Self {
            nav_toggle: ".nav-toggle".into(),
            nav_panel: "#site-nav".into(),
            anchors: r##"a[href^="#"]"##.into(),
            animated: "[data-animate]".into(),
            sections: "main section[id]".into(),
            nav_links: ".site-nav a".into(),
            contact_form: "#contactForm".into(),
            form_status: "#form-status".into(),
            name_field: "#name".into(),
            email_field: "#email".into(),
            message_field: "#message".into(),
            name_error: "#error-name".into(),
            email_error: "#error-email".into(),
            message_error: "#error-message".into(),
            year: "#year".into(),
        }
    }
}

impl MarkupSelectors {
    fn all(&self) -> [(&'static str, &str); 15] {
        [
            ("nav_toggle", self.nav_toggle.as_str()),
            ("nav_panel", self.nav_panel.as_str()),
            ("anchors", self.anchors.as_str()),
            ("animated", self.animated.as_str()),
            ("sections", self.sections.as_str()),
            ("nav_links", self.nav_links.as_str()),
            ("contact_form", self.contact_form.as_str()),
            ("form_status", self.form_status.as_str()),
            ("name_field", self.name_field.as_str()),
            ("email_field", self.email_field.as_str()),
            ("message_field", self.message_field.as_str()),
            ("name_error", self.name_error.as_str()),
            ("email_error", self.email_error.as_str()),
            ("message_error", self.message_error.as_str()),
            ("year", self.year.as_str()),
        ]
    }
}

/// Page-specific knobs. The defaults reproduce the marketing page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageConfig {
    pub markup: MarkupSelectors,
    /// Height of the sticky header, added to the scroll position by scroll-spy.
    pub header_offset: i64,
    /// Section id used when the page has no sections to highlight.
    pub fallback_section: String,
    pub submit_delay_ms: i64,
    pub reveal_root_margin: RootMargin,
    /// Whether the host offers visibility observation. Without it every animated
    /// element is revealed immediately.
    pub intersection_observer: bool,
    /// Footer year; `None` reads the system clock.
    pub current_year: Option<i64>,
    pub viewport: Viewport,
    /// Layout boxes placed before the controller initializes, so the first
    /// scroll-spy pass sees real section offsets.
    pub initial_layout: Vec<(String, LayoutBox)>,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            markup: MarkupSelectors::default(),
            header_offset: DEFAULT_HEADER_OFFSET,
            fallback_section: DEFAULT_FALLBACK_SECTION.into(),
            submit_delay_ms: DEFAULT_SUBMIT_DELAY_MS,
            reveal_root_margin: default_reveal_root_margin(),
            intersection_observer: true,
            current_year: None,
            viewport: Viewport::default(),
            initial_layout: Vec::new(),
        }
    }
}

fn default_reveal_root_margin() -> RootMargin {
    RootMargin {
        top: Margin::Px(0.0),
        right: Margin::Px(0.0),
        bottom: Margin::Percent(-10.0),
        left: Margin::Px(0.0),
    }
}

impl PageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_markup(mut self, markup: MarkupSelectors) -> Self {
        self.markup = markup;
        self
    }

    pub fn with_header_offset(mut self, header_offset: i64) -> Self {
        self.header_offset = header_offset;
        self
    }

    pub fn with_fallback_section(mut self, id: impl Into<String>) -> Self {
        self.fallback_section = id.into();
        self
    }

    pub fn with_submit_delay_ms(mut self, delay_ms: i64) -> Self {
        self.submit_delay_ms = delay_ms;
        self
    }

    pub fn with_reveal_root_margin(mut self, margin: &str) -> Result<Self> {
        self.reveal_root_margin = RootMargin::parse(margin)?;
        Ok(self)
    }

    pub fn with_intersection_observer(mut self, supported: bool) -> Self {
        self.intersection_observer = supported;
        self
    }

    pub fn with_current_year(mut self, year: i64) -> Self {
        self.current_year = Some(year);
        self
    }

    pub fn with_viewport(mut self, width: i64, height: i64) -> Self {
        self.viewport.width = width;
        self.viewport.height = height;
        self
    }

    pub fn with_layout(mut self, selector: impl Into<String>, top: i64, height: i64) -> Self {
        self.initial_layout
            .push((selector.into(), LayoutBox::new(top, height)));
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.submit_delay_ms < 0 {
            return Err(Error::InvalidConfig(format!(
                "submit_delay_ms must be non-negative, got {}",
                self.submit_delay_ms
            )));
        }
        if self.viewport.width <= 0 || self.viewport.height <= 0 {
            return Err(Error::InvalidConfig(format!(
                "viewport must have a positive size, got {}x{}",
                self.viewport.width, self.viewport.height
            )));
        }
        if self.viewport.scroll_y < 0 {
            return Err(Error::InvalidConfig("initial scroll_y must be non-negative".into()));
        }
        for (name, selector) in self.markup.all() {
            selector::parse_selector_list(selector).map_err(|_| {
                Error::InvalidConfig(format!("markup.{name} is not a supported selector: {selector:?}"))
            })?;
        }
        for (selector, layout) in &self.initial_layout {
            if layout.height < 0 {
                return Err(Error::InvalidConfig(format!(
                    "layout height for {selector:?} must be non-negative, got {}",
                    layout.height
                )));
            }
            selector::parse_selector_list(selector).map_err(|_| {
                Error::InvalidConfig(format!("layout selector is not supported: {selector:?}"))
            })?;
        }
        Ok(())
    }
}
