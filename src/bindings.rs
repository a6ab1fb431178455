use super::*;

/// Elements the contact form behavior works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactFormBindings {
    pub form: NodeId,
    pub status: Option<NodeId>,
    pub name: NodeId,
    pub email: NodeId,
    pub message: NodeId,
    pub name_error: Option<NodeId>,
    pub email_error: Option<NodeId>,
    pub message_error: Option<NodeId>,
}

impl ContactFormBindings {
    pub(crate) fn field(&self, field: ContactField) -> NodeId {
        match field {
            ContactField::Name => self.name,
            ContactField::Email => self.email,
            ContactField::Message => self.message,
        }
    }

    pub(crate) fn error(&self, field: ContactField) -> Option<NodeId> {
        match field {
            ContactField::Name => self.name_error,
            ContactField::Email => self.email_error,
            ContactField::Message => self.message_error,
        }
    }
}

/// The markup contract resolved once, at initialization. Behaviors only ever see
/// these ids; nothing queries the document afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageBindings {
    pub nav_toggle: Option<NodeId>,
    pub nav_panel: Option<NodeId>,
    pub anchors: Vec<NodeId>,
    pub animated: Vec<NodeId>,
    pub sections: Vec<NodeId>,
    pub nav_links: Vec<NodeId>,
    pub contact: Option<ContactFormBindings>,
    pub year: Option<NodeId>,
}

impl PageBindings {
    pub(crate) fn discover(dom: &Dom, markup: &MarkupSelectors) -> Result<Self> {
        Ok(Self {
            nav_toggle: dom.query_selector(&markup.nav_toggle)?,
            nav_panel: dom.query_selector(&markup.nav_panel)?,
            anchors: dom.query_selector_all(&markup.anchors)?,
            animated: dom.query_selector_all(&markup.animated)?,
            sections: dom.query_selector_all(&markup.sections)?,
            nav_links: dom.query_selector_all(&markup.nav_links)?,
            contact: discover_contact_form(dom, markup)?,
            year: dom.query_selector(&markup.year)?,
        })
    }

    /// Toggle and panel only work as a pair.
    pub(crate) fn navigation(&self) -> Option<(NodeId, NodeId)> {
        self.nav_toggle.zip(self.nav_panel)
    }
}

fn discover_contact_form(dom: &Dom, markup: &MarkupSelectors) -> Result<Option<ContactFormBindings>> {
    let Some(form) = dom.query_selector(&markup.contact_form)? else {
        return Ok(None);
    };

    let text_control = |selector: &str| -> Result<Option<NodeId>> {
        Ok(dom
            .query_selector(selector)?
            .filter(|node| dom.is_text_control(*node)))
    };
    let (Some(name), Some(email), Some(message)) = (
        text_control(&markup.name_field)?,
        text_control(&markup.email_field)?,
        text_control(&markup.message_field)?,
    ) else {
        return Ok(None);
    };

    Ok(Some(ContactFormBindings {
        form,
        status: dom.query_selector(&markup.form_status)?,
        name,
        email,
        message,
        name_error: dom.query_selector(&markup.name_error)?,
        email_error: dom.query_selector(&markup.email_error)?,
        message_error: dom.query_selector(&markup.message_error)?,
    }))
}
