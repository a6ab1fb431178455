use super::*;
use fancy_regex::Regex;

// ECMAScript WhiteSpace and LineTerminator. Unlike Unicode White_Space this
// includes U+FEFF and leaves out U+0085.
const JS_WHITESPACE_CLASS: &str =
    r"\t\x{0B}\x{0C} \x{A0}\x{1680}\x{2000}-\x{200A}\x{202F}\x{205F}\x{3000}\x{FEFF}\n\r\x{2028}\x{2029}";
const MIN_NAME_LEN: usize = 2;
const MIN_MESSAGE_LEN: usize = 10;

pub(crate) const STATUS_INVALID: &str = "Please fix the highlighted fields.";
pub(crate) const STATUS_SENDING: &str = "Sending…";
pub(crate) const STATUS_SENT: &str = "Thank you! We will be in touch shortly.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactField {
    Name,
    Email,
    Message,
}

impl ContactField {
    pub const ALL: [ContactField; 3] = [Self::Name, Self::Email, Self::Message];

    /// Text shown in the field's error element when its rule fails.
    pub fn error_message(self) -> &'static str {
        match self {
            Self::Name => "Please enter your full name.",
            Self::Email => "Please enter a valid email address.",
            Self::Message => "Message should be at least 10 characters.",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Message => "message",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactValues {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactValues {
    pub fn new(name: impl Into<String>, email: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            message: message.into(),
        }
    }

    pub fn get(&self, field: ContactField) -> &str {
        match field {
            ContactField::Name => &self.name,
            ContactField::Email => &self.email,
            ContactField::Message => &self.message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldReport {
    pub field: ContactField,
    /// `None` when the field passed.
    pub error: Option<&'static str>,
}

impl FieldReport {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of one validation pass, one report per field in form order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub fields: [FieldReport; 3],
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.fields.iter().all(FieldReport::is_valid)
    }

    pub fn field(&self, field: ContactField) -> &FieldReport {
        match field {
            ContactField::Name => &self.fields[0],
            ContactField::Email => &self.fields[1],
            ContactField::Message => &self.fields[2],
        }
    }

    pub fn invalid_fields(&self) -> Vec<ContactField> {
        self.fields
            .iter()
            .filter(|report| !report.is_valid())
            .map(|report| report.field)
            .collect()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ContactValidator {
    email: Regex,
}

impl ContactValidator {
    pub(crate) fn new() -> Result<Self> {
        let email = Regex::new(&email_pattern())
            .map_err(|err| Error::Runtime(format!("email pattern failed to compile: {err}")))?;
        Ok(Self { email })
    }

    pub(crate) fn validate(&self, values: &ContactValues) -> Result<ValidationReport> {
        let report = |field: ContactField, valid: bool| FieldReport {
            field,
            error: (!valid).then(|| field.error_message()),
        };

        let name = trim_whitespace(&values.name);
        let email = trim_whitespace(&values.email);
        let message = trim_whitespace(&values.message);

        let email_ok = self
            .email
            .is_match(email)
            .map_err(|err| Error::Runtime(format!("email pattern failed to run: {err}")))?;

        Ok(ValidationReport {
            fields: [
                report(ContactField::Name, utf16_len(name) >= MIN_NAME_LEN),
                report(ContactField::Email, email_ok),
                report(ContactField::Message, utf16_len(message) >= MIN_MESSAGE_LEN),
            ],
        })
    }
}

/// Checks contact details with the same rules the form applies on submit.
pub fn validate_contact(values: &ContactValues) -> Result<ValidationReport> {
    ContactValidator::new()?.validate(values)
}

fn email_pattern() -> String {
    let part = format!("[^{JS_WHITESPACE_CLASS}@]+");
    format!(r"^{part}@{part}\.{part}$")
}

fn is_js_whitespace(ch: char) -> bool {
    matches!(
        ch,
        '\t' | '\u{B}'
            | '\u{C}'
            | ' '
            | '\u{A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
            | '\n'
            | '\r'
            | '\u{2028}'
            | '\u{2029}'
    )
}

// Same set String.prototype.trim strips.
fn trim_whitespace(value: &str) -> &str {
    value.trim_matches(is_js_whitespace)
}

fn utf16_len(value: &str) -> usize {
    value.encode_utf16().count()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ContactFormState {
    #[default]
    Idle,
    Validating,
    Invalid,
    Submitting,
    Success,
}

#[derive(Debug, Clone)]
pub(crate) struct ContactFormMachine {
    validator: ContactValidator,
    state: ContactFormState,
    last_report: Option<ValidationReport>,
    in_flight: usize,
}

impl ContactFormMachine {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            validator: ContactValidator::new()?,
            state: ContactFormState::Idle,
            last_report: None,
            in_flight: 0,
        })
    }
}

impl Page {
    pub(crate) fn install_contact_form(&mut self) {
        let Some(contact) = self.bindings.contact.as_ref() else {
            self.trace_behavior_line("[form] contact form not found, validation not wired".into());
            return;
        };
        let form = contact.form;
        self.listeners.add(
            form,
            "submit",
            Listener {
                capture: false,
                handler: Handler::SubmitContactForm,
            },
        );
    }

    pub(crate) fn submit_contact_form(&mut self, event: &mut EventState) -> Result<()> {
        let Some(contact) = self.bindings.contact.clone() else {
            return Ok(());
        };
        event.prevent_default();
        self.set_optional_text(contact.status, "")?;
        self.set_contact_state(ContactFormState::Validating);

        let values = ContactValues {
            name: self.dom.value(contact.field(ContactField::Name))?,
            email: self.dom.value(contact.field(ContactField::Email))?,
            message: self.dom.value(contact.field(ContactField::Message))?,
        };
        let report = self.contact.validator.validate(&values)?;
        for field_report in report.fields {
            let text = field_report.error.unwrap_or("");
            self.set_optional_text(contact.error(field_report.field), text)?;
        }
        let valid = report.is_valid();
        let invalid_fields = report.invalid_fields();
        self.contact.last_report = Some(report);

        if !valid {
            self.set_optional_text(contact.status, STATUS_INVALID)?;
            self.set_contact_state(ContactFormState::Invalid);
            self.trace_behavior_line(format!("[form] rejected fields={invalid_fields:?}"));
            self.set_contact_state(ContactFormState::Idle);
            return Ok(());
        }

        self.set_optional_text(contact.status, STATUS_SENDING)?;
        self.set_contact_state(ContactFormState::Submitting);
        self.contact.in_flight += 1;
        let delay = self.config.submit_delay_ms;
        let id = self.set_timeout(TaskKind::ContactSubmission, delay);
        self.trace_behavior_line(format!("[form] sending timer={id} delay_ms={delay}"));
        Ok(())
    }

    pub(crate) fn complete_contact_submission(&mut self) -> Result<()> {
        self.contact.in_flight = self.contact.in_flight.saturating_sub(1);
        let Some(contact) = self.bindings.contact.clone() else {
            return Ok(());
        };
        self.set_optional_text(contact.status, STATUS_SENT)?;
        self.reset_form(contact.form)?;
        self.set_contact_state(ContactFormState::Success);
        Ok(())
    }

    /// Returns every text control in the form to its default value unless the
    /// `reset` event is cancelled.
    pub(crate) fn reset_form(&mut self, form: NodeId) -> Result<()> {
        let outcome = self.dispatch_event(form, "reset")?;
        if outcome.default_prevented {
            return Ok(());
        }
        let controls = self
            .dom
            .all_element_nodes()
            .into_iter()
            .filter(|node| *node != form && self.dom.contains(form, *node))
            .filter(|node| self.dom.is_text_control(*node))
            .collect::<Vec<_>>();
        for control in controls {
            let default = self.dom.default_value(control);
            self.dom.set_value(control, &default)?;
        }
        Ok(())
    }

    fn set_contact_state(&mut self, state: ContactFormState) {
        if self.contact.state != state {
            self.trace_behavior_line(format!("[form] {:?} -> {:?}", self.contact.state, state));
        }
        self.contact.state = state;
    }

    pub fn contact_form_state(&self) -> ContactFormState {
        self.contact.state
    }

    /// Report from the most recent submission attempt.
    pub fn last_validation(&self) -> Option<&ValidationReport> {
        self.contact.last_report.as_ref()
    }

    /// Submissions whose simulated network delay has not elapsed yet.
    pub fn submissions_in_flight(&self) -> usize {
        self.contact.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_check_trimmed_lengths() -> Result<()> {
        let report = validate_contact(&ContactValues::new("  A  ", "a@b.co", "0123456789"))?;
        assert_eq!(report.invalid_fields(), vec![ContactField::Name]);
        assert_eq!(
            report.field(ContactField::Name).error,
            Some("Please enter your full name.")
        );

        let report = validate_contact(&ContactValues::new("Al", " a@b.co ", "   0123456789\n"))?;
        assert!(report.is_valid());
        Ok(())
    }

    #[test]
    fn lengths_count_utf16_units() -> Result<()> {
        // One astral character is two UTF-16 units.
        let report = validate_contact(&ContactValues::new("😀", "a@b.co", "😀😀😀😀😀"))?;
        assert!(report.is_valid());
        Ok(())
    }

    #[test]
    fn email_rule_matches_the_page_pattern() -> Result<()> {
        let validator = ContactValidator::new()?;
        let check = |email: &str| -> Result<bool> {
            let report = validator.validate(&ContactValues::new("Al", email, "long enough message"))?;
            Ok(report.field(ContactField::Email).is_valid())
        };
        assert!(check("a@b.com")?);
        assert!(check("first.last@sub.example.org")?);
        assert!(!check("not-an-email")?);
        assert!(!check("a@b")?);
        assert!(!check("a b@c.d")?);
        assert!(!check("a@@b.c")?);
        assert!(!check("a@b.")?);
        Ok(())
    }

    #[test]
    fn whitespace_follows_javascript_rules() -> Result<()> {
        // U+0085 is not JS whitespace: it survives the trim and counts.
        let report = validate_contact(&ContactValues::new("A\u{85}", "a\u{85}@b.co", "0123456789"))?;
        assert!(report.is_valid());

        let report = validate_contact(&ContactValues::new(
            "\u{3000}Al\u{FEFF}",
            "\u{2028}a@b.co\u{A0}",
            "0123456789\u{205F}",
        ))?;
        assert!(report.is_valid());

        let report = validate_contact(&ContactValues::new("A\u{2003}", "a\u{2003}b@c.d", "0123456789"))?;
        assert_eq!(report.invalid_fields(), vec![ContactField::Name, ContactField::Email]);
        Ok(())
    }

    #[test]
    fn error_messages_are_fixed() {
        assert_eq!(
            ContactField::ALL.map(ContactField::error_message),
            [
                "Please enter your full name.",
                "Please enter a valid email address.",
                "Message should be at least 10 characters.",
            ]
        );
    }

    #[test]
    fn reset_restores_default_values() -> Result<()> {
        let mut page = Page::from_html(
            r#"<form id="f"><input id="a" value="seed"><textarea id="b">draft</textarea></form>"#,
        )?;
        page.type_text("#a", "changed")?;
        page.type_text("#b", "changed")?;
        let form = page.select_one("#f")?;
        page.reset_form(form)?;
        page.assert_value("#a", "seed")?;
        page.assert_value("#b", "draft")?;
        Ok(())
    }
}
