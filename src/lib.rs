//! Interaction controller for a static marketing page, running on a deterministic
//! headless page model.
//!
//! A [`Page`] is built from HTML. Building it wires up the navigation toggle, smooth
//! anchor scrolling, scroll-spy highlighting, reveal-on-scroll animation, the contact
//! form validator and the footer year. Tests then drive the page through user actions
//! and a virtual clock:
//!
//! ```no_run
//! use site_interactions::{Page, Result};
//!
//! fn main() -> Result<()> {
//!     let mut page = Page::from_html(
//!         r#"<button class='nav-toggle' aria-expanded='false'>Menu</button>
//!            <nav id='site-nav' class='site-nav'><a href='#about'>About</a></nav>"#,
//!     )?;
//!     page.click(".nav-toggle")?;
//!     page.assert_attr(".nav-toggle", "aria-expanded", "true")?;
//!     Ok(())
//! }
//! ```

use std::collections::{HashMap, VecDeque};
use std::error::Error as StdError;
use std::fmt;

mod bindings;
mod config;
mod contact_form;
mod dom;
mod events;
mod footer;
mod geometry;
mod html;
mod intersection;
mod navigation;
mod page;
mod reveal;
mod runtime_state;
mod scheduler;
mod scroll_spy;
mod selector;

#[cfg(test)]
mod tests;

pub use bindings::{ContactFormBindings, PageBindings};
pub use config::{MarkupSelectors, PageConfig};
pub use contact_form::{
    ContactField, ContactFormState, ContactValues, FieldReport, ValidationReport,
    validate_contact,
};
pub use geometry::{LayoutBox, Margin, Rect, RootMargin, ScrollBehavior, Viewport};
pub use intersection::RevealState;
pub use page::Page;
pub use runtime_state::{PendingTimer, TaskKind};
pub use scroll_spy::current_section;
pub use selector::css_escape;

use dom::Dom;
use runtime_state::*;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    UnsupportedSelector(String),
    SelectorNotFound(String),
    TypeMismatch {
        selector: String,
        expected: String,
        actual: String,
    },
    InvalidConfig(String),
    Runtime(String),
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::TypeMismatch {
                selector,
                expected,
                actual,
            } => write!(
                f,
                "type mismatch for {selector}: expected {expected}, actual {actual}"
            ),
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::Runtime(msg) => write!(f, "runtime error: {msg}"),
            Self::AssertionFailed {
                selector,
                expected,
                actual,
                dom_snippet,
            } => write!(
                f,
                "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
            ),
        }
    }
}

impl StdError for Error {}

/// Identity of a node inside a page's DOM arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    let mut it = value.chars();
    let mut out = String::new();
    for _ in 0..max_chars {
        let Some(ch) = it.next() else {
            return out;
        };
        out.push(ch);
    }
    if it.next().is_some() {
        out.push_str("...");
    }
    out
}
