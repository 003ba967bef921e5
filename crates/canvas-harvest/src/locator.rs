//! Element addressing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How an element on the page is found.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locator {
    /// Element `id` attribute.
    Id(String),
    /// Raw CSS selector.
    Css(String),
    /// A single class name.
    ClassName(String),
    /// An anchor whose whitespace-normalized text equals the value.
    LinkText(String),
}

impl Locator {
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::ClassName(name.into())
    }

    pub fn link_text(text: impl Into<String>) -> Self {
        Self::LinkText(text.into())
    }

    /// CSS selector for this locator, or `None` when only XPath can express it.
    pub fn to_css(&self) -> Option<String> {
        match self {
            Self::Id(id) => Some(format!("#{id}")),
            Self::Css(selector) => Some(selector.clone()),
            Self::ClassName(name) => Some(format!(".{name}")),
            Self::LinkText(_) => None,
        }
    }

    /// XPath for this locator, or `None` for a raw CSS selector.
    pub fn to_xpath(&self) -> Option<String> {
        match self {
            Self::Id(id) => Some(format!("//*[@id={}]", xpath_literal(id))),
            Self::ClassName(name) => Some(format!(
                "//*[contains(concat(' ', normalize-space(@class), ' '), {})]",
                xpath_literal(&format!(" {name} "))
            )),
            Self::LinkText(text) => Some(format!(
                "//a[normalize-space(.)={}]",
                xpath_literal(text.trim())
            )),
            Self::Css(_) => None,
        }
    }
}

/// Quote a string as an XPath 1.0 literal. XPath has no escapes, so text
/// holding both quote kinds is spliced together with `concat()`.
fn xpath_literal(text: &str) -> String {
    if !text.contains('"') {
        return format!("\"{text}\"");
    }
    if !text.contains('\'') {
        return format!("'{text}'");
    }
    let parts: Vec<String> = text
        .split('"')
        .map(|part| format!("\"{part}\""))
        .collect();
    format!("concat({})", parts.join(", '\"', "))
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LinkText(text) => write!(f, "link \"{text}\""),
            other => write!(f, "{}", other.to_css().unwrap_or_default()),
        }
    }
}
