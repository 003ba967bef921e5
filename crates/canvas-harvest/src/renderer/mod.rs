//! Browser abstraction for the harvest workflow.
//!
//! Defines the `Renderer` and `PageContext` traits that abstract over the
//! browser engine (currently Chromium via chromiumoxide). The workflow only
//! ever talks to a `PageContext`, which is what lets it run against
//! [`crate::testing::MockSite`] in tests.

pub mod chromium;

use crate::error::Result;
use crate::locator::Locator;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// Observable state of one element matched by a locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementState {
    /// Rendered with a non-empty box and not hidden by style.
    pub visible: bool,
    /// Not carrying a `disabled` flag.
    pub enabled: bool,
}

impl ElementState {
    /// Visible and enabled, the same test Selenium's "clickable" applies.
    pub fn clickable(&self) -> bool {
        self.visible && self.enabled
    }
}

/// A browser engine that can open page contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new browser context (tab).
    async fn new_context(&self) -> Result<Box<dyn PageContext>>;
    /// Shut down the browser engine.
    async fn shutdown(&self) -> Result<()>;
}

/// A single browser tab.
///
/// Element operations take a locator plus the index of the match in document
/// order. Elements are looked up again on every call, so an index that no
/// longer matches yields [`crate::HarvestError::ElementNotFound`].
#[async_trait]
pub trait PageContext: Send + Sync {
    /// Navigate to a URL with a timeout.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult>;
    /// Go one entry back in session history.
    async fn go_back(&mut self) -> Result<()>;
    /// Get the current URL.
    async fn current_url(&self) -> Result<String>;
    /// State of every element matching `locator`, in document order.
    async fn probe(&self, locator: &Locator) -> Result<Vec<ElementState>>;
    /// Click the `index`-th match. Does not wait for any navigation the
    /// click starts; see [`PageContext::settle`].
    async fn click(&mut self, locator: &Locator, index: usize) -> Result<()>;
    /// Wait, at most `timeout_ms`, for the tab to leave `from_url` and load
    /// the next page. Returns `false` when no navigation happened in time.
    async fn settle(&mut self, from_url: &str, timeout_ms: u64) -> Result<bool>;
    /// Focus the `index`-th match and type `text` into it.
    async fn type_text(&mut self, locator: &Locator, index: usize, text: &str) -> Result<()>;
    /// Read an attribute of the `index`-th match.
    async fn attribute(&self, locator: &Locator, index: usize, name: &str)
        -> Result<Option<String>>;
    /// Close this context.
    async fn close(self: Box<Self>) -> Result<()>;
}
