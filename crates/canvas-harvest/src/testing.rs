//! Testing infrastructure.
//!
//! [`MockSite`] is a scripted, in-memory [`PageContext`]: pages are keyed by
//! URL and hold located elements with a fixed state and a click effect. The
//! whole harvest workflow can run against it without a browser.
//!
//! ```ignore
//! let site = MockSite::new();
//! site.add_page(
//!     "https://canvas.example.edu/courses/1/modules",
//!     MockPage::new().with(
//!         selectors::first_module_item(),
//!         MockElement::visible().attr("href", "https://canvas.example.edu/courses/1/pages/intro"),
//!     ),
//! );
//! let mut ctx = site.context();
//! ```

use crate::error::{HarvestError, Result};
use crate::locator::Locator;
use crate::renderer::{ElementState, NavigationResult, PageContext};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// What clicking a mock element does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickEffect {
    Nothing,
    /// Start loading another page. Like a real browser, the old page stays
    /// in place until the navigation is awaited with `settle`.
    Navigate(String),
    /// Record a finished download with this file name.
    Download(String),
    /// Fail the click with a browser error carrying this message.
    Fail(String),
}

/// One element on a mock page.
#[derive(Debug, Clone)]
pub struct MockElement {
    state: ElementState,
    attributes: HashMap<String, String>,
    on_click: ClickEffect,
    appear_after: u32,
    probes: u32,
}

impl MockElement {
    pub fn visible() -> Self {
        Self {
            state: ElementState {
                visible: true,
                enabled: true,
            },
            attributes: HashMap::new(),
            on_click: ClickEffect::Nothing,
            appear_after: 0,
            probes: 0,
        }
    }

    pub fn hidden() -> Self {
        let mut element = Self::visible();
        element.state.visible = false;
        element
    }

    pub fn disabled(mut self) -> Self {
        self.state.enabled = false;
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn navigates_to(mut self, url: &str) -> Self {
        self.on_click = ClickEffect::Navigate(url.to_string());
        self
    }

    pub fn downloads(mut self, file_name: &str) -> Self {
        self.on_click = ClickEffect::Download(file_name.to_string());
        self
    }

    pub fn fails_with(mut self, message: &str) -> Self {
        self.on_click = ClickEffect::Fail(message.to_string());
        self
    }

    /// Stay out of the DOM for the first `probes` lookups, like content that
    /// renders late.
    pub fn appears_after(mut self, probes: u32) -> Self {
        self.appear_after = probes;
        self
    }

    fn present(&self) -> bool {
        self.probes >= self.appear_after
    }
}

/// A page: located elements in document order.
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    elements: Vec<(Locator, MockElement)>,
}

impl MockPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, locator: Locator, element: MockElement) -> Self {
        self.elements.push((locator, element));
        self
    }
}

/// Something the workflow did to the mock site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    Navigated(String),
    Back,
    Clicked(Locator, usize),
    Typed(Locator, String),
}

#[derive(Default)]
struct SiteState {
    pages: HashMap<String, MockPage>,
    unreachable: HashSet<String>,
    current: String,
    pending: Option<String>,
    history: Vec<String>,
    events: Vec<MockEvent>,
    downloads: Vec<String>,
}

impl SiteState {
    fn load(&mut self, url: &str) {
        self.pending = None;
        if !self.current.is_empty() {
            let previous = std::mem::take(&mut self.current);
            self.history.push(previous);
        }
        self.current = url.to_string();
        // A fresh load re-renders late content from scratch.
        if let Some(page) = self.pages.get_mut(url) {
            for (_, element) in &mut page.elements {
                element.probes = 0;
            }
        }
    }

    /// Indices into the current page's element list for `locator`, present
    /// elements only.
    fn matching(&self, locator: &Locator) -> Vec<usize> {
        self.pages
            .get(&self.current)
            .map(|page| {
                page.elements
                    .iter()
                    .enumerate()
                    .filter(|(_, (l, e))| l == locator && e.present())
                    .map(|(i, _)| i)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn nth(&mut self, locator: &Locator, index: usize) -> Result<&mut MockElement> {
        let slot = *self
            .matching(locator)
            .get(index)
            .ok_or_else(|| HarvestError::not_found(locator))?;
        let page = self
            .pages
            .get_mut(&self.current)
            .ok_or_else(|| HarvestError::not_found(locator))?;
        Ok(&mut page.elements[slot].1)
    }
}

/// Shared handle to a scripted site. Clones see the same state, so a test
/// can keep one while the workflow owns a [`MockSite::context`].
#[derive(Clone, Default)]
pub struct MockSite {
    inner: Arc<Mutex<SiteState>>,
}

impl MockSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_page(&self, url: &str, page: MockPage) {
        self.lock().pages.insert(url.to_string(), page);
    }

    /// Make navigation to `url` fail.
    pub fn make_unreachable(&self, url: &str) {
        self.lock().unreachable.insert(url.to_string());
    }

    /// A boxed context driving this site.
    pub fn context(&self) -> Box<dyn PageContext> {
        Box::new(self.clone())
    }

    pub fn current(&self) -> String {
        self.lock().current.clone()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.lock().downloads.clone()
    }

    pub fn events(&self) -> Vec<MockEvent> {
        self.lock().events.clone()
    }

    /// URLs navigated to directly, in order.
    pub fn visited(&self) -> Vec<String> {
        self.lock()
            .events
            .iter()
            .filter_map(|e| match e {
                MockEvent::Navigated(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, SiteState> {
        // A panicking test poisons the lock; the state is still usable.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl PageContext for MockSite {
    async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<NavigationResult> {
        let mut state = self.lock();
        if state.unreachable.contains(url) {
            return Err(HarvestError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_CONNECTION_REFUSED".to_string(),
            });
        }
        state.events.push(MockEvent::Navigated(url.to_string()));
        state.load(url);
        Ok(NavigationResult {
            final_url: url.to_string(),
            load_time_ms: 0,
        })
    }

    async fn go_back(&mut self) -> Result<()> {
        let mut state = self.lock();
        state.pending = None;
        state.events.push(MockEvent::Back);
        if let Some(previous) = state.history.pop() {
            state.current = previous;
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.current())
    }

    async fn probe(&self, locator: &Locator) -> Result<Vec<ElementState>> {
        let mut state = self.lock();
        let current = state.current.clone();
        let Some(page) = state.pages.get_mut(&current) else {
            return Ok(Vec::new());
        };
        let mut states = Vec::new();
        for (l, element) in &mut page.elements {
            if l != locator {
                continue;
            }
            if element.present() {
                states.push(element.state);
            }
            element.probes += 1;
        }
        Ok(states)
    }

    async fn click(&mut self, locator: &Locator, index: usize) -> Result<()> {
        let mut state = self.lock();
        let element = state.nth(locator, index)?;
        if !element.state.clickable() {
            return Err(HarvestError::Browser(format!(
                "{locator} is not interactable"
            )));
        }
        let effect = element.on_click.clone();
        if let ClickEffect::Fail(message) = &effect {
            return Err(HarvestError::Browser(message.clone()));
        }
        state.events.push(MockEvent::Clicked(locator.clone(), index));
        match effect {
            ClickEffect::Navigate(url) => state.pending = Some(url),
            ClickEffect::Download(name) => state.downloads.push(name),
            ClickEffect::Nothing | ClickEffect::Fail(_) => {}
        }
        Ok(())
    }

    async fn settle(&mut self, from_url: &str, _timeout_ms: u64) -> Result<bool> {
        let mut state = self.lock();
        if let Some(url) = state.pending.take() {
            state.load(&url);
        }
        Ok(state.current != from_url)
    }

    async fn type_text(&mut self, locator: &Locator, index: usize, text: &str) -> Result<()> {
        let mut state = self.lock();
        let element = state.nth(locator, index)?;
        element
            .attributes
            .entry("value".to_string())
            .or_default()
            .push_str(text);
        state
            .events
            .push(MockEvent::Typed(locator.clone(), text.to_string()));
        Ok(())
    }

    async fn attribute(
        &self,
        locator: &Locator,
        index: usize,
        name: &str,
    ) -> Result<Option<String>> {
        let mut state = self.lock();
        let element = state.nth(locator, index)?;
        Ok(element.attributes.get(name).cloned())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_navigation_and_history() {
        let site = MockSite::new();
        site.add_page(
            "https://a/",
            MockPage::new().with(Locator::link_text("go"), MockElement::visible().navigates_to("https://b/")),
        );
        let mut ctx = site.context();

        ctx.navigate("https://a/", 1000).await.unwrap();
        ctx.click(&Locator::link_text("go"), 0).await.unwrap();
        // Still on the old page until the navigation is awaited.
        assert_eq!(site.current(), "https://a/");
        assert!(ctx.settle("https://a/", 1000).await.unwrap());
        assert_eq!(site.current(), "https://b/");

        ctx.go_back().await.unwrap();
        assert_eq!(ctx.current_url().await.unwrap(), "https://a/");
    }

    #[tokio::test]
    async fn test_mock_late_elements_and_missing_index() {
        let site = MockSite::new();
        let lock = Locator::class("late");
        site.add_page("https://a/", MockPage::new().with(lock.clone(), MockElement::visible().appears_after(2)));
        let mut ctx = site.context();
        ctx.navigate("https://a/", 1000).await.unwrap();

        assert!(ctx.probe(&lock).await.unwrap().is_empty());
        assert!(ctx.probe(&lock).await.unwrap().is_empty());
        assert_eq!(ctx.probe(&lock).await.unwrap().len(), 1);

        let err = ctx.click(&lock, 3).await.unwrap_err();
        assert!(err.is_benign());
    }

    #[tokio::test]
    async fn test_mock_settle_without_navigation() {
        let site = MockSite::new();
        let button = Locator::id("stay");
        site.add_page("https://a/", MockPage::new().with(button.clone(), MockElement::visible()));
        let mut ctx = site.context();
        ctx.navigate("https://a/", 1000).await.unwrap();

        ctx.click(&button, 0).await.unwrap();
        assert!(!ctx.settle("https://a/", 1000).await.unwrap());
        assert_eq!(site.current(), "https://a/");
    }

    #[tokio::test]
    async fn test_mock_failing_click() {
        let site = MockSite::new();
        let button = Locator::id("uc-download-link");
        site.add_page(
            "https://a/",
            MockPage::new().with(button.clone(), MockElement::visible().fails_with("click intercepted")),
        );
        let mut ctx = site.context();
        ctx.navigate("https://a/", 1000).await.unwrap();

        let err = ctx.click(&button, 0).await.unwrap_err();
        assert!(matches!(err, HarvestError::Browser(ref m) if m == "click intercepted"));
        assert!(!site.events().contains(&MockEvent::Clicked(button, 0)));
    }

    #[tokio::test]
    async fn test_mock_hidden_element_not_clickable() {
        let site = MockSite::new();
        let link = Locator::css("a.file_download_btn");
        site.add_page("https://a/", MockPage::new().with(link.clone(), MockElement::hidden()));
        let mut ctx = site.context();
        ctx.navigate("https://a/", 1000).await.unwrap();

        let err = ctx.click(&link, 0).await.unwrap_err();
        assert!(!err.is_benign());
        assert!(site.downloads().is_empty());
    }
}
