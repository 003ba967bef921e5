//! Chromium-based renderer using chromiumoxide.

use super::{ElementState, NavigationResult, PageContext, Renderer};
use crate::config::{HarvestConfig, ENV_CHROMIUM_PATH};
use crate::error::{HarvestError, Result};
use crate::locator::Locator;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

const WINDOW_WIDTH: u32 = 1920;
const WINDOW_HEIGHT: u32 = 1080;

/// How often `settle` re-reads the tab's URL.
const SETTLE_POLL: Duration = Duration::from_millis(100);
/// Upper bound for the page `history.back()` returns to.
const BACK_TIMEOUT_MS: u64 = 30_000;

/// Runs inside the page with the element bound to `this`. Returns a JSON
/// string so the result travels as a primitive.
const ELEMENT_STATE_FN: &str = r#"function() {
    const rect = this.getBoundingClientRect();
    const style = window.getComputedStyle(this);
    const visible = rect.width > 0 && rect.height > 0
        && style.visibility !== 'hidden' && style.display !== 'none';
    return JSON.stringify({ visible: visible, enabled: !this.disabled });
}"#;

/// Find the Chromium binary path.
pub fn find_chromium(explicit: Option<&PathBuf>) -> Option<PathBuf> {
    // 1. Configured path (CANVAS_CHROMIUM_PATH)
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.clone());
        }
        tracing::warn!("{ENV_CHROMIUM_PATH} points at {}, which does not exist", path.display());
    }

    // 2. System PATH
    for name in ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 3. Common macOS locations
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Chromium-based renderer.
pub struct ChromiumRenderer {
    browser: tokio::sync::Mutex<Browser>,
    handler: JoinHandle<()>,
}

impl ChromiumRenderer {
    /// Launch Chromium configured to save downloads into `config.download_dir`
    /// without prompting.
    pub async fn launch(config: &HarvestConfig) -> Result<Self> {
        let chrome_path = find_chromium(config.chromium_path.as_ref()).ok_or_else(|| {
            HarvestError::Browser(format!(
                "Chromium not found. Install Google Chrome or set {ENV_CHROMIUM_PATH}."
            ))
        })?;

        std::fs::create_dir_all(&config.download_dir)?;
        let download_dir = config
            .download_dir
            .canonicalize()
            .unwrap_or_else(|_| config.download_dir.clone());

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(WINDOW_WIDTH, WINDOW_HEIGHT)
            .arg("--disable-notifications")
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-software-rasterizer");
        if !config.headless {
            builder = builder.with_head();
        }
        let browser_config = builder
            .build()
            .map_err(|e| HarvestError::Browser(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| HarvestError::Browser(format!("failed to launch Chromium: {e}")))?;

        // Spawn the handler task
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("browser handler: {e}");
                }
            }
        });

        let behavior = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::Allow)
            .download_path(download_dir.display().to_string())
            .build()
            .map_err(HarvestError::Browser)?;
        browser
            .execute(behavior)
            .await
            .map_err(|e| HarvestError::Browser(format!("failed to set download behavior: {e}")))?;

        tracing::info!(dir = %download_dir.display(), headless = config.headless, "Chromium launched");

        Ok(Self {
            browser: tokio::sync::Mutex::new(browser),
            handler,
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn PageContext>> {
        let page = self
            .browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .map_err(|e| HarvestError::Browser(format!("failed to create new page: {e}")))?;

        Ok(Box::new(ChromiumContext { page }))
    }

    async fn shutdown(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            tracing::warn!("failed to close browser: {e}");
        }
        if let Err(e) = browser.wait().await {
            tracing::debug!("browser process did not exit cleanly: {e}");
        }
        self.handler.abort();
        Ok(())
    }
}

/// A single Chromium page context.
pub struct ChromiumContext {
    page: Page,
}

impl ChromiumContext {
    async fn find_all(&self, locator: &Locator) -> Result<Vec<Element>> {
        let found = match locator.to_css() {
            Some(css) => self.page.find_elements(css).await,
            None => {
                let xpath = locator.to_xpath().unwrap_or_default();
                self.page.find_xpaths(xpath).await
            }
        };
        matches_or_empty(found, locator)
    }

    async fn nth(&self, locator: &Locator, index: usize) -> Result<Element> {
        self.find_all(locator)
            .await?
            .into_iter()
            .nth(index)
            .ok_or_else(|| HarvestError::not_found(locator))
    }
}

/// Chromium answers an XPath search without hits with a protocol error, and
/// a vanished node with `NotFound`. Both mean "no match". Any other failure
/// means the tab or the connection is gone.
fn matches_or_empty<T>(
    found: std::result::Result<Vec<T>, CdpError>,
    locator: &Locator,
) -> Result<Vec<T>> {
    match found {
        Ok(elements) => Ok(elements),
        Err(CdpError::Chrome(_) | CdpError::NotFound) => Ok(Vec::new()),
        Err(e) => Err(HarvestError::Browser(format!(
            "looking up {locator} failed: {e}"
        ))),
    }
}

async fn element_state(element: &Element) -> ElementState {
    let raw = match element.call_js_fn(ELEMENT_STATE_FN, false).await {
        Ok(returns) => returns.result.value,
        // Detached between lookup and probe.
        Err(_) => None,
    };
    raw.as_ref()
        .and_then(|v| v.as_str())
        .and_then(|s| serde_json::from_str::<ElementState>(s).ok())
        .unwrap_or(ElementState {
            visible: false,
            enabled: false,
        })
}

#[async_trait]
impl PageContext for ChromiumContext {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        let start = Instant::now();

        let result =
            tokio::time::timeout(Duration::from_millis(timeout_ms), self.page.goto(url)).await;

        let load_time_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(_)) => {
                let final_url = self
                    .page
                    .url()
                    .await
                    .unwrap_or_default()
                    .unwrap_or_else(|| url.to_string());

                Ok(NavigationResult {
                    final_url,
                    load_time_ms,
                })
            }
            Ok(Err(e)) => Err(HarvestError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(HarvestError::Navigation {
                url: url.to_string(),
                reason: format!("timed out after {timeout_ms}ms"),
            }),
        }
    }

    async fn go_back(&mut self) -> Result<()> {
        let from = self.current_url().await?;
        self.page
            .evaluate("window.history.back()")
            .await
            .map_err(|e| HarvestError::Browser(format!("history.back failed: {e}")))?;
        if !self.settle(&from, BACK_TIMEOUT_MS).await? {
            tracing::debug!(url = %from, "history.back did not leave the page");
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| HarvestError::Browser(format!("failed to get URL: {e}")))?
            .unwrap_or_default();
        Ok(url)
    }

    async fn probe(&self, locator: &Locator) -> Result<Vec<ElementState>> {
        let elements = self.find_all(locator).await?;
        let mut states = Vec::with_capacity(elements.len());
        for element in &elements {
            states.push(element_state(element).await);
        }
        Ok(states)
    }

    async fn click(&mut self, locator: &Locator, index: usize) -> Result<()> {
        let element = self.nth(locator, index).await?;
        element
            .click()
            .await
            .map_err(|e| HarvestError::Browser(format!("click on {locator} failed: {e}")))?;
        Ok(())
    }

    async fn settle(&mut self, from_url: &str, timeout_ms: u64) -> Result<bool> {
        // The old document counts as loaded until the new one commits, so
        // `wait_for_navigation` alone would return at once. Wait for the main
        // frame's URL to move first.
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if self.current_url().await? != from_url {
                break;
            }
            if Instant::now() >= deadline {
                tracing::debug!(url = %from_url, "no navigation after {timeout_ms}ms");
                return Ok(false);
            }
            tokio::time::sleep(SETTLE_POLL).await;
        }

        let left = deadline.saturating_duration_since(Instant::now());
        match tokio::time::timeout(left, self.page.wait_for_navigation()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::debug!("waiting for page load: {e}"),
            Err(_) => tracing::debug!("page still loading after {timeout_ms}ms"),
        }
        Ok(true)
    }

    async fn type_text(&mut self, locator: &Locator, index: usize, text: &str) -> Result<()> {
        let element = self.nth(locator, index).await?;
        element
            .click()
            .await
            .map_err(|e| HarvestError::Browser(format!("focus on {locator} failed: {e}")))?;
        element
            .type_str(text)
            .await
            .map_err(|e| HarvestError::Browser(format!("typing into {locator} failed: {e}")))?;
        Ok(())
    }

    async fn attribute(
        &self,
        locator: &Locator,
        index: usize,
        name: &str,
    ) -> Result<Option<String>> {
        let element = self.nth(locator, index).await?;
        element
            .attribute(name)
            .await
            .map_err(|e| HarvestError::Browser(format!("reading {name} of {locator} failed: {e}")))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        if let Err(e) = self.page.close().await {
            tracing::debug!("failed to close page: {e}");
        }
        Ok(())
    }
}
