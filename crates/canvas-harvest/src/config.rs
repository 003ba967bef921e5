//! Configuration loading and resolution.
//!
//! Everything comes from the process environment, after an optional `.env`
//! file has been merged in. Parsing goes through a key lookup function so the
//! same rules can be exercised without touching the real environment.

use crate::error::{HarvestError, Result};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_BASE_URL: &str = "CANVAS_BASE_URL";
pub const ENV_EMAIL: &str = "CANVAS_EMAIL";
pub const ENV_PASSWORD: &str = "CANVAS_PASSWORD";
pub const ENV_DOWNLOAD_DIR: &str = "CANVAS_DOWNLOAD_DIR";
pub const ENV_WAIT_MS: &str = "CANVAS_WAIT_MS";
pub const ENV_POLL_MS: &str = "CANVAS_POLL_MS";
pub const ENV_CLICK_PAUSE_MS: &str = "CANVAS_CLICK_PAUSE_MS";
pub const ENV_NAV_TIMEOUT_MS: &str = "CANVAS_NAV_TIMEOUT_MS";
pub const ENV_MAX_PAGES: &str = "CANVAS_MAX_PAGES";
pub const ENV_HEADLESS: &str = "CANVAS_HEADLESS";
pub const ENV_CHROMIUM_PATH: &str = "CANVAS_CHROMIUM_PATH";

/// Unprefixed names accepted as fallbacks for the credentials.
const LEGACY_EMAIL: &str = "EMAIL";
const LEGACY_PASSWORD: &str = "PASSWORD";

const DEFAULT_WAIT_MS: u64 = 1500;
const DEFAULT_POLL_MS: u64 = 500;
const DEFAULT_CLICK_PAUSE_MS: u64 = 500;
const DEFAULT_NAV_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_MAX_PAGES: usize = 1000;

/// Runtime settings for one harvest.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Portal entry page. Required for anything that opens the portal.
    pub base_url: Option<String>,
    /// Where the browser saves downloads.
    pub download_dir: PathBuf,
    /// Upper bound of every element wait.
    pub wait_timeout: Duration,
    /// Delay between polls inside a wait.
    pub poll_interval: Duration,
    /// Pause after each file download click.
    pub click_pause: Duration,
    /// Page navigation timeout in milliseconds.
    pub nav_timeout_ms: u64,
    /// Safety cap on module pages walked per course.
    pub max_pages: usize,
    /// Launch the browser without a window.
    pub headless: bool,
    /// Explicit browser binary, bypassing discovery.
    pub chromium_path: Option<PathBuf>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            download_dir: default_download_dir(),
            wait_timeout: Duration::from_millis(DEFAULT_WAIT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_MS),
            click_pause: Duration::from_millis(DEFAULT_CLICK_PAUSE_MS),
            nav_timeout_ms: DEFAULT_NAV_TIMEOUT_MS,
            max_pages: DEFAULT_MAX_PAGES,
            headless: false,
            chromium_path: None,
        }
    }
}

impl HarvestConfig {
    /// Load `.env` (if any) and read the configuration from the environment.
    pub fn from_env() -> Result<Self> {
        load_dotenv();
        Self::from_lookup(env_lookup)
    }

    /// Read the configuration through `lookup`, which maps a variable name to
    /// its value. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            base_url: get(ENV_BASE_URL).map(|u| u.trim().trim_end_matches('/').to_string()),
            download_dir: get(ENV_DOWNLOAD_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.download_dir),
            wait_timeout: parse_millis(ENV_WAIT_MS, get(ENV_WAIT_MS))?
                .unwrap_or(defaults.wait_timeout),
            poll_interval: parse_millis(ENV_POLL_MS, get(ENV_POLL_MS))?
                .unwrap_or(defaults.poll_interval),
            click_pause: parse_millis(ENV_CLICK_PAUSE_MS, get(ENV_CLICK_PAUSE_MS))?
                .unwrap_or(defaults.click_pause),
            nav_timeout_ms: parse_number(ENV_NAV_TIMEOUT_MS, get(ENV_NAV_TIMEOUT_MS))?
                .unwrap_or(defaults.nav_timeout_ms),
            max_pages: parse_number(ENV_MAX_PAGES, get(ENV_MAX_PAGES))?
                .unwrap_or(defaults.max_pages),
            headless: parse_bool(ENV_HEADLESS, get(ENV_HEADLESS))?.unwrap_or(defaults.headless),
            chromium_path: get(ENV_CHROMIUM_PATH).map(PathBuf::from),
        })
    }

    /// The portal entry page, or a configuration error naming the variable.
    pub fn base_url(&self) -> Result<&str> {
        self.base_url
            .as_deref()
            .ok_or_else(|| HarvestError::Config(format!("{ENV_BASE_URL} is not set")))
    }
}

/// Sign-in credentials.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Read credentials from the environment (after `.env`).
    pub fn from_env() -> Result<Self> {
        load_dotenv();
        Self::from_lookup(env_lookup)
    }

    /// Read credentials through `lookup`. The prefixed names win over the
    /// bare `EMAIL`/`PASSWORD` ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |primary: &str, fallback: &str| {
            lookup(primary)
                .filter(|v| !v.is_empty())
                .or_else(|| lookup(fallback).filter(|v| !v.is_empty()))
        };

        let email = get(ENV_EMAIL, LEGACY_EMAIL).ok_or(HarvestError::MissingCredential(ENV_EMAIL))?;
        let password =
            get(ENV_PASSWORD, LEGACY_PASSWORD).ok_or(HarvestError::MissingCredential(ENV_PASSWORD))?;

        Ok(Self { email, password })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Merge a `.env` file from the working directory (or a parent) into the
/// process environment. Variables already set are left alone.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!("loaded {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("ignoring unreadable .env: {e}"),
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn default_download_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join("Documents"))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: Option<String>) -> Result<Option<T>> {
    raw.map(|v| {
        v.trim()
            .parse::<T>()
            .map_err(|_| HarvestError::Config(format!("{key} must be a non-negative integer, got {v:?}")))
    })
    .transpose()
}

fn parse_millis(key: &str, raw: Option<String>) -> Result<Option<Duration>> {
    Ok(parse_number::<u64>(key, raw)?.map(Duration::from_millis))
}

fn parse_bool(key: &str, raw: Option<String>) -> Result<Option<bool>> {
    raw.map(|v| match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(HarvestError::Config(format!("{key} must be a boolean, got {v:?}"))),
    })
    .transpose()
}
