//! Error types for the harvest workflow.
//!
//! Only two kinds are expected while walking a portal: an element that is not
//! on the page, and a bounded wait that ran out. Both are benign and are
//! folded into `None` by [`benign`]; every other kind aborts the current step.

use crate::locator::Locator;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, HarvestError>;

/// All errors that can occur while driving the portal.
#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    #[error("element not found: {locator}")]
    ElementNotFound { locator: String },

    #[error("timed out after {timeout_ms}ms waiting for {condition}")]
    WaitTimeout { condition: String, timeout_ms: u64 },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("browser error: {0}")]
    Browser(String),

    #[error("missing credential: set {0}")]
    MissingCredential(&'static str),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarvestError {
    /// Shorthand for an [`HarvestError::ElementNotFound`] on `locator`.
    pub fn not_found(locator: &Locator) -> Self {
        Self::ElementNotFound {
            locator: locator.to_string(),
        }
    }

    /// Whether the error is an expected absence rather than a failure.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            Self::ElementNotFound { .. } | Self::WaitTimeout { .. }
        )
    }
}

/// Fold benign errors into `Ok(None)` and propagate the rest.
pub fn benign<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_benign() => {
            tracing::debug!("tolerated: {e}");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benign_kinds() {
        let missing = HarvestError::not_found(&Locator::id("i0116"));
        assert!(missing.is_benign());
        assert_eq!(missing.to_string(), "element not found: #i0116");

        let timeout = HarvestError::WaitTimeout {
            condition: "clickable link \"Next\"".into(),
            timeout_ms: 1500,
        };
        assert!(timeout.is_benign());

        assert!(!HarvestError::Browser("gone".into()).is_benign());
        assert!(!HarvestError::MissingCredential("CANVAS_EMAIL").is_benign());
    }

    #[test]
    fn test_benign_swallows_only_expected_absence() {
        let found: Result<u32> = Ok(7);
        assert_eq!(benign(found).unwrap(), Some(7));

        let absent: Result<u32> = Err(HarvestError::not_found(&Locator::class("lock_explanation")));
        assert_eq!(benign(absent).unwrap(), None);

        let fatal: Result<u32> = Err(HarvestError::Navigation {
            url: "https://canvas.example.edu".into(),
            reason: "net::ERR_NAME_NOT_RESOLVED".into(),
        });
        assert!(benign(fatal).is_err());
    }
}
