//! Bounded polling for page elements.
//!
//! A [`Waiter`] re-probes the page until a [`Condition`] holds or its timeout
//! runs out, in which case it returns [`HarvestError::WaitTimeout`]. The
//! condition is always checked at least once, so a zero timeout is a single
//! look at the page.

use crate::error::{HarvestError, Result};
use crate::locator::Locator;
use crate::renderer::{ElementState, PageContext};
use std::fmt;
use std::time::{Duration, Instant};

/// What a wait is waiting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// At least one element matches.
    Present(Locator),
    /// A matching element is visible and enabled.
    Clickable(Locator),
    /// At least one matching element is visible.
    AnyVisible(Locator),
}

impl Condition {
    pub fn locator(&self) -> &Locator {
        match self {
            Self::Present(l) | Self::Clickable(l) | Self::AnyVisible(l) => l,
        }
    }

    /// Indices of the matches that satisfy the condition; empty means "not yet".
    fn satisfied_by(&self, states: &[ElementState]) -> Vec<usize> {
        match self {
            Self::Present(_) => {
                if states.is_empty() {
                    Vec::new()
                } else {
                    vec![0]
                }
            }
            Self::Clickable(_) => states
                .iter()
                .position(ElementState::clickable)
                .into_iter()
                .collect(),
            Self::AnyVisible(_) => states
                .iter()
                .enumerate()
                .filter(|(_, s)| s.visible)
                .map(|(i, _)| i)
                .collect(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present(l) => write!(f, "presence of {l}"),
            Self::Clickable(l) => write!(f, "clickable {l}"),
            Self::AnyVisible(l) => write!(f, "visible {l}"),
        }
    }
}

/// Polls a page until a condition holds.
#[derive(Debug, Clone, Copy)]
pub struct Waiter {
    timeout: Duration,
    poll_interval: Duration,
}

impl Waiter {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            // A zero interval would spin.
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    /// Wait for `condition` and return the indices of the matching elements
    /// (never empty on success).
    pub async fn until(&self, ctx: &dyn PageContext, condition: &Condition) -> Result<Vec<usize>> {
        let start = Instant::now();
        loop {
            match ctx.probe(condition.locator()).await {
                Ok(states) => {
                    let hits = condition.satisfied_by(&states);
                    if !hits.is_empty() {
                        return Ok(hits);
                    }
                }
                Err(e) if e.is_benign() => {}
                Err(e) => return Err(e),
            }

            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                return Err(HarvestError::WaitTimeout {
                    condition: condition.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(self.poll_interval.min(self.timeout - elapsed)).await;
        }
    }

    /// Wait for `condition` and return the first matching index.
    pub async fn until_first(&self, ctx: &dyn PageContext, condition: &Condition) -> Result<usize> {
        let hits = self.until(ctx, condition).await?;
        hits.first()
            .copied()
            .ok_or_else(|| HarvestError::not_found(condition.locator()))
    }
}
