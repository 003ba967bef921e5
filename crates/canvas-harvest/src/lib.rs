// Copyright 2026 canvas-harvest contributors
// SPDX-License-Identifier: Apache-2.0

//! canvas-harvest: sign in to a Canvas course portal and download module
//! files and lecture videos by driving a real browser.
//!
//! The library exposes the workflow ([`portal::PortalSession`]) behind the
//! [`renderer::PageContext`] seam, so it can run against Chromium or against
//! the scripted [`testing::MockSite`].

pub mod cli;
pub mod config;
pub mod error;
pub mod locator;
pub mod portal;
pub mod renderer;
pub mod report;
pub mod testing;
pub mod wait;

pub use config::{Credentials, HarvestConfig};
pub use error::{HarvestError, Result};
pub use locator::Locator;
pub use portal::PortalSession;
pub use report::{CourseReport, HarvestReport, TraversalEnd};
