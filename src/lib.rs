//! arms-web - Academic record fetcher for the ARMS student portal
//!
//! The portal exposes no API, so this crate drives a headless Chromium
//! session (CDP via chromiumoxide) through the portal's login form and
//! student pages, extracts the profile, grade and attendance tables, and
//! derives summary metrics: CGPA and attendance safety margins against the
//! 80% bar.
//!
//! # Architecture
//!
//! ```text
//! HTTP request ──▶ axum handlers ──▶ SessionStore (lease per identity)
//!                                        │
//!                              Authenticator (first request only)
//!                                        │
//!                                  BrowserSession (CDP)
//!                                        │
//!                                  PageExtractor
//!                              (navigate → wait → retry → script)
//!                                        │
//!                        GradeAggregator / AttendanceCalculator
//! ```
//!
//! One browser per authenticated identity; a request holds an exclusive
//! lease on its identity's session for the duration of extraction, so
//! concurrent requests for the same student queue instead of interleaving
//! navigations on one browser.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod auth;
pub mod browser;
pub mod config;
pub mod error;
pub mod extract;
pub mod report;
pub mod server;
pub mod session;

// Re-exports for convenience
pub use auth::{Authenticator, Credential};
pub use browser::{BrowserConfig, BrowserSession};
pub use config::PortalConfig;
pub use error::{Error, Result};
pub use extract::PageExtractor;
pub use report::{AttendanceCalculator, GradeAggregator};
pub use session::SessionStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
