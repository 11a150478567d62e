//! Browser automation layer
//!
//! One headless Chromium instance per authenticated portal session,
//! driven over CDP via chromiumoxide.

mod controller;

pub use controller::{BrowserConfig, BrowserConfigBuilder, BrowserSession};
