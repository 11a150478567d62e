//! Generic page extraction routine
//!
//! Every portal page is fetched the same way: navigate, poll a readiness
//! predicate with a bounded retry budget, optionally let the page settle,
//! then run an extraction script and hand its result back verbatim. The
//! per-page extractors only supply the (url, predicate, script) triple.

use crate::auth::js_string;
use crate::browser::BrowserSession;
use crate::config::PortalConfig;
use crate::error::{ExtractionError, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Readiness predicate over live page state.
///
/// Extraction only proceeds once the predicate holds; content on the portal
/// regularly hydrates after the page-load event, so "page loaded" alone is
/// not enough.
#[derive(Debug, Clone)]
pub enum ReadyWhen {
    /// The element exists in the DOM
    ElementPresent(&'static str),
    /// The element exists and its text content is non-empty
    TextNonEmpty(&'static str),
}

impl ReadyWhen {
    /// Boolean JS expression implementing the predicate.
    pub fn script(&self) -> String {
        match self {
            ReadyWhen::ElementPresent(id) => {
                format!("!!document.getElementById({})", js_string(id))
            }
            ReadyWhen::TextNonEmpty(id) => format!(
                "(() => {{ const el = document.getElementById({}); \
                 return !!el && el.textContent.trim() !== ''; }})()",
                js_string(id)
            ),
        }
    }
}

/// One page's extraction recipe.
#[derive(Debug, Clone)]
pub struct PageTarget {
    /// Short page name for logs and error messages
    pub page_name: &'static str,
    /// Absolute URL to navigate to
    pub url: String,
    /// Predicate that must hold before the script runs
    pub ready: ReadyWhen,
    /// Extra delay after readiness, for pages that keep mutating the table
    /// briefly after it appears
    pub settle: Option<Duration>,
    /// Script whose return value is the extracted data
    pub script: String,
}

/// Runs [`PageTarget`] recipes against a live session.
pub struct PageExtractor {
    timeout: Duration,
    retries: u32,
    retry_delay: Duration,
    page_load_timeout: Duration,
}

impl PageExtractor {
    /// Build an extractor with the portal's retry budget and deadlines.
    pub fn new(config: &PortalConfig) -> Self {
        Self {
            timeout: config.readiness_timeout,
            retries: config.readiness_retries,
            retry_delay: config.retry_delay,
            page_load_timeout: config.page_load_timeout,
        }
    }

    /// Fetch a page and extract a structured value from it.
    ///
    /// A predicate that never becomes true is a recoverable condition
    /// ([`ExtractionError::NotReady`]), not a crash: the usual cause is a
    /// stale session the portal has logged out server-side.
    #[instrument(skip(self, session, target), fields(page = target.page_name))]
    pub async fn extract<T: DeserializeOwned>(
        &self,
        session: &BrowserSession,
        target: &PageTarget,
    ) -> Result<T> {
        session
            .goto(&target.url, self.page_load_timeout)
            .await
            .map_err(|e| ExtractionError::NavigationFailed(e.to_string()))?;

        let ready_script = target.ready.script();
        let mut ready = false;
        for attempt in 1..=self.retries {
            match session.wait_until(&ready_script, self.timeout).await {
                Ok(()) => {
                    debug!(attempt, "Page ready");
                    ready = true;
                    break;
                }
                Err(e) => {
                    warn!(attempt, "Readiness attempt failed: {}", e);
                    if attempt < self.retries {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }
        if !ready {
            let location = session.current_url().await.unwrap_or_default();
            warn!("Giving up on {} page, current URL: {}", target.page_name, location);
            return Err(ExtractionError::NotReady {
                page: target.page_name,
            }
            .into());
        }

        if let Some(settle) = target.settle {
            tokio::time::sleep(settle).await;
        }

        let value: serde_json::Value = session
            .evaluate(&target.script)
            .await
            .map_err(|e| ExtractionError::ScriptFailed(e.to_string()))?;

        serde_json::from_value(value)
            .map_err(|e| ExtractionError::BadResult(e.to_string()).into())
    }
}
