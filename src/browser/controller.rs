//! Browser lifecycle management
//!
//! This module handles browser launch, shutdown, navigation and script
//! evaluation. Each [`BrowserSession`] owns a dedicated Chromium instance
//! with a single page, mirroring the one-driver-per-user model the portal
//! session cache is built on.

use crate::error::{BrowserError, Error, Result};
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Configuration for browser launch
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run in headless mode (default: true)
    pub headless: bool,
    /// Browser window width (default: 1280)
    pub width: u32,
    /// Browser window height (default: 720)
    pub height: u32,
    /// Enable sandbox (default: true; disable inside containers)
    pub sandbox: bool,
    /// Skip loading images (default: true, the portal tables are text)
    pub disable_images: bool,
    /// Path to Chrome/Chromium executable (None = auto-detect)
    pub chrome_path: Option<String>,
    /// Additional Chrome arguments
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            width: 1280,
            height: 720,
            sandbox: true,
            disable_images: true,
            chrome_path: None,
            extra_args: Vec::new(),
        }
    }
}

impl BrowserConfig {
    /// Create a new config builder
    pub fn builder() -> BrowserConfigBuilder {
        BrowserConfigBuilder::default()
    }
}

/// Builder for BrowserConfig
#[derive(Default)]
pub struct BrowserConfigBuilder {
    config: BrowserConfig,
}

impl BrowserConfigBuilder {
    /// Set headless mode
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    /// Set viewport dimensions
    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    /// Enable/disable sandbox
    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.config.sandbox = sandbox;
        self
    }

    /// Enable/disable image loading
    pub fn disable_images(mut self, disable: bool) -> Self {
        self.config.disable_images = disable;
        self
    }

    /// Set Chrome path
    pub fn chrome_path<S: Into<String>>(mut self, path: S) -> Self {
        self.config.chrome_path = Some(path.into());
        self
    }

    /// Add extra Chrome argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.config.extra_args.push(arg.into());
        self
    }

    /// Build the config
    pub fn build(self) -> BrowserConfig {
        self.config
    }
}

/// One live automated-browser instance with a single page.
///
/// Created by the authenticator, stored in the session store after a
/// committed login, reused by every extraction for the same identity.
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
}

impl BrowserSession {
    /// Launch a fresh browser and open its single page.
    #[instrument(skip(config))]
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        info!(headless = config.headless, "Launching browser");

        let mut builder = CdpBrowserConfig::builder();

        builder = builder.viewport(chromiumoxide::handler::viewport::Viewport {
            width: config.width,
            height: config.height,
            device_scale_factor: None,
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        });

        if !config.headless {
            builder = builder.with_head();
        }

        if !config.sandbox {
            builder = builder.arg("--no-sandbox");
        }

        if let Some(ref path) = config.chrome_path {
            builder = builder.chrome_executable(path);
        }

        // The portal is a plain ASP.NET form site; strip everything that
        // slows page loads down without affecting the DOM we read.
        builder = builder
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-notifications")
            .arg("--disable-popup-blocking");
        if config.disable_images {
            builder = builder.arg("--blink-settings=imagesEnabled=false");
        }

        for arg in &config.extra_args {
            builder = builder.arg(arg);
        }

        let cdp_config = builder
            .build()
            .map_err(|e| BrowserError::ConfigError(e.to_string()))?;

        let (browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    warn!("Browser handler event error");
                    break;
                }
            }
            debug!("Browser handler finished");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::PageCreationFailed(e.to_string()))?;

        info!("Browser launched");

        Ok(Self {
            browser,
            handler: handler_task,
            page,
        })
    }

    /// Navigate the page to a URL, bounded by `timeout`.
    #[instrument(skip(self))]
    pub async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
        debug!("Navigating to {}", url);
        tokio::time::timeout(timeout, self.page.goto(url))
            .await
            .map_err(|_| BrowserError::Timeout(timeout.as_millis() as u64))??;
        Ok(())
    }

    /// Evaluate a script against the live page and deserialize its result.
    pub async fn evaluate<T: DeserializeOwned>(&self, script: &str) -> Result<T> {
        self.page
            .evaluate(script)
            .await?
            .into_value::<T>()
            .map_err(|e| Error::cdp(format!("evaluation result: {e}")))
    }

    /// Poll a boolean script until it evaluates true, bounded by `timeout`.
    ///
    /// The script is re-evaluated on a fixed cadence rather than installed
    /// as a page observer, so it also works across the portal's full-page
    /// postback reloads.
    pub async fn wait_until(&self, script: &str, timeout: Duration) -> Result<()> {
        const POLL_INTERVAL: Duration = Duration::from_millis(250);

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            // Evaluation errors count as "not ready yet": the page may be
            // mid-navigation with no execution context to run in.
            if let Ok(true) = self.evaluate::<bool>(script).await {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(BrowserError::Timeout(timeout.as_millis() as u64).into());
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Current location of the page, as the browser reports it.
    pub async fn current_url(&self) -> Result<String> {
        let url = self.page.url().await?;
        Ok(url.unwrap_or_default())
    }

    /// Close the browser, swallowing teardown errors.
    ///
    /// Used both for committed sessions being replaced and for
    /// partially-initialized sessions after a failed login, where nothing
    /// useful can be done about a close failure.
    #[instrument(skip(self))]
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Browser close failed: {}", e);
        }
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handler).await;
        debug!("Browser session closed");
    }
}

impl std::fmt::Debug for BrowserSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserSession").finish_non_exhaustive()
    }
}
