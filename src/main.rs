//! arms-web server binary
//!
//! Serves the landing page and the grades/attendance fetch endpoints.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use arms_web::auth::Authenticator;
use arms_web::browser::BrowserConfig;
use arms_web::config::PortalConfig;
use arms_web::server::{router, AppState};

/// ARMS portal record fetcher
#[derive(Parser, Debug)]
#[command(name = "arms-web")]
#[command(version)]
#[command(about = "Fetches grades, CGPA and attendance margins from the ARMS student portal")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Portal root URL
    #[arg(long)]
    portal_url: Option<String>,

    /// Path to Chrome/Chromium executable
    #[arg(long)]
    chrome_path: Option<String>,

    /// Run the browser in headless mode
    #[arg(long, default_value = "true")]
    headless: bool,

    /// Disable the Chrome sandbox (needed in most containers)
    #[arg(long)]
    no_sandbox: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .init();

    let portal = match &args.portal_url {
        Some(url) => PortalConfig::with_base_url(url).context("invalid --portal-url")?,
        None => PortalConfig::default(),
    };

    let mut browser = BrowserConfig::builder()
        .headless(args.headless)
        .sandbox(!args.no_sandbox);
    if let Some(path) = &args.chrome_path {
        browser = browser.chrome_path(path);
    }

    let authenticator = Authenticator::new(portal.clone(), browser.build());
    let state = Arc::new(AppState::new(portal, authenticator));

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("arms-web listening on {}", addr);

    axum::serve(listener, router(state))
        .await
        .context("server error")?;

    Ok(())
}
