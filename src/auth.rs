//! Portal login state machine
//!
//! Drives a fresh browser through the portal's login form:
//! navigate to the root, wait for the form, inject the credentials, submit,
//! then wait for the post-login redirect. Strictly forward-only; any failure
//! tears the half-initialized browser down and reports [`AuthError`], so a
//! session is only ever handed back once the portal confirmed the login.

use crate::browser::{BrowserConfig, BrowserSession};
use crate::config::PortalConfig;
use crate::error::{AuthError, Result};
use tracing::{debug, info, instrument, warn};

/// Transient login credentials. Never stored, never logged.
#[derive(Clone)]
pub struct Credential {
    /// Portal username, also the session-store key
    pub username: String,
    /// Portal password
    pub password: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Runs the login state machine against a fresh browser.
pub struct Authenticator {
    portal: PortalConfig,
    browser: BrowserConfig,
}

impl Authenticator {
    /// Create an authenticator for the given portal and browser settings.
    pub fn new(portal: PortalConfig, browser: BrowserConfig) -> Self {
        Self { portal, browser }
    }

    /// Log in and return the live, authenticated session.
    ///
    /// On any failure the partial browser is closed best-effort and the
    /// error propagates; nothing is stored anywhere by this method.
    #[instrument(skip(self, credential), fields(username = %credential.username))]
    pub async fn login(&self, credential: &Credential) -> Result<BrowserSession> {
        let session = BrowserSession::launch(&self.browser).await?;

        match self.drive_login(&session, credential).await {
            Ok(()) => {
                info!("Login committed");
                Ok(session)
            }
            Err(e) => {
                warn!("Login failed: {}", e);
                session.close().await;
                Err(e)
            }
        }
    }

    async fn drive_login(&self, session: &BrowserSession, credential: &Credential) -> Result<()> {
        let portal = &self.portal;

        debug!("Opening login page");
        session
            .goto(&portal.login_url(), portal.page_load_timeout)
            .await
            .map_err(|e| AuthError::LoginPageUnavailable(e.to_string()))?;

        let form_ready = format!(
            "!!document.getElementById({})",
            js_string(&portal.username_field_id)
        );
        session
            .wait_until(&form_ready, portal.login_form_timeout)
            .await
            .map_err(|_| AuthError::FormTimeout(portal.login_form_timeout.as_millis() as u64))?;

        debug!("Submitting credentials");
        // An Err here usually means the click started navigating before the
        // evaluation returned, which is fine; the redirect wait decides.
        // Ok(false) means the form controls were missing, a hard failure.
        if let Ok(false) = session
            .evaluate::<bool>(&submit_script(portal, credential))
            .await
        {
            return Err(AuthError::LoginFailed.into());
        }

        let marker_seen = format!(
            "window.location.href.indexOf({}) !== -1",
            js_string(&portal.login_success_marker)
        );
        if session
            .wait_until(&marker_seen, portal.redirect_timeout)
            .await
            .is_err()
        {
            let location = session.current_url().await.unwrap_or_default();
            warn!("No post-login redirect, still at: {}", location);
            return Err(AuthError::LoginFailed.into());
        }

        Ok(())
    }
}

/// Script that fills the login form and triggers submission.
///
/// Returns false (instead of throwing) when the expected controls are
/// missing, which the caller reads as a failed login.
fn submit_script(portal: &PortalConfig, credential: &Credential) -> String {
    format!(
        r#"
        (() => {{
            const user = document.getElementById({user_id});
            const pass = document.getElementById({pass_id});
            const button = document.getElementById({button_id});
            if (!user || !pass || !button) return false;
            user.value = {username};
            pass.value = {password};
            button.click();
            return true;
        }})()
        "#,
        user_id = js_string(&portal.username_field_id),
        pass_id = js_string(&portal.password_field_id),
        button_id = js_string(&portal.login_button_id),
        username = js_string(&credential.username),
        password = js_string(&credential.password),
    )
}

/// Render a Rust string as a JS string literal, with full escaping.
pub(crate) fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_redacts_password() {
        let cred = Credential {
            username: "student1".to_string(),
            password: "hunter2".to_string(),
        };
        let rendered = format!("{:?}", cred);
        assert!(rendered.contains("student1"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_submit_script_escapes_credentials() {
        let portal = PortalConfig::default();
        let cred = Credential {
            username: "user\"; alert(1); //".to_string(),
            password: "p'w\\d".to_string(),
        };
        let script = submit_script(&portal, &cred);
        // The payload must land inside a JSON-escaped literal, not as code.
        assert!(script.contains(r#""user\"; alert(1); //""#));
        assert!(script.contains(r#""p'w\\d""#));
    }

    #[test]
    fn test_submit_script_targets_configured_ids() {
        let portal = PortalConfig::default();
        let cred = Credential {
            username: "u".to_string(),
            password: "p".to_string(),
        };
        let script = submit_script(&portal, &cred);
        assert!(script.contains("\"txtusername\""));
        assert!(script.contains("\"txtpassword\""));
        assert!(script.contains("\"btnlogin\""));
    }

    #[test]
    fn test_js_string_plain() {
        assert_eq!(js_string("Landing.aspx"), "\"Landing.aspx\"");
    }
}
