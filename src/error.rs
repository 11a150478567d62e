//! Error types for arms-web
//!
//! This module provides the error type hierarchy using `thiserror`
//! for proper error handling across all components.

use thiserror::Error;

/// The main error type for arms-web operations
#[derive(Error, Debug)]
pub enum Error {
    /// Request arrived without the credentials needed to log in
    #[error("Missing credentials")]
    MissingCredentials,

    /// Authentication errors
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Browser lifecycle errors
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    /// Page extraction errors
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// ChromiumOxide errors
    #[error("CDP error: {0}")]
    Cdp(String),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Authentication state machine errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// The login page did not load within the transport deadline
    #[error("Login page did not load: {0}")]
    LoginPageUnavailable(String),

    /// The login form never appeared on the loaded page
    #[error("Login form not found within {0}ms")]
    FormTimeout(u64),

    /// Credentials rejected or the post-login redirect never happened
    #[error("Login failed, please check credentials")]
    LoginFailed,
}

/// Browser lifecycle and control errors
#[derive(Error, Debug)]
pub enum BrowserError {
    /// Failed to launch browser
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Browser configuration error
    #[error("Invalid browser configuration: {0}")]
    ConfigError(String),

    /// Failed to create new page/tab
    #[error("Failed to create page: {0}")]
    PageCreationFailed(String),

    /// Timeout waiting for a browser operation
    #[error("Browser operation timed out after {0}ms")]
    Timeout(u64),
}

/// Page extraction errors
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Readiness predicate never became true within the retry budget
    #[error("Failed to load {page} page. Possibly logged out.")]
    NotReady {
        /// Human-readable page name (profile, grades, attendance)
        page: &'static str,
    },

    /// The extraction script itself failed to run
    #[error("Extraction script failed: {0}")]
    ScriptFailed(String),

    /// The script ran but its result did not deserialize
    #[error("Unexpected extraction result: {0}")]
    BadResult(String),

    /// Navigation to the target page failed
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),
}

/// Result type alias for arms-web operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a generic error from a string
    pub fn generic<S: Into<String>>(msg: S) -> Self {
        Error::Generic(msg.into())
    }

    /// Create a CDP error from a string
    pub fn cdp<S: Into<String>>(msg: S) -> Self {
        Error::Cdp(msg.into())
    }

    /// Message suitable for the `{success:false, message}` API envelope.
    ///
    /// Internal detail stays in the server-side logs; the caller only sees
    /// the stable, human-readable wording.
    pub fn user_message(&self) -> String {
        match self {
            Error::MissingCredentials => "Missing credentials".to_string(),
            Error::Auth(_) => "Login failed, please check credentials".to_string(),
            Error::Extraction(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}

/// Convert chromiumoxide errors
impl From<chromiumoxide::error::CdpError> for Error {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Error::Cdp(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Browser(BrowserError::LaunchFailed("no chrome".to_string()));
        assert!(err.to_string().contains("Failed to launch browser"));
        assert!(err.to_string().contains("no chrome"));
    }

    #[test]
    fn test_auth_error_user_message_is_uniform() {
        // Bad credentials, a missing form and a dead portal all surface the
        // same message to the caller.
        for err in [
            Error::Auth(AuthError::LoginFailed),
            Error::Auth(AuthError::FormTimeout(10_000)),
            Error::Auth(AuthError::LoginPageUnavailable("dns".to_string())),
        ] {
            assert_eq!(err.user_message(), "Login failed, please check credentials");
        }
    }

    #[test]
    fn test_not_ready_mentions_logout() {
        let err = Error::Extraction(ExtractionError::NotReady { page: "profile" });
        assert!(err.user_message().contains("Possibly logged out"));
        assert!(err.user_message().contains("profile"));
    }

    #[test]
    fn test_missing_credentials_message() {
        assert_eq!(
            Error::MissingCredentials.user_message(),
            "Missing credentials"
        );
    }
}
