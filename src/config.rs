//! Portal layout and timing configuration
//!
//! All portal-specific knowledge lives here: the base URL, the paths of the
//! three student pages, the structural element ids the login form and data
//! tables are keyed by, and every deadline the session machinery uses. The
//! rest of the crate only ever asks this struct.

use crate::error::{Error, Result};
use std::time::Duration;
use url::Url;

/// Default portal root
pub const DEFAULT_BASE_URL: &str = "https://arms.sse.saveetha.com/";

/// Attendance threshold the calculators work against, in whole percent
pub const ATTENDANCE_THRESHOLD: u32 = 80;

/// Portal configuration: URLs, element ids and deadlines.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Portal root URL (login page)
    pub base_url: Url,
    /// Path of the student profile page
    pub profile_path: String,
    /// Path of the grades page
    pub grades_path: String,
    /// Path of the attendance report page
    pub attendance_path: String,
    /// Substring of the post-login URL that marks a committed login
    pub login_success_marker: String,
    /// Username input element id on the login form
    pub username_field_id: String,
    /// Password input element id on the login form
    pub password_field_id: String,
    /// Submit button element id on the login form
    pub login_button_id: String,
    /// Transport-level page load deadline
    pub page_load_timeout: Duration,
    /// Deadline for the login form to appear
    pub login_form_timeout: Duration,
    /// Deadline for the post-login redirect
    pub redirect_timeout: Duration,
    /// Per-attempt deadline for a readiness predicate
    pub readiness_timeout: Duration,
    /// Readiness attempts before giving up
    pub readiness_retries: u32,
    /// Pause between readiness attempts
    pub retry_delay: Duration,
    /// Attendance threshold in whole percent
    pub attendance_threshold: u32,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            profile_path: "StudentPortal/DataProfile.aspx".to_string(),
            grades_path: "StudentPortal/MyCourse.aspx".to_string(),
            attendance_path: "StudentPortal/AttendanceReport.aspx".to_string(),
            login_success_marker: "Landing.aspx".to_string(),
            username_field_id: "txtusername".to_string(),
            password_field_id: "txtpassword".to_string(),
            login_button_id: "btnlogin".to_string(),
            page_load_timeout: Duration::from_secs(20),
            login_form_timeout: Duration::from_secs(10),
            redirect_timeout: Duration::from_secs(10),
            readiness_timeout: Duration::from_secs(15),
            readiness_retries: 3,
            retry_delay: Duration::from_secs(2),
            attendance_threshold: ATTENDANCE_THRESHOLD,
        }
    }
}

impl PortalConfig {
    /// Create a config pointing at a different portal root.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::generic(format!("invalid portal base URL: {e}")))?;
        Ok(Self {
            base_url,
            ..Self::default()
        })
    }

    /// Absolute URL of the login page
    pub fn login_url(&self) -> String {
        self.base_url.to_string()
    }

    /// Absolute URL of the profile page
    pub fn profile_url(&self) -> String {
        self.join(&self.profile_path)
    }

    /// Absolute URL of the grades page
    pub fn grades_url(&self) -> String {
        self.join(&self.grades_path)
    }

    /// Absolute URL of the attendance report page
    pub fn attendance_url(&self) -> String {
        self.join(&self.attendance_path)
    }

    fn join(&self, path: &str) -> String {
        self.base_url
            .join(path)
            .map(|u| u.to_string())
            // Url::join only fails on pathological inputs; fall back to
            // plain concatenation rather than erroring a whole request.
            .unwrap_or_else(|_| format!("{}{}", self.base_url, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_urls() {
        let cfg = PortalConfig::default();
        assert_eq!(cfg.login_url(), "https://arms.sse.saveetha.com/");
        assert_eq!(
            cfg.profile_url(),
            "https://arms.sse.saveetha.com/StudentPortal/DataProfile.aspx"
        );
        assert_eq!(
            cfg.grades_url(),
            "https://arms.sse.saveetha.com/StudentPortal/MyCourse.aspx"
        );
        assert_eq!(
            cfg.attendance_url(),
            "https://arms.sse.saveetha.com/StudentPortal/AttendanceReport.aspx"
        );
    }

    #[test]
    fn test_with_base_url() {
        let cfg = PortalConfig::with_base_url("http://127.0.0.1:8099/").unwrap();
        assert_eq!(
            cfg.profile_url(),
            "http://127.0.0.1:8099/StudentPortal/DataProfile.aspx"
        );
    }

    #[test]
    fn test_with_bad_base_url() {
        assert!(PortalConfig::with_base_url("not a url").is_err());
    }

    #[test]
    fn test_default_deadlines() {
        let cfg = PortalConfig::default();
        assert_eq!(cfg.page_load_timeout, Duration::from_secs(20));
        assert_eq!(cfg.login_form_timeout, Duration::from_secs(10));
        assert_eq!(cfg.readiness_retries, 3);
        assert_eq!(cfg.attendance_threshold, 80);
    }
}
