//! Student profile page extraction

use crate::browser::BrowserSession;
use crate::config::PortalConfig;
use crate::error::Result;
use serde::{Deserialize, Serialize};

use super::page::{PageExtractor, PageTarget, ReadyWhen};

/// Element id whose text signals the profile has hydrated
const NAME_FIELD: &str = "dvname";

/// Student identity block from the profile page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudentProfile {
    /// Student full name
    pub name: String,
    /// Registration number
    pub regno: String,
    /// Enrolled program
    pub program: String,
    /// Profile photo URL
    #[serde(rename = "imgUrl")]
    pub img_url: String,
}

/// Fetches the profile page.
pub struct ProfileExtractor;

impl ProfileExtractor {
    /// Extraction recipe for the profile page.
    ///
    /// The name field renders empty until the portal's data call completes,
    /// so readiness is non-empty text, not mere element presence.
    pub fn target(config: &PortalConfig) -> PageTarget {
        PageTarget {
            page_name: "profile",
            url: config.profile_url(),
            ready: ReadyWhen::TextNonEmpty(NAME_FIELD),
            settle: None,
            script: r#"
                (() => ({
                    name: document.getElementById('dvname').textContent.trim(),
                    regno: document.getElementById('dvregno').textContent.trim(),
                    program: document.getElementById('dvprogram').textContent.trim(),
                    imgUrl: document.getElementById('imgprofile').src
                }))()
            "#
            .to_string(),
        }
    }

    /// Extract the student profile from a live session.
    pub async fn extract(
        extractor: &PageExtractor,
        session: &BrowserSession,
        config: &PortalConfig,
    ) -> Result<StudentProfile> {
        extractor.extract(session, &Self::target(config)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_target() {
        let target = ProfileExtractor::target(&PortalConfig::default());
        assert_eq!(target.page_name, "profile");
        assert!(target.url.ends_with("DataProfile.aspx"));
        assert!(matches!(target.ready, ReadyWhen::TextNonEmpty("dvname")));
        assert!(target.settle.is_none());
    }

    #[test]
    fn test_profile_deserializes_script_shape() {
        let profile: StudentProfile = serde_json::from_value(serde_json::json!({
            "name": "A. Student",
            "regno": "212221230001",
            "program": "B.E. CSE",
            "imgUrl": "https://portal.example/photo.jpg"
        }))
        .unwrap();
        assert_eq!(profile.name, "A. Student");
        assert_eq!(profile.img_url, "https://portal.example/photo.jpg");
    }
}
