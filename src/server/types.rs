//! Request and response types for the HTTP surface
//!
//! Every response carries a `success` flag; failures additionally carry a
//! human-readable `message` and nothing else. The serving layer never leaks
//! stack traces or internal error chains to the caller.

use crate::error::Error;
use crate::extract::CourseRecord;
use crate::extract::StudentProfile;
use crate::report::AttendanceAssessment;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Body of `POST /fetch_grades`.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchGradesRequest {
    /// Portal username
    #[serde(default)]
    pub username: Option<String>,
    /// Portal password
    #[serde(default)]
    pub password: Option<String>,
}

/// Body of `POST /attendance`. Password is optional when a session for the
/// username is already cached.
#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceRequest {
    /// Portal username
    #[serde(default)]
    pub username: Option<String>,
    /// Portal password, only needed for a first login
    #[serde(default)]
    pub password: Option<String>,
}

/// Successful `POST /fetch_grades` payload.
#[derive(Debug, Clone, Serialize)]
pub struct GradesResponse {
    /// Always true on this shape
    pub success: bool,
    /// Profile block from the portal
    pub student_data: StudentProfile,
    /// Retained course records
    pub courses: Vec<CourseRecord>,
    /// CGPA rounded to two decimals
    pub cgpa: f64,
    /// Wall-clock seconds spent serving the request
    pub execution_time: f64,
}

/// Successful `POST /attendance` payload.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceResponse {
    /// Always true on this shape
    pub success: bool,
    /// Per-course assessments
    pub attendance: Vec<AttendanceAssessment>,
}

/// Liveness probe payload with basic runtime counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "healthy" if the process responds
    pub status: String,
    /// Seconds since the server started
    pub uptime_seconds: u64,
    /// Grades + attendance requests accepted so far
    pub requests_served: u64,
}

/// The `{success:false, message}` failure envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureBody {
    /// Always false on this shape
    pub success: bool,
    /// Human-readable reason
    pub message: String,
}

/// Handler-boundary failure: renders as a 200 with the failure envelope.
///
/// The original contract reports all outcomes in-band through the `success`
/// flag, so transport status stays 200 for portal-side problems.
#[derive(Debug)]
pub struct ApiFailure {
    message: String,
}

impl ApiFailure {
    /// Failure with an explicit user-facing message.
    pub fn message<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<Error> for ApiFailure {
    fn from(err: Error) -> Self {
        // Full detail server-side, stable wording to the caller.
        warn!("Request failed: {}", err);
        Self {
            message: err.user_message(),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        Json(FailureBody {
            success: false,
            message: self.message,
        })
        .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_body_shape() {
        let body = FailureBody {
            success: false,
            message: "Missing credentials".to_string(),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"success":false,"message":"Missing credentials"}"#);
    }

    #[test]
    fn test_request_tolerates_missing_fields() {
        let req: FetchGradesRequest = serde_json::from_str("{}").unwrap();
        assert!(req.username.is_none());
        assert!(req.password.is_none());
    }

    #[test]
    fn test_api_failure_from_error_uses_user_message() {
        let failure = ApiFailure::from(Error::MissingCredentials);
        assert_eq!(failure.message, "Missing credentials");
    }

    #[test]
    fn test_grades_response_shape() {
        let response = GradesResponse {
            success: true,
            student_data: StudentProfile {
                name: "A".to_string(),
                regno: "1".to_string(),
                program: "B.E.".to_string(),
                img_url: "x".to_string(),
            },
            courses: vec![],
            cgpa: 0.0,
            execution_time: 1.25,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["student_data"]["imgUrl"], "x");
        assert_eq!(value["cgpa"], 0.0);
    }
}
