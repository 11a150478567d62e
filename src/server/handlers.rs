//! Request handlers for the inbound HTTP surface
//!
//! Three operations: the static landing page, grades+profile fetch, and the
//! attendance report. Handlers own no portal knowledge beyond wiring the
//! session store, authenticator and extractors together; every failure is
//! converted to the `{success:false, message}` envelope at this boundary.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tracing::{info, instrument};

use crate::auth::{Authenticator, Credential};
use crate::browser::BrowserSession;
use crate::config::PortalConfig;
use crate::error::Error;
use crate::extract::{AttendanceExtractor, GradesExtractor, PageExtractor, ProfileExtractor};
use crate::report::{AttendanceCalculator, GradeAggregator};
use crate::session::SessionStore;

use super::types::{
    ApiFailure, AttendanceRequest, AttendanceResponse, FetchGradesRequest, GradesResponse,
    HealthResponse,
};

/// Embedded landing page
const LANDING_PAGE: &str = include_str!("../../static/index.html");

/// Shared application state, owned by the serving layer and passed by
/// reference into every handler.
pub struct AppState {
    /// identity → live authenticated browser session
    pub store: SessionStore<BrowserSession>,
    /// Login state machine
    pub authenticator: Authenticator,
    /// Navigate+wait+extract routine with the portal's retry budget
    pub extractor: PageExtractor,
    /// Portal layout and deadlines
    pub portal: PortalConfig,
    /// Attendance threshold math
    pub calculator: AttendanceCalculator,
    /// Process start, for uptime reporting
    pub start_time: Instant,
    /// Requests served (grades + attendance)
    pub requests_served: AtomicU64,
}

impl AppState {
    /// Wire up state from the portal config and an authenticator.
    pub fn new(portal: PortalConfig, authenticator: Authenticator) -> Self {
        let extractor = PageExtractor::new(&portal);
        let calculator = AttendanceCalculator::new(portal.attendance_threshold);
        Self {
            store: SessionStore::new(),
            authenticator,
            extractor,
            portal,
            calculator,
            start_time: Instant::now(),
            requests_served: AtomicU64::new(0),
        }
    }
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/fetch_grades", post(fetch_grades))
        .route("/attendance", post(attendance))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// `GET /` — static landing page.
async fn home() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

/// `GET /health` — liveness probe with uptime and request counters.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        requests_served: state.requests_served.load(Ordering::Relaxed),
    })
}

/// `POST /fetch_grades` — profile, course list and CGPA for a student.
#[instrument(skip(state, request))]
async fn fetch_grades(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FetchGradesRequest>,
) -> Result<Json<GradesResponse>, ApiFailure> {
    let (username, password) = match (
        non_empty(request.username),
        non_empty(request.password),
    ) {
        (Some(u), Some(p)) => (u, p),
        // No browser session is attempted without both credentials.
        _ => return Err(Error::MissingCredentials.into()),
    };

    state.requests_served.fetch_add(1, Ordering::Relaxed);

    let credential = Credential {
        username: username.clone(),
        password,
    };
    let lease = state
        .store
        .lease(&username, || state.authenticator.login(&credential))
        .await?;

    // Reported time covers extraction only; a first-request login is not
    // billed to it.
    let start = Instant::now();

    let profile =
        ProfileExtractor::extract(&state.extractor, lease.session(), &state.portal).await?;
    let courses =
        GradesExtractor::extract(&state.extractor, lease.session(), &state.portal).await?;
    let summary = GradeAggregator::aggregate(&courses);

    let execution_time = start.elapsed().as_secs_f64();
    info!(
        courses = summary.course_count,
        cgpa = summary.cgpa,
        execution_time,
        "Grades fetched"
    );

    Ok(Json(GradesResponse {
        success: true,
        student_data: profile,
        courses,
        cgpa: summary.cgpa,
        execution_time,
    }))
}

/// `POST /attendance` — per-course attendance assessments.
#[instrument(skip(state, request))]
async fn attendance(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AttendanceRequest>,
) -> Result<Json<AttendanceResponse>, ApiFailure> {
    let Some(username) = non_empty(request.username) else {
        return Err(ApiFailure::message(
            "Username is required to fetch attendance.",
        ));
    };
    let password = non_empty(request.password);

    // Password is only needed when there is no session to reuse. Checked
    // up front so a credential-less request cannot launch a browser.
    if !state.store.contains(&username) && password.is_none() {
        return Err(ApiFailure::message("Missing credentials for login."));
    }

    state.requests_served.fetch_add(1, Ordering::Relaxed);

    let lease = state
        .store
        .lease(&username, || async {
            let password = password.clone().ok_or(Error::MissingCredentials)?;
            let credential = Credential {
                username: username.clone(),
                password,
            };
            state.authenticator.login(&credential).await
        })
        .await?;

    let records =
        AttendanceExtractor::extract(&state.extractor, lease.session(), &state.portal).await?;
    let assessments: Vec<_> = records
        .iter()
        .filter_map(|record| state.calculator.assess(record))
        .collect();

    info!(courses = assessments.len(), "Attendance fetched");

    Ok(Json(AttendanceResponse {
        success: true,
        attendance: assessments,
    }))
}

/// Treat absent and blank strings the same way.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("".to_string())), None);
        assert_eq!(non_empty(Some("   ".to_string())), None);
        assert_eq!(non_empty(Some("user".to_string())), Some("user".to_string()));
    }

    #[test]
    fn test_landing_page_embedded() {
        assert!(LANDING_PAGE.contains("<html"));
    }
}
