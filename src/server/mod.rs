//! Inbound HTTP surface
//!
//! Thin axum layer over the session store, authenticator and extractors.

mod handlers;
mod types;

pub use handlers::{router, AppState};
pub use types::{
    ApiFailure, AttendanceRequest, AttendanceResponse, FailureBody, FetchGradesRequest,
    GradesResponse, HealthResponse,
};
