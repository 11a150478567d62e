//! Derived academic metrics
//!
//! Pure post-processing over extracted records: CGPA from course grades and
//! threshold safety margins from attendance counts. No browser, no I/O.

mod attendance;
mod grades;

pub use attendance::{AttendanceAssessment, AttendanceCalculator};
pub use grades::{round2, GradeAggregator, GradeSummary};
