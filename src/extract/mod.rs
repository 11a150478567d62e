//! Structured extraction from portal pages
//!
//! A generic navigate → wait → retry → script routine ([`page`]) plus the
//! three concrete page bindings: student profile, course grades and the
//! attendance report.

mod attendance;
mod grades;
mod page;
mod profile;

pub use attendance::{parse_attendance_rows, AttendanceExtractor, AttendanceRecord, RawAttendanceRow};
pub use grades::{parse_course_rows, CourseRecord, Grade, GradesExtractor, RawCourseRow};
pub use page::{PageExtractor, PageTarget, ReadyWhen};
pub use profile::{ProfileExtractor, StudentProfile};
