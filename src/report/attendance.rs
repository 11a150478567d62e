//! Attendance threshold math
//!
//! Answers two questions per course against a fixed percentage bar:
//! how many more classes can be skipped while staying at or above it, and
//! how many must be attended consecutively to climb back over it. Both are
//! closed-form integer computations, with degenerate inputs (no classes
//! conducted yet) reported as an explicit `None` instead of a made-up
//! number.

use super::grades::round2;
use crate::extract::AttendanceRecord;
use serde::{Deserialize, Serialize};

/// Derived attendance standing for one course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttendanceAssessment {
    /// Course name
    pub course: String,
    /// Classes attended
    pub attended: u32,
    /// Classes conducted
    pub total: u32,
    /// Attendance percentage, rounded to two decimals
    pub current_percentage: f64,
    /// Additional classes that can be skipped while staying at/above the bar
    pub safe_leave_days: u32,
    /// Consecutive classes to attend to reach the bar; 0 when already there
    pub classes_needed_for_80: u32,
}

/// Threshold calculator over attended/total counts.
#[derive(Debug, Clone, Copy)]
pub struct AttendanceCalculator {
    threshold: u32,
}

impl Default for AttendanceCalculator {
    fn default() -> Self {
        Self::new(crate::config::ATTENDANCE_THRESHOLD)
    }
}

impl AttendanceCalculator {
    /// Create a calculator for a threshold in whole percent.
    ///
    /// The threshold is clamped to 1..=99; at 0 every margin is infinite and
    /// at 100 no amount of catching up ever reaches the bar.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.clamp(1, 99),
        }
    }

    /// The threshold in use, in whole percent.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Largest k such that attending nothing for k more classes keeps
    /// `attended / (total + k)` at or above the threshold.
    ///
    /// Closed form of the reference formulation (count iterations while
    /// `attended / (total + k + 1) * 100 >= T` holds, k starting at 0):
    /// the condition holds exactly for `k + 1 <= 100*attended/T - total`,
    /// so the count is `floor((100*attended - T*total) / T)`, clamped at 0.
    pub fn safe_leave_days(&self, attended: u32, total: u32) -> u32 {
        let t = i64::from(self.threshold);
        let margin = 100 * i64::from(attended) - t * i64::from(total);
        if margin <= 0 {
            0
        } else {
            (margin / t) as u32
        }
    }

    /// Smallest n such that attending the next n classes reaches the
    /// threshold: `(attended + n) / (total + n) * 100 >= T`, reported the
    /// way the reference loop counts it (its condition advances both counts
    /// by one before comparing, hence the `+1` terms below).
    ///
    /// Returns 0 when `current_percentage` is already at or above the bar.
    pub fn classes_needed(&self, attended: u32, total: u32, current_percentage: f64) -> u32 {
        if current_percentage >= f64::from(self.threshold) {
            return 0;
        }
        let t = i64::from(self.threshold);
        let deficit = t * (i64::from(total) + 1) - 100 * (i64::from(attended) + 1);
        if deficit <= 0 {
            0
        } else {
            // ceil division; the per-class gain is 100 - T percent-points.
            let gain = 100 - t;
            ((deficit + gain - 1) / gain) as u32
        }
    }

    /// Full assessment for one extracted record.
    ///
    /// `None` for degenerate inputs (`total == 0`): there is no meaningful
    /// percentage to defend or to chase yet.
    pub fn assess(&self, record: &AttendanceRecord) -> Option<AttendanceAssessment> {
        if record.total == 0 {
            return None;
        }
        Some(AttendanceAssessment {
            course: record.course.clone(),
            attended: record.attended,
            total: record.total,
            current_percentage: round2(record.current_percentage),
            safe_leave_days: self.safe_leave_days(record.attended, record.total),
            classes_needed_for_80: self.classes_needed(
                record.attended,
                record.total,
                record.current_percentage,
            ),
        })
    }
}
