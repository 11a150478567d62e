//! CGPA aggregation

use crate::extract::CourseRecord;
use serde::{Deserialize, Serialize};

/// CGPA over a batch of retained course records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradeSummary {
    /// CGPA rounded to two decimals, for presentation
    pub cgpa: f64,
    /// Unrounded CGPA
    pub raw_cgpa: f64,
    /// Number of courses that contributed
    pub course_count: usize,
}

/// Computes CGPA from course records.
pub struct GradeAggregator;

impl GradeAggregator {
    /// Mean of the grade points, or 0 for an empty batch.
    pub fn aggregate(records: &[CourseRecord]) -> GradeSummary {
        if records.is_empty() {
            return GradeSummary {
                cgpa: 0.0,
                raw_cgpa: 0.0,
                course_count: 0,
            };
        }
        let total: u32 = records.iter().map(|r| r.points).sum();
        let raw_cgpa = f64::from(total) / records.len() as f64;
        GradeSummary {
            cgpa: round2(raw_cgpa),
            raw_cgpa,
            course_count: records.len(),
        }
    }
}

/// Round to two decimal places for presentation.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
