//! Course grades page extraction
//!
//! The in-page script returns the grade table rows as raw text; grade
//! mapping and the PASS filter run here in Rust so the rules are unit
//! testable without a browser.

use crate::browser::BrowserSession;
use crate::config::PortalConfig;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use super::page::{PageExtractor, PageTarget, ReadyWhen};

/// Grade table element id on the grades page
const GRADES_TABLE: &str = "tblGridViewComplete";

/// Letter grade on the portal's fixed scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    /// 10 points
    S,
    /// 9 points
    A,
    /// 8 points
    B,
    /// 7 points
    C,
    /// 6 points
    D,
    /// 5 points
    E,
}

impl Grade {
    /// Grade point on the 5–10 scale.
    pub fn points(self) -> u32 {
        match self {
            Grade::S => 10,
            Grade::A => 9,
            Grade::B => 8,
            Grade::C => 7,
            Grade::D => 6,
            Grade::E => 5,
        }
    }
}

impl FromStr for Grade {
    type Err = ();

    /// Exact match only; anything outside the mapping (RA, W, AB, blanks)
    /// is not a grade.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "S" => Ok(Grade::S),
            "A" => Ok(Grade::A),
            "B" => Ok(Grade::B),
            "C" => Ok(Grade::C),
            "D" => Ok(Grade::D),
            "E" => Ok(Grade::E),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            Grade::S => "S",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
        };
        f.write_str(letter)
    }
}

/// One grade-table row as the page script returns it, unfiltered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCourseRow {
    /// Course code cell text
    pub code: String,
    /// Course name cell text
    pub name: String,
    /// Grade cell text
    pub grade: String,
    /// Completion status cell text
    pub status: String,
    /// Completion month/year cell text
    pub completed: String,
}

/// A retained course: status PASS and a grade on the mapping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourseRecord {
    /// Course code
    pub code: String,
    /// Course name
    pub name: String,
    /// Letter grade
    pub grade: Grade,
    /// Grade points (5–10)
    pub points: u32,
    /// Completion month/year
    pub completed: String,
}

/// Keep only rows that passed with a mapped grade.
///
/// Everything else (failed, withdrawn, reappearance, unknown letters) is
/// silently dropped, logged at debug so a surprising CGPA can be explained
/// from the server logs.
pub fn parse_course_rows(rows: &[RawCourseRow]) -> Vec<CourseRecord> {
    rows.iter()
        .filter_map(|row| {
            if !row.status.trim().eq_ignore_ascii_case("PASS") {
                debug!(code = %row.code, status = %row.status, "Dropping non-pass row");
                return None;
            }
            let grade = match Grade::from_str(row.grade.trim()) {
                Ok(g) => g,
                Err(()) => {
                    debug!(code = %row.code, grade = %row.grade, "Dropping unmapped grade");
                    return None;
                }
            };
            Some(CourseRecord {
                code: row.code.trim().to_string(),
                name: row.name.trim().to_string(),
                grade,
                points: grade.points(),
                completed: row.completed.trim().to_string(),
            })
        })
        .collect()
}

/// Fetches and filters the grades page.
pub struct GradesExtractor;

impl GradesExtractor {
    /// Extraction recipe for the grades page.
    ///
    /// The table keeps repainting briefly after it first appears, hence the
    /// settle delay on top of element presence.
    pub fn target(config: &PortalConfig) -> PageTarget {
        PageTarget {
            page_name: "grades",
            url: config.grades_url(),
            ready: ReadyWhen::ElementPresent(GRADES_TABLE),
            settle: Some(Duration::from_secs(3)),
            script: r#"
                (() => {
                    const table = document.getElementById('tblGridViewComplete');
                    const rows = table.getElementsByTagName('tr');
                    const results = [];
                    for (let i = 1; i < rows.length; i++) {
                        const cells = rows[i].getElementsByTagName('td');
                        if (cells.length < 6) continue;
                        try {
                            const statusEl = cells[4].getElementsByTagName('span')[0];
                            results.push({
                                code: cells[1].textContent.trim(),
                                name: cells[2].textContent.trim(),
                                grade: cells[3].textContent.trim(),
                                status: statusEl ? statusEl.textContent.trim() : '',
                                completed: cells[5].textContent.trim()
                            });
                        } catch (e) {
                            console.log('Error processing row ' + i + ': ' + e.message);
                        }
                    }
                    return results;
                })()
            "#
            .to_string(),
        }
    }

    /// Extract the retained course records from a live session.
    pub async fn extract(
        extractor: &PageExtractor,
        session: &BrowserSession,
        config: &PortalConfig,
    ) -> Result<Vec<CourseRecord>> {
        let rows: Vec<RawCourseRow> = extractor.extract(session, &Self::target(config)).await?;
        debug!(raw = rows.len(), "Grade rows extracted");
        Ok(parse_course_rows(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(code: &str, grade: &str, status: &str) -> RawCourseRow {
        RawCourseRow {
            code: code.to_string(),
            name: format!("Course {code}"),
            grade: grade.to_string(),
            status: status.to_string(),
            completed: "MAY 2024".to_string(),
        }
    }

    #[test]
    fn test_grade_points() {
        assert_eq!(Grade::S.points(), 10);
        assert_eq!(Grade::A.points(), 9);
        assert_eq!(Grade::B.points(), 8);
        assert_eq!(Grade::C.points(), 7);
        assert_eq!(Grade::D.points(), 6);
        assert_eq!(Grade::E.points(), 5);
    }

    #[test]
    fn test_grade_parse_rejects_unmapped() {
        assert!(Grade::from_str("F").is_err());
        assert!(Grade::from_str("RA").is_err());
        assert!(Grade::from_str("").is_err());
        assert!(Grade::from_str("s").is_err());
    }

    #[test]
    fn test_pass_rows_retained() {
        let rows = vec![row("CS1001", "A", "PASS"), row("CS1002", "S", "pass")];
        let records = parse_course_rows(&rows);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].grade, Grade::A);
        assert_eq!(records[0].points, 9);
        assert_eq!(records[1].points, 10);
    }

    #[test]
    fn test_fail_status_dropped() {
        let rows = vec![row("CS1001", "A", "FAIL"), row("CS1002", "B", "Reappear")];
        assert!(parse_course_rows(&rows).is_empty());
    }

    #[test]
    fn test_unmapped_grade_dropped() {
        let rows = vec![row("CS1001", "RA", "PASS"), row("CS1002", "", "PASS")];
        assert!(parse_course_rows(&rows).is_empty());
    }

    #[test]
    fn test_whitespace_trimmed() {
        let rows = vec![RawCourseRow {
            code: " CS1001 ".to_string(),
            name: " Data Structures ".to_string(),
            grade: " B ".to_string(),
            status: " Pass ".to_string(),
            completed: " NOV 2023 ".to_string(),
        }];
        let records = parse_course_rows(&rows);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].code, "CS1001");
        assert_eq!(records[0].name, "Data Structures");
        assert_eq!(records[0].completed, "NOV 2023");
    }

    #[test]
    fn test_grades_target() {
        let target = GradesExtractor::target(&PortalConfig::default());
        assert_eq!(target.page_name, "grades");
        assert!(target.url.ends_with("MyCourse.aspx"));
        assert!(matches!(
            target.ready,
            ReadyWhen::ElementPresent("tblGridViewComplete")
        ));
        assert_eq!(target.settle, Some(Duration::from_secs(3)));
    }
}
