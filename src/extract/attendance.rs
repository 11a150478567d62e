//! Attendance report page extraction
//!
//! The page script returns table cells as raw text; integer and percentage
//! parsing happens here so malformed rows can be skipped and logged without
//! aborting the batch.

use crate::browser::BrowserSession;
use crate::config::PortalConfig;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::page::{PageExtractor, PageTarget, ReadyWhen};

/// Attendance table element id on the report page
const ATTENDANCE_TABLE: &str = "tblStudent";

/// One attendance-table row as the page script returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAttendanceRow {
    /// Course name cell text
    pub course: String,
    /// Attended-hours cell text
    pub attended: String,
    /// Total-hours cell text
    pub total: String,
    /// Percentage cell text, usually with a trailing `%`
    pub percentage: String,
}

/// Parsed attendance standing for one course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttendanceRecord {
    /// Course name
    pub course: String,
    /// Classes attended
    pub attended: u32,
    /// Classes conducted
    pub total: u32,
    /// Attendance percentage as the portal reports it (0–100)
    pub current_percentage: f64,
}

/// Parse raw rows, skipping any with unparseable numbers.
pub fn parse_attendance_rows(rows: &[RawAttendanceRow]) -> Vec<AttendanceRecord> {
    rows.iter()
        .filter_map(|row| {
            let attended = row.attended.trim().parse::<u32>();
            let total = row.total.trim().parse::<u32>();
            let percentage = row
                .percentage
                .trim()
                .trim_end_matches('%')
                .trim()
                .parse::<f64>();
            match (attended, total, percentage) {
                (Ok(attended), Ok(total), Ok(current_percentage)) => Some(AttendanceRecord {
                    course: row.course.trim().to_string(),
                    attended,
                    total,
                    current_percentage,
                }),
                _ => {
                    warn!(course = %row.course, "Dropping unparseable attendance row");
                    None
                }
            }
        })
        .collect()
}

/// Fetches and parses the attendance report page.
pub struct AttendanceExtractor;

impl AttendanceExtractor {
    /// Extraction recipe for the attendance report page.
    pub fn target(config: &PortalConfig) -> PageTarget {
        PageTarget {
            page_name: "attendance",
            url: config.attendance_url(),
            ready: ReadyWhen::ElementPresent(ATTENDANCE_TABLE),
            settle: None,
            script: r#"
                (() => {
                    const table = document.getElementById('tblStudent');
                    const rows = table.getElementsByTagName('tr');
                    const results = [];
                    for (let i = 1; i < rows.length; i++) {
                        const cells = rows[i].getElementsByTagName('td');
                        if (cells.length < 8) continue;
                        results.push({
                            course: cells[2].textContent.trim(),
                            attended: cells[3].textContent.trim(),
                            total: cells[5].textContent.trim(),
                            percentage: cells[7].textContent.trim()
                        });
                    }
                    return results;
                })()
            "#
            .to_string(),
        }
    }

    /// Extract attendance records from a live session.
    pub async fn extract(
        extractor: &PageExtractor,
        session: &BrowserSession,
        config: &PortalConfig,
    ) -> Result<Vec<AttendanceRecord>> {
        let rows: Vec<RawAttendanceRow> =
            extractor.extract(session, &Self::target(config)).await?;
        debug!(raw = rows.len(), "Attendance rows extracted");
        Ok(parse_attendance_rows(&rows))
    }
}
