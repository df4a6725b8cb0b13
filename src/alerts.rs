//! Low attendance alerts.

use crate::error::AttendanceResult;
use crate::manager::AttendanceManager;
use crate::models::Student;
use crate::stats::{self, SessionStats};
use std::fmt;
use tabled::Tabled;
use tracing::debug;

/// Below this percentage an alert is [`Criticality::Critical`].
pub const CRITICAL_BELOW: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criticality {
    Critical,
    High,
}

impl Criticality {
    /// Tier for a percentage that is already known to be under the threshold.
    pub fn for_percentage(percentage: f64) -> Self {
        if percentage < CRITICAL_BELOW {
            Criticality::Critical
        } else {
            Criticality::High
        }
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criticality::Critical => f.write_str("Critical"),
            Criticality::High => f.write_str("High"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct Alert {
    #[tabled(rename = "Roll No")]
    pub roll_no: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Division")]
    pub division: String,
    #[tabled(rename = "%")]
    pub percentage: f64,
    #[tabled(rename = "Criticality")]
    pub criticality: Criticality,
}

/// Flags every student strictly below `threshold`, lowest attendance first.
///
/// Students without recorded sessions are never flagged. The comparison and the tier use the
/// unrounded ratio, the reported percentage is rounded to 2 places. Equal percentages keep their
/// input order.
pub fn classify<I>(students: I, threshold: f64) -> Vec<Alert>
where
    I: IntoIterator<Item = (Student, SessionStats)>,
{
    let mut alerts: Vec<Alert> = students
        .into_iter()
        .filter(|(_, stats)| stats.total > 0 && stats.ratio < threshold)
        .map(|(student, stats)| Alert {
            roll_no: student.roll_no,
            name: student.name,
            division: student.division,
            percentage: stats.percentage(),
            criticality: Criticality::for_percentage(stats.ratio),
        })
        .collect();

    alerts.sort_by(|a, b| a.percentage.total_cmp(&b.percentage));
    alerts
}

/// Computes the alert list over every stored student.
pub fn low_attendance(manager: &mut AttendanceManager, threshold: f64) -> AttendanceResult<Vec<Alert>> {
    let students = manager.students()?;

    let mut with_stats = Vec::with_capacity(students.len());
    for student in students {
        let stats = stats::session_stats(manager, student.id)?;
        with_stats.push((student, stats));
    }

    let alerts = classify(with_stats, threshold);
    debug!(threshold, flagged = alerts.len(), "classified low attendance");

    Ok(alerts)
}
