//! Read-only attendance statistics: per student, per day and per division.

use crate::alerts;
use crate::error::AttendanceResult;
use crate::manager::AttendanceManager;
use crate::models::Student;
use crate::settings::Settings;
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;
use tracing::debug;

/// Rounds `value` to `places` decimal places, half away from zero.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

/// Session counts for one student.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionStats {
    pub total: i64,
    pub present: i64,
    pub absent: i64,
    /// Unrounded; see [`SessionStats::percentage`] for the reported value.
    pub ratio: f64,
}

impl SessionStats {
    /// A student with no recorded sessions counts as fully attending.
    pub fn from_counts(total: i64, present: i64) -> Self {
        let ratio = if total > 0 {
            present as f64 / total as f64 * 100.0
        } else {
            100.0
        };

        Self {
            total,
            present,
            absent: total - present,
            ratio,
        }
    }

    /// The attendance percentage rounded to 2 decimal places.
    pub fn percentage(&self) -> f64 {
        round_to(self.ratio, 2)
    }
}

/// Which students a report covers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DivisionFilter {
    #[default]
    All,
    Division(String),
}

impl FromStr for DivisionFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "all" => DivisionFilter::All,
            division => DivisionFilter::Division(division.to_string()),
        })
    }
}

impl fmt::Display for DivisionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DivisionFilter::All => f.write_str("all"),
            DivisionFilter::Division(division) => f.write_str(division),
        }
    }
}

/// One row of the attendance report.
#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct StudentReport {
    #[tabled(rename = "Roll No")]
    pub roll_no: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Division")]
    pub division: String,
    #[tabled(rename = "Sessions")]
    pub total_sessions: i64,
    #[tabled(rename = "Present")]
    pub present: i64,
    #[tabled(rename = "Absent")]
    pub absent: i64,
    #[tabled(rename = "%")]
    pub percentage: f64,
}

impl StudentReport {
    fn new(student: Student, stats: SessionStats) -> Self {
        Self {
            roll_no: student.roll_no,
            name: student.name,
            division: student.division,
            total_sessions: stats.total,
            present: stats.present,
            absent: stats.absent,
            percentage: stats.percentage(),
        }
    }
}

/// Department overview shown on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub department: String,
    pub total_students: usize,
    pub total_divisions: usize,
    pub date: NaiveDate,
    pub attendance_rate: f64,
    pub low_attendance_count: usize,
    pub subjects: Vec<String>,
    pub sessions_per_day: u32,
    pub students_per_division: u32,
}

pub fn session_stats(manager: &mut AttendanceManager, student_id: i32) -> AttendanceResult<SessionStats> {
    let (total, present) = manager.tally(student_id)?;
    Ok(SessionStats::from_counts(total, present))
}

/// Share of present records on `date`, rounded to 1 decimal place. Zero when nothing was recorded.
pub fn daily_rate(manager: &mut AttendanceManager, date: NaiveDate) -> AttendanceResult<f64> {
    let (total, present) = manager.day_tally(date)?;
    if total == 0 {
        return Ok(0.0);
    }

    let rate = present as f64 / total as f64 * 100.0;

    debug!(%date, records = total, present, "computed daily rate");

    Ok(round_to(rate, 1))
}

/// Per-student statistics for one division ordered by roll number, or for every student grouped
/// by division in configured order.
pub fn report(
    manager: &mut AttendanceManager,
    settings: &Settings,
    filter: &DivisionFilter,
) -> AttendanceResult<Vec<StudentReport>> {
    let students = match filter {
        DivisionFilter::All => {
            let mut students = manager.all_students()?;
            // Stable, so roll number order survives within each division.
            students.sort_by_key(|s| settings.division_rank(&s.division).unwrap_or(usize::MAX));
            students
        }
        DivisionFilter::Division(division) => {
            settings.check_division(division)?;
            manager.roster(division)?
        }
    };

    debug!(%filter, students = students.len(), "building attendance report");

    students
        .into_iter()
        .map(|student| {
            let stats = session_stats(manager, student.id)?;
            Ok(StudentReport::new(student, stats))
        })
        .collect()
}

pub fn dashboard(
    manager: &mut AttendanceManager,
    settings: &Settings,
    date: NaiveDate,
) -> AttendanceResult<DashboardSummary> {
    let total_students = manager.num_students()?;
    let attendance_rate = daily_rate(manager, date)?;
    let low_attendance_count = alerts::low_attendance(manager, settings.low_attendance_threshold)?.len();

    Ok(DashboardSummary {
        department: settings.department.clone(),
        total_students,
        total_divisions: settings.divisions.len(),
        date,
        attendance_rate,
        low_attendance_count,
        subjects: settings.subjects.clone(),
        sessions_per_day: settings.sessions_per_day,
        students_per_division: settings.students_per_division,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::tests::seeded;
    use crate::models::{SessionKey, Status};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn settings(divisions: &[&str]) -> Settings {
        Settings {
            database_url: ":memory:".to_string(),
            department: "CS Department".to_string(),
            divisions: divisions.iter().map(|d| d.to_string()).collect(),
            subjects: vec!["ML".to_string(), "SFT".to_string()],
            students_per_division: 2,
            sessions_per_day: 6,
            low_attendance_threshold: 75.0,
        }
    }

    fn mark(manager: &mut AttendanceManager, staff: i32, division: &str, d: u32, statuses: &[Status]) {
        let roster = manager.roster(division).unwrap();
        let entries: Vec<(i32, Status)> = roster.iter().map(|s| s.id).zip(statuses.iter().copied()).collect();
        let key = SessionKey {
            division: division.to_string(),
            subject: "ML".to_string(),
            date: day(d),
        };
        manager.replace_session(&key, staff, &entries).unwrap();
    }

    #[test]
    fn no_sessions_means_full_attendance() {
        let stats = SessionStats::from_counts(0, 0);
        assert_eq!(stats.percentage(), 100.0);
        assert_eq!(stats.absent, 0);
    }

    #[test]
    fn percentage_is_rounded_to_two_places() {
        let stats = SessionStats::from_counts(3, 2);
        assert_eq!(stats.percentage(), 66.67);
        assert_eq!(stats.present + stats.absent, stats.total);
    }

    #[test]
    fn daily_rate_is_zero_without_records() {
        let (mut manager, _) = seeded(&["A"], 2);
        assert_eq!(daily_rate(&mut manager, day(10)).unwrap(), 0.0);
    }

    #[test]
    fn daily_rate_counts_every_session_that_day() {
        let (mut manager, staff) = seeded(&["A", "B"], 3);
        use Status::*;
        mark(&mut manager, staff.id, "A", 10, &[Present, Present, Absent]);
        mark(&mut manager, staff.id, "B", 10, &[Present, Absent, Absent]);
        mark(&mut manager, staff.id, "B", 11, &[Present, Present, Present]);

        // 3 of 6 on the 10th.
        assert_eq!(daily_rate(&mut manager, day(10)).unwrap(), 50.0);
        assert_eq!(daily_rate(&mut manager, day(11)).unwrap(), 100.0);
    }

    #[test]
    fn daily_rate_rounds_to_one_place() {
        let (mut manager, staff) = seeded(&["A"], 3);
        use Status::*;
        mark(&mut manager, staff.id, "A", 10, &[Present, Absent, Absent]);

        assert_eq!(daily_rate(&mut manager, day(10)).unwrap(), 33.3);
    }

    #[test]
    fn report_for_all_follows_configured_division_order() {
        let (mut manager, _) = seeded(&["A", "B"], 2);
        let rows = report(&mut manager, &settings(&["B", "A"]), &DivisionFilter::All).unwrap();

        let rolls: Vec<&str> = rows.iter().map(|r| r.roll_no.as_str()).collect();
        assert_eq!(rolls, ["B01", "B02", "A01", "A02"]);
    }

    #[test]
    fn report_for_one_division() {
        let (mut manager, staff) = seeded(&["A", "B"], 2);
        use Status::*;
        mark(&mut manager, staff.id, "A", 10, &[Present, Absent]);
        mark(&mut manager, staff.id, "A", 11, &[Present, Present]);

        let filter: DivisionFilter = "A".parse().unwrap();
        let rows = report(&mut manager, &settings(&["A", "B"]), &filter).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].total_sessions, rows[0].present, rows[0].percentage), (2, 2, 100.0));
        assert_eq!((rows[1].total_sessions, rows[1].absent, rows[1].percentage), (2, 1, 50.0));
    }

    #[test]
    fn report_rejects_unknown_division() {
        let (mut manager, _) = seeded(&["A"], 1);
        let filter = DivisionFilter::Division("Q".to_string());

        assert!(report(&mut manager, &settings(&["A"]), &filter).unwrap_err().is_validation());
    }

    #[test]
    fn dashboard_summarises_the_department() {
        let (mut manager, staff) = seeded(&["A"], 2);
        use Status::*;
        mark(&mut manager, staff.id, "A", 10, &[Present, Absent]);

        let summary = dashboard(&mut manager, &settings(&["A"]), day(10)).unwrap();
        assert_eq!(summary.total_students, 2);
        assert_eq!(summary.total_divisions, 1);
        assert_eq!(summary.attendance_rate, 50.0);
        assert_eq!(summary.low_attendance_count, 1);
    }
}
