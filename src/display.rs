use crate::alerts;
use crate::error::{AttendanceResult, ValidationError};
use crate::manager::AttendanceManager;
use crate::recording::RecordOutcome;
use crate::settings::Settings;
use crate::stats::{self, DivisionFilter};
use chrono::NaiveDate;
use tabled::{Table, Tabled, settings::Style};

/// Pretty prints per-student attendance for the selected divisions.
pub fn show_report(
    manager: &mut AttendanceManager,
    settings: &Settings,
    filter: &DivisionFilter,
) -> AttendanceResult<()> {
    let rows = stats::report(manager, settings, filter)?;

    let mut table = Table::new(rows);
    table.with(Style::modern());

    println!("Attendance report ({filter}):\n{table}");

    Ok(())
}

/// Pretty prints the low attendance alerts.
pub fn show_alerts(manager: &mut AttendanceManager, settings: &Settings) -> AttendanceResult<()> {
    let threshold = settings.low_attendance_threshold;
    let alerts = alerts::low_attendance(manager, threshold)?;

    if alerts.is_empty() {
        println!("No students below {threshold}% attendance.");
        return Ok(());
    }

    let mut table = Table::new(alerts);
    table.with(Style::modern());

    println!("Students below {threshold}% attendance:\n{table}");

    Ok(())
}

pub fn show_dashboard(
    manager: &mut AttendanceManager,
    settings: &Settings,
    date: NaiveDate,
) -> AttendanceResult<()> {
    let summary = stats::dashboard(manager, settings, date)?;

    #[derive(Tabled)]
    struct Line {
        metric: &'static str,
        value: String,
    }

    let lines = [
        Line {
            metric: "Department",
            value: summary.department,
        },
        Line {
            metric: "Students",
            value: summary.total_students.to_string(),
        },
        Line {
            metric: "Divisions",
            value: summary.total_divisions.to_string(),
        },
        Line {
            metric: "Students per division",
            value: summary.students_per_division.to_string(),
        },
        Line {
            metric: "Subjects",
            value: summary.subjects.join(", "),
        },
        Line {
            metric: "Sessions per day",
            value: summary.sessions_per_day.to_string(),
        },
        Line {
            metric: "Attendance rate",
            value: format!("{}%", summary.attendance_rate),
        },
        Line {
            metric: "Low attendance",
            value: summary.low_attendance_count.to_string(),
        },
    ];

    let mut table = Table::new(lines);
    table.with(Style::modern());

    println!("Dashboard for {}:\n{table}", summary.date);

    Ok(())
}

/// Pretty prints the roster of a division in roll number order.
pub fn show_roster(
    manager: &mut AttendanceManager,
    settings: &Settings,
    division: &str,
) -> AttendanceResult<()> {
    settings.check_division(division)?;

    #[derive(Tabled)]
    struct SimpleStudent {
        id: i32,
        roll_no: String,
        name: String,
    }

    let roster: Vec<SimpleStudent> = manager
        .roster(division)?
        .into_iter()
        .map(|student| SimpleStudent {
            id: student.id,
            roll_no: student.roll_no,
            name: student.name,
        })
        .collect();

    let mut table = Table::new(roster);
    table.with(Style::modern());

    println!("Division {division} roster:\n{table}");

    Ok(())
}

/// Prints all info about a student, including each recorded session.
pub fn show_student_info(manager: &mut AttendanceManager, roll_no: &str) -> AttendanceResult<()> {
    let student = manager
        .student_by_roll(roll_no)?
        .ok_or_else(|| ValidationError::UnknownRollNumber(roll_no.to_string()))?;

    let stats = stats::session_stats(manager, student.id)?;

    println!(
        "{} ({}), division {}: {} of {} sessions attended ({}%)",
        student.name,
        student.roll_no,
        student.division,
        stats.present,
        stats.total,
        stats.percentage()
    );

    #[derive(Tabled)]
    struct Session {
        date: NaiveDate,
        subject: String,
        status: String,
    }

    let sessions: Vec<Session> = manager
        .student_records(&student)?
        .into_iter()
        .map(|record| Session {
            date: record.date,
            subject: record.subject,
            status: record.status.to_string(),
        })
        .collect();

    if !sessions.is_empty() {
        let mut table = Table::new(sessions);
        table.with(Style::modern());
        println!("{table}");
    }

    Ok(())
}

pub fn show_recorded(outcome: &RecordOutcome) {
    println!(
        "Attendance saved for division {} - {} on {}: {} records ({} replaced)",
        outcome.key.division,
        outcome.key.subject,
        outcome.key.date,
        outcome.inserted,
        outcome.removed
    );
}
