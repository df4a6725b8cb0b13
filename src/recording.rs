//! Recording a session's attendance.

use crate::auth::StaffContext;
use crate::error::{AttendanceResult, ValidationError};
use crate::manager::AttendanceManager;
use crate::models::{SessionKey, Status, Student};
use crate::settings::Settings;
use chrono::{Local, NaiveDate};
use std::collections::HashMap;
use tracing::info;

/// The only accepted date format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A submitted attendance sheet for one session.
#[derive(Debug, Clone)]
pub struct MarkRequest<'a> {
    pub division: &'a str,
    pub subject: &'a str,
    /// Raw `YYYY-MM-DD` text as it was submitted.
    pub date: &'a str,
    /// `(student_id, status)` pairs. Students of the division roster that are not listed are
    /// recorded as absent.
    pub entries: Vec<(i32, Status)>,
}

/// What a roster replacement did.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutcome {
    pub key: SessionKey,
    pub removed: usize,
    pub inserted: usize,
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(raw.to_string()))
}

/// Today's local date in [`DATE_FORMAT`], for sheets submitted without a date.
pub fn today() -> String {
    Local::now().date_naive().format(DATE_FORMAT).to_string()
}

/// Pairs a positional status list with a roster ordered by roll number.
///
/// Students past the end of a short list are absent. A list longer than the roster is rejected.
pub fn align_statuses(
    division: &str,
    roster: &[Student],
    statuses: &[Status],
) -> Result<Vec<(i32, Status)>, ValidationError> {
    if statuses.len() > roster.len() {
        return Err(ValidationError::TooManyStatuses {
            given: statuses.len(),
            roster: roster.len(),
            division: division.to_string(),
        });
    }

    Ok(roster
        .iter()
        .enumerate()
        .map(|(idx, student)| {
            (
                student.id,
                statuses.get(idx).copied().unwrap_or(Status::Absent),
            )
        })
        .collect())
}

/// Builds the full roster sheet, rejecting entries for students outside the division.
fn complete_sheet(
    division: &str,
    roster: &[Student],
    entries: &[(i32, Status)],
) -> Result<Vec<(i32, Status)>, ValidationError> {
    let mut submitted = HashMap::with_capacity(entries.len());
    for &(student_id, status) in entries {
        if !roster.iter().any(|s| s.id == student_id) {
            return Err(ValidationError::UnknownStudent {
                student_id,
                division: division.to_string(),
            });
        }
        if submitted.insert(student_id, status).is_some() {
            return Err(ValidationError::DuplicateStudent(student_id));
        }
    }

    Ok(roster
        .iter()
        .map(|s| (s.id, submitted.get(&s.id).copied().unwrap_or(Status::Absent)))
        .collect())
}

/// Replaces the stored attendance of a session with the submitted sheet.
///
/// All input is validated before anything is deleted. The replacement itself is atomic, so
/// submitting the same sheet twice leaves the same records as submitting it once.
pub fn record_attendance(
    manager: &mut AttendanceManager,
    settings: &Settings,
    staff: &StaffContext,
    request: &MarkRequest<'_>,
) -> AttendanceResult<RecordOutcome> {
    settings.check_division(request.division)?;
    settings.check_subject(request.subject)?;
    let date = parse_date(request.date)?;

    let roster = manager.roster(request.division)?;
    let sheet = complete_sheet(request.division, &roster, &request.entries)?;

    let key = SessionKey {
        division: request.division.to_string(),
        subject: request.subject.to_string(),
        date,
    };
    let (removed, inserted) = manager.replace_session(&key, staff.staff_id, &sheet)?;

    info!(
        division = %key.division,
        subject = %key.subject,
        %date,
        staff_id = staff.staff_id,
        removed,
        inserted,
        "recorded attendance"
    );

    Ok(RecordOutcome {
        key,
        removed,
        inserted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AttendanceError;
    use crate::manager::tests::seeded;
    use crate::models::Staff;

    fn settings() -> Settings {
        Settings {
            database_url: ":memory:".to_string(),
            department: "CS Department".to_string(),
            divisions: vec!["A".to_string(), "B".to_string()],
            subjects: vec!["ML".to_string(), "SFT".to_string()],
            students_per_division: 3,
            sessions_per_day: 6,
            low_attendance_threshold: 75.0,
        }
    }

    fn context(staff: Staff) -> StaffContext {
        staff.into()
    }

    fn request<'a>(date: &'a str, entries: Vec<(i32, Status)>) -> MarkRequest<'a> {
        MarkRequest {
            division: "A",
            subject: "ML",
            date,
            entries,
        }
    }

    #[test]
    fn parses_iso_dates_only() {
        assert_eq!(
            parse_date("2024-01-10"),
            Ok(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap())
        );
        assert!(parse_date("10/01/2024").is_err());
        assert!(parse_date("2024-02-30").is_err());
    }

    #[test]
    fn today_is_accepted_as_a_session_date() {
        assert!(parse_date(&today()).is_ok());
    }

    #[test]
    fn short_status_list_defaults_to_absent() {
        let (mut manager, _) = seeded(&["A"], 3);
        let roster = manager.roster("A").unwrap();

        let sheet = align_statuses("A", &roster, &[Status::Present]).unwrap();
        let statuses: Vec<Status> = sheet.iter().map(|&(_, s)| s).collect();
        assert_eq!(statuses, [Status::Present, Status::Absent, Status::Absent]);
    }

    #[test]
    fn long_status_list_is_rejected() {
        let (mut manager, _) = seeded(&["A"], 1);
        let roster = manager.roster("A").unwrap();

        let err = align_statuses("A", &roster, &[Status::Present, Status::Present]).unwrap_err();
        assert!(matches!(err, ValidationError::TooManyStatuses { given: 2, roster: 1, .. }));
    }

    #[test]
    fn unlisted_students_are_recorded_absent() {
        let (mut manager, staff) = seeded(&["A"], 3);
        let roster = manager.roster("A").unwrap();

        let outcome = record_attendance(
            &mut manager,
            &settings(),
            &context(staff),
            &request("2024-01-10", vec![(roster[1].id, Status::Present)]),
        )
        .unwrap();
        assert_eq!(outcome.inserted, 3);

        let stored: Vec<Status> = manager
            .session_records(&outcome.key)
            .unwrap()
            .into_iter()
            .map(|r| r.status)
            .collect();
        assert_eq!(stored, [Status::Absent, Status::Present, Status::Absent]);
    }

    #[test]
    fn invalid_date_touches_nothing() {
        let (mut manager, staff) = seeded(&["A"], 2);
        let roster = manager.roster("A").unwrap();
        let staff = context(staff);
        let entries = vec![(roster[0].id, Status::Present), (roster[1].id, Status::Present)];

        record_attendance(&mut manager, &settings(), &staff, &request("2024-01-10", entries.clone()))
            .unwrap();
        let err = record_attendance(&mut manager, &settings(), &staff, &request("2024-13-10", entries))
            .unwrap_err();

        assert!(matches!(
            err,
            AttendanceError::Validation(ValidationError::InvalidDate(_))
        ));
        assert_eq!(manager.tally(roster[0].id).unwrap(), (1, 1));
    }

    #[test]
    fn rejects_unknown_division_and_subject() {
        let (mut manager, staff) = seeded(&["A"], 1);
        let staff = context(staff);

        let mut bad_division = request("2024-01-10", vec![]);
        bad_division.division = "Z";
        assert!(matches!(
            record_attendance(&mut manager, &settings(), &staff, &bad_division),
            Err(AttendanceError::Validation(ValidationError::UnknownDivision(_)))
        ));

        let mut bad_subject = request("2024-01-10", vec![]);
        bad_subject.subject = "ART";
        assert!(matches!(
            record_attendance(&mut manager, &settings(), &staff, &bad_subject),
            Err(AttendanceError::Validation(ValidationError::UnknownSubject(_)))
        ));
    }

    #[test]
    fn rejects_students_from_another_division() {
        let (mut manager, staff) = seeded(&["A", "B"], 1);
        let outsider = manager.roster("B").unwrap()[0].id;

        let err = record_attendance(
            &mut manager,
            &settings(),
            &context(staff),
            &request("2024-01-10", vec![(outsider, Status::Present)]),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            AttendanceError::Validation(ValidationError::UnknownStudent { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_entries() {
        let (mut manager, staff) = seeded(&["A"], 2);
        let id = manager.roster("A").unwrap()[0].id;

        let err = record_attendance(
            &mut manager,
            &settings(),
            &context(staff),
            &request("2024-01-10", vec![(id, Status::Present), (id, Status::Absent)]),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            AttendanceError::Validation(ValidationError::DuplicateStudent(_))
        ));
    }
}
