//! Roster provisioning from a CSV file with `roll_no,name,division` columns.

use crate::error::AttendanceResult;
use crate::manager::AttendanceManager;
use crate::models::NewStudent;
use crate::settings::Settings;
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RosterRecord {
    pub roll_no: String,
    pub name: String,
    pub division: String,
}

/// Reads every record, checking each division against the configuration.
pub fn read_roster<R: Read>(reader: R, settings: &Settings) -> AttendanceResult<Vec<RosterRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut records = Vec::new();
    for record in csv_reader.deserialize() {
        let record: RosterRecord = record?;
        settings.check_division(&record.division)?;
        records.push(record);
    }

    Ok(records)
}

/// Adds the students whose roll number is not stored yet. Existing students are left as they are.
///
/// Returns the roll numbers that were added.
pub fn sync_roster(
    manager: &mut AttendanceManager,
    records: &[RosterRecord],
) -> AttendanceResult<Vec<String>> {
    let mut known: HashSet<String> = manager
        .students()?
        .into_iter()
        .map(|student| student.roll_no)
        .collect();

    let added: Vec<&RosterRecord> = records
        .iter()
        .filter(|record| known.insert(record.roll_no.clone()))
        .collect();

    let new_students: Vec<NewStudent> = added
        .iter()
        .map(|record| NewStudent {
            roll_no: &record.roll_no,
            name: &record.name,
            division: &record.division,
        })
        .collect();
    manager.insert_students(&new_students)?;

    info!(
        added = added.len(),
        skipped = records.len() - added.len(),
        "synced roster"
    );

    Ok(added.into_iter().map(|record| record.roll_no.clone()).collect())
}

pub fn import_roster(
    manager: &mut AttendanceManager,
    settings: &Settings,
    path: &Path,
) -> AttendanceResult<Vec<String>> {
    let file = std::fs::File::open(path).map_err(csv::Error::from)?;
    let records = read_roster(file, settings)?;
    sync_roster(manager, &records)
}
