//! Department configuration: divisions, subjects and the low attendance threshold.
//!
//! Values are layered, later sources overriding earlier ones:
//! built-in defaults, the `config.toml` file (optional), `ATTENDANCE_*` environment variables, and
//! finally `DATABASE_URL` (also read from a `.env` file).

use crate::error::{AttendanceResult, ValidationError};
use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use dotenvy::dotenv;
use serde::Deserialize;
use std::collections::HashSet;
use std::env;

/// The configuration file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub department: String,
    pub divisions: Vec<String>,
    pub subjects: Vec<String>,
    pub students_per_division: u32,
    pub sessions_per_day: u32,
    /// Students strictly below this percentage are flagged.
    pub low_attendance_threshold: f64,
}

impl Settings {
    /// Loads settings from `config.toml` in the working directory if it exists.
    pub fn load() -> AttendanceResult<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Loads settings from the given configuration file. The file may be missing, in which case
    /// only the defaults and the environment apply.
    pub fn load_from(path: &str) -> AttendanceResult<Self> {
        dotenv().ok();

        let builder = Self::defaults()?
            .add_source(File::with_name(path).required(false))
            .add_source(Self::environment())
            .set_override_option("database_url", env::var("DATABASE_URL").ok())?;

        Self::build(builder)
    }

    /// `ATTENDANCE_<KEY>` variables. `divisions` and `subjects` are comma separated lists.
    fn environment() -> Environment {
        Environment::with_prefix("ATTENDANCE")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("divisions")
            .with_list_parse_key("subjects")
    }

    fn defaults() -> AttendanceResult<ConfigBuilder<DefaultState>> {
        Ok(Config::builder()
            .set_default("database_url", "attendance.db")?
            .set_default("department", "CS Department")?
            .set_default("divisions", vec!["A", "B", "C", "D", "E", "F"])?
            .set_default("subjects", vec!["SFT", "ML", "ETI", "MAN", "CPE", "MAD"])?
            .set_default("students_per_division", 40_i64)?
            .set_default("sessions_per_day", 6_i64)?
            .set_default("low_attendance_threshold", 75.0)?)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> AttendanceResult<Self> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks the invariants the rest of the crate relies on.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.divisions.is_empty() {
            return Err(ValidationError::InvalidSetting(
                "at least one division must be configured".to_string(),
            ));
        }
        if self.subjects.is_empty() {
            return Err(ValidationError::InvalidSetting(
                "at least one subject must be configured".to_string(),
            ));
        }
        if let Some(dup) = first_duplicate(&self.divisions) {
            return Err(ValidationError::InvalidSetting(format!(
                "division '{dup}' is listed twice"
            )));
        }
        if let Some(dup) = first_duplicate(&self.subjects) {
            return Err(ValidationError::InvalidSetting(format!(
                "subject '{dup}' is listed twice"
            )));
        }
        if !(self.low_attendance_threshold > 0.0 && self.low_attendance_threshold <= 100.0) {
            return Err(ValidationError::InvalidSetting(format!(
                "low_attendance_threshold must be in (0, 100], got {}",
                self.low_attendance_threshold
            )));
        }
        Ok(())
    }

    /// Position of a division in the configured order, used to group reports.
    pub fn division_rank(&self, division: &str) -> Option<usize> {
        self.divisions.iter().position(|d| d == division)
    }

    pub fn check_division(&self, division: &str) -> Result<(), ValidationError> {
        match self.division_rank(division) {
            Some(_) => Ok(()),
            None => Err(ValidationError::UnknownDivision(division.to_string())),
        }
    }

    pub fn check_subject(&self, subject: &str) -> Result<(), ValidationError> {
        if self.subjects.iter().any(|s| s == subject) {
            Ok(())
        } else {
            Err(ValidationError::UnknownSubject(subject.to_string()))
        }
    }
}

fn first_duplicate(values: &[String]) -> Option<&str> {
    let mut seen = HashSet::new();
    values
        .iter()
        .find(|value| !seen.insert(value.as_str()))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn with_file(contents: &str) -> AttendanceResult<Settings> {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).expect("write config file");

        let builder = Settings::defaults()?.add_source(File::from(path));
        Settings::build(builder)
    }

    #[test]
    fn defaults_match_the_department_layout() {
        let settings = Settings::build(Settings::defaults().unwrap()).unwrap();

        assert_eq!(settings.divisions, ["A", "B", "C", "D", "E", "F"]);
        assert_eq!(settings.subjects.len(), 6);
        assert_eq!(settings.students_per_division, 40);
        assert_eq!(settings.low_attendance_threshold, 75.0);
    }

    #[test]
    fn file_values_override_defaults() {
        let settings = with_file(
            r#"
            divisions = ["X", "Y"]
            low_attendance_threshold = 60.0
            "#,
        )
        .unwrap();

        assert_eq!(settings.divisions, ["X", "Y"]);
        assert_eq!(settings.low_attendance_threshold, 60.0);
        assert_eq!(settings.department, "CS Department");
    }

    #[test]
    fn environment_sets_lists_and_numbers() {
        let mut vars = config::Map::new();
        vars.insert("ATTENDANCE_DIVISIONS".to_string(), "X,Y".to_string());
        vars.insert("ATTENDANCE_SUBJECTS".to_string(), "ML".to_string());
        vars.insert("ATTENDANCE_LOW_ATTENDANCE_THRESHOLD".to_string(), "60".to_string());

        let builder = Settings::defaults()
            .unwrap()
            .add_source(Settings::environment().source(Some(vars)));
        let settings = Settings::build(builder).unwrap();

        assert_eq!(settings.divisions, ["X", "Y"]);
        assert_eq!(settings.subjects, ["ML"]);
        assert_eq!(settings.low_attendance_threshold, 60.0);
        assert_eq!(settings.department, "CS Department");
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let err = with_file("low_attendance_threshold = 0.0").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn rejects_duplicate_divisions() {
        let err = with_file(r#"divisions = ["A", "B", "A"]"#).unwrap_err();
        assert!(err.to_string().contains("'A'"));
    }

    #[test]
    fn division_rank_follows_configured_order() {
        let settings = with_file(r#"divisions = ["C", "A"]"#).unwrap();

        assert_eq!(settings.division_rank("C"), Some(0));
        assert_eq!(settings.division_rank("A"), Some(1));
        assert!(settings.check_division("B").is_err());
        assert!(settings.check_subject("ML").is_ok());
    }
}
