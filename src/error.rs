//! Error types shared by every layer of the attendance tracker.

use thiserror::Error;

/// Convenience alias used throughout the library.
pub type AttendanceResult<T> = Result<T, AttendanceError>;

/// Input that was rejected before anything was written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{0}' is not a valid date, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("division '{0}' is not configured")]
    UnknownDivision(String),

    #[error("subject '{0}' is not configured")]
    UnknownSubject(String),

    #[error("student {student_id} is not on the roster of division {division}")]
    UnknownStudent { student_id: i32, division: String },

    #[error("no student with roll number '{0}'")]
    UnknownRollNumber(String),

    #[error("student {0} appears more than once in the submission")]
    DuplicateStudent(i32),

    #[error("{given} statuses were submitted but division {division} has {roster} students")]
    TooManyStatuses {
        given: usize,
        roster: usize,
        division: String,
    },

    #[error("'{0}' is not a status, expected Present or Absent")]
    UnknownStatus(String),

    #[error("invalid setting: {0}")]
    InvalidSetting(String),
}

#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("storage failure: {0}")]
    Storage(#[from] diesel::result::Error),

    #[error("could not connect to the database: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("could not apply database migrations: {0}")]
    Migration(Box<dyn std::error::Error + Send + Sync>),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("roster import failed: {0}")]
    Import(#[from] csv::Error),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("could not hash credential: {0}")]
    Credential(String),
}

impl AttendanceError {
    /// Returns `true` when the error was raised before any mutation took place.
    pub fn is_validation(&self) -> bool {
        matches!(self, AttendanceError::Validation(_))
    }
}
