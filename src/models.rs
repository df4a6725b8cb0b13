use crate::error::ValidationError;
use crate::schema::{attendance, staff, students};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::Sqlite;
use std::fmt;
use std::str::FromStr;

/// Whether a student was in a session. Stored as `Present` / `Absent` text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum Status {
    Present,
    Absent,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Present => "Present",
            Status::Absent => "Absent",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ValidationError;

    /// Accepts the stored spelling in any case, plus the `P` / `A` shorthands.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "present" | "p" => Ok(Status::Present),
            "absent" | "a" => Ok(Status::Absent),
            _ => Err(ValidationError::UnknownStatus(s.to_string())),
        }
    }
}

impl ToSql<Text, Sqlite> for Status {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Sqlite> for Status {
    fn from_sql(bytes: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let value = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
        match value.as_str() {
            "Present" => Ok(Status::Present),
            "Absent" => Ok(Status::Absent),
            other => Err(format!("unrecognized attendance status '{other}'").into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = staff)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Staff {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub department: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = staff)]
pub struct NewStaff<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub department: &'a str,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = students)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Student {
    pub id: i32,
    pub roll_no: String,
    pub name: String,
    pub division: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = students)]
pub struct NewStudent<'a> {
    pub roll_no: &'a str,
    pub name: &'a str,
    pub division: &'a str,
}

/// A single student's status for one session.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = attendance)]
#[diesel(belongs_to(Student))]
#[diesel(belongs_to(Staff, foreign_key = marked_by))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Attendance {
    pub id: i32,
    pub student_id: i32,
    pub date: NaiveDate,
    pub division: String,
    pub subject: String,
    pub status: Status,
    pub marked_by: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = attendance)]
pub struct NewAttendance<'a> {
    pub student_id: i32,
    pub date: NaiveDate,
    pub division: &'a str,
    pub subject: &'a str,
    pub status: Status,
    pub marked_by: i32,
}

/// Identifies one session: a division taking a subject on a date.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub division: String,
    pub subject: String,
    pub date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_long_and_short_forms() {
        assert_eq!("Present".parse::<Status>(), Ok(Status::Present));
        assert_eq!("absent".parse::<Status>(), Ok(Status::Absent));
        assert_eq!(" P ".parse::<Status>(), Ok(Status::Present));
        assert_eq!("a".parse::<Status>(), Ok(Status::Absent));
    }

    #[test]
    fn status_rejects_anything_else() {
        assert_eq!(
            "Excused".parse::<Status>(),
            Err(ValidationError::UnknownStatus("Excused".to_string()))
        );
    }
}
