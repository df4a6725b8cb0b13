use crate::error::{AttendanceError, AttendanceResult, ValidationError};
use crate::models::{
    Attendance, NewAttendance, NewStaff, NewStudent, SessionKey, Staff, Status, Student,
};
use crate::schema;
use chrono::NaiveDate;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info};

/// The SQL schema, applied every time a connection is opened.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// The manager for recording and retrieving attendance data.
///
/// Ownership rule: attendance rows belong to their student. Removing a student through
/// [`AttendanceManager::delete_student`] removes that student's attendance in the same
/// transaction.
pub struct AttendanceManager {
    db: SqliteConnection,
}

impl AttendanceManager {
    /// Creates a new `AttendanceManager` by connecting to the `sqlite3` database at
    /// `database_url`, enabling foreign keys and applying any pending migrations.
    pub fn connect(database_url: &str) -> AttendanceResult<Self> {
        let mut db = SqliteConnection::establish(database_url)?;

        db.batch_execute("PRAGMA foreign_keys = ON;")?;
        db.run_pending_migrations(MIGRATIONS)
            .map_err(AttendanceError::Migration)?;

        debug!(database_url, "connected to attendance database");

        Ok(Self { db })
    }

    /// Opens a private in-memory database. Every call gets a fresh, empty store.
    pub fn in_memory() -> AttendanceResult<Self> {
        Self::connect(":memory:")
    }

    /// Returns the total number of students on the roster.
    pub fn num_students(&mut self) -> AttendanceResult<usize> {
        use schema::students::dsl::*;

        let count: i64 = students.count().get_result(&mut self.db)?;
        Ok(count as usize)
    }

    /// Retrieves every student in insertion order.
    pub fn students(&mut self) -> AttendanceResult<Vec<Student>> {
        use schema::students::dsl::*;

        Ok(students
            .order(id)
            .select(Student::as_select())
            .load(&mut self.db)?)
    }

    /// Retrieves every student ordered by division, then roll number.
    pub fn all_students(&mut self) -> AttendanceResult<Vec<Student>> {
        use schema::students::dsl::*;

        Ok(students
            .order((division.asc(), roll_no.asc()))
            .select(Student::as_select())
            .load(&mut self.db)?)
    }

    /// Retrieves the roster of one division, ordered by roll number.
    pub fn roster(&mut self, division_name: &str) -> AttendanceResult<Vec<Student>> {
        use schema::students::dsl::*;

        Ok(students
            .filter(division.eq(division_name))
            .order(roll_no.asc())
            .select(Student::as_select())
            .load(&mut self.db)?)
    }

    pub fn student_by_roll(&mut self, roll: &str) -> AttendanceResult<Option<Student>> {
        use schema::students::dsl::*;

        Ok(students
            .filter(roll_no.eq(roll))
            .select(Student::as_select())
            .first(&mut self.db)
            .optional()?)
    }

    /// Inserts students into the database, returning how many rows were written.
    pub fn insert_students(&mut self, new_students: &[NewStudent<'_>]) -> AttendanceResult<usize> {
        if new_students.is_empty() {
            return Ok(0);
        }

        Ok(diesel::insert_into(schema::students::table)
            .values(new_students)
            .execute(&mut self.db)?)
    }

    /// Removes a student together with every attendance record they own.
    pub fn delete_student(&mut self, roll: &str) -> AttendanceResult<Student> {
        self.db.transaction(|conn| {
            let student = schema::students::table
                .filter(schema::students::roll_no.eq(roll))
                .select(Student::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| ValidationError::UnknownRollNumber(roll.to_string()))?;

            let records = diesel::delete(
                schema::attendance::table.filter(schema::attendance::student_id.eq(student.id)),
            )
            .execute(conn)?;

            diesel::delete(schema::students::table.find(student.id)).execute(conn)?;

            info!(roll_no = roll, records, "removed student and their attendance");

            Ok::<_, AttendanceError>(student)
        })
    }

    pub fn insert_staff(&mut self, new_staff: &NewStaff<'_>) -> AttendanceResult<Staff> {
        Ok(diesel::insert_into(schema::staff::table)
            .values(new_staff)
            .returning(Staff::as_returning())
            .get_result(&mut self.db)?)
    }

    pub fn find_staff_by_email(&mut self, address: &str) -> AttendanceResult<Option<Staff>> {
        use schema::staff::dsl::*;

        Ok(staff
            .filter(email.eq(address))
            .select(Staff::as_select())
            .first(&mut self.db)
            .optional()?)
    }

    /// Counts a student's recorded sessions, returning `(total, present)`.
    pub fn tally(&mut self, student: i32) -> AttendanceResult<(i64, i64)> {
        use schema::attendance::dsl::*;

        let total: i64 = attendance
            .filter(student_id.eq(student))
            .count()
            .get_result(&mut self.db)?;

        let present: i64 = attendance
            .filter(student_id.eq(student))
            .filter(status.eq(Status::Present))
            .count()
            .get_result(&mut self.db)?;

        Ok((total, present))
    }

    /// Counts the records dated `day` across all divisions and subjects, returning
    /// `(total, present)`.
    pub fn day_tally(&mut self, day: NaiveDate) -> AttendanceResult<(i64, i64)> {
        use schema::attendance::dsl::*;

        let total: i64 = attendance
            .filter(date.eq(day))
            .count()
            .get_result(&mut self.db)?;

        let present: i64 = attendance
            .filter(date.eq(day))
            .filter(status.eq(Status::Present))
            .count()
            .get_result(&mut self.db)?;

        Ok((total, present))
    }

    /// Every attendance record a student owns, oldest first.
    pub fn student_records(&mut self, student: &Student) -> AttendanceResult<Vec<Attendance>> {
        Ok(Attendance::belonging_to(student)
            .order((schema::attendance::date.asc(), schema::attendance::subject.asc()))
            .select(Attendance::as_select())
            .load(&mut self.db)?)
    }

    /// The stored records of one session, in roster order.
    pub fn session_records(&mut self, key: &SessionKey) -> AttendanceResult<Vec<Attendance>> {
        use schema::attendance::dsl::*;

        Ok(attendance
            .inner_join(schema::students::table)
            .filter(date.eq(key.date))
            .filter(division.eq(key.division.as_str()))
            .filter(subject.eq(key.subject.as_str()))
            .order(schema::students::roll_no.asc())
            .select(Attendance::as_select())
            .load(&mut self.db)?)
    }

    /// Replaces every record of a session with `entries`.
    ///
    /// The delete and the inserts run in one transaction: on failure the previous records are left
    /// untouched. Returns `(removed, inserted)`.
    pub fn replace_session(
        &mut self,
        key: &SessionKey,
        recorder: i32,
        entries: &[(i32, Status)],
    ) -> AttendanceResult<(usize, usize)> {
        use schema::attendance::dsl::*;

        let records: Vec<NewAttendance> = entries
            .iter()
            .map(|&(student, mark)| NewAttendance {
                student_id: student,
                date: key.date,
                division: &key.division,
                subject: &key.subject,
                status: mark,
                marked_by: recorder,
            })
            .collect();

        self.db.transaction(|conn| {
            let removed = diesel::delete(
                attendance
                    .filter(date.eq(key.date))
                    .filter(division.eq(key.division.as_str()))
                    .filter(subject.eq(key.subject.as_str())),
            )
            .execute(conn)?;

            let inserted = if records.is_empty() {
                0
            } else {
                diesel::insert_into(attendance)
                    .values(&records)
                    .execute(conn)?
            };

            Ok::<_, AttendanceError>((removed, inserted))
        })
    }
}
