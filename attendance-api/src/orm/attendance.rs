//! Check-in recording and counting.
//!
//! The unique index on `(student_id, session_code)` is what guarantees one
//! record per student per session. The lookup before the insert only saves a
//! failed write in the common case; when two submissions race past it, the
//! loser's unique violation is reported as [`CheckInOutcome::AlreadyCheckedIn`].

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

use crate::models::{AttendanceRecord, CheckInInput, CheckInOutcome, NewAttendanceRecord};

#[derive(Error, Debug)]
pub enum CheckInError {
    /// A required field was missing or blank. Nothing was written.
    #[error("{0}")]
    Validation(String),
    #[error("Database error while recording attendance: {0}")]
    Storage(#[from] DieselError),
}

/// Returns the trimmed value if it is present and not blank.
fn required(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Checks a submission and turns it into an insertable record stamped with
/// `timestamp`.
///
/// `student_id`, `course_code` and `session_code` are required. A missing or
/// blank `student_name` is replaced with `placeholder_name`. The session code
/// is not checked against any live session here.
pub fn validate_check_in(
    input: &CheckInInput,
    placeholder_name: &str,
    timestamp: NaiveDateTime,
) -> Result<NewAttendanceRecord, CheckInError> {
    let mut missing = Vec::new();
    let student_id = required(&input.student_id);
    let course_code = required(&input.course_code);
    let session_code = required(&input.session_code);

    if student_id.is_none() {
        missing.push("studentId");
    }
    if course_code.is_none() {
        missing.push("courseCode");
    }
    if session_code.is_none() {
        missing.push("sessionCode");
    }

    match (student_id, course_code, session_code) {
        (Some(student_id), Some(course_code), Some(session_code)) => Ok(NewAttendanceRecord {
            student_id,
            student_name: required(&input.student_name)
                .unwrap_or_else(|| placeholder_name.to_string()),
            course_code,
            session_code,
            timestamp,
        }),
        _ => Err(CheckInError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        ))),
    }
}

/// Looks up the record for a student and session code, if any.
pub fn find_check_in(
    conn: &mut SqliteConnection,
    student: &str,
    session: &str,
) -> Result<Option<AttendanceRecord>, DieselError> {
    use crate::schema::attendance_records::dsl::*;
    attendance_records
        .filter(student_id.eq(student))
        .filter(session_code.eq(session))
        .select(AttendanceRecord::as_select())
        .first(conn)
        .optional()
}

/// Inserts a record, treating a unique violation as an existing check-in.
///
/// This is the only place that decides whether a duplicate happened; callers
/// never see a raw duplicate-key error.
pub fn insert_check_in(
    conn: &mut SqliteConnection,
    record: NewAttendanceRecord,
) -> Result<CheckInOutcome, DieselError> {
    use crate::schema::attendance_records::dsl::*;

    match diesel::insert_into(attendance_records)
        .values(&record)
        .execute(conn)
    {
        Ok(_) => {}
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            info!(
                "Duplicate check-in for student {} on session {} lost the insert race",
                record.student_id, record.session_code
            );
            return Ok(CheckInOutcome::AlreadyCheckedIn);
        }
        Err(e) => return Err(e),
    }

    // (student_id, session_code) is unique, so this reads back our own row.
    let stored = attendance_records
        .filter(student_id.eq(&record.student_id))
        .filter(session_code.eq(&record.session_code))
        .select(AttendanceRecord::as_select())
        .first(conn)?;
    Ok(CheckInOutcome::Recorded(stored))
}

/// Records an already validated check-in at most once.
pub fn record_validated_check_in(
    conn: &mut SqliteConnection,
    record: NewAttendanceRecord,
) -> Result<CheckInOutcome, DieselError> {
    if find_check_in(conn, &record.student_id, &record.session_code)?.is_some() {
        return Ok(CheckInOutcome::AlreadyCheckedIn);
    }
    insert_check_in(conn, record)
}

/// Validates and records a check-in submission.
///
/// # Returns
/// * `Ok(CheckInOutcome::Recorded(record))` - A new record was stored
/// * `Ok(CheckInOutcome::AlreadyCheckedIn)` - The student already has a record for this session code
/// * `Err(CheckInError::Validation(_))` - A required field was missing
/// * `Err(CheckInError::Storage(_))` - The database failed
pub fn record_check_in(
    conn: &mut SqliteConnection,
    input: &CheckInInput,
    placeholder_name: &str,
) -> Result<CheckInOutcome, CheckInError> {
    let record = validate_check_in(input, placeholder_name, Utc::now().naive_utc())?;
    Ok(record_validated_check_in(conn, record)?)
}

/// Number of check-ins recorded for a session code. Unknown codes count 0.
pub fn count_check_ins(conn: &mut SqliteConnection, session: &str) -> Result<i64, DieselError> {
    use crate::schema::attendance_records::dsl::*;
    attendance_records
        .filter(session_code.eq(session))
        .count()
        .get_result(conn)
}
