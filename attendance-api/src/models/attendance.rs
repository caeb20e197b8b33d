use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::attendance_records;

/// One student's check-in against one session code.
///
/// `(student_id, session_code)` is unique at the storage level. Records are
/// written once and never updated.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[diesel(table_name = attendance_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AttendanceRecord {
    pub id: i32,
    pub student_id: String,
    /// Name snapshot taken at check-in time.
    pub student_name: String,
    pub course_code: String,
    pub session_code: String,
    #[ts(type = "string")]
    pub timestamp: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = attendance_records)]
pub struct NewAttendanceRecord {
    pub student_id: String,
    pub student_name: String,
    pub course_code: String,
    pub session_code: String,
    pub timestamp: NaiveDateTime,
}

// For API inputs and validation. Every field is optional so that a missing
// field reaches our own validation instead of failing JSON parsing.
#[derive(Debug, Default, Clone, Deserialize, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckInInput {
    pub student_id: Option<String>,
    pub student_name: Option<String>,
    pub course_code: Option<String>,
    pub session_code: Option<String>,
}

/// Outcome of a check-in attempt that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckInOutcome {
    Recorded(AttendanceRecord),
    AlreadyCheckedIn,
}

impl CheckInOutcome {
    pub fn kind(&self) -> CheckInOutcomeKind {
        match self {
            CheckInOutcome::Recorded(_) => CheckInOutcomeKind::Recorded,
            CheckInOutcome::AlreadyCheckedIn => CheckInOutcomeKind::AlreadyCheckedIn,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum CheckInOutcomeKind {
    Recorded,
    AlreadyCheckedIn,
}

/// Response body for the check-in endpoint.
#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckInResponse {
    pub outcome: CheckInOutcomeKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub record: Option<AttendanceRecord>,
}

impl From<CheckInOutcome> for CheckInResponse {
    fn from(outcome: CheckInOutcome) -> Self {
        match outcome {
            CheckInOutcome::Recorded(record) => CheckInResponse {
                outcome: CheckInOutcomeKind::Recorded,
                message: "Attendance recorded successfully".to_string(),
                record: Some(record),
            },
            CheckInOutcome::AlreadyCheckedIn => CheckInResponse {
                outcome: CheckInOutcomeKind::AlreadyCheckedIn,
                message: "Already checked in".to_string(),
                record: None,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckInCount {
    pub count: i64,
}
