//! Check-in and attendance count endpoints.
//!
//! Students submit the code they scanned from the lecturer's screen; the
//! lecturer's screen polls the count for its current session code.

use chrono::Utc;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{Route, State};

use super::{ApiError, api_error};
use crate::config::AttendanceConfig;
use crate::logged_json::LoggedJson;
use crate::models::{CheckInCount, CheckInInput, CheckInOutcome, CheckInResponse};
use crate::orm::DbConn;
use crate::orm::attendance::{count_check_ins, record_validated_check_in, validate_check_in};
use crate::orm::prepare_connection;
use crate::session_token::SessionRegistry;

/// Query string for the count endpoint.
#[derive(Debug, FromForm)]
pub struct CountQuery {
    #[field(name = "sessionCode")]
    pub session_code: Option<String>,
}

/// Record Check-in endpoint.
///
/// - **URL:** `/api/1/Attendance`
/// - **Method:** `POST`
/// - **Purpose:** Records that a student attended the session identified by a session code
/// - **Authentication:** None (identity is supplied by the caller)
///
/// A student gets at most one record per session code. Submitting the same
/// code again is not an error: the response reports `ALREADY_CHECKED_IN`
/// and nothing is written.
///
/// # Request Format
///
/// ```json
/// {
///   "studentId": "s1",
///   "studentName": "Ama Mensah",
///   "courseCode": "CS101",
///   "sessionCode": "CS101-1760000000000"
/// }
/// ```
///
/// `studentName` is optional.
///
/// # Response
///
/// **Success (HTTP 201 Created):**
/// ```json
/// {
///   "outcome": "RECORDED",
///   "message": "Attendance recorded successfully",
///   "record": {
///     "id": 1,
///     "studentId": "s1",
///     "studentName": "Ama Mensah",
///     "courseCode": "CS101",
///     "sessionCode": "CS101-1760000000000",
///     "timestamp": "2026-10-17T09:00:00"
///   }
/// }
/// ```
///
/// **Already checked in (HTTP 200 OK):**
/// ```json
/// { "outcome": "ALREADY_CHECKED_IN", "message": "Already checked in" }
/// ```
///
/// **Failure Responses:**
/// - `400 Bad Request` - `studentId`, `courseCode` or `sessionCode` missing
/// - `403 Forbidden` - Session code not issued by a live session (only when
///   `enforce_active_sessions` is enabled)
/// - `500 Internal Server Error` - Database failure
#[post("/1/Attendance", data = "<input>")]
pub async fn record_attendance(
    db: DbConn,
    config: &State<AttendanceConfig>,
    registry: &State<SessionRegistry>,
    input: LoggedJson<CheckInInput>,
) -> Result<status::Custom<Json<CheckInResponse>>, ApiError> {
    let now = Utc::now();
    let record = validate_check_in(&input, &config.placeholder_student_name, now.naive_utc())
        .map_err(|e| api_error(Status::BadRequest, e.to_string()))?;

    if config.enforce_active_sessions
        && !registry.accepts_token(&record.course_code, &record.session_code, now)
    {
        warn!(
            "Rejected check-in for student {} with inactive session code {}",
            record.student_id, record.session_code
        );
        return Err(api_error(Status::Forbidden, "Session code is not active"));
    }

    let busy_timeout_ms = config.busy_timeout_ms;
    let outcome = db
        .run(move |conn| {
            prepare_connection(conn, busy_timeout_ms)?;
            record_validated_check_in(conn, record)
        })
        .await;

    match outcome {
        Ok(outcome @ CheckInOutcome::Recorded(_)) => {
            Ok(status::Custom(Status::Created, Json(outcome.into())))
        }
        Ok(outcome @ CheckInOutcome::AlreadyCheckedIn) => {
            Ok(status::Custom(Status::Ok, Json(outcome.into())))
        }
        Err(e) => {
            error!("Error recording attendance: {:?}", e);
            Err(api_error(
                Status::InternalServerError,
                "Database error while recording attendance",
            ))
        }
    }
}

/// Attendance Count endpoint.
///
/// - **URL:** `/api/1/Attendance/Count?sessionCode=<code>`
/// - **Method:** `GET`
/// - **Purpose:** Number of students checked in with a session code
///
/// Unknown session codes count zero.
///
/// **Success (HTTP 200 OK):**
/// ```json
/// { "count": 12 }
/// ```
///
/// **Failure Responses:**
/// - `400 Bad Request` - `sessionCode` missing or blank
/// - `500 Internal Server Error` - Database failure
#[get("/1/Attendance/Count?<query..>")]
pub async fn count_attendance(
    db: DbConn,
    config: &State<AttendanceConfig>,
    query: CountQuery,
) -> Result<Json<CheckInCount>, ApiError> {
    let session_code = query
        .session_code
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty())
        .ok_or_else(|| api_error(Status::BadRequest, "Session code is required"))?;

    let busy_timeout_ms = config.busy_timeout_ms;
    db.run(move |conn| {
        prepare_connection(conn, busy_timeout_ms)?;
        count_check_ins(conn, &session_code)
    })
    .await
    .map(|count| Json(CheckInCount { count }))
    .map_err(|e| {
        error!("Error counting attendance: {:?}", e);
        api_error(Status::InternalServerError, "Database error while counting attendance")
    })
}

pub fn routes() -> Vec<Route> {
    routes![record_attendance, count_attendance]
}
