//! Attendance session endpoints used by the lecturer's QR screen.
//!
//! A session is opened with a course code, shows a token that rotates on a
//! fixed interval, and stops issuing tokens once its duration has elapsed.
//! Sessions live in memory only.

use chrono::Utc;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{Route, State};
use uuid::Uuid;

use super::{ApiError, api_error};
use crate::config::AttendanceConfig;
use crate::logged_json::LoggedJson;
use crate::models::{SessionView, StartSessionInput};
use crate::session_token::SessionRegistry;

fn parse_session_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| api_error(Status::NotFound, "Session not found"))
}

/// Start Session endpoint.
///
/// - **URL:** `/api/1/Sessions`
/// - **Method:** `POST`
/// - **Purpose:** Opens an attendance window for a course
///
/// # Request Format
///
/// ```json
/// {
///   "courseCode": "CS101",
///   "durationSeconds": 300,
///   "rotationIntervalSeconds": 10
/// }
/// ```
///
/// Both durations are optional and default to the configured values.
///
/// # Response
///
/// **Success (HTTP 201 Created):**
/// ```json
/// {
///   "id": "6f1c...",
///   "courseCode": "CS101",
///   "token": "CS101-1760691600000",
///   "startedAt": "2026-10-17T09:00:00Z",
///   "expiresAt": "2026-10-17T09:05:00Z",
///   "nextRotation": "2026-10-17T09:00:10Z",
///   "secondsRemaining": 300,
///   "rotationIntervalSeconds": 10
/// }
/// ```
///
/// **Failure Responses:**
/// - `400 Bad Request` - Missing course code, zero durations, or a duration above the maximum
#[post("/1/Sessions", data = "<input>")]
pub fn start_session(
    config: &State<AttendanceConfig>,
    registry: &State<SessionRegistry>,
    input: LoggedJson<StartSessionInput>,
) -> Result<status::Created<Json<SessionView>>, ApiError> {
    let input = input.into_inner();
    let now = Utc::now();

    let session = registry
        .start(
            input.course_code.as_deref().unwrap_or_default(),
            input.duration_seconds.unwrap_or(config.default_duration_secs),
            input
                .rotation_interval_seconds
                .unwrap_or(config.rotation_interval_secs),
            config.max_duration_secs,
            now,
        )
        .map_err(|e| api_error(Status::BadRequest, e.to_string()))?;

    info!(
        "Started attendance session {} for {} ({}s, rotating every {}s)",
        session.id,
        session.course_code,
        session.duration.num_seconds(),
        session.rotation_interval.num_seconds()
    );

    let location = format!("/api/1/Sessions/{}", session.id);
    Ok(status::Created::new(location).body(Json(SessionView::at(&session, now))))
}

/// Current Token endpoint.
///
/// - **URL:** `/api/1/Sessions/<id>`
/// - **Method:** `GET`
/// - **Purpose:** Returns the token to display now and when it next changes
///
/// **Failure Responses:**
/// - `404 Not Found` - Unknown or ended session
/// - `410 Gone` - The session has run out of time
#[get("/1/Sessions/<id>")]
pub fn get_session(id: &str, registry: &State<SessionRegistry>) -> Result<Json<SessionView>, ApiError> {
    let id = parse_session_id(id)?;
    let session = registry
        .get(&id)
        .ok_or_else(|| api_error(Status::NotFound, "Session not found"))?;

    let now = Utc::now();
    if session.is_expired(now) {
        return Err(api_error(Status::Gone, "Session has expired"));
    }
    Ok(Json(SessionView::at(&session, now)))
}

/// End Session endpoint.
///
/// - **URL:** `/api/1/Sessions/<id>`
/// - **Method:** `DELETE`
/// - **Purpose:** Closes a session before its time runs out
///
/// Returns `204 No Content`, or `404 Not Found` for an unknown session.
#[delete("/1/Sessions/<id>")]
pub fn end_session(id: &str, registry: &State<SessionRegistry>) -> Result<Status, ApiError> {
    let id = parse_session_id(id)?;
    if registry.end(&id) {
        info!("Ended attendance session {}", id);
        Ok(Status::NoContent)
    } else {
        Err(api_error(Status::NotFound, "Session not found"))
    }
}

pub fn routes() -> Vec<Route> {
    routes![start_session, get_session, end_session]
}
