use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::session_token::AttendanceSession;

/// Body of a request to open an attendance window for a course.
///
/// Omitted durations fall back to the configured defaults.
#[derive(Debug, Default, Clone, Deserialize, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StartSessionInput {
    pub course_code: Option<String>,
    pub duration_seconds: Option<u64>,
    pub rotation_interval_seconds: Option<u64>,
}

/// What the lecturer's screen needs to render the QR code and countdown.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SessionView {
    #[ts(type = "string")]
    pub id: Uuid,
    pub course_code: String,
    /// Current QR payload; absent once the session has expired.
    pub token: Option<String>,
    #[ts(type = "string")]
    pub started_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub expires_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub next_rotation: Option<DateTime<Utc>>,
    pub seconds_remaining: i64,
    pub rotation_interval_seconds: i64,
}

impl SessionView {
    pub fn at(session: &AttendanceSession, now: DateTime<Utc>) -> Self {
        SessionView {
            id: session.id,
            course_code: session.course_code.clone(),
            token: session.current_token(now),
            started_at: session.started_at,
            expires_at: session.expires_at(),
            next_rotation: session.next_rotation(now),
            seconds_remaining: session.remaining(now).num_seconds(),
            rotation_interval_seconds: session.rotation_interval.num_seconds(),
        }
    }
}
