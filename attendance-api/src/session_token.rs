//! Rotating check-in tokens for lecturer-run attendance sessions.
//!
//! A session owns its rotation schedule explicitly: the token shown at any
//! instant is a pure function of the course code and the start of the
//! rotation bucket that instant falls in, so nothing has to poll a clock to
//! keep the token "fresh". Tokens have the shape `<courseCode>-<millis>`,
//! where `millis` is the Unix time of the bucket start.
//!
//! Tokens are derived from public information and are therefore guessable.
//! The check-in recorder trusts any token unless the service is configured
//! to check submissions against the live sessions held in
//! [`SessionRegistry`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Course code is required")]
    MissingCourseCode,
    #[error("Session duration must be greater than zero")]
    ZeroDuration,
    #[error("Rotation interval must be greater than zero")]
    ZeroRotationInterval,
    #[error("Session duration may not exceed {max} seconds")]
    DurationTooLong { max: u64 },
}

/// Builds the token for a course and a rotation bucket start.
pub fn token_for(course_code: &str, rotation_start: DateTime<Utc>) -> String {
    format!("{}-{}", course_code, rotation_start.timestamp_millis())
}

/// An attendance window opened by a lecturer for one course.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceSession {
    pub id: Uuid,
    pub course_code: String,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub rotation_interval: Duration,
}

impl AttendanceSession {
    /// Creates a session starting at `started_at`.
    ///
    /// A rotation interval longer than the session is clamped to the session
    /// duration, which yields a single token for the whole window.
    pub fn new(
        course_code: &str,
        started_at: DateTime<Utc>,
        duration_secs: u64,
        rotation_interval_secs: u64,
        max_duration_secs: u64,
    ) -> Result<Self, SessionError> {
        let course_code = course_code.trim();
        if course_code.is_empty() {
            return Err(SessionError::MissingCourseCode);
        }
        if duration_secs == 0 {
            return Err(SessionError::ZeroDuration);
        }
        if rotation_interval_secs == 0 {
            return Err(SessionError::ZeroRotationInterval);
        }
        if duration_secs > max_duration_secs {
            return Err(SessionError::DurationTooLong {
                max: max_duration_secs,
            });
        }

        let too_long = SessionError::DurationTooLong {
            max: max_duration_secs,
        };
        let duration = i64::try_from(duration_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| too_long.clone())?;
        let rotation_interval = i64::try_from(rotation_interval_secs.min(duration_secs))
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| too_long.clone())?;
        // Rejects durations that would push the expiry past chrono's range.
        started_at.checked_add_signed(duration).ok_or(too_long)?;

        Ok(AttendanceSession {
            id: Uuid::new_v4(),
            course_code: course_code.to_string(),
            started_at,
            duration,
            rotation_interval,
        })
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.started_at + self.duration
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    /// Time left before the session stops issuing tokens. Never negative.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at() - now).max(Duration::zero())
    }

    /// Zero-based index of the rotation bucket `now` falls into. Instants
    /// before the start count as the first bucket.
    fn rotation_index(&self, now: DateTime<Utc>) -> i64 {
        let elapsed_ms = (now - self.started_at).num_milliseconds().max(0);
        elapsed_ms / self.rotation_interval.num_milliseconds()
    }

    fn bucket_start(&self, index: i64) -> DateTime<Utc> {
        self.started_at + Duration::milliseconds(index * self.rotation_interval.num_milliseconds())
    }

    /// Token the lecturer should be displaying at `now`, or `None` once the
    /// session has expired.
    pub fn current_token(&self, now: DateTime<Utc>) -> Option<String> {
        if self.is_expired(now) {
            return None;
        }
        Some(token_for(&self.course_code, self.bucket_start(self.rotation_index(now))))
    }

    /// When the displayed token will next change. `None` if the current token
    /// is the last one this session will issue.
    pub fn next_rotation(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.is_expired(now) {
            return None;
        }
        let next = self.bucket_start(self.rotation_index(now) + 1);
        (next < self.expires_at()).then_some(next)
    }

    /// Whether a submitted token belongs to this live session.
    ///
    /// The token from the previous rotation is still honoured so that a scan
    /// taken just before a rotation is not rejected.
    pub fn accepts(&self, course_code: &str, token: &str, now: DateTime<Utc>) -> bool {
        if self.is_expired(now) || self.course_code != course_code.trim() {
            return false;
        }
        let index = self.rotation_index(now);
        let token = token.trim();
        if token == token_for(&self.course_code, self.bucket_start(index)) {
            return true;
        }
        index > 0 && token == token_for(&self.course_code, self.bucket_start(index - 1))
    }
}

/// Live attendance sessions, keyed by handle.
///
/// Held in Rocket managed state. Sessions are kept in memory only; a restart
/// forgets them, exactly as a lecturer closing the QR screen would.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, AttendanceSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, AttendanceSession>> {
        // A panic while holding the lock cannot leave the map half-written.
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens a new session and drops any that have already expired.
    pub fn start(
        &self,
        course_code: &str,
        duration_secs: u64,
        rotation_interval_secs: u64,
        max_duration_secs: u64,
        now: DateTime<Utc>,
    ) -> Result<AttendanceSession, SessionError> {
        let session = AttendanceSession::new(
            course_code,
            now,
            duration_secs,
            rotation_interval_secs,
            max_duration_secs,
        )?;

        self.purge_expired(now);
        self.lock().insert(session.id, session.clone());
        Ok(session)
    }

    pub fn get(&self, id: &Uuid) -> Option<AttendanceSession> {
        self.lock().get(id).cloned()
    }

    /// Ends a session early. Returns false if the handle was unknown.
    pub fn end(&self, id: &Uuid) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Removes expired sessions, returning how many were dropped.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        before - sessions.len()
    }

    /// Whether any live session for `course_code` currently accepts `token`.
    pub fn accepts_token(&self, course_code: &str, token: &str, now: DateTime<Utc>) -> bool {
        self.lock()
            .values()
            .any(|session| session.accepts(course_code, token, now))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start_time() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_000_000).single().expect("valid timestamp")
    }

    fn session(duration: u64, interval: u64) -> AttendanceSession {
        AttendanceSession::new("CS101", start_time(), duration, interval, 3600)
            .expect("valid session")
    }

    #[test]
    fn test_token_is_course_code_and_bucket_millis() {
        let s = session(60, 10);
        assert_eq!(s.current_token(start_time()).as_deref(), Some("CS101-1000000"));
    }

    #[test]
    fn test_token_rotates_on_interval() {
        let s = session(60, 10);
        let t0 = s.current_token(start_time()).unwrap();
        let t9 = s.current_token(start_time() + Duration::milliseconds(9_999)).unwrap();
        let t10 = s.current_token(start_time() + Duration::seconds(10)).unwrap();

        assert_eq!(t0, t9, "token is stable within a bucket");
        assert_ne!(t0, t10, "token changes at the rotation boundary");
        assert_eq!(t10, "CS101-1010000");
        assert!(t10.starts_with("CS101-"));
    }

    #[test]
    fn test_next_rotation_and_expiry() {
        let s = session(25, 10);
        let now = start_time() + Duration::seconds(3);
        assert_eq!(s.next_rotation(now), Some(start_time() + Duration::seconds(10)));

        // The last bucket (20s..25s) has no further rotation.
        let late = start_time() + Duration::seconds(21);
        assert!(s.current_token(late).is_some());
        assert_eq!(s.next_rotation(late), None);

        let end = start_time() + Duration::seconds(25);
        assert!(s.is_expired(end));
        assert_eq!(s.current_token(end), None);
        assert_eq!(s.remaining(end + Duration::seconds(5)), Duration::zero());
    }

    #[test]
    fn test_interval_longer_than_duration_gives_single_token() {
        let s = session(5, 30);
        assert_eq!(s.rotation_interval, Duration::seconds(5));
        assert_eq!(s.next_rotation(start_time()), None);
    }

    #[test]
    fn test_new_session_validation() {
        assert_eq!(
            AttendanceSession::new("  ", start_time(), 60, 10, 3600),
            Err(SessionError::MissingCourseCode)
        );
        assert_eq!(
            AttendanceSession::new("CS101", start_time(), 0, 10, 3600),
            Err(SessionError::ZeroDuration)
        );
        assert_eq!(
            AttendanceSession::new("CS101", start_time(), 60, 0, 3600),
            Err(SessionError::ZeroRotationInterval)
        );
        assert_eq!(
            AttendanceSession::new("CS101", start_time(), 7200, 10, 3600),
            Err(SessionError::DurationTooLong { max: 3600 })
        );
    }

    #[test]
    fn test_duration_beyond_calendar_range_is_rejected() {
        // Fits in a chrono Duration but not in a DateTime.
        let huge = 9_000_000_000_000;
        assert_eq!(
            AttendanceSession::new("CS101", start_time(), huge, 10, u64::MAX),
            Err(SessionError::DurationTooLong { max: u64::MAX })
        );
    }

    #[test]
    fn test_accepts_current_and_previous_token_only() {
        let s = session(60, 10);
        let first = s.current_token(start_time()).unwrap();
        let second_at = start_time() + Duration::seconds(10);
        let second = s.current_token(second_at).unwrap();
        let third_at = start_time() + Duration::seconds(20);

        assert!(s.accepts("CS101", &first, start_time()));
        assert!(s.accepts("CS101", &first, second_at), "previous token has grace");
        assert!(!s.accepts("CS101", &first, third_at), "older tokens are rejected");
        assert!(s.accepts("CS101", &second, third_at));
        assert!(!s.accepts("CS102", &second, second_at), "course must match");
        assert!(!s.accepts("CS101", "CS101-42", second_at));
        assert!(!s.accepts("CS101", &second, start_time() + Duration::seconds(60)));
    }

    #[test]
    fn test_registry_start_get_end() {
        let registry = SessionRegistry::new();
        let now = Utc::now();
        let s = registry.start("CS101", 60, 10, 3600, now).unwrap();

        assert_eq!(registry.get(&s.id).map(|found| found.course_code), Some("CS101".to_string()));
        let token = s.current_token(now).unwrap();
        assert!(registry.accepts_token("CS101", &token, now));

        assert!(registry.end(&s.id));
        assert!(!registry.end(&s.id));
        assert!(registry.get(&s.id).is_none());
        assert!(!registry.accepts_token("CS101", &token, now));
    }

    #[test]
    fn test_registry_drops_expired_sessions() {
        let registry = SessionRegistry::new();
        let then = Utc::now() - Duration::seconds(120);
        registry.start("CS101", 60, 10, 3600, then).unwrap();
        registry.start("CS102", 600, 10, 3600, then).unwrap();
        assert_eq!(registry.len(), 2);

        assert_eq!(registry.purge_expired(Utc::now()), 1);
        assert_eq!(registry.len(), 1);

        // Starting a new session also sweeps.
        registry.start("CS103", 60, 10, 3600, Utc::now() + Duration::seconds(3600)).unwrap();
        assert_eq!(registry.len(), 1);
    }
}
