//! Service settings read from the `attendance` table of Rocket's figment.
//!
//! ```toml
//! [default.attendance]
//! rotation_interval_secs = 10
//! default_duration_secs = 60
//! enforce_active_sessions = false
//! ```
//!
//! Every key is optional; missing keys take the defaults below. The same
//! values can be set from the environment, e.g.
//! `ROCKET_ATTENDANCE={enforce_active_sessions=true}`.

use rocket::fairing::AdHoc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AttendanceConfig {
    /// Seconds between token rotations when a session does not specify one.
    pub rotation_interval_secs: u64,
    /// Session length when a session does not specify one.
    pub default_duration_secs: u64,
    pub max_duration_secs: u64,
    /// Reject check-ins whose session code is not issued by a live session.
    pub enforce_active_sessions: bool,
    /// Stored when a check-in arrives without a student name.
    pub placeholder_student_name: String,
    /// How long a connection waits on a locked database before failing.
    pub busy_timeout_ms: u64,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        AttendanceConfig {
            rotation_interval_secs: 10,
            default_duration_secs: 60,
            max_duration_secs: 4 * 60 * 60,
            enforce_active_sessions: false,
            placeholder_student_name: "Unknown Student".to_string(),
            busy_timeout_ms: 5000,
        }
    }
}

/// Creates a fairing that extracts [`AttendanceConfig`] from the figment and
/// places it in managed state.
///
/// A malformed `attendance` table is logged and replaced by the defaults
/// rather than aborting launch.
pub fn attendance_config_fairing() -> AdHoc {
    AdHoc::on_ignite("Attendance Config", |rocket| async {
        let config = match rocket.figment().extract_inner::<AttendanceConfig>("attendance") {
            Ok(config) => config,
            Err(e) if e.missing() => AttendanceConfig::default(),
            Err(e) => {
                warn!("Invalid attendance configuration, using defaults: {}", e);
                AttendanceConfig::default()
            }
        };

        info!(
            "Attendance config: rotation {}s, default duration {}s, enforce active sessions: {}",
            config.rotation_interval_secs, config.default_duration_secs, config.enforce_active_sessions
        );

        rocket.manage(config)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::figment::Figment;
    use rocket::figment::providers::Serialized;

    #[test]
    fn test_partial_table_keeps_other_defaults() {
        let figment = Figment::new().merge(Serialized::default(
            "attendance",
            serde_json::json!({ "rotation_interval_secs": 30 }),
        ));
        let config: AttendanceConfig = figment.extract_inner("attendance").unwrap();

        assert_eq!(config.rotation_interval_secs, 30);
        assert_eq!(config.default_duration_secs, 60);
        assert!(!config.enforce_active_sessions);
        assert_eq!(config.placeholder_student_name, "Unknown Student");
    }

    #[rocket::async_test]
    async fn test_fairing_manages_defaults_when_table_missing() {
        let rocket = rocket::custom(Figment::from(rocket::Config::default()))
            .attach(attendance_config_fairing())
            .ignite()
            .await
            .expect("rocket ignites");

        assert_eq!(rocket.state::<AttendanceConfig>(), Some(&AttendanceConfig::default()));
    }
}
