//! Database and Rocket fixtures shared by unit and integration tests.

use std::path::PathBuf;

use diesel::Connection;
use diesel::sqlite::SqliteConnection;
use rocket::figment::{
    util::map,
    value::{Map, Value},
};
use rocket::{Build, Rocket};
use uuid::Uuid;

use super::db::{DbConn, prepare_connection, run_migrations_fairing, run_pending_migrations};
use crate::config::{AttendanceConfig, attendance_config_fairing};
use crate::session_token::SessionRegistry;

/// Creates a synchronous in-memory SQLite database connection for unit tests.
///
/// This function returns a `diesel::SqliteConnection` connected to an in-memory
/// SQLite database with all embedded migrations applied. Each call returns a
/// new, independent database.
pub fn setup_test_db() -> SqliteConnection {
    let mut conn = SqliteConnection::establish(":memory:")
        .expect("Failed to create in-memory SQLite database");
    prepare_connection(&mut conn, 5000).expect("Failed to prepare test connection");
    run_pending_migrations(&mut conn);
    conn
}

/// A migrated SQLite file in the system temp directory, removed on drop.
///
/// Unlike [`setup_test_db`], several connections opened with
/// [`TempDb::connect`] see the same data, which is what concurrency tests
/// need.
pub struct TempDb {
    path: PathBuf,
}

impl TempDb {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("attendance_test_{}.db", Uuid::new_v4()));
        let db = TempDb { path };
        let mut conn = db.connect();
        run_pending_migrations(&mut conn);
        db
    }

    pub fn url(&self) -> String {
        self.path.to_string_lossy().to_string()
    }

    /// Opens a new connection with the busy timeout the server uses.
    pub fn connect(&self) -> SqliteConnection {
        let mut conn =
            SqliteConnection::establish(&self.url()).expect("Failed to open temp SQLite database");
        prepare_connection(&mut conn, 5000).expect("Failed to prepare test connection");
        conn
    }
}

impl Default for TempDb {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Creates a Rocket instance for testing backed by a private in-memory
/// database and default [`AttendanceConfig`].
///
/// The returned Rocket instance will have:
/// - A uniquely named shared-cache in-memory SQLite database
/// - Database connection pool attached
/// - All migrations run
/// - An empty session registry
/// - API routes mounted
pub fn test_rocket() -> Rocket<Build> {
    test_rocket_with(AttendanceConfig::default())
}

/// Same as [`test_rocket`] with the given attendance settings.
pub fn test_rocket_with(config: AttendanceConfig) -> Rocket<Build> {
    // Unique name so parallel tests never share a database.
    let unique_db_name = format!("file:test_db_{}?mode=memory&cache=shared", Uuid::new_v4());

    // A single pooled connection keeps shared-cache table locks out of the
    // picture; requests queue for it instead.
    build_test_rocket(unique_db_name, 1, config)
}

/// Creates a Rocket instance whose pool holds several connections to the
/// file behind `db`, so requests really run against SQLite concurrently.
///
/// `db` must outlive the client built from the returned Rocket.
pub fn test_rocket_on_file(db: &TempDb, pool_size: u32) -> Rocket<Build> {
    build_test_rocket(db.url(), pool_size, AttendanceConfig::default())
}

fn build_test_rocket(url: String, pool_size: u32, config: AttendanceConfig) -> Rocket<Build> {
    let db_config: Map<_, Value> = map! {
        "url" => url.into(),
        "pool_size" => pool_size.into(),
        "timeout" => 5.into(),
    };

    let figment = rocket::Config::figment()
        .merge(("databases", map!["sqlite_db" => db_config]))
        .merge(("attendance", config));

    let rocket = rocket::custom(figment)
        .attach(DbConn::fairing())
        .attach(run_migrations_fairing())
        .attach(attendance_config_fairing())
        .manage(SessionRegistry::new());

    crate::register_catchers(crate::mount_api_routes(rocket))
}
