use diesel::connection::SimpleConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use rocket::fairing::AdHoc;
use rocket_sync_db_pools::{database, diesel};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[database("sqlite_db")]
pub struct DbConn(diesel::SqliteConnection);

/// Prepares a pooled SQLite connection for use by a request.
///
/// Foreign keys and the busy timeout are per-connection settings in SQLite,
/// so they are applied every time a handler takes a connection from the
/// pool. With a busy timeout, concurrent check-ins wait for the writer ahead
/// of them instead of failing with `SQLITE_BUSY`.
///
/// # Arguments
/// * `conn` - A mutable reference to a SQLite database connection
/// * `busy_timeout_ms` - Milliseconds to wait on a locked database
pub fn prepare_connection(
    conn: &mut diesel::SqliteConnection,
    busy_timeout_ms: u64,
) -> Result<(), diesel::result::Error> {
    conn.batch_execute(&format!(
        "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
        busy_timeout_ms
    ))
}

/// Runs all pending database migrations on the provided connection.
///
/// # Arguments
/// * `conn` - A mutable reference to a SQLite database connection
///
/// # Panics
/// Panics if any migration fails to run
pub fn run_pending_migrations(conn: &mut diesel::SqliteConnection) {
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run pending migrations");
}

/// Creates a Rocket fairing that runs database migrations on ignition.
///
/// This fairing ensures the attendance and course request tables exist
/// before the first request is served.
pub fn run_migrations_fairing() -> AdHoc {
    AdHoc::on_ignite("Diesel Migrations", |rocket| async {
        // Get a database connection from Rocket's pool
        let conn = DbConn::get_one(&rocket)
            .await
            .expect("database connection for migration");
        conn.run(|c| {
            run_pending_migrations(c);
        })
        .await;
        rocket
    })
}
