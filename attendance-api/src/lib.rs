#[macro_use]
extern crate rocket;

use rocket::figment::value::Map;
use rocket::figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use rocket::request::Request;
use rocket::serde::json::{Json, Value, json};
use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod logged_json;
pub mod models;
pub mod orm;
pub use orm::DbConn;
pub mod schema;
pub mod session_token;

#[cfg(test)]
pub mod generate_types;

pub use orm::MIGRATIONS;

fn error_body(status: rocket::http::Status, req: &Request) -> Json<Value> {
    Json(json!({
        "error": status.reason().unwrap_or("Unknown Error"),
        "path": req.uri().path().to_string(),
        "status": status.code
    }))
}

#[catch(400)]
fn bad_request(req: &Request) -> Json<Value> {
    error_body(rocket::http::Status::BadRequest, req)
}

#[catch(404)]
fn not_found(req: &Request) -> Json<Value> {
    error_body(rocket::http::Status::NotFound, req)
}

#[catch(422)]
fn unprocessable_entity(req: &Request) -> Json<Value> {
    error_body(rocket::http::Status::UnprocessableEntity, req)
}

#[catch(500)]
fn internal_server_error(req: &Request) -> Json<Value> {
    error_body(rocket::http::Status::InternalServerError, req)
}

#[catch(default)]
fn default_catcher(status: rocket::http::Status, req: &Request) -> Json<Value> {
    error_body(status, req)
}

pub fn mount_api_routes(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount("/api", api::routes())
}

pub fn register_catchers(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.register(
        "/",
        catchers![
            bad_request,
            not_found,
            unprocessable_entity,
            internal_server_error,
            default_catcher
        ],
    )
}

fn log_rocket_info(rocket: &Rocket<Build>) {
    let figment = rocket.figment();

    if let Ok(address) = figment.extract_inner::<String>("address") {
        info!("Rocket is running at: {}", address);
    }

    if let Ok(port) = figment.extract_inner::<u16>("port") {
        info!("Rocket is listening on port: {}", port);
    }

    match figment.extract_inner::<Map<String, Value>>("databases.sqlite_db") {
        Ok(db_config) => {
            if let Some(Value::String(url)) = db_config.get("url") {
                info!("Database URL: {}", url);
            } else {
                warn!("Database URL not found in configuration");
            }
        }
        Err(e) => {
            warn!("Failed to extract database configuration: {}", e);
        }
    }
}

/// Builds the production Rocket instance.
///
/// Configuration comes from `Rocket.toml`, `ROCKET_`-prefixed environment
/// variables and, when set, `DATABASE_URL` for the SQLite file. Tests use
/// [`orm::testing::test_rocket`] instead, which swaps in an in-memory
/// database.
pub fn rocket() -> Rocket<Build> {
    let mut figment = Figment::from(rocket::Config::default())
        .merge(Toml::file("Rocket.toml").nested())
        .merge(Env::prefixed("ROCKET_").global());

    if let Ok(database_url) = std::env::var("DATABASE_URL") {
        figment = figment.merge(("databases.sqlite_db.url", database_url));
    }

    let rocket = rocket::custom(figment)
        .attach(DbConn::fairing())
        .attach(orm::run_migrations_fairing())
        .attach(config::attendance_config_fairing())
        .manage(session_token::SessionRegistry::new());

    log_rocket_info(&rocket);

    register_catchers(mount_api_routes(rocket))
}
