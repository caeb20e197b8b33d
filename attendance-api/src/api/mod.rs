//! HTTP endpoints, all mounted under `/api`.

pub mod attendance;
pub mod course_request;
pub mod session;
pub mod status;

use rocket::Route;
use rocket::http::Status;
use rocket::response::status as rocket_status;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Error body returned by every endpoint on failure.
#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = rocket_status::Custom<Json<ErrorResponse>>;

pub(crate) fn api_error(status: Status, message: impl Into<String>) -> ApiError {
    rocket_status::Custom(
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(attendance::routes());
    routes.extend(course_request::routes());
    routes.extend(session::routes());
    routes.extend(status::routes());
    routes
}
