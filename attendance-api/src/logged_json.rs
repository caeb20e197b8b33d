//! JSON data guard that logs every accepted request body.
//!
//! `LoggedJson<T>` parses exactly like `Json<T>` and then writes the body,
//! re-serialized, to the log together with the method and path. Check-in
//! submissions carry only opaque identifiers, so nothing is redacted.

use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket::{
    Data, Request,
    data::{self, FromData},
};

pub struct LoggedJson<T>(pub T);

impl<T> LoggedJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for LoggedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn describe_body<T: Serialize>(body: &T) -> String {
    serde_json::to_string(body).unwrap_or_else(|_| "<failed to serialize>".to_string())
}

#[rocket::async_trait]
impl<'r, T: Deserialize<'r> + Serialize> FromData<'r> for LoggedJson<T> {
    type Error = rocket::serde::json::Error<'r>;

    async fn from_data(req: &'r Request<'_>, data: Data<'r>) -> data::Outcome<'r, Self> {
        match Json::<T>::from_data(req, data).await {
            data::Outcome::Success(json) => {
                let body = json.into_inner();
                info!(
                    "API Request Body: {} {} | Data: {}",
                    req.method().as_str(),
                    req.uri().path(),
                    describe_body(&body)
                );
                data::Outcome::Success(LoggedJson(body))
            }
            data::Outcome::Error(e) => data::Outcome::Error(e),
            data::Outcome::Forward(f) => data::Outcome::Forward(f),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for LoggedJson<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
