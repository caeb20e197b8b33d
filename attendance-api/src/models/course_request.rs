use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::course_requests;

/// A lecturer's application to teach a course, decided by an administrator.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = course_requests)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CourseRequest {
    pub id: i32,
    pub lecturer_id: String,
    pub lecturer_name: String,
    pub course_name: String,
    pub course_code: String,
    pub room: String,
    #[serde(rename = "time")]
    pub meeting_time: String,
    pub reason: Option<String>,
    pub status: String,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
    #[ts(type = "string")]
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = course_requests)]
pub struct NewCourseRequest {
    pub lecturer_id: String,
    pub lecturer_name: String,
    pub course_name: String,
    pub course_code: String,
    pub room: String,
    pub meeting_time: String,
    pub reason: Option<String>,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CourseRequestInput {
    pub lecturer_id: Option<String>,
    pub lecturer_name: Option<String>,
    pub course_name: Option<String>,
    pub course_code: Option<String>,
    pub room: Option<String>,
    pub time: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct CourseRequestStatusInput {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum CourseRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl CourseRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseRequestStatus::Pending => "PENDING",
            CourseRequestStatus::Approved => "APPROVED",
            CourseRequestStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for CourseRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CourseRequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(CourseRequestStatus::Pending),
            "APPROVED" => Ok(CourseRequestStatus::Approved),
            "REJECTED" => Ok(CourseRequestStatus::Rejected),
            other => Err(format!("Unknown course request status '{}'", other)),
        }
    }
}
