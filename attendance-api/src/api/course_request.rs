//! API endpoints for lecturer course requests.
//!
//! Lecturers ask to be assigned a course; an administrator approves or
//! rejects the request. Approved requests are the lecturer's course list.

use chrono::Utc;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{Route, State};

use super::{ApiError, api_error};
use crate::config::AttendanceConfig;
use crate::logged_json::LoggedJson;
use crate::models::{CourseRequest, CourseRequestInput, CourseRequestStatus, CourseRequestStatusInput};
use crate::orm::DbConn;
use crate::orm::course_request::{
    get_all_course_requests, get_approved_courses_for_lecturer, get_course_request_by_id,
    insert_course_request, update_course_request_status, validate_course_request,
};
use crate::orm::prepare_connection;

/// Submit Course Request endpoint.
///
/// - **URL:** `/api/1/CourseRequests`
/// - **Method:** `POST`
/// - **Purpose:** Files a lecturer's request to teach a course
///
/// # Request Format
///
/// ```json
/// {
///   "lecturerId": "lect-1",
///   "lecturerName": "Dr. Ada Lovelace",
///   "courseName": "Algorithms",
///   "courseCode": "CS201",
///   "room": "B12",
///   "time": "Mon 09:00",
///   "reason": "Taught it last year"
/// }
/// ```
///
/// `reason` is optional. New requests start as `PENDING`.
///
/// **Failure Responses:**
/// - `400 Bad Request` - A required field is missing
/// - `500 Internal Server Error` - Database failure
#[post("/1/CourseRequests", data = "<input>")]
pub async fn submit_course_request(
    db: DbConn,
    config: &State<AttendanceConfig>,
    input: LoggedJson<CourseRequestInput>,
) -> Result<status::Created<Json<CourseRequest>>, ApiError> {
    let new_request = validate_course_request(&input, Utc::now().naive_utc())
        .map_err(|msg| api_error(Status::BadRequest, msg))?;

    let busy_timeout_ms = config.busy_timeout_ms;
    db.run(move |conn| {
        prepare_connection(conn, busy_timeout_ms)?;
        insert_course_request(conn, new_request)
    })
    .await
    .map(|request| {
        let location = format!("/api/1/CourseRequests/{}", request.id);
        status::Created::new(location).body(Json(request))
    })
    .map_err(|e| {
        error!("Error creating course request: {:?}", e);
        api_error(Status::InternalServerError, "Database error while creating course request")
    })
}

/// List Course Requests endpoint.
///
/// - **URL:** `/api/1/CourseRequests`
/// - **Method:** `GET`
/// - **Purpose:** All requests, newest first, for the admin review screen
#[get("/1/CourseRequests")]
pub async fn list_course_requests(
    db: DbConn,
    config: &State<AttendanceConfig>,
) -> Result<Json<Vec<CourseRequest>>, ApiError> {
    let busy_timeout_ms = config.busy_timeout_ms;
    db.run(move |conn| {
        prepare_connection(conn, busy_timeout_ms)?;
        get_all_course_requests(conn)
    })
    .await
    .map(Json)
    .map_err(|e| {
        error!("Error listing course requests: {:?}", e);
        api_error(Status::InternalServerError, "Database error while listing course requests")
    })
}

/// Get Course Request endpoint.
///
/// - **URL:** `/api/1/CourseRequests/<id>`
/// - **Method:** `GET`
#[get("/1/CourseRequests/<id>")]
pub async fn get_course_request(
    db: DbConn,
    config: &State<AttendanceConfig>,
    id: i32,
) -> Result<Json<CourseRequest>, ApiError> {
    let busy_timeout_ms = config.busy_timeout_ms;
    let found = db
        .run(move |conn| {
            prepare_connection(conn, busy_timeout_ms)?;
            get_course_request_by_id(conn, id)
        })
        .await;

    match found {
        Ok(Some(request)) => Ok(Json(request)),
        Ok(None) => Err(api_error(Status::NotFound, "Request not found")),
        Err(e) => {
            error!("Error fetching course request {}: {:?}", id, e);
            Err(api_error(Status::InternalServerError, "Database error while fetching course request"))
        }
    }
}

/// Decide Course Request endpoint.
///
/// - **URL:** `/api/1/CourseRequests/<id>`
/// - **Method:** `PATCH`
/// - **Purpose:** Approve or reject a request
///
/// # Request Format
///
/// ```json
/// { "status": "APPROVED" }
/// ```
///
/// **Failure Responses:**
/// - `400 Bad Request` - Missing or unknown status
/// - `404 Not Found` - No request with that id
/// - `500 Internal Server Error` - Database failure
#[patch("/1/CourseRequests/<id>", data = "<input>")]
pub async fn decide_course_request(
    db: DbConn,
    config: &State<AttendanceConfig>,
    id: i32,
    input: LoggedJson<CourseRequestStatusInput>,
) -> Result<Json<CourseRequest>, ApiError> {
    let new_status = input
        .status
        .as_deref()
        .ok_or_else(|| api_error(Status::BadRequest, "Missing required fields: status"))?
        .parse::<CourseRequestStatus>()
        .map_err(|msg| api_error(Status::BadRequest, msg))?;

    let busy_timeout_ms = config.busy_timeout_ms;
    let updated = db
        .run(move |conn| {
            prepare_connection(conn, busy_timeout_ms)?;
            update_course_request_status(conn, id, new_status)
        })
        .await;

    match updated {
        Ok(Some(request)) => {
            // Lecturer notification is delivered outside this service.
            info!(
                "Course request {} for {} ({}) by lecturer {} marked {}",
                request.id, request.course_name, request.course_code, request.lecturer_id, new_status
            );
            Ok(Json(request))
        }
        Ok(None) => Err(api_error(Status::NotFound, "Request not found")),
        Err(e) => {
            error!("Error updating course request {}: {:?}", id, e);
            Err(api_error(Status::InternalServerError, "Database error while updating course request"))
        }
    }
}

/// Lecturer Courses endpoint.
///
/// - **URL:** `/api/1/Lecturers/<lecturer_id>/Courses`
/// - **Method:** `GET`
/// - **Purpose:** Approved course requests for one lecturer, newest first
#[get("/1/Lecturers/<lecturer_id>/Courses")]
pub async fn lecturer_courses(
    db: DbConn,
    config: &State<AttendanceConfig>,
    lecturer_id: String,
) -> Result<Json<Vec<CourseRequest>>, ApiError> {
    let busy_timeout_ms = config.busy_timeout_ms;
    db.run(move |conn| {
        prepare_connection(conn, busy_timeout_ms)?;
        get_approved_courses_for_lecturer(conn, &lecturer_id)
    })
    .await
    .map(Json)
    .map_err(|e| {
        error!("Error listing lecturer courses: {:?}", e);
        api_error(Status::InternalServerError, "Database error while listing courses")
    })
}

pub fn routes() -> Vec<Route> {
    routes![
        submit_course_request,
        list_course_requests,
        get_course_request,
        decide_course_request,
        lecturer_courses
    ]
}
