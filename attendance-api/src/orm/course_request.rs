use chrono::{NaiveDateTime, Utc};
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::BigInt;

use crate::models::{CourseRequest, CourseRequestInput, CourseRequestStatus, NewCourseRequest};

#[derive(QueryableByName)]
struct LastInsertRowId {
    #[diesel(sql_type = BigInt)]
    last_insert_rowid: i64,
}

fn required(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Checks a course request submission and builds a pending request.
///
/// Everything except `reason` is required. Returns the list of missing
/// field names on failure.
pub fn validate_course_request(
    input: &CourseRequestInput,
    now: NaiveDateTime,
) -> Result<NewCourseRequest, String> {
    let fields = [
        ("lecturerId", required(&input.lecturer_id)),
        ("lecturerName", required(&input.lecturer_name)),
        ("courseName", required(&input.course_name)),
        ("courseCode", required(&input.course_code)),
        ("room", required(&input.room)),
        ("time", required(&input.time)),
    ];
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, v)| v.is_none())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(format!("Missing required fields: {}", missing.join(", ")));
    }

    let [lecturer_id, lecturer_name, course_name, course_code, room, meeting_time] =
        fields.map(|(_, v)| v.unwrap_or_default());

    Ok(NewCourseRequest {
        lecturer_id,
        lecturer_name,
        course_name,
        course_code,
        room,
        meeting_time,
        reason: required(&input.reason),
        status: CourseRequestStatus::Pending.as_str().to_string(),
        created_at: now,
        updated_at: now,
    })
}

/// Insert a new course request and return it as stored.
pub fn insert_course_request(
    conn: &mut SqliteConnection,
    request: NewCourseRequest,
) -> Result<CourseRequest, diesel::result::Error> {
    use crate::schema::course_requests::dsl::*;

    diesel::insert_into(course_requests)
        .values(&request)
        .execute(conn)?;

    let last_id = diesel::sql_query("SELECT last_insert_rowid() as last_insert_rowid")
        .get_result::<LastInsertRowId>(conn)?
        .last_insert_rowid;

    course_requests
        .filter(id.eq(last_id as i32))
        .select(CourseRequest::as_select())
        .first(conn)
}

/// Try to find a course request by id.
/// Returns Ok(Some(CourseRequest)) if found, Ok(None) if not, Err on DB error.
pub fn get_course_request_by_id(
    conn: &mut SqliteConnection,
    request_id: i32,
) -> Result<Option<CourseRequest>, diesel::result::Error> {
    use crate::schema::course_requests::dsl::*;
    course_requests
        .filter(id.eq(request_id))
        .select(CourseRequest::as_select())
        .first(conn)
        .optional()
}

/// Returns all course requests, newest first.
pub fn get_all_course_requests(
    conn: &mut SqliteConnection,
) -> Result<Vec<CourseRequest>, diesel::result::Error> {
    use crate::schema::course_requests::dsl::*;
    course_requests
        .order((created_at.desc(), id.desc()))
        .select(CourseRequest::as_select())
        .load(conn)
}

/// Sets the status of a request and bumps `updated_at`.
/// Returns Ok(None) if no request has that id.
pub fn update_course_request_status(
    conn: &mut SqliteConnection,
    request_id: i32,
    new_status: CourseRequestStatus,
) -> Result<Option<CourseRequest>, diesel::result::Error> {
    use crate::schema::course_requests::dsl::*;

    let rows = diesel::update(course_requests.filter(id.eq(request_id)))
        .set((
            status.eq(new_status.as_str()),
            updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)?;
    if rows == 0 {
        return Ok(None);
    }
    get_course_request_by_id(conn, request_id)
}

/// Courses a lecturer has been approved to teach, newest first.
pub fn get_approved_courses_for_lecturer(
    conn: &mut SqliteConnection,
    lecturer: &str,
) -> Result<Vec<CourseRequest>, diesel::result::Error> {
    use crate::schema::course_requests::dsl::*;
    course_requests
        .filter(lecturer_id.eq(lecturer))
        .filter(status.eq(CourseRequestStatus::Approved.as_str()))
        .order((created_at.desc(), id.desc()))
        .select(CourseRequest::as_select())
        .load(conn)
}
