use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    auth::AdminUser,
    error::ApiError,
    handlers::parse_id,
    models::{Course, CreateCourseRequest, MessageResponse, UpdateCourseRequest},
    validation::ValidatedJson,
};

const COURSE_NOT_FOUND: &str = "Course not found";

/// create_course
///
/// [Admin Route] Adds a course to the catalog.
#[utoipa::path(
    post,
    path = "/api/enrolled/addproduct",
    security(("bearer_auth" = [])),
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Created", body = Course),
        (status = 400, description = "Invalid course", body = MessageResponse)
    )
)]
pub async fn create_course(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateCourseRequest>,
) -> Result<(StatusCode, Json<Course>), ApiError> {
    let course = state.repo.create_course(payload).await?;
    tracing::info!(course_id = %course.id, by = %admin.id, "course created");
    Ok((StatusCode::CREATED, Json(course)))
}

/// list_courses
///
/// [Public Route] The full catalog in creation order.
#[utoipa::path(
    get,
    path = "/api/enrolled/getallproduct",
    responses((status = 200, description = "All courses", body = [Course]))
)]
pub async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, ApiError> {
    Ok(Json(state.repo.list_courses().await?))
}

/// get_course
///
/// [Public Route] One course. Also mounted at `/api/enrolled/getallproduct/{id}`,
/// the path the course detail page requests.
#[utoipa::path(
    get,
    path = "/api/enrolled/course/{id}",
    params(("id" = String, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Found", body = Course),
        (status = 404, description = "Not Found", body = MessageResponse)
    )
)]
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Course>, ApiError> {
    let id = parse_id(&id, COURSE_NOT_FOUND)?;
    state
        .repo
        .get_course(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(COURSE_NOT_FOUND))
}

/// update_course
///
/// [Admin Route] Partial update; fields absent from the body keep their values.
#[utoipa::path(
    put,
    path = "/api/enrolled/product/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Course ID")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Updated", body = Course),
        (status = 404, description = "Not Found", body = MessageResponse)
    )
)]
pub async fn update_course(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateCourseRequest>,
) -> Result<Json<Course>, ApiError> {
    let id = parse_id(&id, COURSE_NOT_FOUND)?;
    let course = state
        .repo
        .update_course(id, payload)
        .await?
        .ok_or(ApiError::NotFound(COURSE_NOT_FOUND))?;
    tracing::info!(course_id = %id, by = %admin.id, "course updated");
    Ok(Json(course))
}

/// delete_course
///
/// [Admin Route] Removes a course from the catalog.
#[utoipa::path(
    delete,
    path = "/api/enrolled/product/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not Found", body = MessageResponse)
    )
)]
pub async fn delete_course(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id, COURSE_NOT_FOUND)?;
    if !state.repo.delete_course(id).await? {
        return Err(ApiError::NotFound(COURSE_NOT_FOUND));
    }
    tracing::info!(course_id = %id, by = %admin.id, "course deleted");
    Ok(Json(MessageResponse::new("Course deleted successfully")))
}
