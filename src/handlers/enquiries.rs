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
    models::{
        CreateEnquiryRequest, Enquiry, EnquiryList, MessageResponse, UpdateEnquiryRequest,
    },
    validation::ValidatedJson,
};

const ENQUIRY_NOT_FOUND: &str = "Enquiry not found";

/// create_enquiry
///
/// [Public Route] Stores a lead from the enquiry form. No token required.
#[utoipa::path(
    post,
    path = "/api/enquiry/detail",
    request_body = CreateEnquiryRequest,
    responses(
        (status = 201, description = "Saved", body = MessageResponse),
        (status = 400, description = "Missing field", body = MessageResponse)
    )
)]
pub async fn create_enquiry(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateEnquiryRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let enquiry = state.repo.create_enquiry(payload).await?;
    tracing::info!(enquiry_id = %enquiry.id, course = %enquiry.course, "enquiry saved");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Enquiry saved successfully")),
    ))
}

/// list_enquiries
///
/// [Admin Route] All enquiries, newest first.
#[utoipa::path(
    get,
    path = "/api/enquiry/all",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All enquiries", body = EnquiryList),
        (status = 401, description = "Not authorized", body = MessageResponse)
    )
)]
pub async fn list_enquiries(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<EnquiryList>, ApiError> {
    let enquiries = state.repo.list_enquiries().await?;
    Ok(Json(EnquiryList { enquiries }))
}

/// get_enquiry
///
/// [Admin Route] One enquiry by id.
#[utoipa::path(
    get,
    path = "/api/enquiry/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Enquiry ID")),
    responses(
        (status = 200, description = "Found", body = Enquiry),
        (status = 404, description = "Not Found", body = MessageResponse)
    )
)]
pub async fn get_enquiry(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Enquiry>, ApiError> {
    let id = parse_id(&id, ENQUIRY_NOT_FOUND)?;
    state
        .repo
        .get_enquiry(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(ENQUIRY_NOT_FOUND))
}

/// update_enquiry
///
/// [Admin Route] Partial update, e.g. adding a follow-up note to `message`.
#[utoipa::path(
    put,
    path = "/api/enquiry/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Enquiry ID")),
    request_body = UpdateEnquiryRequest,
    responses(
        (status = 200, description = "Updated", body = Enquiry),
        (status = 404, description = "Not Found", body = MessageResponse)
    )
)]
pub async fn update_enquiry(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateEnquiryRequest>,
) -> Result<Json<Enquiry>, ApiError> {
    let id = parse_id(&id, ENQUIRY_NOT_FOUND)?;
    let enquiry = state
        .repo
        .update_enquiry(id, payload)
        .await?
        .ok_or(ApiError::NotFound(ENQUIRY_NOT_FOUND))?;
    tracing::info!(enquiry_id = %id, by = %admin.id, "enquiry updated");
    Ok(Json(enquiry))
}

/// delete_enquiry
///
/// [Admin Route] Removes an enquiry once it has been handled.
#[utoipa::path(
    delete,
    path = "/api/enquiry/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Enquiry ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not Found", body = MessageResponse)
    )
)]
pub async fn delete_enquiry(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id, ENQUIRY_NOT_FOUND)?;
    if !state.repo.delete_enquiry(id).await? {
        return Err(ApiError::NotFound(ENQUIRY_NOT_FOUND));
    }
    tracing::info!(enquiry_id = %id, by = %admin.id, "enquiry deleted");
    Ok(Json(MessageResponse::new("Enquiry deleted successfully")))
}
