use axum::{Json, extract::State};

use crate::{
    AppState,
    auth::AdminUser,
    error::ApiError,
    models::{DashboardStats, MessageResponse},
};

/// get_stats
///
/// [Admin Route] Totals for users, courses and enquiries plus the five newest
/// enquiries, as shown on the dashboard overview.
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Stats", body = DashboardStats),
        (status = 403, description = "Not an admin", body = MessageResponse)
    )
)]
pub async fn get_stats(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, ApiError> {
    Ok(Json(state.repo.get_stats().await?))
}
