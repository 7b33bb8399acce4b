use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Routes available to any signed-in account. The bearer guard is layered on top of
/// this router in `create_router`, so handlers always receive a resolved `AuthUser`.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /api/auth/me
        // The principal as currently stored (role changes are reflected immediately).
        .route("/api/auth/me", get(handlers::auth::get_me))
}
