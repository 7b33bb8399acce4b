use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch, post, put},
};

/// Admin Router Module
///
/// Back-office routes. `create_router` wraps this router in the admin guard, which
/// rejects missing/invalid tokens with 401 and non-admin principals with 403 before
/// any handler (and therefore any side effect) runs.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // --- Users ---
        .route("/api/auth/users", get(handlers::auth::list_users))
        .route(
            "/api/auth/users/{id}",
            axum::routing::delete(handlers::auth::delete_user),
        )
        .route(
            "/api/auth/users/{id}/role",
            patch(handlers::auth::update_user_role),
        )
        // --- Enquiries ---
        .route("/api/enquiry/all", get(handlers::enquiries::list_enquiries))
        .route(
            "/api/enquiry/{id}",
            get(handlers::enquiries::get_enquiry)
                .put(handlers::enquiries::update_enquiry)
                .delete(handlers::enquiries::delete_enquiry),
        )
        // --- Courses ---
        .route(
            "/api/enrolled/addproduct",
            post(handlers::courses::create_course),
        )
        .route(
            "/api/enrolled/product/{id}",
            put(handlers::courses::update_course).delete(handlers::courses::delete_course),
        )
        // --- Dashboard ---
        .route("/api/admin/stats", get(handlers::admin::get_stats))
}
