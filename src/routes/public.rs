use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints open to any client: the health probe, account creation and login,
/// the enquiry form and the read-only course catalog.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers; answers without touching storage.
        .route("/health", get(|| async { "ok" }))
        // POST /api/auth/signup, POST /api/auth/login
        // Both answer with {access_token, user}.
        .route("/api/auth/signup", post(handlers::auth::signup))
        .route("/api/auth/login", post(handlers::auth::login))
        // POST /api/enquiry/detail
        // Lead capture from the enquiry form.
        .route("/api/enquiry/detail", post(handlers::enquiries::create_enquiry))
        // GET /api/enrolled/getallproduct
        .route(
            "/api/enrolled/getallproduct",
            get(handlers::courses::list_courses),
        )
        // GET /api/enrolled/course/{id}
        // The detail page requests /getallproduct/{id}, so both paths resolve.
        .route("/api/enrolled/course/{id}", get(handlers::courses::get_course))
        .route(
            "/api/enrolled/getallproduct/{id}",
            get(handlers::courses::get_course),
        )
}
