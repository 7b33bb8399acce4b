use uuid::Uuid;

use crate::error::ApiError;

/// Account lifecycle: signup, login, profile and admin user management.
pub mod auth;
/// Course catalog under /api/enrolled.
pub mod courses;
/// Enquiry (lead) capture and admin review under /api/enquiry.
pub mod enquiries;
/// Admin dashboard aggregation.
pub mod admin;

/// Parses a path id. An id that cannot be a UUID cannot name a record, so it is
/// reported as `NotFound` rather than as a malformed request.
pub(crate) fn parse_id(raw: &str, not_found: &'static str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(not_found))
}
