//! Start-up data: the bootstrap administrator and the sample course catalog.

use crate::{
    auth,
    config::BootstrapAdmin,
    error::ApiError,
    models::{CreateCourseRequest, NewUser, Role},
    repository::Repository,
};

/// The sample catalog shipped with the repository (classes 9-12).
const SAMPLE_COURSES: &str = include_str!("../seed/courses.json");

/// Creates the configured administrator if no account uses that email yet.
///
/// An existing account is left untouched, including its role and password; this is
/// only a first-run convenience. Returns whether an account was created.
pub async fn ensure_admin(
    repo: &dyn Repository,
    admin: &BootstrapAdmin,
    bcrypt_cost: u32,
) -> Result<bool, ApiError> {
    if let Some(existing) = repo.get_user_by_email(&admin.email).await? {
        if existing.role != Role::Admin {
            tracing::warn!(
                email = %admin.email,
                "bootstrap admin email belongs to a non-admin account; leaving it unchanged"
            );
        } else {
            tracing::debug!(email = %admin.email, "bootstrap admin already present");
        }
        return Ok(false);
    }

    let password_hash = auth::hash_password(&admin.password, bcrypt_cost)?;
    let user = repo
        .create_user(NewUser {
            name: admin.name.clone(),
            email: admin.email.clone(),
            phone: admin.phone.clone(),
            password_hash,
            role: Role::Admin,
        })
        .await?;
    tracing::info!(user_id = %user.id, email = %user.email, "bootstrap admin created");
    Ok(true)
}

/// Parses the bundled sample catalog.
pub fn sample_courses() -> Result<Vec<CreateCourseRequest>, serde_json::Error> {
    serde_json::from_str(SAMPLE_COURSES)
}

/// Replaces the whole catalog with `courses`. Returns the number inserted.
pub async fn seed_courses(
    repo: &dyn Repository,
    courses: Vec<CreateCourseRequest>,
) -> Result<usize, ApiError> {
    let removed = repo.clear_courses().await?;
    tracing::info!("cleared {} existing courses", removed);

    let mut inserted = 0;
    for course in courses {
        repo.create_course(course).await?;
        inserted += 1;
    }
    tracing::info!("inserted {} sample courses", inserted);
    Ok(inserted)
}
