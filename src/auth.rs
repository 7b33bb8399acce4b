use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::{ApiError, AuthError},
    models::{Role, User, UserProfile},
    repository::{Repository, RepositoryState},
};

/// Claims
///
/// Payload of an issued bearer token. Only the subject and the validity window are
/// encoded; the role is always re-read from storage when the token is presented.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the id of the user the token was issued to.
    pub sub: Uuid,
    /// Expiration Time (exp): seconds since the epoch.
    pub exp: usize,
    /// Issued At (iat): seconds since the epoch.
    pub iat: usize,
}

/// AuthUser
///
/// The principal of an authenticated request: the current user record (minus the
/// password hash) loaded after the token was verified. `id` and `role` are lifted
/// out of the profile so handlers can destructure them directly.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
    pub profile: UserProfile,
}

impl From<UserProfile> for AuthUser {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            role: profile.role,
            profile,
        }
    }
}

/// AdminUser
///
/// An `AuthUser` that has also passed the admin role gate.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

// --- Token Service ---

/// Signs a token for `user`, valid for `config.jwt_ttl_hours` from now.
pub fn issue_token(user: &User, config: &AppConfig) -> Result<String, ApiError> {
    let now = Utc::now().timestamp();
    let exp = config
        .jwt_ttl_hours
        .checked_mul(3600)
        .and_then(|ttl| now.checked_add(ttl))
        .filter(|exp| *exp > now)
        .and_then(|exp| usize::try_from(exp).ok())
        .ok_or_else(|| {
            ApiError::Server(format!("unusable token lifetime: {}h", config.jwt_ttl_hours))
        })?;
    let claims = Claims {
        sub: user.id,
        iat: now as usize,
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Server(format!("failed to sign token: {e}")))
}

/// Validates signature and expiry, returning the subject's user id.
pub fn verify_token(token: &str, secret: &str) -> Result<Uuid, AuthError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    match decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation) {
        Ok(data) => Ok(data.claims.sub),
        Err(e) => {
            match e.kind() {
                ErrorKind::ExpiredSignature => tracing::warn!("rejected expired token"),
                kind => tracing::warn!(?kind, "rejected invalid token"),
            }
            Err(AuthError::Invalid)
        }
    }
}

/// Pulls the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::Missing)
}

/// Re-fetches the current user record so role changes and deletions made after the
/// token was issued take effect immediately.
pub async fn load_principal(repo: &dyn Repository, user_id: Uuid) -> Result<AuthUser, ApiError> {
    match repo.get_user(user_id).await? {
        Some(user) => Ok(AuthUser::from(user.profile())),
        None => {
            tracing::warn!(%user_id, "token subject no longer exists");
            Err(AuthError::NotFound.into())
        }
    }
}

/// Role gate. Admin is the only elevated role; `User` is satisfied by any principal.
pub fn require_role(principal: &AuthUser, role: Role) -> Result<(), AuthError> {
    match (role, principal.role) {
        (Role::User, _) | (Role::Admin, Role::Admin) => Ok(()),
        (Role::Admin, Role::User) => {
            tracing::warn!(user_id = %principal.id, "admin route refused for non-admin");
            Err(AuthError::Forbidden)
        }
    }
}

/// Extracts the bearer token, verifies it and loads the principal.
pub async fn authenticate(
    headers: &HeaderMap,
    repo: &dyn Repository,
    config: &AppConfig,
) -> Result<AuthUser, ApiError> {
    let token = bearer_token(headers)?;
    let user_id = verify_token(token, &config.jwt_secret)?;
    load_principal(repo, user_id).await
}

// --- Passwords ---

pub fn hash_password(plain: &str, cost: u32) -> Result<String, ApiError> {
    bcrypt::hash(plain, cost).map_err(|e| ApiError::Server(format!("failed to hash password: {e}")))
}

/// False on mismatch and on a malformed stored hash.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    bcrypt::verify(plain, hash).unwrap_or_else(|e| {
        tracing::error!("stored password hash could not be checked: {}", e);
        false
    })
}

/// Login check. With no stored hash a throwaway hash of `plain` is still computed, so
/// an unknown email costs the same bcrypt work as a wrong password.
pub fn check_credentials(plain: &str, stored_hash: Option<&str>, cost: u32) -> bool {
    match stored_hash {
        Some(hash) => verify_password(plain, hash),
        None => {
            let _ = bcrypt::hash(plain, cost);
            false
        }
    }
}

// --- Extractors ---

/// AuthUser Extractor Implementation
///
/// Usable as a handler argument on any guarded route. When the guard middleware has
/// already resolved the principal it is taken from the request extensions; otherwise
/// the full guard runs here.
///
/// Rejection: 401 for missing/invalid tokens or a vanished subject, 500 on storage failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let user = authenticate(&parts.headers, repo.as_ref(), &config).await?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        require_role(&user, Role::Admin)?;
        Ok(AdminUser(user))
    }
}
