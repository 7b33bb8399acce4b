use axum::{
    extract::FromRequestParts,
    http::{Request, StatusCode, header, request::Parts},
    response::IntoResponse,
};
use coaching_portal::{
    AppConfig, AppState, ApiError, AuthError,
    auth::{self, AdminUser, AuthUser, Claims},
    config::MIN_BCRYPT_COST,
    models::{NewUser, Role, User},
    repository::{InMemoryRepository, Repository, RepositoryState},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::{sync::Arc, time::SystemTime};
use uuid::Uuid;

// --- Helpers ---

fn state_with(repo: RepositoryState) -> AppState {
    AppState {
        repo,
        config: AppConfig::default(),
    }
}

async fn create_user(repo: &dyn Repository, email: &str, role: Role) -> User {
    repo.create_user(NewUser {
        name: "Test".to_string(),
        email: email.to_string(),
        phone: "123".to_string(),
        password_hash: auth::hash_password("pw", MIN_BCRYPT_COST).unwrap(),
        role,
    })
    .await
    .unwrap()
}

fn parts_with_auth(value: Option<String>) -> Parts {
    let mut builder = Request::builder().uri("/api/auth/me");
    if let Some(value) = value {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let (parts, _) = builder.body(()).unwrap().into_parts();
    parts
}

fn now_secs() -> usize {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

fn forge_token(sub: Uuid, secret: &str, exp: usize) -> String {
    let claims = Claims {
        sub,
        iat: now_secs(),
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn status_of(err: ApiError) -> StatusCode {
    err.into_response().status()
}

// --- AuthUser ---

#[tokio::test]
async fn valid_token_resolves_principal() {
    let repo: RepositoryState = Arc::new(InMemoryRepository::new());
    let user = create_user(repo.as_ref(), "a@example.com", Role::User).await;
    let state = state_with(repo);
    let token = auth::issue_token(&user, &state.config).unwrap();

    let mut parts = parts_with_auth(Some(format!("Bearer {token}")));
    let principal = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap();

    assert_eq!(principal.id, user.id);
    assert_eq!(principal.role, Role::User);
    // Resolved principal is cached for later extractors.
    assert!(parts.extensions.get::<AuthUser>().is_some());
}

#[tokio::test]
async fn missing_header_is_401_token_missing() {
    let state = state_with(Arc::new(InMemoryRepository::new()));
    let mut parts = parts_with_auth(None);

    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Auth(AuthError::Missing)));
    assert_eq!(status_of(err), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn non_bearer_scheme_is_treated_as_missing() {
    let state = state_with(Arc::new(InMemoryRepository::new()));
    let mut parts = parts_with_auth(Some("Token abc".to_string()));

    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Auth(AuthError::Missing)));
}

#[tokio::test]
async fn wrong_secret_and_expired_tokens_fail() {
    let repo: RepositoryState = Arc::new(InMemoryRepository::new());
    let user = create_user(repo.as_ref(), "b@example.com", Role::User).await;
    let state = state_with(repo);

    let wrong_secret = forge_token(user.id, "someone-elses-secret", now_secs() + 3600);
    let expired = forge_token(user.id, &state.config.jwt_secret, now_secs() - 3600);

    for token in [wrong_secret, expired] {
        let mut parts = parts_with_auth(Some(format!("Bearer {token}")));
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Auth(AuthError::Invalid)));
    }
}

#[tokio::test]
async fn unknown_subject_is_401() {
    let state = state_with(Arc::new(InMemoryRepository::new()));
    let token = forge_token(Uuid::new_v4(), &state.config.jwt_secret, now_secs() + 3600);

    let mut parts = parts_with_auth(Some(format!("Bearer {token}")));
    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Auth(AuthError::NotFound)));
    assert_eq!(status_of(err), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn storage_failure_during_lookup_is_500() {
    let state = state_with(Arc::new(InMemoryRepository::new_failing()));
    let token = forge_token(Uuid::new_v4(), &state.config.jwt_secret, now_secs() + 3600);

    let mut parts = parts_with_auth(Some(format!("Bearer {token}")));
    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();

    assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
}

// --- AdminUser ---

#[tokio::test]
async fn admin_extractor_gates_on_role() {
    let repo: RepositoryState = Arc::new(InMemoryRepository::new());
    let admin = create_user(repo.as_ref(), "admin@example.com", Role::Admin).await;
    let user = create_user(repo.as_ref(), "user@example.com", Role::User).await;
    let state = state_with(repo);

    let admin_token = auth::issue_token(&admin, &state.config).unwrap();
    let mut parts = parts_with_auth(Some(format!("Bearer {admin_token}")));
    let AdminUser(principal) = AdminUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap();
    assert_eq!(principal.id, admin.id);

    let user_token = auth::issue_token(&user, &state.config).unwrap();
    let mut parts = parts_with_auth(Some(format!("Bearer {user_token}")));
    let err = AdminUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Auth(AuthError::Forbidden)));
    assert_eq!(status_of(err), StatusCode::FORBIDDEN);
}
