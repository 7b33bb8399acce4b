use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    auth::{self, AdminUser, AuthUser},
    error::ApiError,
    handlers::parse_id,
    models::{
        AuthResponse, LoginRequest, MeResponse, MessageResponse, NewUser, Role, SignupRequest,
        UpdateRoleRequest, UserProfile,
    },
    validation::ValidatedJson,
};

const USER_NOT_FOUND: &str = "User not found";

/// signup
///
/// [Public Route] Creates a `user` account and signs the caller in.
/// The password is bcrypt-hashed before it reaches storage.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Missing field", body = MessageResponse),
        (status = 409, description = "Email already registered", body = MessageResponse)
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let password_hash = auth::hash_password(&payload.password, state.config.bcrypt_cost)?;

    let user = state
        .repo
        .create_user(NewUser {
            name: payload.name,
            email: payload.email,
            phone: payload.phone,
            password_hash,
            role: Role::User,
        })
        .await?;

    let access_token = auth::issue_token(&user, &state.config)?;
    tracing::info!(user_id = %user.id, "account created");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            access_token,
            user: user.profile(),
        }),
    ))
}

/// login
///
/// [Public Route] Exchanges email + password for a bearer token. Unknown email and
/// wrong password produce the same 401.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid email or password", body = MessageResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state.repo.get_user_by_email(&payload.email).await?;
    let stored_hash = user.as_ref().map(|u| u.password_hash.as_str());
    let verified =
        auth::check_credentials(&payload.password, stored_hash, state.config.bcrypt_cost);

    let user = match user {
        Some(user) if verified => user,
        _ => {
            tracing::warn!("failed login attempt");
            return Err(ApiError::InvalidCredentials);
        }
    };

    let access_token = auth::issue_token(&user, &state.config)?;
    tracing::info!(user_id = %user.id, "signed in");

    Ok(Json(AuthResponse {
        access_token,
        user: user.profile(),
    }))
}

/// get_me
///
/// [Authenticated Route] The principal resolved by the guard.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Not authorized", body = MessageResponse)
    )
)]
pub async fn get_me(AuthUser { profile, .. }: AuthUser) -> Json<MeResponse> {
    Json(MeResponse { user: profile })
}

/// list_users
///
/// [Admin Route] Every account, newest first.
#[utoipa::path(
    get,
    path = "/api/auth/users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All users", body = [UserProfile]),
        (status = 403, description = "Not an admin", body = MessageResponse)
    )
)]
pub async fn list_users(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    let users = state.repo.list_users().await?;
    Ok(Json(users.iter().map(|u| u.profile()).collect()))
}

/// delete_user
///
/// [Admin Route] Removes an account. Tokens already issued to it stop working on
/// their next use because the guard can no longer load the principal.
#[utoipa::path(
    delete,
    path = "/api/auth/users/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not Found", body = MessageResponse)
    )
)]
pub async fn delete_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id, USER_NOT_FOUND)?;
    if !state.repo.delete_user(id).await? {
        return Err(ApiError::NotFound(USER_NOT_FOUND));
    }
    tracing::info!(user_id = %id, by = %admin.id, "user deleted");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// update_user_role
///
/// [Admin Route] Promotes or demotes an account. Takes effect on the account's next
/// request, since roles are never read from the token.
#[utoipa::path(
    patch,
    path = "/api/auth/users/{id}/role",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = UserProfile),
        (status = 404, description = "Not Found", body = MessageResponse)
    )
)]
pub async fn update_user_role(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateRoleRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let id = parse_id(&id, USER_NOT_FOUND)?;
    let user = state
        .repo
        .set_user_role(id, payload.role)
        .await?
        .ok_or(ApiError::NotFound(USER_NOT_FOUND))?;
    tracing::info!(user_id = %id, role = %payload.role, by = %admin.id, "role changed");
    Ok(Json(user.profile()))
}
