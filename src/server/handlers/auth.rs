//! Account handlers: registration, login and the current user.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::{blocking, AppState};
use crate::error::{ApiError, ApiResult};
use crate::model::{hash_password, verify_password, AccountView, User, UserProfile};
use crate::server::auth::{AuthUser, Identity};
use crate::validation::{LoginRequest, RegisterRequest, ValidatedJson};

/// Message of every failed login, whatever the cause.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Response to a successful registration or login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub message: &'static str,
    pub token: String,
    pub user: AccountView,
}

#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub user: UserProfile,
}

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(registration): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    let password = registration.password;
    let password_hash = blocking("Password hashing", move || hash_password(&password)).await?;

    let now = Utc::now();
    let user = state
        .store
        .insert_user(User {
            id: Uuid::new_v4(),
            name: registration.name,
            email: registration.email,
            username: registration.username,
            password_hash,
            profile: registration.profile,
            created_at: now,
            updated_at: now,
        })
        .await?;

    let token = state.auth.issue(&identity(&user))?;
    info!(user_id = %user.id, "Registered user");

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            message: "User registered successfully",
            token,
            user: AccountView::from(&user),
        }),
    ))
}

/// `POST /api/auth/login`
///
/// An unknown email and a wrong password produce the same 401.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(credentials): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let user = state
        .store
        .find_user_by_email(&credentials.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    let password = credentials.password;
    let hash = user.password_hash.clone();
    let valid = blocking("Password verification", move || {
        Ok(verify_password(&password, &hash))
    })
    .await?;
    if !valid {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = state.auth.issue(&identity(&user))?;

    Ok(Json(TokenResponse {
        message: "Login successful",
        token,
        user: AccountView::from(&user),
    }))
}

/// `GET /api/auth/me`
pub async fn me(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> ApiResult<Json<CurrentUserResponse>> {
    let user = state
        .store
        .find_user(caller.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(CurrentUserResponse {
        user: UserProfile::from(&user),
    }))
}

fn identity(user: &User) -> Identity {
    Identity {
        user_id: user.id,
        email: user.email.clone(),
    }
}
