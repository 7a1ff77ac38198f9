use crate::auth::{self, AuthUser, Claims};
use crate::db::{self, UserRow};
use crate::errors::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::State;
use axum::response::Json;
use chrono::Utc;
use std::sync::Arc;

#[derive(serde::Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(serde::Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(serde::Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(serde::Deserialize)]
pub struct ProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(serde::Deserialize)]
pub struct PasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

fn issue_token(state: &AppState, user_id: &str, username: &str) -> ApiResult<String> {
    let claims = Claims::new(user_id, username, state.config.token_expiry_days);
    auth::create_token(&claims, &state.config.jwt_secret)
}

/// POST /api/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let username = req.username.trim().to_string();
    if username.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "username and password required".into(),
        ));
    }

    if db::username_exists(&state.db, &username)? {
        return Err(ApiError::Conflict("username"));
    }
    if let Some(email) = req.email.as_deref() {
        if db::email_taken_by_other(&state.db, email, "")? {
            return Err(ApiError::Conflict("email"));
        }
    }

    let now = Utc::now().to_rfc3339();
    let user = UserRow {
        id: uuid::Uuid::new_v4().to_string(),
        username,
        password_hash: auth::hash_password(&req.password)?,
        email: req.email,
        name: req.name,
        created_at: now.clone(),
        updated_at: now,
    };
    db::create_user(&state.db, &user)?;

    let token = issue_token(&state, &user.id, &user.username)?;

    state
        .counters
        .registrations
        .fetch_add(1, portable_atomic::Ordering::Relaxed);
    tracing::info!(username = %user.username, "user registered");

    Ok(Json(AuthResponse {
        token,
        username: user.username,
        email: user.email,
        name: user.name,
    }))
}

/// POST /api/login
///
/// Unknown username and wrong password respond identically.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "username and password required".into(),
        ));
    }

    let user = db::get_user_by_username(&state.db, req.username.trim())?
        .ok_or(ApiError::InvalidCredentials)?;

    if !auth::verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::InvalidCredentials);
    }

    let token = issue_token(&state, &user.id, &user.username)?;

    state
        .counters
        .logins
        .fetch_add(1, portable_atomic::Ordering::Relaxed);
    tracing::info!(username = %user.username, "user logged in");

    Ok(Json(AuthResponse {
        token,
        username: user.username,
        email: user.email,
        name: user.name,
    }))
}

/// PUT /api/settings/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<ProfileRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    if let Some(email) = req.email.as_deref() {
        if db::email_taken_by_other(&state.db, email, &user.user_id)? {
            return Err(ApiError::Conflict("email"));
        }
    }

    if !db::update_user_profile(
        &state.db,
        &user.user_id,
        req.name.as_deref(),
        req.email.as_deref(),
    )? {
        return Err(ApiError::NotFound("user"));
    }

    Ok(Json(
        serde_json::json!({ "message": "profile updated successfully" }),
    ))
}

/// PUT /api/settings/password
///
/// The current password must verify against the stored hash before the new
/// one is accepted.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<PasswordRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    if req.new_password.is_empty() {
        return Err(ApiError::BadRequest("new password required".into()));
    }

    let row = db::get_user_by_id(&state.db, &user.user_id)?.ok_or(ApiError::NotFound("user"))?;

    if !auth::verify_password(&req.current_password, &row.password_hash)? {
        return Err(ApiError::BadRequest("current password is incorrect".into()));
    }

    let new_hash = auth::hash_password(&req.new_password)?;
    db::update_user_password(&state.db, &user.user_id, &new_hash)?;

    tracing::info!(username = %user.username, "password changed");

    Ok(Json(
        serde_json::json!({ "message": "password updated successfully" }),
    ))
}
