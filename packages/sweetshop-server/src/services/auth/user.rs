use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use bcrypt::{hash, verify};
use std::sync::Arc;
use sweetshop_core::{AuthResponse, LoginRequest, PublicUser, RegisterRequest, Role};
use tracing::{info, warn};

use crate::db::user_ops::{self, NewUser};
use crate::error::AppError;
use crate::services::auth::Identity;
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 6;

/// 哈希密码（在阻塞线程池中执行）
pub async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))
}

/// 验证密码
pub async fn verify_password(password: String, hashed: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify(password, &hashed))
        .await
        .map_err(|e| AppError::Internal(format!("password verification task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("failed to verify password: {e}")))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_registration(request: &RegisterRequest) -> Result<(String, String), AppError> {
    let email = normalize_email(&request.email);
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::validation("A valid email address is required"));
    }

    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::validation("Name is required"));
    }

    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    Ok((email, name))
}

/// 用户注册，新用户默认为普通用户
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let Json(request) = payload?;
    let (email, name) = validate_registration(&request)?;

    if user_ops::find_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::EmailTaken);
    }

    let password = hash_password(request.password, state.config.bcrypt_cost).await?;
    let user = user_ops::insert(
        &state.db,
        NewUser {
            email,
            password,
            name,
            role: Role::User,
        },
    )
    .await?;

    let token = state.keys.issue(&user)?;
    info!(user_id = user.id, email = %user.email, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "Registration successful".to_string(),
            user: user.into(),
            token,
        }),
    ))
}

/// 用户登录
pub async fn login_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(request) = payload?;
    let email = normalize_email(&request.email);

    let Some(user) = user_ops::find_by_email(&state.db, &email).await? else {
        warn!(email = %email, "login attempt for unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(request.password, user.password.clone()).await? {
        warn!(user_id = user.id, "login attempt with wrong password");
        return Err(AppError::InvalidCredentials);
    }

    let token = state.keys.issue(&user)?;
    info!(user_id = user.id, "user logged in");

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        user: user.into(),
        token,
    }))
}

/// 获取当前用户信息
pub async fn get_user_profile(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<PublicUser>, AppError> {
    let user = user_ops::find_by_id(&state.db, identity.user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;
    Ok(Json(user.into()))
}
