use axum::{
    extract::{Request, State},
    http::HeaderMap,
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use sweetshop_core::Role;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::db::users::Model as UserModel;
use crate::error::AppError;
use crate::state::AppState;

/// 凭证校验与权限判定的错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authorization header is required")]
    MissingHeader,
    #[error("Invalid authorization format. Use Bearer token")]
    MalformedHeader,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Access forbidden. {required} privileges required")]
    Forbidden { role: Role, required: Access },
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "MISSING_TOKEN",
            AuthError::MalformedHeader => "INVALID_AUTH_HEADER",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::Forbidden { .. } => "FORBIDDEN",
        }
    }
}

/// 路由所需的访问级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Authenticated,
    AdminOrAbove,
    SuperAdminOnly,
}

impl Access {
    pub fn minimum_role(self) -> Role {
        match self {
            Access::Authenticated => Role::User,
            Access::AdminOrAbove => Role::Admin,
            Access::SuperAdminOnly => Role::SuperAdmin,
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Authenticated => f.write_str("Authenticated user"),
            Access::AdminOrAbove => f.write_str("Admin"),
            Access::SuperAdminOnly => f.write_str("Super admin"),
        }
    }
}

/// 已校验的调用者身份，由中间件放入请求扩展
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i32,
    pub email: String,
    pub role: Role,
}

/// 用户JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserClaims {
    pub sub: String,  // User ID
    pub email: String,
    pub role: Role,
    pub iat: i64,     // 签发时间
    pub exp: i64,     // 过期时间
    pub jti: String,  // JWT ID
}

/// JWT 签发与校验密钥
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: chrono::Duration,
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl JwtKeys {
    pub fn new(secret: &str, ttl: chrono::Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// 为用户签发 HS256 token
    pub fn issue(&self, user: &UserModel) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = UserClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::new(jsonwebtoken::Algorithm::HS256),
            &claims,
            &self.encoding,
        )
        .map_err(|e| AppError::Internal(format!("failed to encode JWT: {e}")))
    }

    /// 校验签名与过期时间，返回调用者身份
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 60; // 允许60秒的时钟偏差

        let data = decode::<UserClaims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "JWT verification failed");
            AuthError::InvalidToken
        })?;

        let user_id = data
            .claims
            .sub
            .parse::<i32>()
            .map_err(|_| AuthError::InvalidToken)?;

        Ok(Identity {
            user_id,
            email: data.claims.email,
            role: data.claims.role,
        })
    }
}

/// 从请求头中提取 Bearer Token
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedHeader)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }
    Ok(token)
}

pub fn authenticate(headers: &HeaderMap, keys: &JwtKeys) -> Result<Identity, AuthError> {
    let token = extract_bearer_token(headers)?;
    keys.verify(token)
}

/// 纯权限判定，不涉及 IO
pub fn authorize(identity: &Identity, required: Access) -> Result<(), AuthError> {
    if identity.role.at_least(required.minimum_role()) {
        Ok(())
    } else {
        Err(AuthError::Forbidden {
            role: identity.role,
            required,
        })
    }
}

async fn gate(
    state: &AppState,
    mut request: Request,
    next: Next,
    required: Access,
) -> Result<Response, AppError> {
    let identity = authenticate(request.headers(), &state.keys)?;

    if let Err(err) = authorize(&identity, required) {
        warn!(
            user_id = identity.user_id,
            email = %identity.email,
            role = %identity.role,
            path = %request.uri().path(),
            "access denied"
        );
        return Err(err.into());
    }

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// 任意已登录用户
pub async fn require_user(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    gate(&state, request, next, Access::Authenticated).await
}

/// admin 及以上
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    gate(&state, request, next, Access::AdminOrAbove).await
}

/// 仅 super_admin
pub async fn require_super_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    gate(&state, request, next, Access::SuperAdminOnly).await
}
