use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::DbErr;
use sweetshop_core::ErrorBody;
use thiserror::Error;
use tracing::{error, warn};

use crate::services::auth::AuthError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid request body: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{message}")]
    Validation { code: &'static str, message: String },
    #[error("Sweet not found")]
    SweetNotFound,
    #[error("User not found")]
    UserNotFound,
    #[error("Insufficient quantity. Only {available} available")]
    InsufficientStock { available: i32 },
    #[error("Cannot delete your own account")]
    CannotDeleteSelf,
    #[error("Invalid role. Must be one of: super_admin, admin, user")]
    InvalidRole,
    #[error("An account with this email already exists")]
    EmailTaken,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Route not found")]
    RouteNotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            code: "VALIDATION_ERROR",
            message: message.into(),
        }
    }

    pub(crate) fn status(&self) -> StatusCode {
        match self {
            AppError::Db(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Json(_)
            | AppError::JsonRejection(_)
            | AppError::Validation { .. }
            | AppError::InsufficientStock { .. }
            | AppError::CannotDeleteSelf
            | AppError::InvalidRole
            | AppError::EmailTaken => StatusCode::BAD_REQUEST,
            AppError::Auth(AuthError::Forbidden { .. }) => StatusCode::FORBIDDEN,
            AppError::Auth(_) | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::SweetNotFound | AppError::UserNotFound | AppError::RouteNotFound => {
                StatusCode::NOT_FOUND
            }
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    pub(crate) fn code(&self) -> &'static str {
        match self {
            AppError::Db(_) | AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::Json(_) | AppError::JsonRejection(_) => "INVALID_JSON",
            AppError::Auth(err) => err.code(),
            AppError::Validation { code, .. } => code,
            AppError::SweetNotFound => "SWEET_NOT_FOUND",
            AppError::UserNotFound => "USER_NOT_FOUND",
            AppError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            AppError::CannotDeleteSelf => "CANNOT_DELETE_SELF",
            AppError::InvalidRole => "INVALID_ROLE",
            AppError::EmailTaken => "EMAIL_TAKEN",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::RouteNotFound => "NOT_FOUND",
            AppError::MethodNotAllowed => "METHOD_NOT_ALLOWED",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = match &self {
            AppError::Db(err) => {
                error!(error = %err, "database error");
                "Internal server error".to_string()
            }
            AppError::Internal(msg) => {
                error!(error = %msg, "internal error");
                "Internal server error".to_string()
            }
            AppError::Json(err) => {
                warn!(error = %err, "json error");
                "Invalid JSON body".to_string()
            }
            AppError::JsonRejection(rejection) => rejection.body_text(),
            other => other.to_string(),
        };
        let body = ErrorBody {
            error: message,
            code: self.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
