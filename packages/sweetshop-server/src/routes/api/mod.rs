use crate::error::AppError;
use crate::state::AppState;
use axum::Router;
use std::sync::Arc;

mod sweets;
mod users;

pub(crate) fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .nest("/sweets", sweets::router(Arc::clone(&state)))
        .nest("/users", users::router(state))
}

/// 路径中的 id 必须是整数
fn parse_id(raw: &str, what: &str) -> Result<i32, AppError> {
    raw.parse::<i32>().map_err(|_| AppError::Validation {
        code: "INVALID_ID",
        message: format!("Invalid {what} ID"),
    })
}
