use crate::db::user_ops::{self, DEFAULT_PAGE_LIMIT, Page, UserFilter};
use crate::error::AppError;
use crate::services::auth::{Identity, require_super_admin};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Extension, Json, Router, middleware};
use serde::Deserialize;
use std::sync::Arc;
use sweetshop_core::{DeletedUserResponse, PublicUser, Role, UpdateRoleRequest};
use tracing::info;

use super::parse_id;

/// 用户列表查询参数，数值字段在 handler 中解析以返回统一的错误格式
#[derive(Debug, Default, Deserialize)]
struct ListUsersQuery {
    search: Option<String>,
    role: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
}

pub(crate) fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_users_handler))
        .route("/{id}", put(update_user_role_handler).delete(delete_user_handler))
        .route_layer(middleware::from_fn_with_state(state, require_super_admin))
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_count(field: &str, value: Option<String>, default: u64) -> Result<u64, AppError> {
    match present(value) {
        None => Ok(default),
        Some(text) => text
            .trim()
            .parse::<u64>()
            .map_err(|_| AppError::validation(format!("{field} must be a non-negative integer"))),
    }
}

fn invalid_role_filter() -> AppError {
    AppError::Validation {
        code: "INVALID_ROLE",
        message: AppError::InvalidRole.to_string(),
    }
}

fn parse_list_query(query: ListUsersQuery) -> Result<(UserFilter, Page), AppError> {
    let role = present(query.role)
        .map(|role| role.parse::<Role>().map_err(|_| invalid_role_filter()))
        .transpose()?;
    let limit = parse_count("limit", query.limit, DEFAULT_PAGE_LIMIT)?;
    let offset = parse_count("offset", query.offset, 0)?;

    Ok((
        UserFilter {
            search: present(query.search),
            role,
        },
        Page::new(limit, offset),
    ))
}

async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    let (filter, page) = parse_list_query(query)?;
    let users = user_ops::list(&state.db, &filter, page).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

async fn update_user_role_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateRoleRequest>, JsonRejection>,
) -> Result<Json<PublicUser>, AppError> {
    let id = parse_id(&id, "user")?;
    let Json(request) = payload?;

    let Some(role) = present(request.role) else {
        return Err(AppError::Validation {
            code: "MISSING_ROLE",
            message: "Role is required".to_string(),
        });
    };
    let role: Role = role.parse().map_err(|_| AppError::InvalidRole)?;

    let user = user_ops::update_role(&state.db, id, role)
        .await?
        .ok_or(AppError::UserNotFound)?;
    info!(
        user_id = user.id,
        role = %user.role,
        changed_by = identity.user_id,
        "user role updated"
    );

    Ok(Json(user.into()))
}

async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<DeletedUserResponse>, AppError> {
    let id = parse_id(&id, "user")?;
    if id == identity.user_id {
        return Err(AppError::CannotDeleteSelf);
    }

    let user = user_ops::delete_by_id(&state.db, id)
        .await?
        .ok_or(AppError::UserNotFound)?;
    info!(user_id = user.id, deleted_by = identity.user_id, "user deleted");

    Ok(Json(DeletedUserResponse {
        message: "User deleted successfully".to_string(),
        user: user.into(),
    }))
}
