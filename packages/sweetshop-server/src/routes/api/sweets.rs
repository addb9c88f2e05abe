use crate::db::sweet_ops;
use crate::error::AppError;
use crate::services::auth::{require_admin, require_user};
use crate::services::{catalog, inventory};
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router, middleware};
use std::sync::Arc;
use sweetshop_core::{
    CreateSweetRequest, MessageResponse, PurchaseRequest, PurchaseResponse, RestockRequest,
    RestockResponse, SweetFilters, SweetItem, SweetListResponse, SweetResponse,
    SweetSearchResponse, UpdateSweetRequest,
};
use tracing::info;

use super::parse_id;

pub(crate) fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let admin_router = Router::new()
        .route("/", post(create_sweet_handler))
        .route("/{id}", put(update_sweet_handler).delete(delete_sweet_handler))
        .route("/{id}/restock", post(restock_sweet_handler))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_admin,
        ));

    let customer_router = Router::new()
        .route("/{id}/purchase", post(purchase_sweet_handler))
        .route_layer(middleware::from_fn_with_state(state, require_user));

    Router::new()
        .route("/", get(list_sweets_handler))
        .route("/search", get(search_sweets_handler))
        .route("/{id}", get(get_sweet_handler))
        .merge(admin_router)
        .merge(customer_router)
}

async fn list_sweets_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SweetListResponse>, AppError> {
    let sweets: Vec<SweetItem> = sweet_ops::list_all(&state.db)
        .await?
        .into_iter()
        .map(SweetItem::from)
        .collect();

    Ok(Json(SweetListResponse {
        count: sweets.len(),
        sweets,
    }))
}

async fn search_sweets_handler(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<SweetFilters>,
) -> Result<Json<SweetSearchResponse>, AppError> {
    let search = catalog::parse_search(&filters)?;
    let sweets: Vec<SweetItem> = sweet_ops::search(&state.db, &search)
        .await?
        .into_iter()
        .map(SweetItem::from)
        .collect();

    Ok(Json(SweetSearchResponse {
        count: sweets.len(),
        sweets,
        filters,
    }))
}

async fn get_sweet_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SweetResponse>, AppError> {
    let id = parse_id(&id, "sweet")?;
    let sweet = sweet_ops::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::SweetNotFound)?;

    Ok(Json(SweetResponse {
        message: None,
        sweet: sweet.into(),
    }))
}

async fn create_sweet_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateSweetRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SweetResponse>), AppError> {
    let Json(request) = payload?;
    let new_sweet = catalog::validate_new_sweet(request)?;
    let sweet = sweet_ops::insert(&state.db, new_sweet).await?;
    info!(sweet_id = sweet.id, name = %sweet.name, "sweet created");

    Ok((
        StatusCode::CREATED,
        Json(SweetResponse {
            message: Some("Sweet created successfully".to_string()),
            sweet: sweet.into(),
        }),
    ))
}

async fn update_sweet_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateSweetRequest>, JsonRejection>,
) -> Result<Json<SweetResponse>, AppError> {
    let id = parse_id(&id, "sweet")?;
    let Json(request) = payload?;
    let changes = catalog::validate_changes(request)?;
    let sweet = sweet_ops::update(&state.db, id, changes)
        .await?
        .ok_or(AppError::SweetNotFound)?;
    info!(sweet_id = sweet.id, "sweet updated");

    Ok(Json(SweetResponse {
        message: Some("Sweet updated successfully".to_string()),
        sweet: sweet.into(),
    }))
}

async fn delete_sweet_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, "sweet")?;
    if !sweet_ops::delete_by_id(&state.db, id).await? {
        return Err(AppError::SweetNotFound);
    }
    info!(sweet_id = id, "sweet deleted");

    Ok(Json(MessageResponse {
        message: "Sweet deleted successfully".to_string(),
    }))
}

/// 空请求体或缺少 `quantity` 视为购买 1 件，显式的 `null` 会被拒绝
async fn purchase_sweet_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<PurchaseResponse>, AppError> {
    let id = parse_id(&id, "sweet")?;
    let request: PurchaseRequest = if body.iter().all(u8::is_ascii_whitespace) {
        PurchaseRequest::default()
    } else {
        serde_json::from_slice(&body)?
    };
    let quantity = match request.quantity {
        None => None,
        Some(Some(quantity)) => Some(quantity),
        Some(None) => return Err(AppError::validation("Quantity must be at least 1")),
    };

    let purchase = inventory::purchase(&state.db, id, quantity).await?;

    Ok(Json(PurchaseResponse {
        message: "Purchase successful".to_string(),
        sweet: purchase.sweet.into(),
        purchased: purchase.purchased,
        total_cost: purchase.total_cost,
    }))
}

async fn restock_sweet_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<RestockRequest>, JsonRejection>,
) -> Result<Json<RestockResponse>, AppError> {
    let id = parse_id(&id, "sweet")?;
    let Json(request) = payload?;

    let restock = inventory::restock(&state.db, id, request.quantity).await?;

    Ok(Json(RestockResponse {
        message: "Restock successful".to_string(),
        sweet: restock.sweet.into(),
        restocked: restock.restocked,
    }))
}
