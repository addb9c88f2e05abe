use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;

use crate::services::auth::require_user;
use crate::services::auth::user::{get_user_profile, login_user, register_user};
use crate::state::AppState;

pub(crate) fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected_router = Router::new()
        .route("/me", get(get_user_profile))
        .route_layer(middleware::from_fn_with_state(state, require_user));

    Router::new()
        .route("/register", post(register_user))
        .route("/login", post(login_user))
        .merge(protected_router)
}
