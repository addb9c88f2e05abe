use crate::routes;
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub(crate) fn axum_app(state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .nest("/auth", routes::auth::router(Arc::clone(&state)))
        .merge(routes::api::router(Arc::clone(&state)));

    Router::new()
        // 公开路由
        .route("/", get(routes::index::root))
        .route("/health", get(routes::index::health))
        .nest("/api", api_router)
        .fallback(routes::index::not_found)
        .method_not_allowed_fallback(routes::index::method_not_allowed)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::config::test_config;
    use crate::db::initialize::test_db;
    use crate::db::user_ops::insert_test_user;
    use crate::db::users::Model as UserModel;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use serde_json::{Value, json};
    use sweetshop_core::Role;
    use tower::ServiceExt;

    struct TestApp {
        state: Arc<AppState>,
    }

    impl TestApp {
        async fn new() -> Self {
            let state = AppState::new(test_db().await, test_config());
            Self {
                state: Arc::new(state),
            }
        }

        async fn user(&self, email: &str, role: Role) -> (UserModel, String) {
            let user = insert_test_user(&self.state.db, email, role).await;
            let token = self.state.keys.issue(&user).unwrap();
            (user, token)
        }

        async fn send(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = axum_app(Arc::clone(&self.state))
                .oneshot(request)
                .await
                .unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        async fn create_ladoo(&self, admin_token: &str) -> i64 {
            let (status, body) = self
                .send(
                    Method::POST,
                    "/api/sweets",
                    Some(admin_token),
                    Some(json!({
                        "name": "Ladoo",
                        "category": "Indian Sweet",
                        "price": 10,
                        "quantity": 5
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body["message"], "Sweet created successfully");
            body["sweet"]["id"].as_i64().unwrap()
        }
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let app = TestApp::new().await;

        let (status, body) = app.send(Method::GET, "/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "running");

        let (status, body) = app.send(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_purchase_flow_end_to_end() {
        let app = TestApp::new().await;
        let (_, admin) = app.user("admin1@sweetshop.com", Role::Admin).await;
        let (_, customer) = app.user("user1@sweetshop.com", Role::User).await;
        let id = app.create_ladoo(&admin).await;

        let uri = format!("/api/sweets/{id}/purchase");
        let (status, body) = app
            .send(Method::POST, &uri, Some(&customer), Some(json!({ "quantity": 3 })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Purchase successful");
        assert_eq!(body["purchased"], 3);
        assert_eq!(body["totalCost"], "30.00");
        assert_eq!(body["sweet"]["quantity"], 2);

        let (status, body) = app
            .send(Method::POST, &uri, Some(&customer), Some(json!({ "quantity": 10 })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INSUFFICIENT_STOCK");
        assert_eq!(body["error"], "Insufficient quantity. Only 2 available");

        let (status, body) = app
            .send(Method::GET, &format!("/api/sweets/{id}"), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sweet"]["quantity"], 2);
    }

    #[tokio::test]
    async fn test_unknown_routes_use_error_envelope() {
        let app = TestApp::new().await;

        let (status, body) = app.send(Method::GET, "/api/cakes", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["error"], "Route not found");

        let (status, body) = app.send(Method::PATCH, "/api/sweets", None, None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["code"], "METHOD_NOT_ALLOWED");
    }

    #[tokio::test]
    async fn test_purchase_rejects_explicit_null_quantity() {
        let app = TestApp::new().await;
        let (_, admin) = app.user("admin1@sweetshop.com", Role::Admin).await;
        let (_, customer) = app.user("user1@sweetshop.com", Role::User).await;
        let id = app.create_ladoo(&admin).await;

        let uri = format!("/api/sweets/{id}/purchase");
        let (status, body) = app
            .send(Method::POST, &uri, Some(&customer), Some(json!({ "quantity": null })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"], "Quantity must be at least 1");

        let (status, body) = app
            .send(Method::POST, &uri, Some(&customer), Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["purchased"], 1);
        assert_eq!(body["sweet"]["quantity"], 4);
    }

    #[tokio::test]
    async fn test_create_rejects_unrepresentable_price() {
        let app = TestApp::new().await;
        let (_, admin) = app.user("admin1@sweetshop.com", Role::Admin).await;

        let (status, body) = app
            .send(
                Method::POST,
                "/api/sweets",
                Some(&admin),
                Some(json!({
                    "name": "Gold Leaf Barfi",
                    "category": "Indian Sweet",
                    "price": 1e29,
                    "quantity": 5
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_purchase_with_empty_body_buys_one() {
        let app = TestApp::new().await;
        let (_, admin) = app.user("admin1@sweetshop.com", Role::Admin).await;
        let (_, customer) = app.user("user1@sweetshop.com", Role::User).await;
        let id = app.create_ladoo(&admin).await;

        let (status, body) = app
            .send(Method::POST, &format!("/api/sweets/{id}/purchase"), Some(&customer), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["purchased"], 1);
        assert_eq!(body["totalCost"], "10.00");
        assert_eq!(body["sweet"]["quantity"], 4);
    }

    #[tokio::test]
    async fn test_access_control() {
        let app = TestApp::new().await;
        let (_, customer) = app.user("user1@sweetshop.com", Role::User).await;
        let (_, admin) = app.user("admin1@sweetshop.com", Role::Admin).await;

        let (status, body) = app.send(Method::POST, "/api/sweets", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "MISSING_TOKEN");

        let (status, body) = app
            .send(Method::POST, "/api/sweets/1/purchase", Some("not-a-jwt"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "INVALID_TOKEN");

        let (status, body) = app
            .send(Method::POST, "/api/sweets", Some(&customer), Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");

        let (status, _) = app.send(Method::GET, "/api/users", Some(&admin), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app.send(Method::GET, "/api/sweets", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn test_sweet_validation_errors() {
        let app = TestApp::new().await;
        let (_, admin) = app.user("admin1@sweetshop.com", Role::Admin).await;
        let id = app.create_ladoo(&admin).await;

        let (status, body) = app
            .send(Method::POST, "/api/sweets", Some(&admin), Some(json!({ "name": "Barfi" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"], "Name, category, price, and quantity are required");

        let (status, body) = app.send(Method::GET, "/api/sweets/abc", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_ID");

        let (status, body) = app.send(Method::GET, "/api/sweets/9999", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "SWEET_NOT_FOUND");

        let (status, body) = app
            .send(
                Method::POST,
                &format!("/api/sweets/{id}/restock"),
                Some(&admin),
                Some(json!({ "quantity": 0 })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Quantity must be at least 1");
    }

    #[tokio::test]
    async fn test_update_restock_and_delete_sweet() {
        let app = TestApp::new().await;
        let (_, admin) = app.user("admin1@sweetshop.com", Role::Admin).await;
        let id = app.create_ladoo(&admin).await;

        let (status, body) = app
            .send(
                Method::PUT,
                &format!("/api/sweets/{id}"),
                Some(&admin),
                Some(json!({ "price": 12.5, "description": "Besan ladoo" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Sweet updated successfully");
        assert_eq!(body["sweet"]["price"], 12.5);
        assert_eq!(body["sweet"]["name"], "Ladoo");
        assert_eq!(body["sweet"]["description"], "Besan ladoo");

        let (status, body) = app
            .send(
                Method::POST,
                &format!("/api/sweets/{id}/restock"),
                Some(&admin),
                Some(json!({ "quantity": 10 })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Restock successful");
        assert_eq!(body["restocked"], 10);
        assert_eq!(body["sweet"]["quantity"], 15);

        let (status, body) = app
            .send(Method::DELETE, &format!("/api/sweets/{id}"), Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Sweet deleted successfully");

        let (status, _) = app
            .send(Method::DELETE, &format!("/api/sweets/{id}"), Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_search_exact_price_range() {
        let app = TestApp::new().await;
        let (_, admin) = app.user("admin1@sweetshop.com", Role::Admin).await;
        for (name, price) in [("Jalebi", 5.0), ("Ladoo", 10.0), ("Peda", 5.0)] {
            let (status, _) = app
                .send(
                    Method::POST,
                    "/api/sweets",
                    Some(&admin),
                    Some(json!({
                        "name": name,
                        "category": "Indian Sweet",
                        "price": price,
                        "quantity": 1
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, body) = app
            .send(Method::GET, "/api/sweets/search?minPrice=5&maxPrice=5", None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["filters"]["minPrice"], "5");
        assert_eq!(body["filters"]["name"], Value::Null);

        let (status, body) = app
            .send(Method::GET, "/api/sweets/search?maxPrice=cheap", None, None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_user_management() {
        let app = TestApp::new().await;
        let (root, root_token) = app.user("superadmin@sweetshop.com", Role::SuperAdmin).await;
        let (user, _) = app.user("user1@sweetshop.com", Role::User).await;

        let (status, body) = app
            .send(Method::GET, "/api/users?role=user", Some(&root_token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert!(body[0].get("password").is_none());

        let uri = format!("/api/users/{}", user.id);
        let (status, body) = app
            .send(Method::PUT, &uri, Some(&root_token), Some(json!({ "role": "overlord" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_ROLE");

        let (status, body) = app
            .send(Method::PUT, &uri, Some(&root_token), Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MISSING_ROLE");

        let stored = crate::db::user_ops::find_by_id(&app.state.db, user.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.role, Role::User);

        let (status, body) = app
            .send(Method::PUT, &uri, Some(&root_token), Some(json!({ "role": "admin" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "admin");

        let (status, body) = app
            .send(
                Method::DELETE,
                &format!("/api/users/{}", root.id),
                Some(&root_token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "CANNOT_DELETE_SELF");

        let (status, body) = app.send(Method::DELETE, &uri, Some(&root_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User deleted successfully");
        assert_eq!(body["user"]["email"], "user1@sweetshop.com");

        let (status, body) = app.send(Method::DELETE, &uri, Some(&root_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "USER_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_register_login_and_me() {
        let app = TestApp::new().await;

        let (status, body) = app
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "email": " New.Customer@Example.com ",
                    "password": "secret1",
                    "name": "New Customer"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["email"], "new.customer@example.com");
        assert_eq!(body["user"]["role"], "user");

        let (status, body) = app
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": "new.customer@example.com", "password": "wrong!" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "INVALID_CREDENTIALS");

        let (status, body) = app
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": "new.customer@example.com", "password": "secret1" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();

        let (status, body) = app.send(Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "New Customer");
    }
}
