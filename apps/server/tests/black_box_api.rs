//! Black-box HTTP tests.
//!
//! Spawns the real router against an in-memory database on an ephemeral
//! loopback port and drives it with reqwest, exactly as the admin SPA
//! would.

use std::sync::Arc;

use serde_json::{json, Value};

use bistro_db::{Database, DbConfig};
use bistro_server::app::build_app;
use bistro_server::config::ServerConfig;
use bistro_server::state::{ensure_bootstrap_admin, AppState};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        ensure_bootstrap_admin(&db, "admin", "bistro123").await.unwrap();

        let config = ServerConfig {
            port: 0,
            database_path: ":memory:".to_string(),
            jwt_secret: "black-box-test-secret".to_string(),
            jwt_access_lifetime_secs: 3600,
            jwt_refresh_lifetime_secs: 86400,
            bootstrap_admin_username: "admin".to_string(),
            bootstrap_admin_password: "bistro123".to_string(),
        };

        let app = build_app(Arc::new(AppState::new(db, config)));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestServer {
            base_url: format!("http://{}", addr),
            client: reqwest::Client::new(),
            handle,
        }
    }

    async fn login(&self) -> String {
        let resp = self
            .client
            .post(format!("{}/auth/login", self.base_url))
            .json(&json!({ "username": "admin", "password": "bistro123" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        body["accessToken"].as_str().unwrap().to_string()
    }

    async fn post(&self, token: &str, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn post_empty(&self, token: &str, path: &str) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    async fn get(&self, token: &str, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_is_public() {
    let server = TestServer::spawn().await;

    let resp = reqwest::get(format!("{}/health", server.base_url))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["migrationsTotal"], body["migrationsApplied"]);
}

#[tokio::test]
async fn protected_routes_require_bearer_token() {
    let server = TestServer::spawn().await;

    let resp = reqwest::get(format!("{}/menu/items", server.base_url))
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let server = TestServer::spawn().await;

    let resp = server
        .client
        .post(format!("{}/auth/login", server.base_url))
        .json(&json!({ "username": "admin", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn refresh_issues_new_pair() {
    let server = TestServer::spawn().await;

    let resp = server
        .client
        .post(format!("{}/auth/login", server.base_url))
        .json(&json!({ "username": "admin", "password": "bistro123" }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let refresh = body["refreshToken"].as_str().unwrap();

    let resp = server
        .client
        .post(format!("{}/auth/refresh", server.base_url))
        .json(&json!({ "refreshToken": refresh }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert!(body["accessToken"].as_str().is_some());

    // An access token must not pass as a refresh token
    let access = body["accessToken"].as_str().unwrap();
    let resp = server
        .client
        .post(format!("{}/auth/refresh", server.base_url))
        .json(&json!({ "refreshToken": access }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

/// The central scenario: an order whose recipe outruns the stockroom is
/// refused with the full shortfall list and deducts nothing; after
/// receiving goods the same order starts, deducts, and leaves movements
/// behind.
#[tokio::test]
async fn order_start_consumes_stock_or_refuses() {
    let server = TestServer::spawn().await;
    let token = server.login().await;

    // One bun on hand, recipe needs one per burger
    let resp = server
        .post(
            &token,
            "/stock/items",
            json!({ "name": "Burger Bun", "unit": "pcs", "onHandQty": 1, "unitCostCents": 35 }),
        )
        .await;
    assert_eq!(resp.status(), 201);
    let bun: Value = resp.json().await.unwrap();
    let bun_id = bun["id"].as_str().unwrap().to_string();

    let resp = server
        .post(
            &token,
            "/menu/items",
            json!({ "name": "Classic Burger", "category": "mains", "priceCents": 1099, "taxRateBps": 825 }),
        )
        .await;
    assert_eq!(resp.status(), 201);
    let burger: Value = resp.json().await.unwrap();
    let burger_id = burger["id"].as_str().unwrap().to_string();

    let resp = server
        .client
        .put(format!("{}/menu/items/{}/recipe", server.base_url, burger_id))
        .bearer_auth(&token)
        .json(&json!({ "entries": [{ "stockItemId": bun_id, "qtyPerUnitMilli": 1000 }] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Two burgers against one bun
    let resp = server
        .post(
            &token,
            "/orders",
            json!({ "lines": [{ "menuItemId": burger_id, "quantity": 2 }] }),
        )
        .await;
    assert_eq!(resp.status(), 201);
    let order: Value = resp.json().await.unwrap();
    let order_id = order["id"].as_str().unwrap().to_string();
    assert_eq!(order["status"], "pending");
    assert_eq!(order["subtotalCents"], 2198);

    // Start refused: shortfall named, nothing deducted
    let resp = server
        .post_empty(&token, &format!("/orders/{}/start", order_id))
        .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Burger Bun (needed 2, have 1)"));

    let resp = server.get(&token, &format!("/stock/items/{}", bun_id)).await;
    let bun: Value = resp.json().await.unwrap();
    assert_eq!(bun["onHandQty"], 1);

    // The refusal hands the claim back: the ticket is still pending
    let resp = server.get(&token, &format!("/orders/{}", order_id)).await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["order"]["status"], "pending");

    // Receive a delivery, then the start succeeds
    let resp = server
        .post(
            &token,
            &format!("/stock/items/{}/receive", bun_id),
            json!({ "quantity": 12 }),
        )
        .await;
    assert_eq!(resp.status(), 200);

    let resp = server
        .post_empty(&token, &format!("/orders/{}/start", order_id))
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["order"]["status"], "in_progress");
    assert_eq!(body["deductions"][0]["quantity"], 2);

    let resp = server.get(&token, &format!("/stock/items/{}", bun_id)).await;
    let bun: Value = resp.json().await.unwrap();
    assert_eq!(bun["onHandQty"], 11);

    // Double-tap must not deduct again
    let resp = server
        .post_empty(&token, &format!("/orders/{}/start", order_id))
        .await;
    assert_eq!(resp.status(), 409);

    // One 'received' and one 'consumption' movement on the trail
    let resp = server
        .get(&token, &format!("/stock/items/{}/movements", bun_id))
        .await;
    let movements: Value = resp.json().await.unwrap();
    let kinds: Vec<&str> = movements
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["kind"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"received"));
    assert!(kinds.contains(&"consumption"));
}

#[tokio::test]
async fn full_service_flow_through_close() {
    let server = TestServer::spawn().await;
    let token = server.login().await;

    let resp = server
        .post(
            &token,
            "/menu/items",
            json!({ "name": "Lemonade", "priceCents": 399, "taxRateBps": 825 }),
        )
        .await;
    let item: Value = resp.json().await.unwrap();
    let item_id = item["id"].as_str().unwrap();

    // No recipe: the order starts without touching stock
    let resp = server
        .post(
            &token,
            "/orders",
            json!({ "lines": [{ "menuItemId": item_id, "quantity": 1 }] }),
        )
        .await;
    let order: Value = resp.json().await.unwrap();
    let order_id = order["id"].as_str().unwrap().to_string();
    let total = order["totalCents"].as_i64().unwrap();
    assert_eq!(total, 399 + 33); // 8.25% of 399, rounded half-up

    for step in ["start", "ready", "serve"] {
        let resp = server
            .post_empty(&token, &format!("/orders/{}/{}", order_id, step))
            .await;
        assert_eq!(resp.status(), 200, "step {} failed", step);
    }

    // Closing before payment is refused
    let resp = server
        .post_empty(&token, &format!("/orders/{}/close", order_id))
        .await;
    assert_eq!(resp.status(), 409);

    let resp = server
        .post(
            &token,
            &format!("/orders/{}/payments", order_id),
            json!({ "method": "cash", "amountCents": total, "tenderedCents": 500 }),
        )
        .await;
    assert_eq!(resp.status(), 201);
    let payment: Value = resp.json().await.unwrap();
    assert_eq!(payment["changeCents"], 500 - total);

    let resp = server
        .post_empty(&token, &format!("/orders/{}/close", order_id))
        .await;
    assert_eq!(resp.status(), 200);
    let closed: Value = resp.json().await.unwrap();
    assert_eq!(closed["status"], "closed");
    assert!(closed["closedAt"].as_str().is_some());
}

#[tokio::test]
async fn user_admin_requires_admin_role() {
    let server = TestServer::spawn().await;
    let token = server.login().await;

    // Admin creates a waiter account
    let resp = server
        .post(
            &token,
            "/users",
            json!({
                "username": "maria.r",
                "displayName": "Maria R",
                "password": "waiterpass1",
                "role": "waiter"
            }),
        )
        .await;
    assert_eq!(resp.status(), 201);

    // The waiter can log in but cannot list users
    let resp = server
        .client
        .post(format!("{}/auth/login", server.base_url))
        .json(&json!({ "username": "maria.r", "password": "waiterpass1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let waiter_token = body["accessToken"].as_str().unwrap().to_string();

    let resp = server.get(&waiter_token, "/users").await;
    assert_eq!(resp.status(), 403);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "FORBIDDEN");
}
