//! Shared harness: the full router over in-memory SQLite and an outbox mailer.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::AUTHORIZATION},
};
use cashtrackr_api::{AppState, RateLimiter, create_router};
use cashtrackr_db::connect_in_memory;
use cashtrackr_shared::{AuthEmailKind, JwtConfig, JwtService, OutboxMailer};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

pub const PASSWORD: &str = "password";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub outbox: Arc<OutboxMailer>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_rate_limit(1_000).await
    }

    pub async fn with_rate_limit(max_requests: u32) -> Self {
        let db = connect_in_memory()
            .await
            .expect("Failed to open database");
        let outbox = Arc::new(OutboxMailer::new("http://localhost:3000"));

        let state = AppState {
            db: Arc::new(db),
            jwt_service: Arc::new(JwtService::new(JwtConfig::default())),
            mailer: outbox.clone(),
            rate_limiter: Arc::new(RateLimiter::new(Duration::from_secs(60), max_requests)),
        };

        Self {
            router: create_router(state.clone()),
            state,
            outbox,
        }
    }

    /// Sends a request and returns status and JSON body (`Null` when empty).
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = body.map_or_else(Body::empty, |b| Body::from(b.to_string()));

        self.send_request(builder.body(body).unwrap()).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn register(&self, name: &str, email: &str) -> (StatusCode, Value) {
        self.send(
            "POST",
            "/api/auth/create-account",
            None,
            Some(json!({ "name": name, "email": email, "password": PASSWORD })),
        )
        .await
    }

    pub fn confirmation_token(&self, email: &str) -> String {
        self.outbox
            .latest_token(AuthEmailKind::Confirmation, email)
            .expect("confirmation email should have been sent")
    }

    pub fn reset_token(&self, email: &str) -> String {
        self.outbox
            .latest_token(AuthEmailKind::PasswordReset, email)
            .expect("reset email should have been sent")
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Registers, confirms and logs in; returns the session token.
    pub async fn signed_in_user(&self, email: &str) -> String {
        let (status, _) = self.register("Test User", email).await;
        assert_eq!(status, StatusCode::CREATED);

        let token = self.confirmation_token(email);
        let (status, _) = self
            .send(
                "POST",
                "/api/auth/confirm-account",
                None,
                Some(json!({ "token": token })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = self.login(email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK);
        body.as_str().expect("session token").to_string()
    }

    /// Creates a budget and returns its id.
    pub async fn create_budget(&self, token: &str, name: &str, amount: Value) -> i64 {
        let (status, _) = self
            .send(
                "POST",
                "/api/budgets",
                Some(token),
                Some(json!({ "name": name, "amount": amount })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, budgets) = self.send("GET", "/api/budgets", Some(token), None).await;
        budgets[0]["id"].as_i64().expect("budget id")
    }

    /// Creates an expense and returns its id.
    pub async fn create_expense(&self, token: &str, budget_id: i64, name: &str) -> i64 {
        let (status, _) = self
            .send(
                "POST",
                &format!("/api/budgets/{budget_id}/expenses"),
                Some(token),
                Some(json!({ "name": name, "amount": 250 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, budget) = self
            .send("GET", &format!("/api/budgets/{budget_id}"), Some(token), None)
            .await;
        budget["expenses"]
            .as_array()
            .and_then(|expenses| expenses.last())
            .and_then(|expense| expense["id"].as_i64())
            .expect("expense id")
    }
}

pub fn messages(body: &Value) -> Vec<String> {
    body["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e["msg"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
