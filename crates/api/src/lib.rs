//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Authentication and rate limiting middleware
//! - Validation pipeline extractors and field rules
//! - Error responses

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
pub mod validation;

use std::sync::Arc;

use axum::Router;
use cashtrackr_core::{account::AccountService, budget::BudgetService};
use cashtrackr_db::{BudgetRepository, UserRepository};
use cashtrackr_shared::{JwtService, Mailer};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};
pub use middleware::RateLimiter;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for session tokens.
    pub jwt_service: Arc<JwtService>,
    /// Notification gateway for account emails.
    pub mailer: Arc<dyn Mailer>,
    /// Request counters for the auth routes.
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Account service backed by the database.
    #[must_use]
    pub fn accounts(&self) -> AccountService<UserRepository> {
        AccountService::new(
            Arc::new(UserRepository::new((*self.db).clone())),
            Arc::clone(&self.mailer),
            Arc::clone(&self.jwt_service),
        )
    }

    /// Budget service backed by the database.
    #[must_use]
    pub fn budgets(&self) -> BudgetService<BudgetRepository> {
        BudgetService::new(Arc::new(BudgetRepository::new((*self.db).clone())))
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
