//! API route definitions.

use axum::{Router, middleware};

use crate::{
    AppState,
    middleware::{auth_middleware, rate_limit_middleware},
};

pub mod auth;
pub mod budgets;
pub mod expenses;
pub mod health;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Account routes that require a session
    let account_routes = auth::account_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Everything under /auth shares the request budget
    let auth_routes = Router::new()
        .merge(auth::public_routes())
        .merge(account_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    let budget_routes = Router::new()
        .merge(budgets::routes())
        .merge(expenses::routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(auth_routes)
        .merge(budget_routes)
}
