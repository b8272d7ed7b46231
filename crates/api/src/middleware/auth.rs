//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use cashtrackr_core::account::UserProfile;
use cashtrackr_shared::AppError;
use tracing::debug;

use crate::AppState;
use crate::error::{ApiError, unauthorized};

/// Extracts the token segment that follows the scheme in the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header.split(' ').nth(1).filter(|token| !token.is_empty())
}

/// Authentication middleware that resolves the session token to a user.
///
/// This middleware:
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Validates the token using the JWT service
/// 3. Loads the user (id, name, email) and stores it in request extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers()).await {
        Ok(user) => {
            debug!(user_id = user.id, "Request authenticated");
            request.extensions_mut().insert(AuthUser(user));
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<UserProfile, ApiError> {
    let Some(header) = headers.get(AUTHORIZATION) else {
        return Err(unauthorized("No Autorizado"));
    };

    let token = header
        .to_str()
        .ok()
        .and_then(extract_bearer_token)
        .ok_or_else(|| unauthorized("Token no válido"))?;

    let claims = state
        .jwt_service
        .verify_session_token(token)
        .map_err(|_| unauthorized("Token no válido"))?;

    Ok(state.accounts().current_user(claims.user_id()).await?)
}

/// Extractor for the authenticated user.
///
/// Use this in handlers behind [`auth_middleware`]:
///
/// ```ignore
/// async fn handler(AuthUser(user): AuthUser) -> impl IntoResponse {
///     Json(user)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserProfile);

impl AuthUser {
    /// Returns the user ID.
    #[must_use]
    pub const fn user_id(&self) -> i32 {
        self.0.id
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| ApiError(AppError::Unauthorized("No Autorizado".to_string())))
    }
}
