//! Validation pipeline stages as request extractors.
//!
//! Handlers list them in pipeline order. Path stages run before the body is
//! read:
//!
//! ```ignore
//! async fn update_expense(
//!     State(state): State<AppState>,
//!     ExpenseContext { expense, .. }: ExpenseContext,
//!     ValidatedJson(body): ValidatedJson<ExpenseBody>,
//! ) -> ApiResult<Json<&'static str>>
//! ```

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use cashtrackr_core::budget::{Budget, BudgetError, Expense};
use cashtrackr_shared::AppError;
use tracing::{debug, warn};

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::validation::{Body, RequestBody};

/// JSON body that passed its declared field rules.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: RequestBody,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        // Transport failures such as an oversized body keep axum's own status.
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let body = Body::parse(&bytes);
        let errors = body.check(T::FIELDS);
        if !errors.is_empty() {
            return Err(ApiError(AppError::Validation(errors)).into_response());
        }

        Ok(Self(T::from_body(&body)))
    }
}

/// Reads one path parameter by name.
///
/// A segment that does not decode (e.g. `%FF`) is reported as an invalid id,
/// carrying the segment that follows `collection` in the raw path.
async fn path_param(
    parts: &mut Parts,
    state: &AppState,
    name: &'static str,
    collection: &str,
) -> Result<String, ApiError> {
    let params = match Path::<HashMap<String, String>>::from_request_parts(parts, state).await {
        Ok(Path(params)) => params,
        Err(rejection) => {
            debug!(error = %rejection, param = name, "Undecodable path parameter");
            let raw = segment_after(parts.uri.path(), collection).unwrap_or_default();
            return Err(BudgetError::InvalidId { param: name, raw }.into());
        }
    };

    params
        .get(name)
        .cloned()
        .ok_or_else(|| ApiError(AppError::Internal(format!("missing path parameter {name}"))))
}

/// The raw path segment right after the `collection` segment.
pub(crate) fn segment_after(path: &str, collection: &str) -> Option<String> {
    let mut segments = path.split('/');
    segments.find(|segment| *segment == collection)?;
    segments.next().map(str::to_string)
}

/// A budget resolved from `{budgetId}` and owned by the caller.
#[derive(Debug, Clone)]
pub struct BudgetContext(pub Budget);

impl FromRequestParts<AppState> for BudgetContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(context) = parts.extensions.get::<Self>() {
            return Ok(context.clone());
        }

        let user = AuthUser::from_request_parts(parts, state).await?;
        let raw_id = path_param(parts, state, "budgetId", "budgets").await?;

        let budget = state.budgets().load_budget(&raw_id).await?;
        if let Err(e) = budget.ensure_owned_by(user.user_id()) {
            warn!(error = %e, "Budget access denied");
            return Err(e.into());
        }

        let context = Self(budget);
        parts.extensions.insert(context.clone());
        Ok(context)
    }
}

/// An expense resolved from `{expenseId}` under an authorized budget.
#[derive(Debug, Clone)]
pub struct ExpenseContext {
    /// The authorized parent budget.
    pub budget: Budget,
    /// The expense, guaranteed to belong to `budget`.
    pub expense: Expense,
}

impl FromRequestParts<AppState> for ExpenseContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BudgetContext(budget) = BudgetContext::from_request_parts(parts, state).await?;
        let raw_id = path_param(parts, state, "expenseId", "expenses").await?;

        let expense = state
            .budgets()
            .load_expense(&budget, &raw_id)
            .await
            .inspect_err(|e| {
                if matches!(e, BudgetError::ExpenseOutsideBudget { .. }) {
                    warn!(error = %e, "Expense access denied");
                }
            })?;

        Ok(Self { budget, expense })
    }
}
