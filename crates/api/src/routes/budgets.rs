//! Budget routes (requires auth middleware to be applied externally).
//!
//! Routes with `{budgetId}` go through [`BudgetContext`], so handlers only
//! ever see a budget the caller owns.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use cashtrackr_core::budget::{Budget, BudgetInput, BudgetWithExpenses};

use crate::{
    AppState,
    error::ApiResult,
    extractors::{BudgetContext, ValidatedJson},
    middleware::AuthUser,
    validation::{Body, Field, RequestBody, Rule},
};

/// Creates the budget routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/budgets", get(list_budgets).post(create_budget))
        .route(
            "/budgets/{budgetId}",
            get(get_budget).put(update_budget).delete(delete_budget),
        )
}

/// Body of budget create and update.
#[derive(Debug)]
pub struct BudgetBody(BudgetInput);

impl RequestBody for BudgetBody {
    const FIELDS: &'static [Field] = &[
        Field {
            name: "name",
            rules: &[Rule::NotEmpty(
                "El nombre del presupuesto no puede estar vacío",
            )],
        },
        Field {
            name: "amount",
            rules: &[
                Rule::NotEmpty("La cantidad del presupuesto no puede estar vacía"),
                Rule::Numeric("Cantidad no válida"),
                Rule::Positive("La cantidad del presupuesto debe ser mayor que 0"),
            ],
        },
    ];

    fn from_body(body: &Body) -> Self {
        Self(BudgetInput {
            name: body.text("name"),
            amount: body.decimal("amount"),
        })
    }
}

/// GET /budgets - Budgets of the caller, newest first.
async fn list_budgets(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<Budget>>> {
    let budgets = state.budgets().list_budgets(user.user_id()).await?;
    Ok(Json(budgets))
}

/// POST /budgets - Create a budget owned by the caller.
async fn create_budget(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(BudgetBody(input)): ValidatedJson<BudgetBody>,
) -> ApiResult<(StatusCode, Json<&'static str>)> {
    state.budgets().create_budget(user.user_id(), input).await?;
    Ok((StatusCode::CREATED, Json("Presupuesto Creado Correctamente")))
}

/// GET /budgets/{budgetId} - The budget with its expenses.
async fn get_budget(
    State(state): State<AppState>,
    BudgetContext(budget): BudgetContext,
) -> ApiResult<Json<BudgetWithExpenses>> {
    let budget = state.budgets().get_budget(budget).await?;
    Ok(Json(budget))
}

/// PUT /budgets/{budgetId} - Overwrite name and amount.
async fn update_budget(
    State(state): State<AppState>,
    BudgetContext(budget): BudgetContext,
    ValidatedJson(BudgetBody(input)): ValidatedJson<BudgetBody>,
) -> ApiResult<Json<&'static str>> {
    state.budgets().update_budget(&budget, input).await?;
    Ok(Json("Presupuesto actualizado correctamente"))
}

/// DELETE /budgets/{budgetId} - Delete the budget and its expenses.
async fn delete_budget(
    State(state): State<AppState>,
    BudgetContext(budget): BudgetContext,
) -> ApiResult<Json<&'static str>> {
    state.budgets().delete_budget(&budget).await?;
    Ok(Json("Presupuesto eliminado correctamente"))
}
