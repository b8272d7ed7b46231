//! Expense routes, nested under an owned budget.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use cashtrackr_core::budget::{Expense, ExpenseInput};

use crate::{
    AppState,
    error::ApiResult,
    extractors::{BudgetContext, ExpenseContext, ValidatedJson},
    validation::{Body, Field, RequestBody, Rule},
};

/// Creates the expense routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/budgets/{budgetId}/expenses", post(create_expense))
        .route(
            "/budgets/{budgetId}/expenses/{expenseId}",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
}

/// Body of expense create and update.
#[derive(Debug)]
pub struct ExpenseBody(ExpenseInput);

impl RequestBody for ExpenseBody {
    const FIELDS: &'static [Field] = &[
        Field {
            name: "name",
            rules: &[Rule::NotEmpty("El nombre del gasto no puede ir vacio")],
        },
        Field {
            name: "amount",
            rules: &[
                Rule::NotEmpty("La cantidad del gasto no puede estar vacía"),
                Rule::Numeric("Cantidad no válida"),
                Rule::Positive("La cantidad del gasto debe ser mayor que 0"),
            ],
        },
    ];

    fn from_body(body: &Body) -> Self {
        Self(ExpenseInput {
            name: body.text("name"),
            amount: body.decimal("amount"),
        })
    }
}

/// POST /budgets/{budgetId}/expenses
async fn create_expense(
    State(state): State<AppState>,
    BudgetContext(budget): BudgetContext,
    ValidatedJson(ExpenseBody(input)): ValidatedJson<ExpenseBody>,
) -> ApiResult<(StatusCode, Json<&'static str>)> {
    state.budgets().create_expense(&budget, input).await?;
    Ok((StatusCode::CREATED, Json("Gasto Creado Correctamente")))
}

/// GET /budgets/{budgetId}/expenses/{expenseId}
async fn get_expense(ExpenseContext { expense, .. }: ExpenseContext) -> Json<Expense> {
    Json(expense)
}

/// PUT /budgets/{budgetId}/expenses/{expenseId}
async fn update_expense(
    State(state): State<AppState>,
    ExpenseContext { expense, .. }: ExpenseContext,
    ValidatedJson(ExpenseBody(input)): ValidatedJson<ExpenseBody>,
) -> ApiResult<Json<&'static str>> {
    state.budgets().update_expense(&expense, input).await?;
    Ok(Json("Gasto actualizado correctamente"))
}

/// DELETE /budgets/{budgetId}/expenses/{expenseId}
async fn delete_expense(
    State(state): State<AppState>,
    ExpenseContext { expense, .. }: ExpenseContext,
) -> ApiResult<Json<&'static str>> {
    state.budgets().delete_expense(&expense).await?;
    Ok(Json("Gasto eliminado correctamente"))
}
