//! Budget error types.

use cashtrackr_shared::{AppError, FieldError};
use serde_json::Value;
use thiserror::Error;

/// Budget and expense errors.
#[derive(Debug, Error)]
pub enum BudgetError {
    /// A path id is not a positive integer.
    #[error("invalid id for {param}: {raw}")]
    InvalidId {
        /// Path parameter name.
        param: &'static str,
        /// Raw segment received.
        raw: String,
    },

    /// Budget not found.
    #[error("budget not found: {0}")]
    BudgetNotFound(i32),

    /// Expense not found.
    #[error("expense not found: {0}")]
    ExpenseNotFound(i32),

    /// Budget belongs to another user.
    #[error("budget {budget_id} is not owned by user {user_id}")]
    NotOwner {
        /// Budget ID.
        budget_id: i32,
        /// Requesting user.
        user_id: i32,
    },

    /// Expense is addressed through a budget it does not belong to.
    #[error("expense {expense_id} does not belong to budget {budget_id}")]
    ExpenseOutsideBudget {
        /// Expense ID.
        expense_id: i32,
        /// Budget in the request path.
        budget_id: i32,
    },

    /// Amount must be greater than zero.
    #[error("amount must be positive")]
    NonPositiveAmount,

    /// Amount has more decimals or digits than the column stores.
    #[error("amount out of range: {0}")]
    AmountOutOfRange(rust_decimal::Decimal),

    /// Persistence failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl From<BudgetError> for AppError {
    fn from(error: BudgetError) -> Self {
        match error {
            BudgetError::InvalidId { param, raw } => {
                Self::Validation(vec![FieldError::param(param, &raw, "ID no válido")])
            }
            BudgetError::BudgetNotFound(_) => Self::NotFound("Presupuesto no encontrado".to_string()),
            BudgetError::ExpenseNotFound(_) => Self::NotFound("Gasto no encontrado".to_string()),
            BudgetError::NotOwner { .. } | BudgetError::ExpenseOutsideBudget { .. } => {
                Self::Unauthorized("Acción no válida".to_string())
            }
            BudgetError::NonPositiveAmount => Self::Validation(vec![FieldError::body(
                "amount",
                Value::Null,
                "La cantidad debe ser mayor que 0",
            )]),
            BudgetError::AmountOutOfRange(amount) => Self::Validation(vec![FieldError::body(
                "amount",
                Value::String(amount.to_string()),
                "Cantidad no válida",
            )]),
            BudgetError::Repository(e) => Self::Database(e),
        }
    }
}
