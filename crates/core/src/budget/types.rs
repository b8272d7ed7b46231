//! Budget and expense data types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::error::BudgetError;

/// Decimal places kept by the amount columns.
pub const AMOUNT_SCALE: u32 = 2;

/// Integer digits the amount columns can hold.
pub const AMOUNT_INTEGER_DIGITS: u32 = 10;

/// Returns true if `amount` is stored unchanged in a `NUMERIC(12,2)` column.
///
/// Trailing zeros beyond the scale are fine; any other extra precision or
/// magnitude is not.
#[must_use]
pub fn fits_amount_column(amount: Decimal) -> bool {
    let limit = Decimal::from(10_i64.pow(AMOUNT_INTEGER_DIGITS));
    let normalized = amount.normalize();
    normalized.scale() <= AMOUNT_SCALE && normalized.abs() < limit
}

/// A budget owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// Budget ID.
    pub id: i32,
    /// Budget name.
    pub name: String,
    /// Budgeted amount, always positive.
    pub amount: Decimal,
    /// Owner.
    pub user_id: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// Check that `user_id` owns this budget.
    ///
    /// # Errors
    ///
    /// Returns `NotOwner` on mismatch.
    pub fn ensure_owned_by(&self, user_id: i32) -> Result<(), BudgetError> {
        if self.user_id == user_id {
            Ok(())
        } else {
            Err(BudgetError::NotOwner {
                budget_id: self.id,
                user_id,
            })
        }
    }
}

/// An expense recorded against a budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// Expense ID.
    pub id: i32,
    /// Expense name.
    pub name: String,
    /// Spent amount, always positive.
    pub amount: Decimal,
    /// Parent budget.
    pub budget_id: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A budget with its expenses loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetWithExpenses {
    /// The budget itself.
    #[serde(flatten)]
    pub budget: Budget,
    /// Expenses of the budget, oldest first.
    pub expenses: Vec<Expense>,
}

/// Name and amount of a budget to create or overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetInput {
    /// Budget name.
    pub name: String,
    /// Budgeted amount.
    pub amount: Decimal,
}

/// Name and amount of an expense to create or overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseInput {
    /// Expense name.
    pub name: String,
    /// Spent amount.
    pub amount: Decimal,
}
