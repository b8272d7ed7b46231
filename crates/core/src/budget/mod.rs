//! Budgets and their expenses, scoped by owner.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::BudgetError;
pub use service::{BudgetService, BudgetStore};
pub use types::{
    AMOUNT_INTEGER_DIGITS, AMOUNT_SCALE, Budget, BudgetInput, BudgetWithExpenses, Expense,
    ExpenseInput, fits_amount_column,
};
