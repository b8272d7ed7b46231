//! Budget and expense service.
//!
//! `load_budget`, [`Budget::ensure_owned_by`] and `load_expense` are the
//! stages of the ownership chain. Every mutating operation takes the entity
//! those stages already resolved and never re-checks ownership.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use super::error::BudgetError;
use super::types::{
    Budget, BudgetInput, BudgetWithExpenses, Expense, ExpenseInput, fits_amount_column,
};
use crate::ids::parse_resource_id;

/// Repository trait for budget and expense persistence.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait BudgetStore: Send + Sync {
    /// List budgets of a user, newest first.
    fn list_budgets(
        &self,
        user_id: i32,
    ) -> impl std::future::Future<Output = Result<Vec<Budget>, BudgetError>> + Send;

    /// Find a budget by ID.
    fn find_budget(
        &self,
        id: i32,
    ) -> impl std::future::Future<Output = Result<Option<Budget>, BudgetError>> + Send;

    /// Create a budget owned by `user_id`.
    fn create_budget(
        &self,
        user_id: i32,
        input: BudgetInput,
    ) -> impl std::future::Future<Output = Result<Budget, BudgetError>> + Send;

    /// Overwrite name and amount of a budget.
    fn update_budget(
        &self,
        id: i32,
        input: BudgetInput,
    ) -> impl std::future::Future<Output = Result<Budget, BudgetError>> + Send;

    /// Delete a budget together with its expenses.
    fn delete_budget(
        &self,
        id: i32,
    ) -> impl std::future::Future<Output = Result<(), BudgetError>> + Send;

    /// List expenses of a budget, oldest first.
    fn list_expenses(
        &self,
        budget_id: i32,
    ) -> impl std::future::Future<Output = Result<Vec<Expense>, BudgetError>> + Send;

    /// Find an expense by ID.
    fn find_expense(
        &self,
        id: i32,
    ) -> impl std::future::Future<Output = Result<Option<Expense>, BudgetError>> + Send;

    /// Create an expense under `budget_id`.
    fn create_expense(
        &self,
        budget_id: i32,
        input: ExpenseInput,
    ) -> impl std::future::Future<Output = Result<Expense, BudgetError>> + Send;

    /// Overwrite name and amount of an expense.
    fn update_expense(
        &self,
        id: i32,
        input: ExpenseInput,
    ) -> impl std::future::Future<Output = Result<Expense, BudgetError>> + Send;

    /// Delete an expense.
    fn delete_expense(
        &self,
        id: i32,
    ) -> impl std::future::Future<Output = Result<(), BudgetError>> + Send;
}

/// Budget service.
pub struct BudgetService<S: BudgetStore> {
    store: Arc<S>,
}

impl<S: BudgetStore> Clone for BudgetService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: BudgetStore> BudgetService<S> {
    /// Create a new budget service.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Parse a `budgetId` path segment and load the budget.
    ///
    /// # Errors
    ///
    /// Returns `InvalidId` for a malformed id and `BudgetNotFound` if absent.
    pub async fn load_budget(&self, raw_id: &str) -> Result<Budget, BudgetError> {
        let id = parse_resource_id(raw_id).ok_or_else(|| BudgetError::InvalidId {
            param: "budgetId",
            raw: raw_id.to_string(),
        })?;

        self.store
            .find_budget(id)
            .await?
            .ok_or(BudgetError::BudgetNotFound(id))
    }

    /// Parse an `expenseId` path segment and load the expense, which must
    /// belong to the already authorized `budget`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidId`, `ExpenseNotFound` or `ExpenseOutsideBudget`.
    pub async fn load_expense(&self, budget: &Budget, raw_id: &str) -> Result<Expense, BudgetError> {
        let id = parse_resource_id(raw_id).ok_or_else(|| BudgetError::InvalidId {
            param: "expenseId",
            raw: raw_id.to_string(),
        })?;

        let expense = self
            .store
            .find_expense(id)
            .await?
            .ok_or(BudgetError::ExpenseNotFound(id))?;

        if expense.budget_id != budget.id {
            return Err(BudgetError::ExpenseOutsideBudget {
                expense_id: expense.id,
                budget_id: budget.id,
            });
        }
        Ok(expense)
    }

    /// List the budgets of a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn list_budgets(&self, user_id: i32) -> Result<Vec<Budget>, BudgetError> {
        self.store.list_budgets(user_id).await
    }

    /// Create a budget owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveAmount`, `AmountOutOfRange` or a store error.
    pub async fn create_budget(
        &self,
        user_id: i32,
        input: BudgetInput,
    ) -> Result<Budget, BudgetError> {
        ensure_valid_amount(input.amount)?;
        let budget = self.store.create_budget(user_id, input).await?;
        info!(budget_id = budget.id, user_id, "Budget created");
        Ok(budget)
    }

    /// Load the expenses of an authorized budget.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn get_budget(&self, budget: Budget) -> Result<BudgetWithExpenses, BudgetError> {
        let expenses = self.store.list_expenses(budget.id).await?;
        Ok(BudgetWithExpenses { budget, expenses })
    }

    /// Overwrite an authorized budget.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveAmount`, `AmountOutOfRange` or a store error.
    pub async fn update_budget(
        &self,
        budget: &Budget,
        input: BudgetInput,
    ) -> Result<Budget, BudgetError> {
        ensure_valid_amount(input.amount)?;
        let budget = self.store.update_budget(budget.id, input).await?;
        info!(budget_id = budget.id, "Budget updated");
        Ok(budget)
    }

    /// Delete an authorized budget and its expenses.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn delete_budget(&self, budget: &Budget) -> Result<(), BudgetError> {
        self.store.delete_budget(budget.id).await?;
        info!(budget_id = budget.id, "Budget deleted");
        Ok(())
    }

    /// Record an expense against an authorized budget.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveAmount`, `AmountOutOfRange` or a store error.
    pub async fn create_expense(
        &self,
        budget: &Budget,
        input: ExpenseInput,
    ) -> Result<Expense, BudgetError> {
        ensure_valid_amount(input.amount)?;
        let expense = self.store.create_expense(budget.id, input).await?;
        info!(expense_id = expense.id, budget_id = budget.id, "Expense created");
        Ok(expense)
    }

    /// Overwrite an authorized expense.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveAmount`, `AmountOutOfRange` or a store error.
    pub async fn update_expense(
        &self,
        expense: &Expense,
        input: ExpenseInput,
    ) -> Result<Expense, BudgetError> {
        ensure_valid_amount(input.amount)?;
        let expense = self.store.update_expense(expense.id, input).await?;
        info!(expense_id = expense.id, "Expense updated");
        Ok(expense)
    }

    /// Delete an authorized expense.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn delete_expense(&self, expense: &Expense) -> Result<(), BudgetError> {
        self.store.delete_expense(expense.id).await?;
        info!(expense_id = expense.id, "Expense deleted");
        Ok(())
    }
}

pub(crate) fn ensure_valid_amount(amount: Decimal) -> Result<(), BudgetError> {
    if amount <= Decimal::ZERO {
        return Err(BudgetError::NonPositiveAmount);
    }
    if !fits_amount_column(amount) {
        return Err(BudgetError::AmountOutOfRange(amount));
    }
    Ok(())
}
