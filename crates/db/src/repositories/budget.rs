//! Budget and expense repository for database operations.

use cashtrackr_core::budget::{
    Budget, BudgetError, BudgetInput, BudgetStore, Expense, ExpenseInput,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::entities::{budgets, expenses};

/// Budget repository implementation.
#[derive(Debug, Clone)]
pub struct BudgetRepository {
    db: DatabaseConnection,
}

impl BudgetRepository {
    /// Creates a new budget repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl BudgetStore for BudgetRepository {
    async fn list_budgets(&self, user_id: i32) -> Result<Vec<Budget>, BudgetError> {
        let models = budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id))
            .order_by_desc(budgets::Column::CreatedAt)
            .order_by_desc(budgets::Column::Id)
            .all(&self.db)
            .await
            .map_err(repository)?;

        Ok(models.into_iter().map(budget_to_domain).collect())
    }

    async fn find_budget(&self, id: i32) -> Result<Option<Budget>, BudgetError> {
        let model = budgets::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(repository)?;

        Ok(model.map(budget_to_domain))
    }

    async fn create_budget(
        &self,
        user_id: i32,
        input: BudgetInput,
    ) -> Result<Budget, BudgetError> {
        let now = Utc::now();
        let active_model = budgets::ActiveModel {
            name: Set(input.name),
            amount: Set(input.amount),
            user_id: Set(user_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active_model.insert(&self.db).await.map_err(repository)?;
        Ok(budget_to_domain(model))
    }

    async fn update_budget(&self, id: i32, input: BudgetInput) -> Result<Budget, BudgetError> {
        let active_model = budgets::ActiveModel {
            id: Set(id),
            name: Set(input.name),
            amount: Set(input.amount),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        let model = active_model.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => BudgetError::BudgetNotFound(id),
            e => repository(e),
        })?;
        Ok(budget_to_domain(model))
    }

    async fn delete_budget(&self, id: i32) -> Result<(), BudgetError> {
        let txn = self.db.begin().await.map_err(repository)?;

        expenses::Entity::delete_many()
            .filter(expenses::Column::BudgetId.eq(id))
            .exec(&txn)
            .await
            .map_err(repository)?;
        budgets::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(repository)?;

        txn.commit().await.map_err(repository)
    }

    async fn list_expenses(&self, budget_id: i32) -> Result<Vec<Expense>, BudgetError> {
        let models = expenses::Entity::find()
            .filter(expenses::Column::BudgetId.eq(budget_id))
            .order_by_asc(expenses::Column::Id)
            .all(&self.db)
            .await
            .map_err(repository)?;

        Ok(models.into_iter().map(expense_to_domain).collect())
    }

    async fn find_expense(&self, id: i32) -> Result<Option<Expense>, BudgetError> {
        let model = expenses::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(repository)?;

        Ok(model.map(expense_to_domain))
    }

    async fn create_expense(
        &self,
        budget_id: i32,
        input: ExpenseInput,
    ) -> Result<Expense, BudgetError> {
        let now = Utc::now();
        let active_model = expenses::ActiveModel {
            name: Set(input.name),
            amount: Set(input.amount),
            budget_id: Set(budget_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active_model.insert(&self.db).await.map_err(repository)?;
        Ok(expense_to_domain(model))
    }

    async fn update_expense(&self, id: i32, input: ExpenseInput) -> Result<Expense, BudgetError> {
        let active_model = expenses::ActiveModel {
            id: Set(id),
            name: Set(input.name),
            amount: Set(input.amount),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        let model = active_model.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => BudgetError::ExpenseNotFound(id),
            e => repository(e),
        })?;
        Ok(expense_to_domain(model))
    }

    async fn delete_expense(&self, id: i32) -> Result<(), BudgetError> {
        expenses::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(repository)?;
        Ok(())
    }
}

fn repository(e: DbErr) -> BudgetError {
    tracing::error!(error = %e, "Budget query failed");
    BudgetError::Repository(e.to_string())
}

fn budget_to_domain(model: budgets::Model) -> Budget {
    Budget {
        id: model.id,
        name: model.name,
        amount: model.amount,
        user_id: model.user_id,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn expense_to_domain(model: expenses::Model) -> Expense {
    Expense {
        id: model.id,
        name: model.name,
        amount: model.amount,
        budget_id: model.budget_id,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
