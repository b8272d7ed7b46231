use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use proptest::prelude::*;
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::service::ensure_valid_amount;
use super::*;

/// In-memory budget store with a monotonically advancing clock.
#[derive(Default)]
struct MockBudgetStore {
    budgets: Mutex<BTreeMap<i32, Budget>>,
    expenses: Mutex<BTreeMap<i32, Expense>>,
    ticks: Mutex<i64>,
}

impl MockBudgetStore {
    fn now(&self) -> chrono::DateTime<Utc> {
        let mut ticks = self.ticks.lock().unwrap();
        *ticks += 1;
        Utc::now() + Duration::seconds(*ticks)
    }
}

impl BudgetStore for MockBudgetStore {
    async fn list_budgets(&self, user_id: i32) -> Result<Vec<Budget>, BudgetError> {
        let mut budgets: Vec<Budget> = self
            .budgets
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        budgets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(budgets)
    }

    async fn find_budget(&self, id: i32) -> Result<Option<Budget>, BudgetError> {
        Ok(self.budgets.lock().unwrap().get(&id).cloned())
    }

    async fn create_budget(&self, user_id: i32, input: BudgetInput) -> Result<Budget, BudgetError> {
        let now = self.now();
        let mut budgets = self.budgets.lock().unwrap();
        let id = i32::try_from(budgets.len()).unwrap() + 1;
        let budget = Budget {
            id,
            name: input.name,
            amount: input.amount,
            user_id,
            created_at: now,
            updated_at: now,
        };
        budgets.insert(id, budget.clone());
        Ok(budget)
    }

    async fn update_budget(&self, id: i32, input: BudgetInput) -> Result<Budget, BudgetError> {
        let now = self.now();
        let mut budgets = self.budgets.lock().unwrap();
        let budget = budgets.get_mut(&id).ok_or(BudgetError::BudgetNotFound(id))?;
        budget.name = input.name;
        budget.amount = input.amount;
        budget.updated_at = now;
        Ok(budget.clone())
    }

    async fn delete_budget(&self, id: i32) -> Result<(), BudgetError> {
        self.expenses
            .lock()
            .unwrap()
            .retain(|_, e| e.budget_id != id);
        self.budgets.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn list_expenses(&self, budget_id: i32) -> Result<Vec<Expense>, BudgetError> {
        Ok(self
            .expenses
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.budget_id == budget_id)
            .cloned()
            .collect())
    }

    async fn find_expense(&self, id: i32) -> Result<Option<Expense>, BudgetError> {
        Ok(self.expenses.lock().unwrap().get(&id).cloned())
    }

    async fn create_expense(
        &self,
        budget_id: i32,
        input: ExpenseInput,
    ) -> Result<Expense, BudgetError> {
        let now = self.now();
        let mut expenses = self.expenses.lock().unwrap();
        let id = i32::try_from(expenses.len()).unwrap() + 100;
        let expense = Expense {
            id,
            name: input.name,
            amount: input.amount,
            budget_id,
            created_at: now,
            updated_at: now,
        };
        expenses.insert(id, expense.clone());
        Ok(expense)
    }

    async fn update_expense(&self, id: i32, input: ExpenseInput) -> Result<Expense, BudgetError> {
        let now = self.now();
        let mut expenses = self.expenses.lock().unwrap();
        let expense = expenses.get_mut(&id).ok_or(BudgetError::ExpenseNotFound(id))?;
        expense.name = input.name;
        expense.amount = input.amount;
        expense.updated_at = now;
        Ok(expense.clone())
    }

    async fn delete_expense(&self, id: i32) -> Result<(), BudgetError> {
        self.expenses.lock().unwrap().remove(&id);
        Ok(())
    }
}

fn service() -> BudgetService<MockBudgetStore> {
    BudgetService::new(Arc::new(MockBudgetStore::default()))
}

fn budget_input(name: &str, amount: Decimal) -> BudgetInput {
    BudgetInput {
        name: name.to_string(),
        amount,
    }
}

fn expense_input(name: &str, amount: Decimal) -> ExpenseInput {
    ExpenseInput {
        name: name.to_string(),
        amount,
    }
}

#[tokio::test]
async fn test_list_budgets_newest_first_and_scoped_to_owner() {
    let service = service();
    service.create_budget(1, budget_input("Vacaciones", dec!(1000))).await.unwrap();
    service.create_budget(2, budget_input("Ajeno", dec!(50))).await.unwrap();
    service.create_budget(1, budget_input("Casa", dec!(4000))).await.unwrap();

    let budgets = service.list_budgets(1).await.unwrap();

    let names: Vec<&str> = budgets.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, ["Casa", "Vacaciones"]);
}

#[tokio::test]
async fn test_load_budget_rejects_malformed_id() {
    let service = service();

    for raw in ["abc", "0", "-1", "1.5"] {
        assert!(matches!(
            service.load_budget(raw).await,
            Err(BudgetError::InvalidId { param: "budgetId", .. })
        ));
    }
}

#[tokio::test]
async fn test_load_budget_missing() {
    let service = service();

    assert!(matches!(
        service.load_budget("3000").await,
        Err(BudgetError::BudgetNotFound(3000))
    ));
}

#[tokio::test]
async fn test_ownership_chain() {
    let service = service();
    let budget = service
        .create_budget(1, budget_input("Casa", dec!(4000)))
        .await
        .unwrap();

    let loaded = service.load_budget(&budget.id.to_string()).await.unwrap();
    assert!(loaded.ensure_owned_by(1).is_ok());
    assert!(matches!(
        loaded.ensure_owned_by(2),
        Err(BudgetError::NotOwner { user_id: 2, .. })
    ));
}

#[tokio::test]
async fn test_load_expense_must_belong_to_budget() {
    let service = service();
    let casa = service
        .create_budget(1, budget_input("Casa", dec!(4000)))
        .await
        .unwrap();
    let viaje = service
        .create_budget(1, budget_input("Viaje", dec!(900)))
        .await
        .unwrap();
    let expense = service
        .create_expense(&casa, expense_input("Renta", dec!(1200)))
        .await
        .unwrap();

    let loaded = service
        .load_expense(&casa, &expense.id.to_string())
        .await
        .unwrap();
    assert_eq!(loaded, expense);

    assert!(matches!(
        service.load_expense(&viaje, &expense.id.to_string()).await,
        Err(BudgetError::ExpenseOutsideBudget { .. })
    ));
    assert!(matches!(
        service.load_expense(&casa, "9999").await,
        Err(BudgetError::ExpenseNotFound(9999))
    ));
    assert!(matches!(
        service.load_expense(&casa, "x").await,
        Err(BudgetError::InvalidId { param: "expenseId", .. })
    ));
}

#[tokio::test]
async fn test_get_budget_includes_expenses() {
    let service = service();
    let budget = service
        .create_budget(1, budget_input("Casa", dec!(4000)))
        .await
        .unwrap();
    service
        .create_expense(&budget, expense_input("Renta", dec!(1200)))
        .await
        .unwrap();
    service
        .create_expense(&budget, expense_input("Luz", dec!(80.50)))
        .await
        .unwrap();

    let full = service.get_budget(budget.clone()).await.unwrap();

    assert_eq!(full.budget, budget);
    assert_eq!(full.expenses.len(), 2);
}

#[tokio::test]
async fn test_update_budget_and_expense() {
    let service = service();
    let budget = service
        .create_budget(1, budget_input("Casa", dec!(4000)))
        .await
        .unwrap();
    let expense = service
        .create_expense(&budget, expense_input("Renta", dec!(1200)))
        .await
        .unwrap();

    let budget = service
        .update_budget(&budget, budget_input("Hogar", dec!(4500)))
        .await
        .unwrap();
    let expense = service
        .update_expense(&expense, expense_input("Alquiler", dec!(1300)))
        .await
        .unwrap();

    assert_eq!(budget.name, "Hogar");
    assert_eq!(budget.amount, dec!(4500));
    assert_eq!(budget.user_id, 1);
    assert_eq!(expense.name, "Alquiler");
    assert_eq!(expense.budget_id, budget.id);
}

#[tokio::test]
async fn test_delete_budget_removes_expenses() {
    let service = service();
    let budget = service
        .create_budget(1, budget_input("Casa", dec!(4000)))
        .await
        .unwrap();
    let expense = service
        .create_expense(&budget, expense_input("Renta", dec!(1200)))
        .await
        .unwrap();

    service.delete_budget(&budget).await.unwrap();

    assert!(matches!(
        service.load_budget(&budget.id.to_string()).await,
        Err(BudgetError::BudgetNotFound(_))
    ));
    assert!(matches!(
        service.load_expense(&budget, &expense.id.to_string()).await,
        Err(BudgetError::ExpenseNotFound(_))
    ));
}

#[tokio::test]
async fn test_delete_expense() {
    let service = service();
    let budget = service
        .create_budget(1, budget_input("Casa", dec!(4000)))
        .await
        .unwrap();
    let expense = service
        .create_expense(&budget, expense_input("Renta", dec!(1200)))
        .await
        .unwrap();

    service.delete_expense(&expense).await.unwrap();

    assert!(service.get_budget(budget).await.unwrap().expenses.is_empty());
}

#[tokio::test]
async fn test_non_positive_amount_rejected() {
    let service = service();

    assert!(matches!(
        service.create_budget(1, budget_input("Casa", dec!(0))).await,
        Err(BudgetError::NonPositiveAmount)
    ));
    assert!(service.list_budgets(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_amount_that_would_be_rounded_is_rejected() {
    let service = service();

    assert!(matches!(
        service.create_budget(1, budget_input("Casa", dec!(0.001))).await,
        Err(BudgetError::AmountOutOfRange(_))
    ));
    assert!(matches!(
        service
            .create_budget(1, budget_input("Casa", dec!(10000000000)))
            .await,
        Err(BudgetError::AmountOutOfRange(_))
    ));
    assert!(service.list_budgets(1).await.unwrap().is_empty());
}

#[rstest]
#[case(dec!(0.01), true)]
#[case(dec!(4000), true)]
#[case(dec!(1.500), true)]
#[case(dec!(9999999999.99), true)]
#[case(dec!(0.001), false)]
#[case(dec!(10000000000), false)]
#[case(dec!(-10000000000), false)]
fn test_fits_amount_column(#[case] amount: Decimal, #[case] fits: bool) {
    assert_eq!(fits_amount_column(amount), fits);
}

#[test]
fn test_budget_serializes_camel_case_with_string_amount() {
    let now = Utc::now();
    let budget = Budget {
        id: 1,
        name: "Casa".to_string(),
        amount: dec!(4000.50),
        user_id: 7,
        created_at: now,
        updated_at: now,
    };

    let value = serde_json::to_value(BudgetWithExpenses {
        budget,
        expenses: Vec::new(),
    })
    .unwrap();

    assert_eq!(value["amount"], "4000.50");
    assert_eq!(value["userId"], 7);
    assert!(value.get("createdAt").is_some());
    assert_eq!(value["expenses"], serde_json::json!([]));
}

proptest! {
    #[test]
    fn positive_amounts_are_accepted(cents in 1i64..1_000_000_000) {
        prop_assert!(ensure_valid_amount(Decimal::new(cents, 2)).is_ok());
    }

    #[test]
    fn non_positive_amounts_are_rejected(cents in -1_000_000_000i64..=0) {
        prop_assert!(matches!(
            ensure_valid_amount(Decimal::new(cents, 2)),
            Err(BudgetError::NonPositiveAmount)
        ));
    }

    #[test]
    fn sub_cent_amounts_are_rejected(millis in 1i64..1_000_000, digit in 1i64..10) {
        let amount = Decimal::new(millis * 10 + digit, 3);
        prop_assert!(matches!(
            ensure_valid_amount(amount),
            Err(BudgetError::AmountOutOfRange(_))
        ));
    }
}
