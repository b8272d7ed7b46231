//! Demo data seeder for CashTrackr development.
//!
//! Seeds a confirmed demo account with a few budgets and their expenses so
//! the web client has something to show. Running it twice is harmless.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use cashtrackr_core::auth::hash_password_blocking;
use cashtrackr_db::entities::{budgets, expenses, users};
use cashtrackr_shared::AppConfig;

/// Demo login; the password is `password`.
const DEMO_EMAIL: &str = "demo@cashtrackr.com";
const DEMO_PASSWORD: &str = "password";

/// Budgets with their expenses.
const BUDGETS: &[(&str, Decimal, &[(&str, Decimal)])] = &[
    (
        "Vacaciones",
        dec!(5000),
        &[
            ("Vuelos", dec!(1800)),
            ("Hotel", dec!(1250.50)),
            ("Comidas", dec!(420)),
        ],
    ),
    (
        "Comida",
        dec!(800),
        &[("Supermercado", dec!(310.75)), ("Restaurante", dec!(95))],
    ),
    ("Transporte", dec!(300), &[("Gasolina", dec!(120))]),
    ("Ahorro", dec!(1000), &[]),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    println!("Connecting to database...");
    let db = cashtrackr_db::connect(&config.database)
        .await
        .context("Failed to connect to database")?;

    println!("Seeding demo user...");
    let Some(user_id) = seed_demo_user(&db).await? else {
        println!("  Demo user already exists, skipping...");
        return Ok(());
    };

    println!("Seeding budgets...");
    seed_budgets(&db, user_id).await?;

    println!("Seeding complete!");
    Ok(())
}

/// Inserts the confirmed demo user; `None` when it already exists.
async fn seed_demo_user(db: &DatabaseConnection) -> anyhow::Result<Option<i32>> {
    let existing = users::Entity::find()
        .filter(users::Column::Email.eq(DEMO_EMAIL))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(None);
    }

    let password = hash_password_blocking(DEMO_PASSWORD.to_string()).await?;
    let now = Utc::now();
    let user = users::ActiveModel {
        name: Set("Demo".to_string()),
        email: Set(DEMO_EMAIL.to_string()),
        password: Set(password),
        token: Set(None),
        confirmed: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .context("Failed to insert demo user")?;

    println!("  Created demo user: {DEMO_EMAIL}");
    Ok(Some(user.id))
}

async fn seed_budgets(db: &DatabaseConnection, user_id: i32) -> anyhow::Result<()> {
    for (name, amount, items) in BUDGETS {
        let now = Utc::now();
        let budget = budgets::ActiveModel {
            name: Set((*name).to_string()),
            amount: Set(*amount),
            user_id: Set(user_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .with_context(|| format!("Failed to insert budget {name}"))?;

        for (expense, spent) in *items {
            expenses::ActiveModel {
                name: Set((*expense).to_string()),
                amount: Set(*spent),
                budget_id: Set(budget.id),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await
            .with_context(|| format!("Failed to insert expense {expense}"))?;
        }

        println!("  Created budget {name} with {} expenses", items.len());
    }
    Ok(())
}
