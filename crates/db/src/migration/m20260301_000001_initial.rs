//! Initial schema: users, budgets and expenses.
//!
//! Built with the schema builder so the same migration runs on `PostgreSQL`
//! and on the `SQLite` databases used by tests.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Name).string_len(50).not_null())
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string_len(255).not_null())
                    .col(ColumnDef::new(Users::Token).string_len(6).null())
                    .col(
                        ColumnDef::new(Users::Confirmed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(timestamp(Users::CreatedAt))
                    .col(timestamp(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_token")
                    .table(Users::Table)
                    .col(Users::Token)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Budgets::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Budgets::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Budgets::Amount).decimal_len(12, 2).not_null())
                    .col(ColumnDef::new(Budgets::UserId).integer().not_null())
                    .col(timestamp(Budgets::CreatedAt))
                    .col(timestamp(Budgets::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_budgets_user")
                            .from(Budgets::Table, Budgets::UserId)
                            .to(Users::Table, Users::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_budgets_user_created")
                    .table(Budgets::Table)
                    .col(Budgets::UserId)
                    .col(Budgets::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Expenses::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Expenses::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Expenses::Amount).decimal_len(12, 2).not_null())
                    .col(ColumnDef::new(Expenses::BudgetId).integer().not_null())
                    .col(timestamp(Expenses::CreatedAt))
                    .col(timestamp(Expenses::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expenses_budget")
                            .from(Expenses::Table, Expenses::BudgetId)
                            .to(Budgets::Table, Budgets::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_expenses_budget")
                    .table(Expenses::Table)
                    .col(Expenses::BudgetId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Expenses::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Budgets::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).if_exists().to_owned())
            .await
    }
}

fn timestamp<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
    Email,
    Password,
    Token,
    Confirmed,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Budgets {
    Table,
    Id,
    Name,
    Amount,
    UserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Expenses {
    Table,
    Id,
    Name,
    Amount,
    BudgetId,
    CreatedAt,
    UpdatedAt,
}
