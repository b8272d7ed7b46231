//! Schema migration runner for CashTrackr.
//!
//! Reads `DATABASE_URL` and accepts the sea-orm-migration subcommands:
//!   migrator up       - Apply pending migrations
//!   migrator down     - Roll back the last migration
//!   migrator status   - List applied and pending migrations
//!   migrator refresh  - Roll back everything, then apply again

use cashtrackr_db::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    cli::run_cli(Migrator).await;
}
