//! `SeaORM` entity definitions.

pub mod prelude;

pub mod budgets;
pub mod expenses;
pub mod users;
