//! Core business logic for CashTrackr.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Persistence is reached through the store traits implemented by the db crate.
//!
//! # Modules
//!
//! - `auth` - Password hashing and opaque one-time tokens
//! - `ids` - Path id sanity rules
//! - `account` - Registration, confirmation, login and password flows
//! - `budget` - Budgets and expenses scoped by owner

pub mod account;
pub mod auth;
pub mod budget;
pub mod ids;
