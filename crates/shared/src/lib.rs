//! Shared errors, configuration, session tokens and mail delivery for CashTrackr.
//!
//! This crate provides common pieces used across all other crates:
//! - Application-wide error taxonomy and field errors
//! - Configuration management
//! - Session token (JWT) issuing and verification
//! - The notification gateway used by the account flows

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod jwt;

pub use auth::Claims;
pub use config::{AppConfig, EmailConfig, EmailTransport, Environment};
pub use email::{
    AuthEmail, AuthEmailKind, EmailError, EmailService, Mailer, OUTBOX_CAPACITY, OutboxMailer,
};
pub use error::{AppError, AppResult, FieldError, FieldLocation};
pub use jwt::{JwtConfig, JwtError, JwtService};
