//! Account error types.

use cashtrackr_shared::{AppError, EmailError, JwtError};
use thiserror::Error;

use crate::auth::PasswordError;

/// Account flow errors.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Another user already owns this email.
    #[error("email already registered")]
    EmailTaken,

    /// No user matches the email or id.
    #[error("user not found")]
    UserNotFound,

    /// Confirmation token does not match any pending account.
    #[error("invalid confirmation token")]
    InvalidConfirmationToken,

    /// Reset token does not match any user.
    #[error("reset token not found")]
    ResetTokenNotFound,

    /// Login before the email was confirmed.
    #[error("account not confirmed")]
    NotConfirmed,

    /// Login password did not match.
    #[error("wrong password")]
    WrongPassword,

    /// Current password did not match on a password change or check.
    #[error("wrong current password")]
    WrongCurrentPassword,

    /// Hashing or verification failed.
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Session token could not be issued.
    #[error(transparent)]
    SessionToken(#[from] JwtError),

    /// Notification could not be delivered.
    #[error(transparent)]
    Email(#[from] EmailError),

    /// Persistence failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl From<AccountError> for AppError {
    fn from(error: AccountError) -> Self {
        match error {
            AccountError::EmailTaken => {
                Self::Conflict("Un usuario con ese email ya esta registrado".to_string())
            }
            AccountError::UserNotFound => Self::NotFound("Usuario no encontrado".to_string()),
            AccountError::InvalidConfirmationToken => {
                Self::Unauthorized("Token no válido".to_string())
            }
            AccountError::ResetTokenNotFound => Self::NotFound("Token no válido".to_string()),
            AccountError::NotConfirmed => {
                Self::Forbidden("La Cuenta no ha sido confirmada".to_string())
            }
            AccountError::WrongPassword => Self::Unauthorized("Password Incorrecto".to_string()),
            AccountError::WrongCurrentPassword => {
                Self::Unauthorized("El password actual es incorrecto".to_string())
            }
            AccountError::Password(e) => Self::Internal(e.to_string()),
            AccountError::SessionToken(e) => Self::Internal(e.to_string()),
            AccountError::Email(e) => Self::ExternalService(e.to_string()),
            AccountError::Repository(e) => Self::Database(e),
        }
    }
}
