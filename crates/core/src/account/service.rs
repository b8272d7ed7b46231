//! Account lifecycle: registration, confirmation, login and password flows.

use std::sync::Arc;

use cashtrackr_shared::{AuthEmail, JwtService, Mailer};
use tracing::{error, info, warn};

use super::error::AccountError;
use super::types::{NewUser, ProfileUpdate, Registration, User, UserChanges, UserProfile};
use crate::auth::{generate_opaque_token, hash_password_blocking, verify_password_blocking};

/// Repository trait for user persistence.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait UserStore: Send + Sync {
    /// Find a user by email.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, AccountError>> + Send;

    /// Find a user by ID.
    fn find_by_id(
        &self,
        id: i32,
    ) -> impl std::future::Future<Output = Result<Option<User>, AccountError>> + Send;

    /// Find the user holding a pending token. Never matches an empty token.
    fn find_by_token(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, AccountError>> + Send;

    /// Insert a new unconfirmed user in a single write.
    fn create(
        &self,
        user: NewUser,
    ) -> impl std::future::Future<Output = Result<User, AccountError>> + Send;

    /// Apply a partial update and return the stored row.
    fn update(
        &self,
        id: i32,
        changes: UserChanges,
    ) -> impl std::future::Future<Output = Result<User, AccountError>> + Send;
}

/// Account service.
pub struct AccountService<S: UserStore> {
    store: Arc<S>,
    mailer: Arc<dyn Mailer>,
    jwt: Arc<JwtService>,
}

impl<S: UserStore> Clone for AccountService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            mailer: Arc::clone(&self.mailer),
            jwt: Arc::clone(&self.jwt),
        }
    }
}

impl<S: UserStore> AccountService<S> {
    /// Create a new account service.
    #[must_use]
    pub fn new(store: Arc<S>, mailer: Arc<dyn Mailer>, jwt: Arc<JwtService>) -> Self {
        Self { store, mailer, jwt }
    }

    /// Register a new unconfirmed account and send its confirmation email.
    ///
    /// The password hash and token are computed before the row is written,
    /// so the insert is a single statement.
    ///
    /// # Errors
    ///
    /// Returns `EmailTaken` if the email is already registered, or an
    /// internal error if hashing, persistence or delivery fails.
    pub async fn register(&self, registration: Registration) -> Result<User, AccountError> {
        if self.store.find_by_email(&registration.email).await?.is_some() {
            warn!(email = %registration.email, "Registration rejected, email taken");
            return Err(AccountError::EmailTaken);
        }

        let password_hash = hash_password_blocking(registration.password).await?;
        let user = self
            .store
            .create(NewUser {
                name: registration.name,
                email: registration.email,
                password_hash,
                token: generate_opaque_token(),
            })
            .await?;

        let token = user.token.clone().unwrap_or_default();
        self.mailer
            .send(AuthEmail::confirmation(&user.name, &user.email, &token))
            .await
            .inspect_err(|e| error!(user_id = user.id, error = %e, "Confirmation email failed"))?;

        info!(user_id = user.id, "Account created");
        Ok(user)
    }

    /// Confirm an account by its pending token.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfirmationToken` if no user holds the token.
    pub async fn confirm(&self, token: &str) -> Result<(), AccountError> {
        let user = self
            .lookup_token(token)
            .await?
            .ok_or(AccountError::InvalidConfirmationToken)?;

        self.store
            .update(
                user.id,
                UserChanges {
                    confirmed: Some(true),
                    token: Some(None),
                    ..UserChanges::default()
                },
            )
            .await?;

        info!(user_id = user.id, "Account confirmed");
        Ok(())
    }

    /// Authenticate with email and password and issue a session token.
    ///
    /// Checks run in order: existence, confirmation, password.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound`, `NotConfirmed` or `WrongPassword`.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AccountError> {
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AccountError::UserNotFound)?;

        if !user.confirmed {
            warn!(user_id = user.id, "Login before confirmation");
            return Err(AccountError::NotConfirmed);
        }

        if !verify_password_blocking(password.to_string(), user.password_hash).await? {
            warn!(user_id = user.id, "Login with wrong password");
            return Err(AccountError::WrongPassword);
        }

        let token = self.jwt.generate_session_token(user.id)?;
        info!(user_id = user.id, "User logged in");
        Ok(token)
    }

    /// Issue a fresh reset token and email it.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if the email is unknown.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AccountError> {
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AccountError::UserNotFound)?;

        let token = generate_opaque_token();
        self.store
            .update(
                user.id,
                UserChanges {
                    token: Some(Some(token.clone())),
                    ..UserChanges::default()
                },
            )
            .await?;

        self.mailer
            .send(AuthEmail::password_reset(&user.name, &user.email, &token))
            .await
            .inspect_err(|e| error!(user_id = user.id, error = %e, "Reset email failed"))?;

        info!(user_id = user.id, "Password reset requested");
        Ok(())
    }

    /// Check that a reset token belongs to some user.
    ///
    /// # Errors
    ///
    /// Returns `ResetTokenNotFound` otherwise.
    pub async fn validate_reset_token(&self, token: &str) -> Result<(), AccountError> {
        self.lookup_token(token)
            .await?
            .map(|_| ())
            .ok_or(AccountError::ResetTokenNotFound)
    }

    /// Set a new password for the holder of a reset token and consume the token.
    ///
    /// # Errors
    ///
    /// Returns `ResetTokenNotFound` if no user holds the token.
    pub async fn reset_password(&self, token: &str, password: String) -> Result<(), AccountError> {
        let user = self
            .lookup_token(token)
            .await?
            .ok_or(AccountError::ResetTokenNotFound)?;

        let password_hash = hash_password_blocking(password).await?;
        self.store
            .update(
                user.id,
                UserChanges {
                    password_hash: Some(password_hash),
                    token: Some(None),
                    ..UserChanges::default()
                },
            )
            .await?;

        info!(user_id = user.id, "Password reset");
        Ok(())
    }

    /// Resolve the profile of an authenticated user.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if the user no longer exists.
    pub async fn current_user(&self, user_id: i32) -> Result<UserProfile, AccountError> {
        self.require_user(user_id).await.map(|user| user.profile())
    }

    /// Replace the password after checking the current one.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` or `WrongCurrentPassword`.
    pub async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        password: String,
    ) -> Result<(), AccountError> {
        let user = self.require_user(user_id).await?;
        Self::check_current_password(&user, current_password).await?;

        let password_hash = hash_password_blocking(password).await?;
        self.store
            .update(
                user.id,
                UserChanges {
                    password_hash: Some(password_hash),
                    ..UserChanges::default()
                },
            )
            .await?;

        info!(user_id, "Password changed");
        Ok(())
    }

    /// Check a password against the stored hash without changing anything.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` or `WrongCurrentPassword`.
    pub async fn verify_current_password(
        &self,
        user_id: i32,
        password: &str,
    ) -> Result<(), AccountError> {
        let user = self.require_user(user_id).await?;
        Self::check_current_password(&user, password).await
    }

    /// Update name and email.
    ///
    /// # Errors
    ///
    /// Returns `EmailTaken` if another user already owns the new email.
    pub async fn update_profile(
        &self,
        user_id: i32,
        update: ProfileUpdate,
    ) -> Result<UserProfile, AccountError> {
        let taken = self
            .store
            .find_by_email(&update.email)
            .await?
            .is_some_and(|existing| existing.id != user_id);
        if taken {
            warn!(user_id, "Profile update rejected, email taken");
            return Err(AccountError::EmailTaken);
        }

        let user = self
            .store
            .update(
                user_id,
                UserChanges {
                    name: Some(update.name),
                    email: Some(update.email),
                    ..UserChanges::default()
                },
            )
            .await?;

        info!(user_id, "Profile updated");
        Ok(user.profile())
    }

    async fn lookup_token(&self, token: &str) -> Result<Option<User>, AccountError> {
        if token.is_empty() {
            return Ok(None);
        }
        self.store.find_by_token(token).await
    }

    async fn require_user(&self, user_id: i32) -> Result<User, AccountError> {
        self.store
            .find_by_id(user_id)
            .await?
            .ok_or(AccountError::UserNotFound)
    }

    async fn check_current_password(user: &User, password: &str) -> Result<(), AccountError> {
        if verify_password_blocking(password.to_string(), user.password_hash.clone()).await? {
            Ok(())
        } else {
            warn!(user_id = user.id, "Current password mismatch");
            Err(AccountError::WrongCurrentPassword)
        }
    }
}
