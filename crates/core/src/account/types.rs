//! Account data types.

use serde::Serialize;

/// A stored user row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// User ID.
    pub id: i32,
    /// Display name.
    pub name: String,
    /// Unique email address.
    pub email: String,
    /// Argon2 PHC hash.
    pub password_hash: String,
    /// Whether the email address has been confirmed.
    pub confirmed: bool,
    /// Pending confirmation or reset token.
    pub token: Option<String>,
}

impl User {
    /// Returns the public projection of this user.
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// The fields of a user that are safe to expose and attach to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    /// User ID.
    pub id: i32,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
}

/// A user about to be inserted, already hashed and tokenized.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Argon2 PHC hash.
    pub password_hash: String,
    /// Confirmation token.
    pub token: String,
}

/// Partial update of a user row. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    /// New name.
    pub name: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New password hash.
    pub password_hash: Option<String>,
    /// New confirmation flag.
    pub confirmed: Option<bool>,
    /// New token; `Some(None)` clears it.
    pub token: Option<Option<String>>,
}

/// Registration request.
#[derive(Debug, Clone)]
pub struct Registration {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// Profile update request.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    /// New display name.
    pub name: String,
    /// New email address.
    pub email: String,
}
