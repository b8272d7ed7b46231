//! Session token claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JWT claims for session tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub id: i32,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: i32, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: user_id,
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> i32 {
        self.id
    }
}
