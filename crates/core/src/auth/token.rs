//! Opaque one-time tokens.
//!
//! The same 6-digit shape is used for email confirmation and password reset;
//! only the flow that stored it on the user row differs.

use rand::Rng;

/// Length of every opaque token.
pub const OPAQUE_TOKEN_LEN: usize = 6;

/// Generates a random 6-digit numeric token.
#[must_use]
pub fn generate_opaque_token() -> String {
    rand::rng().random_range(100_000..1_000_000).to_string()
}

/// Returns true if `token` has the length of an opaque token.
#[must_use]
pub fn is_opaque_token_shape(token: &str) -> bool {
    token.chars().count() == OPAQUE_TOKEN_LEN
}
