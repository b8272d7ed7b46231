//! Credential utilities.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - Password verification
//! - Opaque one-time tokens for account confirmation and password reset

mod password;
mod token;

pub use password::{
    PasswordError, hash_password, hash_password_blocking, verify_password,
    verify_password_blocking,
};
pub use token::{OPAQUE_TOKEN_LEN, generate_opaque_token, is_opaque_token_shape};
