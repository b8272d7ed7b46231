//! Account lifecycle.
//!
//! Registration, email confirmation, login and the password flows. Storage
//! is reached through [`UserStore`]; notifications through the shared
//! [`Mailer`](cashtrackr_shared::Mailer) seam.

mod error;
mod service;
mod types;


pub use error::AccountError;
pub use service::{AccountService, UserStore};
pub use types::{NewUser, ProfileUpdate, Registration, User, UserChanges, UserProfile};
