//! Session-related types.
//!
//! Types stored in the session for authentication, cart and flash state.

use serde::{Deserialize, Serialize};

use loja_core::{Email, UserId};

use super::user::User;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the shopping cart, a map of variant id to line item.
    pub const CART: &str = "cart";

    /// Key for pending flash messages.
    pub const FLASH: &str = "flash";
}
