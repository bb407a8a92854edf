//! Business logic services for storefront.
//!
//! - `auth` - Password accounts (Argon2)
//! - `cart` - Session cart storage and cart messages
//! - `catalog` - Cached catalog pages
//! - `checkout` - Checkout gate
//! - `flash` - Session flash messages

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod flash;
