//! Loja Core - domain types and cart rules.
//!
//! This crate is shared by the storefront binary and the CLI:
//! - `storefront` - Public-facing shop (product pages, cart, checkout summary)
//! - `cli` - Migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure business rules - no I/O, no
//! database access, no sessions. Everything the storefront persists in the
//! session (the cart, flash messages) is defined here as plain serde types so
//! the rules can be tested without a running web stack.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices and emails
//! - [`catalog`] - Product and variant records
//! - [`cart`] - Session cart and its add/remove rules
//! - [`profile`] - Customer profile validation (CPF, CEP, UF)
//! - [`flash`] - Classified one-shot user messages

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod flash;
pub mod profile;
pub mod types;

pub use cart::{AddOutcome, Cart, CartError, CartLineItem, parse_variant_param};
pub use catalog::{Product, Variant};
pub use flash::{FlashLevel, FlashMessage};
pub use profile::{Cpf, NewProfile, Profile, ProfileDraft, ProfileError, STATES};
pub use types::*;
