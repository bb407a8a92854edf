//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Redirect to product listing
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (database ping)
//!
//! # Products
//! GET  /products?page=N        - Product listing
//! GET  /products/{slug}        - Product detail
//!
//! # Cart
//! GET  /cart                   - Cart page
//! GET  /cart/add?vid=ID        - Add one unit, redirect back
//! GET  /cart/remove?vid=ID     - Remove line, redirect back
//!
//! # Checkout
//! GET  /checkout/summary       - Checkout summary (login, profile and items required)
//!
//! # Profile
//! GET  /profile/create         - Profile form
//! POST /profile/create         - Create account (if anonymous) and save profile
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! POST /auth/logout            - Logout action
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod products;
pub mod profile;

use axum::{
    Router,
    http::{HeaderMap, header::REFERER},
    response::Redirect,
    routing::{get, post},
};
use tower_sessions::Session;
use url::Url;

use loja_core::FlashMessage;

use crate::middleware::{current_user, form_rate_limiter};
use crate::models::CurrentUser;
use crate::services::{cart::CartStore, flash};
use crate::state::AppState;

/// Product listing path.
pub const PRODUCT_LIST_PATH: &str = "/products";

/// Profile creation path.
pub const PROFILE_CREATE_PATH: &str = "/profile/create";

/// Cart page path.
pub const CART_PATH: &str = "/cart";

/// Data every page layout needs: header and flash messages.
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub cart_count: u32,
    pub messages: Vec<FlashMessage>,
}

impl PageContext {
    /// Read the layout data, draining pending flash messages.
    pub async fn load(session: &Session) -> Self {
        Self {
            user: current_user(session).await,
            cart_count: CartStore::new(session).peek().await.total_quantity(),
            messages: flash::take(session).await,
        }
    }

    /// Layout data for a page rendered alongside an inline form error.
    pub async fn with_error(session: &Session, error: impl Into<String>) -> Self {
        let mut page = Self::load(session).await;
        page.messages.push(FlashMessage::error(error));
        page
    }
}

/// Queue a flash message and redirect.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn flash_redirect(
    session: &Session,
    message: FlashMessage,
    to: &str,
) -> Result<Redirect, tower_sessions::session::Error> {
    flash::push(session, message).await?;
    Ok(Redirect::to(to))
}

/// Where to send the shopper after a cart action.
///
/// Follows the `Referer` header when it points at this storefront, keeping
/// path and query; anything else goes to the product listing.
#[must_use]
pub fn back_target(headers: &HeaderMap, base_url: &Url) -> String {
    headers
        .get(REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|r| Url::parse(r).ok())
        .filter(|r| {
            r.host_str() == base_url.host_str()
                && r.port_or_known_default() == base_url.port_or_known_default()
        })
        .map_or_else(
            || PRODUCT_LIST_PATH.to_string(),
            |r| match r.query() {
                Some(query) => format!("{}?{query}", r.path()),
                None => r.path().to_string(),
            },
        )
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", get(cart::add))
        .route("/remove", get(cart::remove))
}

/// Create the profile routes router.
///
/// Only the POST handlers sit behind the rate limiter.
pub fn profile_routes() -> Router<AppState> {
    Router::new().route(
        "/create",
        post(profile::create)
            .layer(form_rate_limiter())
            .get(profile::create_page),
    )
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            post(auth::login)
                .layer(form_rate_limiter())
                .get(auth::login_page),
        )
        .route("/logout", post(auth::logout))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to(PRODUCT_LIST_PATH) }))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/checkout/summary", get(checkout::summary))
        .nest("/profile", profile_routes())
        .nest("/auth", auth_routes())
}
