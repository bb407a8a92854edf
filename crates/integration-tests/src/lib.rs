//! Shared helpers for the Loja integration tests.
//!
//! The storefront router runs in-process behind an in-memory session store.
//! The database pool is lazy, so routes that never query `PostgreSQL` can be
//! exercised without a running server.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, Session, SessionManagerLayer};
use url::Url;

use loja_core::{Price, Product, ProductId, Variant, VariantId};
use loja_storefront::config::{SentryConfig, StorefrontConfig};
use loja_storefront::state::AppState;

/// Database URL used for the lazy pool; nothing connects to it.
const TEST_DATABASE_URL: &str = "postgres://localhost/loja_test";

/// Configuration for an in-process storefront.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from(TEST_DATABASE_URL),
        host: [127, 0, 0, 1].into(),
        port: 3000,
        base_url: Url::parse("http://localhost:3000").expect("valid base url"),
        products_per_page: 10,
        catalog_cache_ttl: Duration::from_secs(60),
        media_dir: PathBuf::from("media"),
        sentry: SentryConfig::default(),
    }
}

/// Build the storefront router with a memory session store.
#[must_use]
pub fn test_app() -> Router {
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(1))
        .connect_lazy(TEST_DATABASE_URL)
        .expect("valid database url");

    loja_storefront::app(AppState::new(test_config(), pool))
        .layer(SessionManagerLayer::new(MemoryStore::default()).with_secure(false))
}

/// A fresh session backed by its own memory store.
#[must_use]
pub fn memory_session() -> Session {
    Session::new(None, Arc::new(MemoryStore::default()), None)
}

/// Browser stand-in that carries the session cookie between requests.
pub struct TestClient {
    app: Router,
    cookie: Option<String>,
}

impl TestClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            app: test_app(),
            cookie: None,
        }
    }

    /// Send a GET request, remembering any session cookie in the response.
    pub async fn get(&mut self, uri: &str) -> Response<Body> {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = request.body(Body::empty()).expect("valid request");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
        {
            self.cookie = Some(set_cookie.to_string());
        }

        response
    }

    /// Send a GET request and return the status and body text.
    pub async fn get_text(&mut self, uri: &str) -> (axum::http::StatusCode, String) {
        let response = self.get(uri).await;
        let status = response.status();
        (status, body_text(response).await)
    }
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a response body as UTF-8.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

/// `Location` header of a redirect response.
#[must_use]
pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

/// A product fixture.
#[must_use]
pub fn product(id: i32, name: &str) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        slug: name.to_lowercase().replace(' ', "-"),
        image: None,
        short_description: String::new(),
        long_description: String::new(),
    }
}

/// A variant fixture priced in cents.
#[must_use]
pub fn variant(id: i32, product: &Product, name: Option<&str>, cents: i64, stock: u32) -> Variant {
    Variant {
        id: VariantId::new(id),
        product_id: product.id,
        name: name.map(str::to_string),
        price: Price::from_cents(cents),
        promotional_price: None,
        stock,
    }
}
