//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//! 5. Security headers
//! 6. Rate limiting on login and profile forms (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAuth, current_user, set_current_user};
pub use rate_limit::form_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
