//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (used for referer checks and
//!   the `Secure` cookie flag)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_PRODUCTS_PER_PAGE` - Product listing page size (default: 10)
//! - `STOREFRONT_CATALOG_CACHE_TTL_SECS` - Product page cache lifetime (default: 60)
//! - `STOREFRONT_MEDIA_DIR` - Directory served under `/media` (default: crates/storefront/media)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Largest page size accepted for the product listing.
const MAX_PRODUCTS_PER_PAGE: u32 = 100;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: Url,
    /// Products per listing page
    pub products_per_page: u32,
    /// How long product pages stay cached
    pub catalog_cache_ttl: Duration,
    /// Directory with product images
    pub media_dir: PathBuf,
    /// Sentry error tracking settings
    pub sentry: SentryConfig,
}

/// Sentry settings.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_parsed_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = get_parsed_env("STOREFRONT_PORT", "3000")?;
        let base_url = parse_base_url(&get_required_env("STOREFRONT_BASE_URL")?)?;

        let products_per_page: u32 = get_parsed_env("STOREFRONT_PRODUCTS_PER_PAGE", "10")?;
        if products_per_page == 0 || products_per_page > MAX_PRODUCTS_PER_PAGE {
            return Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_PRODUCTS_PER_PAGE".to_string(),
                format!("must be between 1 and {MAX_PRODUCTS_PER_PAGE}"),
            ));
        }

        let cache_ttl_secs: u64 = get_parsed_env("STOREFRONT_CATALOG_CACHE_TTL_SECS", "60")?;
        let media_dir = PathBuf::from(get_env_or_default(
            "STOREFRONT_MEDIA_DIR",
            "crates/storefront/media",
        ));

        let sentry = SentryConfig {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: get_parsed_env("SENTRY_SAMPLE_RATE", "1.0")?,
            traces_sample_rate: get_parsed_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        };

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            products_per_page,
            catalog_cache_ttl: Duration::from_secs(cache_ttl_secs),
            media_dir,
            sentry,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an environment variable (or its default) parsed into `T`.
fn get_parsed_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse the public base URL, requiring an http(s) scheme and a host.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), msg);
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("must have a host".to_string()));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// Configuration suitable for tests that never touch the network.
    pub(crate) fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/loja_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: Url::parse("http://localhost:3000").unwrap(),
            products_per_page: 10,
            catalog_cache_ttl: Duration::from_secs(60),
            media_dir: PathBuf::from("media"),
            sentry: SentryConfig::default(),
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_is_secure() {
        let mut config = test_config();
        assert!(!config.is_secure());
        config.base_url = Url::parse("https://loja.com.br").unwrap();
        assert!(config.is_secure());
    }

    #[test]
    fn test_parse_base_url() {
        assert!(parse_base_url("https://loja.com.br/").is_ok());
        assert!(matches!(
            parse_base_url("ftp://loja.com.br"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn test_parse_value() {
        let port: u16 = parse_value("PORT", " 8080 ").unwrap();
        assert_eq!(port, 8080);

        let err = parse_value::<u16>("PORT", "eighty").unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
