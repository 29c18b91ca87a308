//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; defaults target the public demo API.
//!
//! - `FRESHCART_API_BASE_URL` - Remote API root (default: <https://ecommerce.routemisr.com/api/v1>)
//! - `FRESHCART_CHECKOUT_RETURN_URL` - Where hosted checkout sends the customer back (default: <http://localhost:5173>)
//! - `FRESHCART_TOKEN_PATH` - File holding the persisted auth token (default: `$HOME/.freshcart/token`)
//! - `FRESHCART_CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `FRESHCART_HTTP_TIMEOUT_SECS` - Per-request timeout (default: none)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.0)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "https://ecommerce.routemisr.com/api/v1";
const DEFAULT_CHECKOUT_RETURN_URL: &str = "http://localhost:5173";
const DEFAULT_CATALOG_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Remote commerce API settings
    pub api: ApiConfig,
    /// Return URL handed to the hosted checkout session
    pub checkout_return_url: Url,
    /// Where the auth token is persisted between runs
    pub token_path: PathBuf,
    /// Lifetime of cached catalog responses
    pub catalog_cache_ttl: Duration,
    /// Error tracking configuration
    pub sentry: SentryConfig,
}

/// Remote commerce API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API root; always ends with `/` so relative endpoint paths join under it.
    pub base_url: Url,
    /// Optional per-request timeout.
    pub timeout: Option<Duration>,
}

/// Sentry configuration.
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
    /// Returns `ConfigError` if a variable is present but malformed, or if no
    /// token path is given and `HOME` is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(lookup);

        let base_url = parse_url(
            "FRESHCART_API_BASE_URL",
            &env.or_default("FRESHCART_API_BASE_URL", DEFAULT_API_BASE_URL),
        )?;
        let timeout = env
            .optional("FRESHCART_HTTP_TIMEOUT_SECS")
            .map(|v| parse_secs("FRESHCART_HTTP_TIMEOUT_SECS", &v))
            .transpose()?;
        let checkout_return_url = parse_url(
            "FRESHCART_CHECKOUT_RETURN_URL",
            &env.or_default("FRESHCART_CHECKOUT_RETURN_URL", DEFAULT_CHECKOUT_RETURN_URL),
        )?;
        let token_path = match env.optional("FRESHCART_TOKEN_PATH") {
            Some(path) => PathBuf::from(path),
            None => env
                .optional("HOME")
                .map(|home| PathBuf::from(home).join(".freshcart").join("token"))
                .ok_or_else(|| ConfigError::MissingEnvVar("FRESHCART_TOKEN_PATH".to_string()))?,
        };
        let catalog_cache_ttl = parse_secs(
            "FRESHCART_CATALOG_CACHE_TTL_SECS",
            &env.or_default(
                "FRESHCART_CATALOG_CACHE_TTL_SECS",
                &DEFAULT_CATALOG_CACHE_TTL_SECS.to_string(),
            ),
        )?;

        Ok(Self {
            api: ApiConfig {
                base_url: with_trailing_slash(base_url),
                timeout,
            },
            checkout_return_url,
            token_path,
            catalog_cache_ttl,
            sentry: SentryConfig::from_lookup(&env)?,
        })
    }
}

impl ApiConfig {
    /// Configuration pointing at an arbitrary API root.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url: with_trailing_slash(base_url),
            timeout: None,
        }
    }
}

impl SentryConfig {
    fn from_lookup<F>(env: &Lookup<F>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            dsn: env.optional("SENTRY_DSN"),
            environment: env.optional("SENTRY_ENVIRONMENT"),
            sample_rate: parse_rate("SENTRY_SAMPLE_RATE", &env.or_default("SENTRY_SAMPLE_RATE", "1.0"))?,
            traces_sample_rate: parse_rate(
                "SENTRY_TRACES_SAMPLE_RATE",
                &env.or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0"),
            )?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url =
        Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }
    Ok(url)
}

fn parse_secs(key: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_rate(key: &str, value: &str) -> Result<f32, ConfigError> {
    let rate = value
        .trim()
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be between 0.0 and 1.0".to_string(),
        ));
    }
    Ok(rate)
}

/// Endpoint paths are joined relative to the base, which needs a trailing slash
/// or `Url::join` drops the last segment.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
