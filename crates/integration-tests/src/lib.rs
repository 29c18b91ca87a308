//! Live tests for the FreshCart storefront client.
//!
//! These talk to the real commerce API, so every test is `#[ignore]`d.
//!
//! # Running Tests
//!
//! ```bash
//! # Catalog tests only need network access
//! cargo test -p freshcart-integration-tests -- --ignored catalog
//!
//! # Account tests need a throwaway account
//! FRESHCART_TEST_EMAIL=shopper@example.com FRESHCART_TEST_PASSWORD=secret123 \
//!     cargo test -p freshcart-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `FRESHCART_API_BASE_URL` - API root (defaults to the public demo API)
//! - `FRESHCART_TEST_EMAIL` - Account used by the session tests
//! - `FRESHCART_TEST_PASSWORD` - Password for that account

use std::path::PathBuf;

use freshcart_storefront::Storefront;
use freshcart_storefront::config::{ConfigError, StorefrontConfig};
use freshcart_storefront::error::AppError;
use freshcart_storefront::forms::LoginForm;

/// A storefront whose session token lives in its own temporary file.
pub struct TestContext {
    pub storefront: Storefront,
    token_path: PathBuf,
}

impl TestContext {
    /// Build a signed-out storefront against the configured API.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or HTTP client is invalid.
    pub fn new(name: &str) -> Result<Self, AppError> {
        let token_path = std::env::temp_dir().join(format!(
            "freshcart-it-{name}-{}.token",
            std::process::id()
        ));
        let config = test_config(&token_path)?;
        Ok(Self {
            storefront: Storefront::new(config)?,
            token_path,
        })
    }

    /// Sign in with the test account, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if sign-in fails.
    pub async fn sign_in(&self) -> Result<bool, AppError> {
        let Some(form) = test_credentials() else {
            return Ok(false);
        };
        self.storefront.login(&form).await?;
        Ok(true)
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.token_path);
    }
}

fn test_config(token_path: &std::path::Path) -> Result<StorefrontConfig, ConfigError> {
    let token_path = token_path.display().to_string();
    StorefrontConfig::from_lookup(|key| match key {
        "FRESHCART_TOKEN_PATH" => Some(token_path.clone()),
        // Keep test failures out of the error tracker
        "SENTRY_DSN" => None,
        _ => std::env::var(key).ok(),
    })
}

/// Credentials from `FRESHCART_TEST_EMAIL` and `FRESHCART_TEST_PASSWORD`.
#[must_use]
pub fn test_credentials() -> Option<LoginForm> {
    let email = std::env::var("FRESHCART_TEST_EMAIL").ok()?;
    let password = std::env::var("FRESHCART_TEST_PASSWORD").ok()?;
    Some(LoginForm { email, password })
}
