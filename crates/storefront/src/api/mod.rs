//! Remote commerce REST API boundary.
//!
//! # Architecture
//!
//! - [`CommerceApi`] is the seam every synchronizer talks through; the
//!   production implementation is [`RestClient`] (`reqwest`), tests use an
//!   in-memory fake.
//! - The remote service is the source of truth - nothing here caches
//!   mutable state. Read-only catalog caching lives in [`crate::catalog`].
//! - Raw JSON envelopes are decoded into `wire` types, then converted into
//!   the domain types in [`types`].
//!
//! # Authentication
//!
//! Authenticated endpoints carry the session token in a custom `token`
//! request header (not `Authorization`).
//!
//! # Example
//!
//! ```rust,ignore
//! use freshcart_storefront::api::{CommerceApi, RestClient};
//!
//! let client = RestClient::new(&config.api)?;
//! let products = client.products().await?;
//! let cart = client.get_cart(&token).await?;
//! ```

mod client;
mod conversions;
pub mod types;
mod wire;

pub use client::RestClient;
pub use types::*;

use async_trait::async_trait;
use freshcart_core::{CartId, CategoryId, Email, ProductId, UserId};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

/// Errors that can occur when talking to the remote commerce API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (network, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint URL could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Token missing, expired or rejected by the server.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the server.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Server-provided message, if any.
        message: String,
    },

    /// A success response that lacks what the operation needs.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Session token attached to authenticated requests.
///
/// Wraps a [`SecretString`] so it never shows up in logs or `Debug` output.
#[derive(Clone)]
pub struct AuthToken(SecretString);

impl AuthToken {
    /// Wrap a raw token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Expose the raw token for the request header or for persistence.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken([REDACTED])")
    }
}

/// Operations offered by the remote commerce service.
///
/// Mutating cart and wishlist calls return only what the caller needs to
/// confirm success; authoritative state is always re-read with a fetch.
#[async_trait]
pub trait CommerceApi: Send + Sync {
    // -------------------------------------------------------------------------
    // Auth
    // -------------------------------------------------------------------------

    /// Register a new account.
    async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthGrant, ApiError>;

    /// Exchange credentials for a token.
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthGrant, ApiError>;

    /// Ask the service to email a password reset code. Returns the server message.
    async fn forgot_password(&self, email: &Email) -> Result<String, ApiError>;

    /// Check a password reset code.
    async fn verify_reset_code(&self, code: &str) -> Result<(), ApiError>;

    /// Set a new password after a verified reset code.
    async fn reset_password(&self, email: &Email, new_password: &str) -> Result<(), ApiError>;

    // -------------------------------------------------------------------------
    // Catalog (no auth)
    // -------------------------------------------------------------------------

    async fn products(&self) -> Result<Vec<Product>, ApiError>;

    async fn product(&self, id: &ProductId) -> Result<Product, ApiError>;

    async fn categories(&self) -> Result<Vec<Category>, ApiError>;

    async fn subcategories(&self, category: &CategoryId) -> Result<Vec<Subcategory>, ApiError>;

    async fn brands(&self) -> Result<Vec<Brand>, ApiError>;

    // -------------------------------------------------------------------------
    // Cart
    // -------------------------------------------------------------------------

    /// Read the current user's cart.
    async fn get_cart(&self, token: &AuthToken) -> Result<Cart, ApiError>;

    async fn add_to_cart(&self, token: &AuthToken, product: &ProductId) -> Result<(), ApiError>;

    async fn update_cart_item(
        &self,
        token: &AuthToken,
        product: &ProductId,
        count: u32,
    ) -> Result<(), ApiError>;

    async fn remove_cart_item(&self, token: &AuthToken, product: &ProductId)
    -> Result<(), ApiError>;

    async fn clear_cart(&self, token: &AuthToken) -> Result<(), ApiError>;

    // -------------------------------------------------------------------------
    // Wishlist
    // -------------------------------------------------------------------------

    async fn get_wishlist(&self, token: &AuthToken) -> Result<Wishlist, ApiError>;

    /// Add a product; returns the wishlist's product ids after the change.
    async fn add_to_wishlist(
        &self,
        token: &AuthToken,
        product: &ProductId,
    ) -> Result<Vec<ProductId>, ApiError>;

    /// Remove a product; returns the wishlist's product ids after the change.
    async fn remove_from_wishlist(
        &self,
        token: &AuthToken,
        product: &ProductId,
    ) -> Result<Vec<ProductId>, ApiError>;

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    async fn user_orders(&self, token: &AuthToken, user: &UserId) -> Result<Vec<Order>, ApiError>;

    /// Start a hosted online-payment session for a cart.
    async fn create_checkout_session(
        &self,
        token: &AuthToken,
        cart: &CartId,
        address: &ShippingAddress,
        return_url: &Url,
    ) -> Result<CheckoutSession, ApiError>;

    /// Place a cash-on-delivery order for a cart.
    async fn create_cash_order(
        &self,
        token: &AuthToken,
        cart: &CartId,
        address: &ShippingAddress,
    ) -> Result<Order, ApiError>;
}
