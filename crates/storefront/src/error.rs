//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type for front-ends. Remote and internal
//! failures are captured to Sentry before being shown; every variant has a
//! user-facing message that never exposes internals.

use thiserror::Error;

use crate::api::ApiError;
use crate::cart::SyncError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::forms::FieldErrors;
use crate::session::AuthError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Remote API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Session operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart, wishlist or order operation failed.
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Form input was rejected.
    #[error("Invalid input: {0}")]
    Validation(#[from] FieldErrors),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Whether this error points at a fault worth reporting, as opposed to
    /// bad input or a signed-out user.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        match self {
            Self::Config(_) => true,
            Self::Api(err)
            | Self::Sync(SyncError::Api(err))
            | Self::Checkout(CheckoutError::Payment(err)) => {
                !matches!(err, ApiError::Unauthorized(_) | ApiError::NotFound(_))
            }
            Self::Auth(err) => matches!(err, AuthError::Api(_) | AuthError::Store(_)),
            _ => false,
        }
    }

    /// Capture to Sentry when reportable. Returns `self` for chaining.
    #[must_use]
    pub fn report(self) -> Self {
        if self.is_reportable() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Storefront error"
            );
        }
        self
    }

    /// Text safe to show the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(_) => "Something went wrong".to_string(),
            Self::Api(err) => api_message(err),
            Self::Auth(err) => match err {
                AuthError::Validation(errors) => errors.to_string(),
                AuthError::InvalidCredentials => {
                    "Invalid email or password. Please try again.".to_string()
                }
                AuthError::Rejected(message) => message.clone(),
                AuthError::MissingToken | AuthError::Decode(_) => {
                    "Login failed. Please try again.".to_string()
                }
                AuthError::Store(_) => "Could not save your session".to_string(),
                AuthError::Api(err) => api_message(err),
            },
            Self::Sync(err) => match err {
                SyncError::NotAuthenticated => "Please sign in first".to_string(),
                SyncError::InvalidQuantity(_) => "Quantity must be at least 1".to_string(),
                SyncError::Api(err) => api_message(err),
            },
            Self::Checkout(err) => match err {
                CheckoutError::Validation(errors) => errors.to_string(),
                CheckoutError::NotAuthenticated => "Please sign in first".to_string(),
                CheckoutError::NoCart => "Your cart is empty".to_string(),
                CheckoutError::Payment(_) | CheckoutError::MissingRedirect => {
                    "Payment failed. Please try again.".to_string()
                }
            },
            Self::Validation(errors) => errors.to_string(),
            Self::NotFound(what) => format!("Not found: {what}"),
        }
    }
}

/// Server messages for 4xx answers are meant for shoppers; anything else is not.
fn api_message(err: &ApiError) -> String {
    match err {
        ApiError::Unauthorized(_) => "Your session has expired, please sign in again".to_string(),
        ApiError::NotFound(message) => message.clone(),
        ApiError::Status { status, message } if (400..500).contains(status) => message.clone(),
        ApiError::RateLimited(secs) => format!("Too many requests, try again in {secs} seconds"),
        ApiError::Http(_) => "Network error, check your connection".to_string(),
        _ => "External service error".to_string(),
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, username: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: username.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("navigation", "Opened page", Some(&[("path", "/cart")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::Sync(SyncError::InvalidQuantity(0));
        assert_eq!(
            err.to_string(),
            "Sync error: quantity must be at least 1, got 0"
        );
    }

    #[test]
    fn test_user_messages_hide_internals() {
        let err = AppError::Api(ApiError::Status {
            status: 502,
            message: "upstream connect error at 10.0.0.4".to_string(),
        });
        assert_eq!(err.user_message(), "External service error");

        let err = AppError::Api(ApiError::Status {
            status: 400,
            message: "Invalid ID format".to_string(),
        });
        assert_eq!(err.user_message(), "Invalid ID format");

        let err = AppError::Config(ConfigError::MissingEnvVar("TOKEN_SECRET".to_string()));
        assert_eq!(err.user_message(), "Something went wrong");

        let err = AppError::Auth(AuthError::InvalidCredentials);
        assert_eq!(
            err.user_message(),
            "Invalid email or password. Please try again."
        );
    }

    #[test]
    fn test_reportable_errors() {
        assert!(AppError::Config(ConfigError::InvalidEnvVar("X".into(), "y".into())).is_reportable());
        assert!(
            AppError::Api(ApiError::Status {
                status: 500,
                message: String::new()
            })
            .is_reportable()
        );
        assert!(!AppError::Api(ApiError::Unauthorized(String::new())).is_reportable());
        assert!(!AppError::Sync(SyncError::NotAuthenticated).is_reportable());
        assert!(!AppError::Validation(FieldErrors::new()).is_reportable());
    }
}
