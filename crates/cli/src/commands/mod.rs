//! Command implementations.
//!
//! Each command returns the text to print on success. Errors are reported
//! to Sentry (when reportable) before they reach `main`.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod navigate;
pub mod orders;
pub mod wishlist;

use freshcart_storefront::error::AppError;

/// Convert into [`AppError`] and capture it.
fn reported(err: impl Into<AppError>) -> AppError {
    err.into().report()
}
