//! FreshCart Core - Shared domain types.
//!
//! This crate provides common types used across the FreshCart components:
//! - `storefront` - Client library mirroring the remote cart, wishlist and session
//! - `cli` - Terminal front-end built on the storefront library
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O and no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, phones and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
