//! FreshCart storefront client library.
//!
//! Keeps a local, observable mirror of a shopper's session, cart and
//! wishlist in step with the remote commerce REST API, and exposes the
//! catalog, checkout, routes and page view-models a front-end needs.
//! The entry point is [`state::Storefront`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod forms;
pub mod notify;
pub mod orders;
pub mod routes;
pub mod session;
pub mod state;
pub mod sync;
pub mod views;
pub mod wishlist;

#[cfg(test)]
pub(crate) mod testing;

pub use state::Storefront;
