//! Raw JSON shapes returned by the remote commerce API.
//!
//! Field names follow the service (`_id`, camelCase). Everything optional on
//! the wire is optional here; conversions decide on defaults.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::ShippingAddress;

// =============================================================================
// Envelopes
// =============================================================================

/// `{ results, data: [...] }` list envelope.
#[derive(Debug, Deserialize)]
pub struct ListEnvelope<T> {
    #[allow(dead_code)]
    pub results: Option<u32>,
    pub data: Vec<T>,
}

/// `{ data: {...} }` single-item envelope.
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// Error body: `{ statusMsg, message }` or `{ errors: { msg } }`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub message: Option<String>,
    pub status_msg: Option<String>,
    pub errors: Option<FieldErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct FieldErrorBody {
    pub msg: Option<String>,
}

impl ErrorBody {
    /// Best human-readable message in the body.
    pub fn into_message(self) -> Option<String> {
        self.message
            .or_else(|| self.errors.and_then(|e| e.msg))
            .or(self.status_msg)
    }
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub message: String,
    pub token: Option<String>,
    pub user: Option<AuthUser>,
}

#[derive(Debug, Deserialize)]
pub struct AuthUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EmailBody<'a> {
    pub email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetCodeBody<'a> {
    pub reset_code: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordBody<'a> {
    pub email: &'a str,
    pub new_password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: Option<String>,
    pub status_msg: Option<String>,
    pub message: Option<String>,
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct WireCategory {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireSubcategory {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireBrand {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireProduct {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    /// Absent on products embedded in cart lines.
    pub price: Option<Decimal>,
    pub price_after_discount: Option<Decimal>,
    pub image_cover: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub category: Option<WireCategory>,
    pub brand: Option<WireBrand>,
    #[serde(default)]
    pub subcategory: Vec<WireSubcategory>,
    #[serde(default)]
    pub ratings_average: f64,
    #[serde(default)]
    pub ratings_quantity: u32,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub sold: Option<u32>,
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    #[serde(default)]
    pub num_of_cart_items: u32,
    pub cart_id: Option<String>,
    pub data: Option<WireCart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCart {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub products: Vec<WireCartLine>,
    #[serde(default)]
    pub total_cart_price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct WireCartLine {
    #[serde(default = "one")]
    pub count: u32,
    pub price: Option<Decimal>,
    pub product: WireLineProduct,
}

const fn one() -> u32 {
    1
}

/// Lines carry the populated product on reads and only its id on some writes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WireLineProduct {
    Populated(Box<WireProduct>),
    Id(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductIdBody<'a> {
    pub product_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CountBody {
    pub count: u32,
}

// =============================================================================
// Wishlist
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct WishlistResponse {
    pub count: Option<u32>,
    #[serde(default)]
    pub data: Vec<WireProduct>,
}

#[derive(Debug, Deserialize)]
pub struct WishlistMutationResponse {
    #[serde(default)]
    pub data: Vec<String>,
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOrder {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub cart_items: Vec<WireCartLine>,
    #[serde(default)]
    pub total_order_price: Decimal,
    pub payment_method_type: Option<String>,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub is_delivered: bool,
    pub created_at: Option<String>,
    pub shipping_address: Option<WireAddress>,
}

#[derive(Debug, Deserialize)]
pub struct WireAddress {
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub city: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingBody<'a> {
    pub shipping_address: &'a ShippingAddress,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutSessionResponse {
    #[serde(default)]
    pub status: String,
    pub session: Option<WireSession>,
}

#[derive(Debug, Deserialize)]
pub struct WireSession {
    pub url: Option<String>,
}
