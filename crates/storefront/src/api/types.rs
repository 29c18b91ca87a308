//! Domain types for the remote commerce API.
//!
//! These types provide a clean, ergonomic API separate from the raw JSON
//! envelopes the service returns.

use chrono::{DateTime, Utc};
use freshcart_core::{
    BrandId, CartId, CategoryId, DeliveryStatus, Email, OrderId, PaymentMethodType, PaymentStatus,
    Price, ProductId, SubcategoryId,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// Auth Types
// =============================================================================

/// Sign-in credentials.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: Email,
    pub password: String,
}

/// Sign-up payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub name: String,
    pub email: Email,
    pub password: String,
    pub re_password: String,
    pub phone: String,
}

/// Account summary returned alongside a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUser {
    pub name: String,
    pub email: String,
    pub role: Option<String>,
}

/// Raw result of sign-in or sign-up.
///
/// Not validated: the session decides whether a `"success"` message
/// without a token is acceptable (it is not).
#[derive(Debug, Clone)]
pub struct AuthGrant {
    pub message: String,
    pub token: Option<String>,
    pub user: Option<AccountUser>,
}

impl AuthGrant {
    /// The server reported success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.message.eq_ignore_ascii_case("success")
    }
}

// =============================================================================
// Catalog Types
// =============================================================================

/// Top-level product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
}

/// Subcategory within a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: SubcategoryId,
    pub name: String,
    pub slug: String,
    pub category: Option<CategoryId>,
}

/// Product brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
}

/// Full product record (read-only, owned by the remote service).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub price: Price,
    /// Discounted price when a sale is running.
    pub price_after_discount: Option<Price>,
    pub image_cover: Option<String>,
    pub images: Vec<String>,
    pub category: Option<Category>,
    pub brand: Option<Brand>,
    pub subcategories: Vec<Subcategory>,
    pub ratings_average: f64,
    pub ratings_quantity: u32,
    /// Units in stock.
    pub quantity: u32,
    pub sold: u32,
}

impl Product {
    /// The price a shopper actually pays.
    #[must_use]
    pub fn effective_price(&self) -> Price {
        self.price_after_discount.unwrap_or(self.price)
    }

    /// Category name, if the product has one.
    #[must_use]
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.name.as_str())
    }
}

/// Condensed product shown in cart lines, wishlist entries and orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    pub image_cover: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub ratings_average: f64,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            title: product.title.clone(),
            price: product.effective_price(),
            image_cover: product.image_cover.clone(),
            category: product.category.as_ref().map(|c| c.name.clone()),
            brand: product.brand.as_ref().map(|b| b.name.clone()),
            ratings_average: product.ratings_average,
        }
    }
}

// =============================================================================
// Cart Types
// =============================================================================

/// One product line in a cart or order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: ProductSummary,
    /// Always at least 1.
    pub quantity: u32,
    pub unit_price: Price,
}

/// Cart as reported by the remote service.
///
/// `item_count` and `total_price` are the server's figures; they are never
/// recomputed from `lines`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Cart {
    /// Absent when the user has no cart yet (or it was just cleared).
    pub id: Option<CartId>,
    pub item_count: u32,
    pub total_price: Price,
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// A cart with no lines and zero totals.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Quantity of a product in the cart, if present.
    #[must_use]
    pub fn quantity_of(&self, product: &ProductId) -> Option<u32> {
        self.lines
            .iter()
            .find(|line| &line.product.id == product)
            .map(|line| line.quantity)
    }
}

// =============================================================================
// Wishlist Types
// =============================================================================

/// Wishlist as mirrored locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Wishlist {
    /// Server count, adjusted optimistically between fetches.
    pub item_count: u32,
    /// Product summaries from the last full fetch.
    pub items: Vec<ProductSummary>,
    /// Membership, unique by product id. Updated by every mutation.
    pub member_ids: Vec<ProductId>,
}

impl Wishlist {
    /// Build from a full fetch; membership follows the fetched items.
    #[must_use]
    pub fn from_items(item_count: u32, items: Vec<ProductSummary>) -> Self {
        let mut member_ids: Vec<ProductId> = Vec::with_capacity(items.len());
        for item in &items {
            if !member_ids.contains(&item.id) {
                member_ids.push(item.id.clone());
            }
        }
        Self {
            item_count,
            items,
            member_ids,
        }
    }

    /// Linear membership scan. Wishlists are small.
    #[must_use]
    pub fn contains(&self, product: &ProductId) -> bool {
        self.member_ids.iter().any(|id| id == product)
    }

    /// True when nothing is on the wishlist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.member_ids.is_empty()
    }
}

// =============================================================================
// Order Types
// =============================================================================

/// Delivery address for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub details: String,
    pub phone: String,
    pub city: String,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub lines: Vec<CartLine>,
    pub total: Price,
    pub payment_method: PaymentMethodType,
    pub payment_status: PaymentStatus,
    pub delivery_status: DeliveryStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub shipping_address: Option<ShippingAddress>,
}

/// Hosted online-payment session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub status: String,
    /// Where to send the shopper to pay.
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn summary(id: &str) -> ProductSummary {
        ProductSummary {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            price: Price::store(Decimal::new(100, 0)),
            image_cover: None,
            category: None,
            brand: None,
            ratings_average: 4.5,
        }
    }

    #[test]
    fn test_wishlist_membership_is_unique() {
        let wishlist = Wishlist::from_items(3, vec![summary("a"), summary("b"), summary("a")]);
        assert_eq!(wishlist.member_ids.len(), 2);
        assert!(wishlist.contains(&ProductId::new("a")));
        assert!(!wishlist.contains(&ProductId::new("c")));
    }

    #[test]
    fn test_cart_quantity_of() {
        let cart = Cart {
            id: Some(CartId::new("cart-1")),
            item_count: 1,
            total_price: Price::store(Decimal::new(300, 0)),
            lines: vec![CartLine {
                product: summary("a"),
                quantity: 3,
                unit_price: Price::store(Decimal::new(100, 0)),
            }],
        };
        assert_eq!(cart.quantity_of(&ProductId::new("a")), Some(3));
        assert_eq!(cart.quantity_of(&ProductId::new("b")), None);
        assert!(!cart.is_empty());
        assert!(Cart::empty().is_empty());
    }

    #[test]
    fn test_auth_grant_success_is_case_insensitive() {
        let grant = AuthGrant {
            message: "Success".to_string(),
            token: None,
            user: None,
        };
        assert!(grant.is_success());
    }
}
