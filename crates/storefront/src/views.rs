//! Page view-models.
//!
//! Each page is computed from synchronizer snapshots (and catalog data) so a
//! front-end only has to render strings and flags.

use chrono::{DateTime, Utc};
use freshcart_core::{DeliveryStatus, PaymentStatus, ProductId};

use crate::api::{Cart, CartLine, Order, Product, ProductSummary, Wishlist};
use crate::routes::Route;
use crate::sync::{Snapshot, SyncState};

// =============================================================================
// Cart Page
// =============================================================================

/// Cart line display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub title: String,
    pub image: Option<String>,
    pub price: String,
    pub quantity: u32,
    /// Quantity is 1; decrementing would need a remove instead.
    pub decrement_disabled: bool,
}

/// Cart display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub total: String,
    /// Where "Check out" leads; absent until the service assigns a cart id.
    pub checkout: Option<Route>,
    /// A mutation is in flight.
    pub busy: bool,
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product.id.clone(),
            title: line.product.title.clone(),
            image: line.product.image_cover.clone(),
            price: line.unit_price.to_string(),
            quantity: line.quantity,
            decrement_disabled: line.quantity <= 1,
        }
    }
}

impl CartView {
    fn new(cart: &Cart, busy: bool) -> Self {
        Self {
            items: cart.lines.iter().map(CartItemView::from).collect(),
            item_count: cart.item_count,
            total: cart.total_price.to_string(),
            checkout: cart.id.clone().map(|cart_id| Route::Checkout { cart_id }),
            busy,
        }
    }
}

/// What the cart page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartPage {
    Loading,
    Empty,
    Items(CartView),
    Failed(String),
}

impl From<&Snapshot<Cart>> for CartPage {
    fn from(snapshot: &Snapshot<Cart>) -> Self {
        match &snapshot.state {
            SyncState::Uninitialized | SyncState::Loading => Self::Loading,
            SyncState::Error(message) => Self::Failed(message.clone()),
            SyncState::Ready | SyncState::Mutating if snapshot.data.is_empty() => Self::Empty,
            SyncState::Ready => Self::Items(CartView::new(&snapshot.data, false)),
            SyncState::Mutating => Self::Items(CartView::new(&snapshot.data, true)),
        }
    }
}

// =============================================================================
// Wishlist Page
// =============================================================================

/// Wishlist entry display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WishlistItemView {
    pub product_id: ProductId,
    pub title: String,
    pub image: Option<String>,
    pub price: String,
}

impl From<&ProductSummary> for WishlistItemView {
    fn from(item: &ProductSummary) -> Self {
        Self {
            product_id: item.id.clone(),
            title: item.title.clone(),
            image: item.image_cover.clone(),
            price: item.price.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WishlistPage {
    Loading,
    Empty,
    Items {
        items: Vec<WishlistItemView>,
        item_count: u32,
    },
    Failed(String),
}

impl From<&Snapshot<Wishlist>> for WishlistPage {
    fn from(snapshot: &Snapshot<Wishlist>) -> Self {
        match &snapshot.state {
            SyncState::Uninitialized | SyncState::Loading => Self::Loading,
            SyncState::Error(message) => Self::Failed(message.clone()),
            SyncState::Ready | SyncState::Mutating if snapshot.data.items.is_empty() => {
                Self::Empty
            }
            SyncState::Ready | SyncState::Mutating => Self::Items {
                items: snapshot
                    .data
                    .items
                    .iter()
                    .map(WishlistItemView::from)
                    .collect(),
                item_count: snapshot.data.item_count,
            },
        }
    }
}

// =============================================================================
// Product Detail
// =============================================================================

/// Product page: the product, its heart state and similar products.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDetail {
    pub product: Product,
    pub in_wishlist: bool,
    pub related: Vec<ProductSummary>,
}

impl ProductDetail {
    #[must_use]
    pub fn new(product: Product, wishlist: &Wishlist, related: &[Product]) -> Self {
        Self {
            in_wishlist: wishlist.contains(&product.id),
            related: related
                .iter()
                .filter(|p| p.id != product.id)
                .map(ProductSummary::from)
                .collect(),
            product,
        }
    }
}

// =============================================================================
// Orders Page
// =============================================================================

/// One order row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderView {
    pub id: String,
    pub total: String,
    pub item_count: usize,
    pub payment_method: String,
    pub paid: PaymentStatus,
    pub delivered: DeliveryStatus,
    /// Order date as `YYYY-MM-DD`, if the service sent one.
    pub date: Option<String>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            total: order.total.to_string(),
            item_count: order.lines.len(),
            payment_method: order.payment_method.to_string(),
            paid: order.payment_status,
            delivered: order.delivery_status,
            date: order.created_at.as_ref().map(format_date),
        }
    }
}

fn format_date(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrdersPage {
    Empty,
    Orders(Vec<OrderView>),
}

impl From<&[Order]> for OrdersPage {
    fn from(orders: &[Order]) -> Self {
        if orders.is_empty() {
            Self::Empty
        } else {
            Self::Orders(orders.iter().map(OrderView::from).collect())
        }
    }
}
