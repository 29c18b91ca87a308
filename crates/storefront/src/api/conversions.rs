//! Conversions from wire envelopes to domain types.

use chrono::{DateTime, Utc};
use freshcart_core::{
    BrandId, CartId, CategoryId, OrderId, PaymentMethodType, Price, ProductId, SubcategoryId,
};

use super::types::{
    AccountUser, AuthGrant, Brand, Cart, CartLine, Category, CheckoutSession, Order, Product,
    ProductSummary, ShippingAddress, Subcategory, Wishlist,
};
use super::wire::{
    AuthResponse, CartResponse, CheckoutSessionResponse, WireAddress, WireBrand, WireCartLine,
    WireCategory, WireLineProduct, WireOrder, WireProduct, WireSubcategory, WishlistResponse,
};

pub fn convert_auth(response: AuthResponse) -> AuthGrant {
    AuthGrant {
        message: response.message,
        token: response.token.filter(|t| !t.is_empty()),
        user: response.user.map(|u| AccountUser {
            name: u.name,
            email: u.email,
            role: u.role,
        }),
    }
}

pub fn convert_category(category: WireCategory) -> Category {
    Category {
        id: CategoryId::new(category.id),
        name: category.name,
        slug: category.slug,
        image: category.image,
    }
}

pub fn convert_subcategory(subcategory: WireSubcategory) -> Subcategory {
    Subcategory {
        id: SubcategoryId::new(subcategory.id),
        name: subcategory.name,
        slug: subcategory.slug,
        category: subcategory.category.map(CategoryId::new),
    }
}

pub fn convert_brand(brand: WireBrand) -> Brand {
    Brand {
        id: BrandId::new(brand.id),
        name: brand.name,
        slug: brand.slug,
        image: brand.image,
    }
}

pub fn convert_product(product: WireProduct) -> Product {
    Product {
        id: ProductId::new(product.id),
        title: product.title,
        slug: product.slug,
        description: product.description,
        price: Price::store(product.price.unwrap_or_default()),
        price_after_discount: product.price_after_discount.map(Price::store),
        image_cover: product.image_cover,
        images: product.images,
        category: product.category.map(convert_category),
        brand: product.brand.map(convert_brand),
        subcategories: product
            .subcategory
            .into_iter()
            .map(convert_subcategory)
            .collect(),
        ratings_average: product.ratings_average,
        ratings_quantity: product.ratings_quantity,
        quantity: product.quantity,
        sold: product.sold.unwrap_or_default(),
    }
}

fn convert_summary(product: WireProduct) -> ProductSummary {
    ProductSummary::from(&convert_product(product))
}

fn convert_line(line: WireCartLine) -> CartLine {
    let unit_price = Price::store(line.price.unwrap_or_default());
    let product = match line.product {
        WireLineProduct::Populated(product) => {
            let mut summary = convert_summary(*product);
            // Embedded products carry no price of their own; the line price is authoritative.
            if line.price.is_some() || summary.price.is_zero() {
                summary.price = unit_price;
            }
            summary
        }
        WireLineProduct::Id(id) => ProductSummary {
            id: ProductId::new(id),
            title: String::new(),
            price: unit_price,
            image_cover: None,
            category: None,
            brand: None,
            ratings_average: 0.0,
        },
    };

    CartLine {
        product,
        quantity: line.count.max(1),
        unit_price,
    }
}

pub fn convert_cart(response: CartResponse) -> Cart {
    let Some(data) = response.data else {
        return Cart::empty();
    };

    Cart {
        id: data.id.or(response.cart_id).map(CartId::new),
        item_count: response.num_of_cart_items,
        total_price: Price::store(data.total_cart_price),
        lines: data.products.into_iter().map(convert_line).collect(),
    }
}

pub fn convert_wishlist(response: WishlistResponse) -> Wishlist {
    let items: Vec<ProductSummary> = response.data.into_iter().map(convert_summary).collect();
    let count = response
        .count
        .unwrap_or_else(|| u32::try_from(items.len()).unwrap_or(u32::MAX));
    Wishlist::from_items(count, items)
}

fn convert_address(address: WireAddress) -> ShippingAddress {
    ShippingAddress {
        details: address.details,
        phone: address.phone,
        city: address.city,
    }
}

fn convert_payment_method(raw: Option<&str>) -> PaymentMethodType {
    match raw {
        Some(method) if method.eq_ignore_ascii_case("card") => PaymentMethodType::Card,
        _ => PaymentMethodType::Cash,
    }
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn convert_order(order: WireOrder) -> Order {
    Order {
        id: OrderId::new(order.id),
        lines: order.cart_items.into_iter().map(convert_line).collect(),
        total: Price::store(order.total_order_price),
        payment_method: convert_payment_method(order.payment_method_type.as_deref()),
        payment_status: order.is_paid.into(),
        delivery_status: order.is_delivered.into(),
        created_at: parse_timestamp(order.created_at.as_deref()),
        shipping_address: order.shipping_address.map(convert_address),
    }
}

pub fn convert_checkout_session(response: CheckoutSessionResponse) -> CheckoutSession {
    CheckoutSession {
        status: response.status,
        url: response.session.and_then(|s| s.url),
    }
}

/// Wishlist mutation responses list bare product ids.
pub fn convert_member_ids(ids: Vec<String>) -> Vec<ProductId> {
    let mut unique: Vec<ProductId> = Vec::with_capacity(ids.len());
    for id in ids.into_iter().map(ProductId::new) {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}
