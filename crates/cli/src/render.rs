//! Plain-text rendering of storefront pages.
//!
//! Every function returns the text to print so commands stay free of I/O.

use freshcart_storefront::api::{Brand, Category, Product, Subcategory};
use freshcart_storefront::session::Identity;
use freshcart_storefront::views::{CartPage, OrdersPage, ProductDetail, WishlistPage};

pub fn identity(identity: Option<&Identity>) -> String {
    match identity {
        Some(identity) => {
            let name = identity.name().unwrap_or("shopper");
            match identity.claims.role.as_deref() {
                Some(role) => format!("{name} ({role}) id={}", identity.user_id()),
                None => format!("{name} id={}", identity.user_id()),
            }
        }
        None => "Not signed in".to_string(),
    }
}

fn product_line(product: &Product) -> String {
    let price = match product.price_after_discount {
        Some(discounted) => format!("{discounted} (was {})", product.price),
        None => product.price.to_string(),
    };
    let category = product.category_name().unwrap_or("-");
    format!(
        "{}  {}  {price}  [{category}]  {:.1}*",
        product.id, product.title, product.ratings_average
    )
}

pub fn products(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products found".to_string();
    }
    products
        .iter()
        .map(product_line)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn product_detail(detail: &ProductDetail) -> String {
    let product = &detail.product;
    let heart = if detail.in_wishlist { "♥" } else { "♡" };
    let mut lines = vec![
        format!("{heart} {}", product.title),
        product_line(product),
    ];
    if let Some(brand) = &product.brand {
        lines.push(format!("Brand: {}", brand.name));
    }
    if !product.description.is_empty() {
        lines.push(String::new());
        lines.push(product.description.clone());
    }
    if !detail.related.is_empty() {
        lines.push(String::new());
        lines.push("Related products:".to_string());
        lines.extend(
            detail
                .related
                .iter()
                .map(|p| format!("  {}  {}  {}", p.id, p.title, p.price)),
        );
    }
    lines.join("\n")
}

pub fn categories(categories: &[Category]) -> String {
    categories
        .iter()
        .map(|c| format!("{}  {}", c.id, c.name))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn subcategories(subcategories: &[Subcategory]) -> String {
    if subcategories.is_empty() {
        return "No subcategories".to_string();
    }
    subcategories
        .iter()
        .map(|s| format!("{}  {}", s.id, s.name))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn brands(brands: &[Brand]) -> String {
    brands
        .iter()
        .map(|b| format!("{}  {}", b.id, b.name))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn cart(page: &CartPage) -> String {
    match page {
        CartPage::Loading => "Loading cart...".to_string(),
        CartPage::Empty => "Your cart is empty".to_string(),
        CartPage::Failed(message) => message.clone(),
        CartPage::Items(view) => {
            let mut lines: Vec<String> = view
                .items
                .iter()
                .map(|item| {
                    format!(
                        "{}  {}  {} x {}",
                        item.product_id, item.title, item.quantity, item.price
                    )
                })
                .collect();
            lines.push(format!(
                "{} item(s), total {}",
                view.item_count, view.total
            ));
            if let Some(route) = &view.checkout {
                lines.push(format!("Check out: {route}"));
            }
            lines.join("\n")
        }
    }
}

pub fn wishlist(page: &WishlistPage) -> String {
    match page {
        WishlistPage::Loading => "Loading wishlist...".to_string(),
        WishlistPage::Empty => "Your wishlist is empty".to_string(),
        WishlistPage::Failed(message) => message.clone(),
        WishlistPage::Items { items, item_count } => {
            let mut lines: Vec<String> = items
                .iter()
                .map(|item| format!("{}  {}  {}", item.product_id, item.title, item.price))
                .collect();
            lines.push(format!("{item_count} item(s)"));
            lines.join("\n")
        }
    }
}

pub fn orders(page: &OrdersPage) -> String {
    match page {
        OrdersPage::Empty => "No orders yet".to_string(),
        OrdersPage::Orders(rows) => rows
            .iter()
            .map(|row| {
                format!(
                    "#{}  {}  {}  {} item(s)  {}  {}  {}",
                    row.id,
                    row.date.as_deref().unwrap_or("-"),
                    row.total,
                    row.item_count,
                    row.payment_method,
                    row.paid,
                    row.delivered
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use freshcart_core::{CartId, ProductId};
    use freshcart_storefront::routes::Route;
    use freshcart_storefront::views::{CartItemView, CartView, WishlistItemView};

    use super::*;

    #[test]
    fn test_cart_rendering() {
        let page = CartPage::Items(CartView {
            items: vec![CartItemView {
                product_id: ProductId::new("p1"),
                title: "Woman Shawl".to_string(),
                image: None,
                price: "149.00 EGP".to_string(),
                quantity: 2,
                decrement_disabled: false,
            }],
            item_count: 1,
            total: "298.00 EGP".to_string(),
            checkout: Some(Route::Checkout {
                cart_id: CartId::new("c9"),
            }),
            busy: false,
        });

        let text = cart(&page);
        assert!(text.contains("p1  Woman Shawl  2 x 149.00 EGP"));
        assert!(text.contains("1 item(s), total 298.00 EGP"));
        assert!(text.ends_with("Check out: /checkout/c9"));
        assert_eq!(cart(&CartPage::Empty), "Your cart is empty");
    }

    #[test]
    fn test_wishlist_rendering() {
        let page = WishlistPage::Items {
            items: vec![WishlistItemView {
                product_id: ProductId::new("p2"),
                title: "Leather Handbag".to_string(),
                image: None,
                price: "300.00 EGP".to_string(),
            }],
            item_count: 1,
        };
        assert_eq!(
            wishlist(&page),
            "p2  Leather Handbag  300.00 EGP\n1 item(s)"
        );
        assert_eq!(
            wishlist(&WishlistPage::Failed("Failed to load wishlist".into())),
            "Failed to load wishlist"
        );
    }

    #[test]
    fn test_signed_out_identity() {
        assert_eq!(identity(None), "Not signed in");
    }

    #[test]
    fn test_empty_lists() {
        assert_eq!(products(&[]), "No products found");
        assert_eq!(orders(&OrdersPage::Empty), "No orders yet");
    }
}
