//! Opening storefront paths.
//!
//! Paths are resolved and guarded the same way the storefront does it; a
//! signed-out user asking for a protected page is sent to the login page.

use freshcart_storefront::Storefront;
use freshcart_storefront::error::AppError;
use freshcart_storefront::routes::{GuardDecision, Route};

use super::{cart, catalog, orders, wishlist};

pub async fn open(storefront: &Storefront, path: &str) -> Result<String, AppError> {
    let route = match storefront.navigate(path) {
        GuardDecision::Render(route) => route,
        GuardDecision::RedirectToLogin => return Ok(hint(&Route::Login)),
    };

    match route {
        Route::Home | Route::Products => catalog::products(storefront, None).await,
        Route::ProductDetails { id, .. } => catalog::product(storefront, id.as_str()).await,
        Route::Categories => catalog::categories(storefront).await,
        Route::Brands => catalog::brands(storefront).await,
        Route::Cart => cart::show(storefront),
        Route::Wishlist => wishlist::show(storefront),
        Route::AllOrders => orders::list(storefront).await,
        Route::NotFound(path) => Err(AppError::NotFound(path)),
        other => Ok(hint(&other)),
    }
}

/// Which command covers a form page.
fn hint(route: &Route) -> String {
    if let Route::Checkout { cart_id } = route {
        return format!(
            "{route}: use `freshcart checkout --cart {cart_id} --details <address> --phone <phone> --city <city>`"
        );
    }
    let command = match route {
        Route::Login => "freshcart login --email <email>",
        Route::Register => "freshcart signup --name <name> --email <email> --phone <phone>",
        Route::ForgetPassword => "freshcart password forgot --email <email>",
        Route::Verify => "freshcart password verify <code>",
        Route::ResetPassword => "freshcart password reset --email <email>",
        _ => "freshcart --help",
    };
    format!("{route}: use `{command}`")
}
