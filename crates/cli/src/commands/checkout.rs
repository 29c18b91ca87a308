//! Order placement.

use freshcart_core::CartId;
use freshcart_storefront::Storefront;
use freshcart_storefront::checkout::CheckoutOutcome;
use freshcart_storefront::error::AppError;
use freshcart_storefront::forms::ShippingForm;

pub async fn place_order(
    storefront: &Storefront,
    cart_id: Option<String>,
    details: String,
    phone: String,
    city: String,
    payment_method: String,
) -> Result<String, AppError> {
    let form = ShippingForm {
        details,
        phone,
        city,
        payment_method,
    };

    let cart_id = cart_id.map(CartId::new);
    match storefront.checkout(cart_id.as_ref(), &form).await? {
        CheckoutOutcome::Redirect(url) => Ok(format!("Complete your payment at {url}")),
        CheckoutOutcome::OrderPlaced(order) => Ok(format!(
            "Order #{} placed: {}, {}",
            order.id, order.total, order.payment_method
        )),
    }
}
