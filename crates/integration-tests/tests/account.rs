//! Live session, cart and wishlist tests.
//!
//! These tests require:
//! - Network access to the commerce API
//! - `FRESHCART_TEST_EMAIL` and `FRESHCART_TEST_PASSWORD` for a throwaway account
//!
//! The account's cart and wishlist are modified and then restored.

use freshcart_integration_tests::TestContext;
use freshcart_storefront::routes::{GuardDecision, Route};
use freshcart_storefront::sync::SyncState;

async fn signed_in(name: &str) -> Option<TestContext> {
    let ctx = TestContext::new(name).expect("Failed to build storefront");
    let signed_in = ctx.sign_in().await.expect("Sign-in failed");
    signed_in.then_some(ctx)
}

#[tokio::test]
#[ignore = "Requires network access and test account credentials"]
async fn session_survives_restart() {
    let Some(ctx) = signed_in("restart").await else {
        return;
    };
    let user = ctx.storefront.session().user_id().expect("No user id");

    // A second context over the same token file restores the session
    let restored = freshcart_storefront::Storefront::new(ctx.storefront.config().clone())
        .expect("Failed to build storefront");
    let identity = restored.start().await.expect("Session not restored");
    assert_eq!(identity.user_id(), &user);
    assert_eq!(restored.navigate("/cart"), GuardDecision::Render(Route::Cart));

    ctx.storefront.sign_out().await.expect("Sign-out failed");
    assert_eq!(ctx.storefront.navigate("/cart"), GuardDecision::RedirectToLogin);
}

#[tokio::test]
#[ignore = "Requires network access and test account credentials"]
async fn cart_add_update_remove() {
    let Some(ctx) = signed_in("cart").await else {
        return;
    };
    let storefront = &ctx.storefront;
    let products = storefront
        .catalog()
        .products()
        .await
        .expect("Failed to list products");
    let product = products.first().expect("demo catalog should not be empty");

    let cart = storefront
        .cart()
        .add_item(&product.id)
        .await
        .expect("Failed to add to cart");
    let quantity = cart.quantity_of(&product.id).expect("Item missing from cart");

    let cart = storefront
        .cart()
        .update_quantity(&product.id, quantity + 1)
        .await
        .expect("Failed to update quantity");
    assert_eq!(cart.quantity_of(&product.id), Some(quantity + 1));
    assert_eq!(storefront.cart().snapshot().state, SyncState::Ready);

    let cart = storefront
        .cart()
        .remove_item(&product.id)
        .await
        .expect("Failed to remove from cart");
    assert_eq!(cart.quantity_of(&product.id), None);
}

#[tokio::test]
#[ignore = "Requires network access and test account credentials"]
async fn wishlist_toggle_round_trip() {
    let Some(ctx) = signed_in("wishlist").await else {
        return;
    };
    let storefront = &ctx.storefront;
    let products = storefront
        .catalog()
        .products()
        .await
        .expect("Failed to list products");
    let product = products.first().expect("demo catalog should not be empty");
    let was_member = storefront.wishlist().contains(&product.id);

    let added = storefront
        .wishlist()
        .toggle(&product.id)
        .await
        .expect("Failed to toggle wishlist");
    assert_eq!(added, !was_member);
    assert_eq!(storefront.wishlist().contains(&product.id), added);

    let restored = storefront
        .wishlist()
        .toggle(&product.id)
        .await
        .expect("Failed to toggle wishlist back");
    assert_eq!(restored, was_member);
}

#[tokio::test]
#[ignore = "Requires network access and test account credentials"]
async fn orders_page_loads() {
    let Some(ctx) = signed_in("orders").await else {
        return;
    };
    ctx.storefront
        .orders_page()
        .await
        .expect("Failed to load orders");
}
