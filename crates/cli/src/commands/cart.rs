//! Cart commands. Every mutation prints the reconciled cart.

use freshcart_core::ProductId;
use freshcart_storefront::Storefront;
use freshcart_storefront::cart::SyncError;
use freshcart_storefront::error::AppError;

use super::reported;
use crate::render;

pub fn show(storefront: &Storefront) -> Result<String, AppError> {
    if !storefront.session().is_authenticated() {
        return Err(SyncError::NotAuthenticated.into());
    }
    Ok(render::cart(&storefront.cart_page()))
}

pub async fn add(storefront: &Storefront, product_id: &str) -> Result<String, AppError> {
    storefront
        .cart()
        .add_item(&ProductId::new(product_id))
        .await
        .map_err(reported)?;
    show(storefront)
}

pub async fn remove(storefront: &Storefront, product_id: &str) -> Result<String, AppError> {
    storefront
        .cart()
        .remove_item(&ProductId::new(product_id))
        .await
        .map_err(reported)?;
    show(storefront)
}

pub async fn update(
    storefront: &Storefront,
    product_id: &str,
    count: u32,
) -> Result<String, AppError> {
    storefront
        .cart()
        .update_quantity(&ProductId::new(product_id), count)
        .await
        .map_err(reported)?;
    show(storefront)
}

pub async fn clear(storefront: &Storefront) -> Result<String, AppError> {
    storefront.cart().clear().await.map_err(reported)?;
    show(storefront)
}
