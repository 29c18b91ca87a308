//! Wishlist commands.

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
    Ok(render::wishlist(&storefront.wishlist_page()))
}

pub async fn add(storefront: &Storefront, product_id: &str) -> Result<String, AppError> {
    storefront
        .wishlist()
        .add(&ProductId::new(product_id))
        .await
        .map_err(reported)?;
    show(storefront)
}

/// Removal from the wishlist page re-reads the list afterwards.
pub async fn remove(storefront: &Storefront, product_id: &str) -> Result<String, AppError> {
    storefront
        .remove_from_wishlist_page(&ProductId::new(product_id))
        .await?;
    show(storefront)
}

pub async fn toggle(storefront: &Storefront, product_id: &str) -> Result<String, AppError> {
    let id = ProductId::new(product_id);
    let added = storefront.wishlist().toggle(&id).await.map_err(reported)?;
    Ok(if added {
        format!("{id} is now in your wishlist")
    } else {
        format!("{id} is no longer in your wishlist")
    })
}
