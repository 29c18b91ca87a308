//! Catalog browsing.

use freshcart_core::{CategoryId, ProductId};
use freshcart_storefront::Storefront;
use freshcart_storefront::error::AppError;

use super::reported;
use crate::render;

pub async fn products(storefront: &Storefront, search: Option<&str>) -> Result<String, AppError> {
    let catalog = storefront.catalog();
    let text = match search {
        Some(query) => render::products(&catalog.search(query).await.map_err(reported)?),
        None => render::products(&catalog.products().await.map_err(reported)?),
    };
    Ok(text)
}

pub async fn product(storefront: &Storefront, id: &str) -> Result<String, AppError> {
    let detail = storefront.product_detail(&ProductId::new(id)).await?;
    Ok(render::product_detail(&detail))
}

pub async fn categories(storefront: &Storefront) -> Result<String, AppError> {
    let categories = storefront.catalog().categories().await.map_err(reported)?;
    Ok(render::categories(&categories))
}

pub async fn subcategories(storefront: &Storefront, category_id: &str) -> Result<String, AppError> {
    let subcategories = storefront
        .catalog()
        .subcategories(&CategoryId::new(category_id))
        .await
        .map_err(reported)?;
    Ok(render::subcategories(&subcategories))
}

pub async fn brands(storefront: &Storefront) -> Result<String, AppError> {
    let brands = storefront.catalog().brands().await.map_err(reported)?;
    Ok(render::brands(&brands))
}
