use freshcart_storefront::Storefront;
use freshcart_storefront::error::AppError;

use crate::render;

pub async fn list(storefront: &Storefront) -> Result<String, AppError> {
    let page = storefront.orders_page().await?;
    Ok(render::orders(&page))
}
