//! Read-only catalog access with response caching.
//!
//! Products, categories, subcategories and brands are public and change
//! rarely, so responses are cached with `moka` (1000 entries, TTL from
//! configuration). Filtering (related products, search) runs over the
//! cached product list.

use std::sync::Arc;
use std::time::Duration;

use freshcart_core::{CategoryId, ProductId};
use moka::future::Cache;
use tracing::{debug, instrument};

use crate::api::{ApiError, Brand, Category, CommerceApi, Product, Subcategory};

const MAX_CACHE_ENTRIES: u64 = 1000;

/// Cache key for catalog responses.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Products,
    Product(ProductId),
    Categories,
    Subcategories(CategoryId),
    Brands,
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Products(Arc<Vec<Product>>),
    Product(Box<Product>),
    Categories(Arc<Vec<Category>>),
    Subcategories(Arc<Vec<Subcategory>>),
    Brands(Arc<Vec<Brand>>),
}

/// Category name paired with its image, for the category slider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryImage {
    pub name: String,
    pub image: String,
}

/// Cached access to the public catalog.
#[derive(Clone)]
pub struct Catalog {
    api: Arc<dyn CommerceApi>,
    cache: Cache<CacheKey, CacheValue>,
}

impl Catalog {
    #[must_use]
    pub fn new(api: Arc<dyn CommerceApi>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_CACHE_ENTRIES)
            .time_to_live(ttl)
            .build();
        Self { api, cache }
    }

    /// All products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, ApiError> {
        if let Some(CacheValue::Products(products)) = self.cache.get(&CacheKey::Products).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products = Arc::new(self.api.products().await?);
        self.cache
            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// One product by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product = self.api.product(id).await?;
        self.cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// Products in the named category, excluding `exclude`.
    ///
    /// # Errors
    ///
    /// Returns an error if the product list cannot be loaded.
    #[instrument(skip(self))]
    pub async fn related_products(
        &self,
        category_name: &str,
        exclude: Option<&ProductId>,
    ) -> Result<Vec<Product>, ApiError> {
        let products = self.products().await?;
        Ok(products
            .iter()
            .filter(|p| p.category_name() == Some(category_name))
            .filter(|p| exclude != Some(&p.id))
            .cloned()
            .collect())
    }

    /// Case-insensitive title search. A blank query matches everything.
    ///
    /// # Errors
    ///
    /// Returns an error if the product list cannot be loaded.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<Product>, ApiError> {
        let products = self.products().await?;
        let needle = query.trim().to_lowercase();
        Ok(products
            .iter()
            .filter(|p| needle.is_empty() || p.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories = Arc::new(self.api.categories().await?);
        self.cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;
        Ok(categories)
    }

    /// Categories that have an image.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn category_images(&self) -> Result<Vec<CategoryImage>, ApiError> {
        let categories = self.categories().await?;
        Ok(categories
            .iter()
            .filter_map(|c| {
                c.image.as_ref().map(|image| CategoryImage {
                    name: c.name.clone(),
                    image: image.clone(),
                })
            })
            .collect())
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(category_id = %category))]
    pub async fn subcategories(
        &self,
        category: &CategoryId,
    ) -> Result<Arc<Vec<Subcategory>>, ApiError> {
        let key = CacheKey::Subcategories(category.clone());
        if let Some(CacheValue::Subcategories(subcategories)) = self.cache.get(&key).await {
            debug!("Cache hit for subcategories");
            return Ok(subcategories);
        }

        let subcategories = Arc::new(self.api.subcategories(category).await?);
        self.cache
            .insert(key, CacheValue::Subcategories(subcategories.clone()))
            .await;
        Ok(subcategories)
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn brands(&self) -> Result<Arc<Vec<Brand>>, ApiError> {
        if let Some(CacheValue::Brands(brands)) = self.cache.get(&CacheKey::Brands).await {
            debug!("Cache hit for brands");
            return Ok(brands);
        }

        let brands = Arc::new(self.api.brands().await?);
        self.cache
            .insert(CacheKey::Brands, CacheValue::Brands(brands.clone()))
            .await;
        Ok(brands)
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}
