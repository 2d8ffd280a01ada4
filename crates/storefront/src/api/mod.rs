//! Catalog and payment backend API client.
//!
//! Uses `reqwest` for HTTP with `moka` caching of catalog reads
//! (5-minute TTL). List endpoints return `{data, meta.pagination}`
//! envelopes; query strings use the backend's bracketed parameter
//! convention (`pagination[page]`, `filters[slug][$eq]`, ...).

mod cache;
pub mod conversions;
mod raw;
pub mod types;

pub use types::{Category, Collection, Facet, FacetSelection, Post, Product, ProductQuery};

use std::sync::Arc;
use std::time::Duration;

use bravex_core::Page;
use moka::future::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::StorefrontConfig;
use cache::CacheValue;
use conversions::{
    convert_category, convert_collection, convert_facet, convert_post, convert_product,
};
use raw::{ListResponse, RawCategory, RawCollection, RawFacet, RawPost, RawProduct};

/// Request timeout for all backend calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Catalog cache time-to-live.
const CACHE_TTL: Duration = Duration::from_secs(300);
/// Maximum number of cached responses.
const CACHE_CAPACITY: u64 = 1000;

/// Errors that can occur when talking to the backends.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-success status.
    #[error("HTTP status {0}")]
    Status(reqwest::StatusCode),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found (empty result set for a lookup).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Payment gateway reported a failure.
    #[error("Payment gateway error: {0}")]
    Gateway(String),
}

/// Client for the catalog and payment backends.
///
/// Cheaply cloneable; unfiltered catalog reads are cached for 5 minutes.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    api_base: String,
    payments_base: String,
    cache: Cache<String, CacheValue>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                api_base: config.api_base_url.clone(),
                payments_base: config.payments_base_url.clone(),
                cache,
            }),
        })
    }

    /// Base URL of the catalog API (used to absolutize image paths).
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.inner.api_base
    }

    /// Execute a GET against the catalog API and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{path}", self.inner.api_base);
        let response = self.inner.client.get(&url).query(params).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                path = %path,
                body = %body.chars().take(500).collect::<String>(),
                "catalog API returned non-success status"
            );
            return Err(ApiError::Status(status));
        }

        match serde_json::from_str(&body) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    path = %path,
                    body = %body.chars().take(500).collect::<String>(),
                    "failed to parse catalog API response"
                );
                Err(ApiError::Parse(e))
            }
        }
    }

    /// Fetch a list endpoint into a [`Page`], tolerating a missing
    /// `data` array.
    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Page<T>, ApiError> {
        let response: ListResponse<T> = self.get_json(path, params).await?;
        Ok(Page {
            data: response.data.unwrap_or_default(),
            pagination: response.meta.and_then(|m| m.pagination),
        })
    }

    fn paging_params(page: u32, page_size: u32) -> Vec<(String, String)> {
        vec![
            ("pagination[page]".to_string(), page.to_string()),
            ("pagination[pageSize]".to_string(), page_size.to_string()),
        ]
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a paginated, optionally filtered list of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(page = query.page))]
    pub async fn get_products(&self, query: &ProductQuery) -> Result<Page<Product>, ApiError> {
        let cache_key = format!("products:{}:{}", query.page, query.page_size);

        // Check cache (only for unfiltered queries)
        if query.is_unfiltered()
            && let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let page = self
            .get_list::<RawProduct>("/api/products", &query.to_params())
            .await?
            .map(|p| convert_product(p, &self.inner.api_base));

        if query.is_unfiltered() {
            self.inner
                .cache
                .insert(cache_key, CacheValue::Products(page.clone()))
                .await;
        }

        Ok(page)
    }

    /// Get a product by its slug.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no product matches, or an error
    /// if the API request fails.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<Product, ApiError> {
        let cache_key = format!("product:{slug}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let params = vec![
            ("filters[slug][$eq]".to_string(), slug.to_string()),
            ("populate".to_string(), "*".to_string()),
        ];
        let mut page = self.get_list::<RawProduct>("/api/products", &params).await?;

        let raw = page
            .data
            .drain(..)
            .next()
            .ok_or_else(|| ApiError::NotFound(format!("Product not found: {slug}")))?;
        let product = convert_product(raw, &self.inner.api_base);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    // =========================================================================
    // Category Methods
    // =========================================================================

    /// Get a paginated list of categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_categories(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Category>, ApiError> {
        let cache_key = format!("categories:{page}:{page_size}");

        if let Some(CacheValue::Categories(categories)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let result = self
            .get_list::<RawCategory>("/api/categories", &Self::paging_params(page, page_size))
            .await?
            .map(|c| convert_category(c, &self.inner.api_base));

        self.inner
            .cache
            .insert(cache_key, CacheValue::Categories(result.clone()))
            .await;

        Ok(result)
    }

    /// Get a category by its slug.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no category matches, or an error
    /// if the API request fails.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_category_by_slug(&self, slug: &str) -> Result<Category, ApiError> {
        let cache_key = format!("category:{slug}");

        if let Some(CacheValue::Category(category)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for category");
            return Ok(*category);
        }

        let params = vec![("filters[slug][$eq]".to_string(), slug.to_string())];
        let mut page = self
            .get_list::<RawCategory>("/api/categories", &params)
            .await?;

        let raw = page
            .data
            .drain(..)
            .next()
            .ok_or_else(|| ApiError::NotFound(format!("Category not found: {slug}")))?;
        let category = convert_category(raw, &self.inner.api_base);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Category(Box::new(category.clone())))
            .await;

        Ok(category)
    }

    // =========================================================================
    // Collection Methods
    // =========================================================================

    /// Get a paginated list of collections.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_collections(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Collection>, ApiError> {
        let cache_key = format!("collections:{page}:{page_size}");

        if let Some(CacheValue::Collections(collections)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for collections");
            return Ok(collections);
        }

        let result = self
            .get_list::<RawCollection>("/api/collections", &Self::paging_params(page, page_size))
            .await?
            .map(|c| convert_collection(c, &self.inner.api_base));

        self.inner
            .cache
            .insert(cache_key, CacheValue::Collections(result.clone()))
            .await;

        Ok(result)
    }

    // =========================================================================
    // Post Methods (not cached - the feed should pick up new posts)
    // =========================================================================

    /// Get a paginated list of posts, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_posts(&self, page: u32, page_size: u32) -> Result<Page<Post>, ApiError> {
        let mut params = Self::paging_params(page, page_size);
        params.push(("populate".to_string(), "*".to_string()));
        params.push(("sort[0]".to_string(), "publishedAt:desc".to_string()));

        Ok(self
            .get_list::<RawPost>("/api/posts", &params)
            .await?
            .map(|p| convert_post(p, &self.inner.api_base)))
    }

    // =========================================================================
    // Facet Methods
    // =========================================================================

    /// Get all facet definitions with their values.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_all_facets(&self) -> Result<Vec<Facet>, ApiError> {
        let page = self
            .get_list::<RawFacet>("/api/filters/all-with-values", &[])
            .await?;
        Ok(page.data.into_iter().map(convert_facet).collect())
    }

    /// Get the facet definitions applicable to one category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_facets_by_category(&self, slug: &str) -> Result<Vec<Facet>, ApiError> {
        let page = self
            .get_list::<RawFacet>(&format!("/api/filters/category/{slug}"), &[])
            .await?;
        Ok(page.data.into_iter().map(convert_facet).collect())
    }

    // =========================================================================
    // Payment Backend
    // =========================================================================

    /// POST a JSON body to the payment backend and decode the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the status is non-success,
    /// or the body cannot be decoded.
    pub async fn post_payment<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = format!("{}{path}", self.inner.payments_base);
        let response = self.inner.client.post(&url).json(body).send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                path = %path,
                body = %text.chars().take(500).collect::<String>(),
                "payment backend returned non-success status"
            );
            return Err(ApiError::Status(status));
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "failed to parse payment backend response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Invalidate all cached catalog data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}
