//! Domain types for the catalog backend.
//!
//! These types provide a clean, ergonomic API separate from the raw
//! backend payloads, with all image fallback chains already resolved.

use std::collections::BTreeMap;

use bravex_core::{CategoryId, CollectionId, FacetId, PostId, ProductId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Catalog Entities
// =============================================================================

/// A purchasable product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Backend document ID.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Unit price.
    pub price: Decimal,
    /// URL slug, when the backend assigned one.
    pub slug: Option<String>,
    /// Long description.
    pub description: Option<String>,
    /// Card-sized preview image URL.
    pub preview_image: Option<String>,
    /// Full-size gallery image URLs, in display order.
    pub gallery_images: Vec<String>,
    /// Available size labels.
    pub sizes: Vec<String>,
}

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Backend document ID.
    pub id: CategoryId,
    /// Display title.
    pub title: String,
    /// URL slug.
    pub slug: String,
    /// Card image URL.
    pub image: Option<String>,
}

/// A curated product collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    /// Backend document ID.
    pub id: CollectionId,
    /// Display title.
    pub title: String,
    /// Short description.
    pub description: Option<String>,
    /// Cover image URL.
    pub image: Option<String>,
}

/// A blog post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Backend document ID.
    pub id: PostId,
    /// Display title.
    pub title: String,
    /// Subtitle shown on cards.
    pub subtitle: Option<String>,
    /// URL slug, when the backend assigned one.
    pub slug: Option<String>,
    /// Publication timestamp.
    pub published_at: Option<DateTime<Utc>>,
    /// Card-sized preview image URL.
    pub preview_image: Option<String>,
    /// Large cover image URL for the featured slot.
    pub cover_image: Option<String>,
}

/// A filterable product characteristic and its selectable values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facet {
    /// Backend document ID.
    pub id: FacetId,
    /// Display name (e.g. "Color").
    pub name: String,
    /// Selectable values.
    pub values: Vec<String>,
}

// =============================================================================
// Product Queries
// =============================================================================

/// Selected facet values, keyed by facet ID.
///
/// Empty value lists are dropped on insert so they are never sent to the
/// backend as empty filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetSelection(BTreeMap<FacetId, Vec<String>>);

impl FacetSelection {
    /// Create an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the chosen values for a facet. Empty lists are ignored.
    pub fn select(&mut self, facet: FacetId, values: Vec<String>) {
        if !values.is_empty() {
            self.0.insert(facet, values);
        }
    }

    /// Whether no facet has any selected value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over selected facets and their values.
    pub fn iter(&self) -> impl Iterator<Item = (&FacetId, &[String])> {
        self.0.iter().map(|(id, values)| (id, values.as_slice()))
    }
}

/// Parameters for one paged product fetch.
#[derive(Debug, Clone)]
pub struct ProductQuery {
    /// Page number (1-based).
    pub page: u32,
    /// Items per page.
    pub page_size: u32,
    /// Category slug filter.
    pub category: Option<String>,
    /// Selected facet values.
    pub facets: FacetSelection,
}

impl ProductQuery {
    /// Whether this query carries no category or facet filter.
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        self.category.is_none() && self.facets.is_empty()
    }

    /// Render the query as backend query-string pairs.
    ///
    /// Multiple values for one facet are indexed
    /// (`characteristics[{id}][0]`, `characteristics[{id}][1]`, ...) and
    /// combined by the backend with OR semantics; a single value is sent
    /// unindexed.
    #[must_use]
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("pagination[page]".to_string(), self.page.to_string()),
            (
                "pagination[pageSize]".to_string(),
                self.page_size.to_string(),
            ),
        ];

        if let Some(slug) = &self.category {
            params.push((
                "filters[categories][slug][$eq]".to_string(),
                slug.clone(),
            ));
        }

        for (facet, values) in self.facets.iter() {
            if let [single] = values {
                params.push((format!("characteristics[{facet}]"), single.clone()));
            } else {
                for (index, value) in values.iter().enumerate() {
                    params.push((
                        format!("characteristics[{facet}][{index}]"),
                        value.clone(),
                    ));
                }
            }
        }

        params
    }
}
