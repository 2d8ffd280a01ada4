//! Cache value types for catalog API responses.

use bravex_core::Page;

use super::types::{Category, Collection, Product};

/// Cached value types.
///
/// Only unfiltered list pages and slug lookups are cached; faceted
/// queries and posts always go to the backend.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Page<Product>),
    Category(Box<Category>),
    Categories(Page<Category>),
    Collections(Page<Collection>),
}
