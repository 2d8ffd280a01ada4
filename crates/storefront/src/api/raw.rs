//! Raw wire payloads from the catalog backend.
//!
//! Field names and casing mirror the backend's content model exactly
//! (`Title`, `Price`, `Media`, ...). Anything optional in practice is
//! optional here; fallback resolution happens in [`super::conversions`],
//! never at call sites.

use bravex_core::Pagination;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Generic list response envelope: `{data: [...], meta: {pagination}}`.
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    pub data: Option<Vec<T>>,
    pub meta: Option<Meta>,
}

/// Response metadata.
#[derive(Debug, Deserialize)]
pub struct Meta {
    pub pagination: Option<Pagination>,
}

/// One uploaded media file with its derived formats.
#[derive(Debug, Deserialize)]
pub struct RawMedia {
    pub url: String,
    pub formats: Option<RawFormats>,
}

/// Pre-scaled variants of an uploaded media file.
///
/// The backend also emits a `thumbnail` rendition; no fallback chain
/// asks for it, so it is left to serde's unknown-field handling.
#[derive(Debug, Default, Deserialize)]
pub struct RawFormats {
    pub small: Option<RawFormat>,
    pub medium: Option<RawFormat>,
    pub large: Option<RawFormat>,
}

/// One derived format of a media file.
#[derive(Debug, Deserialize)]
pub struct RawFormat {
    pub url: String,
}

/// Raw product payload.
#[derive(Debug, Deserialize)]
pub struct RawProduct {
    #[serde(rename = "documentId")]
    pub document_id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Price", with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub slug: Option<String>,
    #[serde(rename = "Description")]
    pub description: Option<String>,
    #[serde(rename = "Media")]
    pub media: Option<Vec<RawMedia>>,
    pub sizes: Option<Vec<RawSize>>,
}

/// One size option of a product.
#[derive(Debug, Deserialize)]
pub struct RawSize {
    #[serde(rename = "Value")]
    pub value: String,
}

/// Raw category payload.
#[derive(Debug, Deserialize)]
pub struct RawCategory {
    #[serde(rename = "documentId")]
    pub document_id: String,
    #[serde(rename = "Title")]
    pub title: String,
    pub slug: String,
    #[serde(rename = "Thumbnail")]
    pub thumbnail: Option<RawMedia>,
}

/// Raw collection payload.
#[derive(Debug, Deserialize)]
pub struct RawCollection {
    #[serde(rename = "documentId")]
    pub document_id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Description")]
    pub description: Option<String>,
    #[serde(rename = "Thumbnail")]
    pub thumbnail: Option<RawMedia>,
}

/// Raw blog post payload.
#[derive(Debug, Deserialize)]
pub struct RawPost {
    #[serde(rename = "documentId")]
    pub document_id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "SubTitle")]
    pub subtitle: Option<String>,
    pub slug: Option<String>,
    #[serde(rename = "publishedAt")]
    pub published_at: Option<String>,
    #[serde(rename = "Thumbnail")]
    pub thumbnail: Option<RawMedia>,
}

/// Raw facet definition payload.
#[derive(Debug, Deserialize)]
pub struct RawFacet {
    #[serde(rename = "documentId")]
    pub document_id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}
