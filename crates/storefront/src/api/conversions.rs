//! Conversions from raw backend payloads to domain types.
//!
//! All image fallback chains live here. Each entity has one preference
//! order for its card image; products additionally resolve a gallery
//! chain per media file. Relative upload paths are prefixed with the
//! API base URL.

use chrono::{DateTime, Utc};

use bravex_core::{CategoryId, CollectionId, FacetId, PostId, ProductId};

use super::raw::{RawCategory, RawCollection, RawFacet, RawFormats, RawMedia, RawPost, RawProduct};
use super::types::{Category, Collection, Facet, Post, Product};

/// Pre-scaled image formats used by the fallback chains, smallest to
/// largest.
#[derive(Debug, Clone, Copy)]
pub enum ImageFormat {
    Small,
    Medium,
    Large,
}

fn format_url(formats: &RawFormats, format: ImageFormat) -> Option<&str> {
    let slot = match format {
        ImageFormat::Small => &formats.small,
        ImageFormat::Medium => &formats.medium,
        ImageFormat::Large => &formats.large,
    };
    slot.as_ref().map(|f| f.url.as_str())
}

/// Resolve a media file to an absolute URL, trying `preference` formats
/// in order and falling back to the original upload.
fn resolve_image(media: &RawMedia, preference: &[ImageFormat], base_url: &str) -> String {
    let url = media
        .formats
        .as_ref()
        .and_then(|formats| {
            preference
                .iter()
                .find_map(|format| format_url(formats, *format))
        })
        .unwrap_or(media.url.as_str());

    if url.starts_with("http") {
        url.to_string()
    } else {
        format!("{base_url}{url}")
    }
}

pub fn convert_product(raw: RawProduct, base_url: &str) -> Product {
    let media = raw.media.unwrap_or_default();

    // Card preview prefers the small format; the gallery wants the
    // biggest available rendition per file.
    let preview_image = media
        .first()
        .map(|m| resolve_image(m, &[ImageFormat::Small], base_url));
    let gallery_images = media
        .iter()
        .map(|m| resolve_image(m, &[ImageFormat::Large, ImageFormat::Medium], base_url))
        .collect();

    Product {
        id: ProductId::new(raw.document_id),
        title: raw.title,
        price: raw.price,
        slug: raw.slug,
        description: raw.description,
        preview_image,
        gallery_images,
        sizes: raw
            .sizes
            .unwrap_or_default()
            .into_iter()
            .map(|s| s.value)
            .collect(),
    }
}

pub fn convert_category(raw: RawCategory, base_url: &str) -> Category {
    Category {
        id: CategoryId::new(raw.document_id),
        title: raw.title,
        slug: raw.slug,
        image: raw
            .thumbnail
            .as_ref()
            .map(|m| resolve_image(m, &[ImageFormat::Small], base_url)),
    }
}

pub fn convert_collection(raw: RawCollection, base_url: &str) -> Collection {
    Collection {
        id: CollectionId::new(raw.document_id),
        title: raw.title,
        description: raw.description,
        image: raw
            .thumbnail
            .as_ref()
            .map(|m| resolve_image(m, &[ImageFormat::Medium, ImageFormat::Small], base_url)),
    }
}

pub fn convert_post(raw: RawPost, base_url: &str) -> Post {
    let preview_image = raw
        .thumbnail
        .as_ref()
        .map(|m| resolve_image(m, &[ImageFormat::Medium, ImageFormat::Small], base_url));
    let cover_image = raw
        .thumbnail
        .as_ref()
        .map(|m| resolve_image(m, &[ImageFormat::Large, ImageFormat::Medium], base_url));

    Post {
        id: PostId::new(raw.document_id),
        title: raw.title,
        subtitle: raw.subtitle,
        slug: raw.slug,
        published_at: raw
            .published_at
            .as_deref()
            .and_then(parse_timestamp),
        preview_image,
        cover_image,
    }
}

pub fn convert_facet(raw: RawFacet) -> Facet {
    Facet {
        id: FacetId::new(raw.document_id),
        name: raw.name,
        values: raw.values,
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
