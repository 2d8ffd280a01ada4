//! Paged API responses and the has-more policy.
//!
//! Every list endpoint of the catalog backend returns
//! `{data: [...], meta: {pagination: {...}}}`. The pagination block is
//! optional; when it is absent the caller falls back to a batch-size
//! heuristic to decide whether another page exists.

use serde::{Deserialize, Serialize};

/// Server-reported pagination metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page number (1-based).
    pub page: u32,
    /// Requested page size.
    pub page_size: u32,
    /// Total number of pages.
    pub page_count: u32,
    /// Total number of items across all pages.
    pub total: u64,
}

/// One page of a list endpoint response.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// Server pagination metadata, when reported.
    pub pagination: Option<Pagination>,
}

impl<T> Page<T> {
    /// Whether more pages exist after `current_page`.
    ///
    /// Prefers server-reported page-count metadata; falls back to the
    /// "full batch means another page" heuristic when it is absent.
    #[must_use]
    pub fn has_more(&self, current_page: u32, page_size: u32) -> bool {
        self.pagination.map_or_else(
            || self.data.len() == page_size as usize,
            |p| current_page < p.page_count,
        )
    }

    /// Map the items of this page, keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::cast_possible_truncation)]
mod tests {
    use super::*;

    fn page_of(n: usize, pagination: Option<Pagination>) -> Page<u32> {
        Page {
            data: (0..n).map(|i| i as u32).collect(),
            pagination,
        }
    }

    #[test]
    fn test_has_more_prefers_server_metadata() {
        // A full batch, but the server says this is the last page.
        let page = page_of(
            8,
            Some(Pagination {
                page: 1,
                page_size: 8,
                page_count: 1,
                total: 8,
            }),
        );
        assert!(!page.has_more(1, 8));

        let page = page_of(
            8,
            Some(Pagination {
                page: 1,
                page_size: 8,
                page_count: 3,
                total: 20,
            }),
        );
        assert!(page.has_more(1, 8));
    }

    #[test]
    fn test_has_more_falls_back_to_batch_size() {
        assert!(page_of(8, None).has_more(1, 8));
        assert!(!page_of(5, None).has_more(1, 8));
        assert!(!page_of(0, None).has_more(1, 8));
    }

    #[test]
    fn test_map_keeps_pagination() {
        let page = page_of(
            2,
            Some(Pagination {
                page: 1,
                page_size: 2,
                page_count: 4,
                total: 7,
            }),
        );
        let mapped = page.map(|i| i.to_string());
        assert_eq!(mapped.data, vec!["0".to_string(), "1".to_string()]);
        assert_eq!(mapped.pagination.unwrap().total, 7);
    }
}
