//! Pagination metadata

use serde::{Deserialize, Serialize};

/// Pagination metadata returned with every paged listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: usize,
    pub limit: usize,
    #[serde(rename = "totalCount")]
    pub total_count: usize,
    #[serde(rename = "totalPages")]
    pub total_pages: usize,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}

impl PageMeta {
    /// Compute metadata for a 1-indexed page over `total_count` items
    pub fn new(page: usize, limit: usize, total_count: usize) -> Self {
        let total_pages = total_count.div_ceil(limit.max(1));
        Self {
            page,
            limit,
            total_count,
            total_pages,
            has_more: page < total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_is_ceiling() {
        let meta = PageMeta::new(1, 10, 25);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_more);

        let meta = PageMeta::new(3, 10, 25);
        assert!(!meta.has_more);

        let meta = PageMeta::new(1, 10, 30);
        assert_eq!(meta.total_pages, 3);
    }

    #[test]
    fn test_empty_listing() {
        let meta = PageMeta::new(1, 10, 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_more);
    }
}
