//! Pagination utilities for service layer
//!
//! Normalizes limit/offset input and derives page metadata from the total count.
use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// Pagination parameters as received from the caller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    /// Non-positive limit falls back to the default, negative offset to zero.
    pub fn normalize(self) -> (u64, u64) {
        let limit = if self.limit <= 0 { DEFAULT_LIMIT } else { self.limit as u64 };
        let offset = if self.offset < 0 { 0 } else { self.offset as u64 };
        (limit, offset)
    }

    /// Offset for a 1-based page number, as the HTTP layer receives it.
    pub fn from_page(page: i64, limit: i64) -> Self {
        let page = page.max(1);
        Self { limit, offset: (page - 1).saturating_mul(limit.max(0)) }
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { limit: DEFAULT_LIMIT as i64, offset: 0 } }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl PaginationMeta {
    /// `limit` must already be normalized (non-zero).
    pub fn new(limit: u64, offset: u64, total: u64) -> Self {
        Self { page: offset / limit + 1, limit, total, total_pages: total.div_ceil(limit) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_applies_fallbacks() {
        assert_eq!(Pagination { limit: 0, offset: -5 }.normalize(), (10, 0));
        assert_eq!(Pagination { limit: -1, offset: 0 }.normalize(), (10, 0));
        assert_eq!(Pagination { limit: 25, offset: 50 }.normalize(), (25, 50));
    }

    #[test]
    fn page_is_derived_from_offset() {
        assert_eq!(PaginationMeta::new(10, 0, 0).page, 1);
        assert_eq!(PaginationMeta::new(10, 9, 0).page, 1);
        assert_eq!(PaginationMeta::new(10, 10, 0).page, 2);
        assert_eq!(PaginationMeta::new(3, 7, 0).page, 3);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(PaginationMeta::new(10, 0, 0).total_pages, 0);
        assert_eq!(PaginationMeta::new(10, 0, 10).total_pages, 1);
        assert_eq!(PaginationMeta::new(10, 0, 11).total_pages, 2);
        assert_eq!(PaginationMeta::new(1, 0, 7).total_pages, 7);
    }

    #[test]
    fn from_page_clamps_to_first_page() {
        assert_eq!(Pagination::from_page(0, 10), Pagination { limit: 10, offset: 0 });
        assert_eq!(Pagination::from_page(3, 10), Pagination { limit: 10, offset: 20 });
    }

    #[test]
    fn default_values_are_sane() {
        let d = Pagination::default();
        assert_eq!(d.limit, 10);
        assert_eq!(d.offset, 0);
    }
}
