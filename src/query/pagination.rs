//! LIMIT/OFFSET pagination.

use super::fragment::{QueryFragment, QueryParams, QueryValue};

// ---

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// 1-based page plus page size.
///
/// Pages below 1 are clamped for the offset calculation only; page size is
/// taken as given and is the caller's responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    // ---
    pub page: i64,
    pub page_size: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    // ---
    pub fn new(page: i64, page_size: i64) -> Self {
        Self { page, page_size }
    }

    /// Saturates instead of overflowing on absurd page numbers.
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn to_fragment(&self) -> QueryFragment {
        // ---
        let mut params = QueryParams::new();
        params.insert("limit".into(), QueryValue::Int(self.limit()));
        params.insert("offset".into(), QueryValue::Int(self.offset()));
        QueryFragment::new("LIMIT :limit OFFSET :offset", params)
    }
}

pub fn build_pagination(page: i64, page_size: i64) -> QueryFragment {
    Pagination::new(page, page_size).to_fragment()
}
