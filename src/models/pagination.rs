//! Pagination arithmetic and response metadata

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Number of pages needed for `total` rows at `limit` per page (ceiling division)
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if total <= 0 || limit <= 0 {
        return 0;
    }
    (total - 1) / limit + 1
}

/// Row offset of a 1-based `page`
pub fn offset(page: i64, limit: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(limit.max(0))
}

/// Pagination metadata returned alongside a page of rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    /// Current page number
    pub page: i64,
    /// Rows per page
    pub limit: i64,
    /// Rows matching the filter across all pages
    pub total: i64,
    /// Number of pages
    #[serde(rename = "total_page")]
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: total_pages(total, limit),
        }
    }
}
