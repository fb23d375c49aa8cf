//! Book list query parameters and their normalized form.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use super::pagination;

/// Raw list query (API). Page and limit stay strings so garbage falls back to defaults.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Substring of title, author or ISBN (case-insensitive)
    pub search: Option<String>,
    /// Exact status
    pub status: Option<String>,
    /// Exact category
    pub category: Option<String>,
    /// Page number, 1-based (default: 1)
    pub page: Option<String>,
    /// Books per page (default: 10)
    pub limit: Option<String>,
}

/// Normalized filter. `page` and `limit` are always >= 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookFilter {
    pub search: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub page: i64,
    pub limit: i64,
}

// NUL cannot reach Postgres text, so it is dropped like surrounding whitespace
fn constraint(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(|s| s.replace('\0', ""))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn positive(value: &Option<String>) -> Option<i64> {
    value
        .as_deref()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n >= 1)
}

impl BookQuery {
    pub fn normalize(&self, default_limit: i64, max_limit: i64) -> BookFilter {
        let max_limit = max_limit.max(1);
        let limit = positive(&self.limit)
            .unwrap_or_else(|| default_limit.max(1))
            .min(max_limit);

        BookFilter {
            search: constraint(&self.search),
            status: constraint(&self.status),
            category: constraint(&self.category),
            page: positive(&self.page).unwrap_or(1),
            limit,
        }
    }
}

impl BookFilter {
    pub fn offset(&self) -> i64 {
        pagination::offset(self.page, self.limit)
    }
}
