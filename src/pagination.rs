// ABOUTME: Page/offset pagination parsed leniently from query parameters
// ABOUTME: Invalid or missing values fall back to defaults instead of failing the request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashMap;

pub use unlocked_core::models::PaginationMeta;

/// Default page size for listings
pub const DEFAULT_PER_PAGE: u32 = 10;
/// Largest page size accepted from clients
pub const MAX_PER_PAGE: u32 = 100;

/// Requested page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    /// 1-indexed page number
    pub page: u32,
    /// Records per page
    pub per_page: u32,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PaginationParams {
    /// Build explicit params, clamping both values to at least 1
    #[must_use]
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    /// Read `page` and `per_page` from a query map, clamping `per_page` to
    /// `1..=MAX_PER_PAGE`
    #[must_use]
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        Self::from_query_with(query, DEFAULT_PER_PAGE, MAX_PER_PAGE)
    }

    /// Like [`PaginationParams::from_query`] with a custom default and ceiling
    #[must_use]
    pub fn from_query_with(
        query: &HashMap<String, String>,
        default_per_page: u32,
        max_per_page: u32,
    ) -> Self {
        let page = query
            .get("page")
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(1);
        let per_page = query
            .get("per_page")
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(default_per_page)
            .min(max_per_page);
        Self { page, per_page }
    }

    /// SQL `LIMIT`
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    /// SQL `OFFSET`
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }

    /// Metadata for a listing with `total` matching rows
    #[must_use]
    pub fn meta(&self, total: i64) -> PaginationMeta {
        PaginationMeta::new(total, self.page, self.per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn missing_values_use_defaults() {
        let params = PaginationParams::from_query(&query(&[]));
        assert_eq!(params, PaginationParams::default());
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn garbage_values_use_defaults() {
        let params = PaginationParams::from_query(&query(&[("page", "x"), ("per_page", "-4")]));
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, DEFAULT_PER_PAGE);
    }

    #[test]
    fn per_page_is_clamped() {
        let params = PaginationParams::from_query(&query(&[("page", "3"), ("per_page", "1000")]));
        assert_eq!(params.per_page, MAX_PER_PAGE);
        assert_eq!(params.offset(), 200);
    }
}
