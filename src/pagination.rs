//! This module defines the common functionality for paging listing queries.

/// The config for pagination.
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of rows to return per page when not specified in a request.
    pub default_page_size: u64,
    /// The largest page size a request may ask for.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// A resolved page request: a row limit and offset ready to be interpolated
/// into a SQL `LIMIT ?/OFFSET ?` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// The 1-based page number.
    pub number: u64,
    /// The number of rows per page.
    pub size: u64,
}

impl Page {
    /// Resolve the page and page size query parameters against `config`.
    ///
    /// Missing parameters fall back to the config defaults, a page number of
    /// zero is clamped to the first page, and the page size is capped at
    /// `config.max_page_size`.
    pub fn resolve(page: Option<u64>, per_page: Option<u64>, config: &PaginationConfig) -> Self {
        let number = page.unwrap_or(config.default_page).max(1);
        let size = per_page
            .unwrap_or(config.default_page_size)
            .clamp(1, config.max_page_size);

        Self { number, size }
    }

    /// The number of rows to skip before this page starts.
    pub fn offset(&self) -> u64 {
        (self.number - 1) * self.size
    }
}
