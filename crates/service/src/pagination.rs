//! Pagination utilities for service layer
//!
//! `Page` is always valid (both fields >= 1); request parsing lives in the HTTP validators.

/// Pagination parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    /// 1-based page index
    pub page: u32,
    /// items per page
    pub limit: u32,
}

impl Page {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_LIMIT: u32 = 10;

    /// Number of hits to skip: `(page - 1) * limit`
    pub fn offset(self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// Another page exists iff `page * limit < total`
    pub fn has_next(self, total: u64) -> bool {
        u64::from(self.page) * u64::from(self.limit) < total
    }

    pub fn next(self) -> Self {
        Self { page: self.page.saturating_add(1), limit: self.limit }
    }
}

impl Default for Page {
    fn default() -> Self { Self { page: Self::DEFAULT_PAGE, limit: Self::DEFAULT_LIMIT } }
}
