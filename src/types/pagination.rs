//! Page/limit handling shared by every list endpoint.

use serde::Serialize;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// A sanitized page request. Pages are 1-based; `limit` is clamped to
/// `[1, MAX_LIMIT]` so a caller can never request an unbounded scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    page: u32,
    limit: u32,
}

impl Page {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        let page = page.unwrap_or(DEFAULT_PAGE).max(1);
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        Self { page, limit }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Row offset for SQL `OFFSET`
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// A page of results plus the totals clients need to render a pager.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, page: Page, total: u64) -> Self {
        let total_pages = total.div_ceil(u64::from(page.limit())) as u32;
        Self {
            data,
            page: page.page(),
            limit: page.limit(),
            total,
            total_pages,
        }
    }

    pub fn empty(page: Page) -> Self {
        Self::new(Vec::new(), page, 0)
    }

    /// Re-wrap an already-fetched full result set as a single page.
    /// Used by role-scoped listings that resolve to one or a few rows.
    pub fn from_full(data: Vec<T>, page: Page) -> Self {
        let total = data.len() as u64;
        Self::new(data, page, total)
    }
}
