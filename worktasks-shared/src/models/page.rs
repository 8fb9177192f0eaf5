/// Pagination types
///
/// Pages are 1-based. The total count always describes the filtered set before
/// pagination, so clients compute `total_pages = ceil(total_count / page_size)`.

use serde::{Deserialize, Serialize};

/// Largest page a client may request
pub const MAX_PAGE_SIZE: i64 = 100;

/// Default page size when the client omits it
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Validated page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    page_size: i64,
}

impl PageRequest {
    /// Validates a 1-based page request
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if `page < 1`, `page_size < 1` or
    /// `page_size > MAX_PAGE_SIZE`. Out-of-range values are rejected, never
    /// clamped.
    pub fn new(page: i64, page_size: i64) -> Result<Self, String> {
        if page < 1 {
            return Err("page must be at least 1".to_string());
        }
        if page_size < 1 {
            return Err("pageSize must be at least 1".to_string());
        }
        if page_size > MAX_PAGE_SIZE {
            return Err(format!("pageSize must be at most {}", MAX_PAGE_SIZE));
        }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    /// Number of rows to skip
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// Number of rows to return
    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Size of the filtered set before pagination
    pub total_count: i64,

    pub page: i64,

    pub page_size: i64,

    #[serde(rename = "data")]
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: i64, request: PageRequest) -> Self {
        Self {
            total_count,
            page: request.page(),
            page_size: request.page_size(),
            items,
        }
    }

    /// `ceil(total_count / page_size)`
    pub fn total_pages(&self) -> i64 {
        if self.page_size <= 0 {
            return 0;
        }
        (self.total_count + self.page_size - 1) / self.page_size
    }
}
