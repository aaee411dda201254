use std::fmt;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 20;

/// One-based page request. The limit is clamped to [`MAX_PAGE_SIZE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    limit: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageError {
    PageTooSmall,
    LimitTooSmall,
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PageTooSmall => f.write_str("page must be at least 1"),
            Self::LimitTooSmall => f.write_str("limit must be at least 1"),
        }
    }
}

impl std::error::Error for PageError {}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Result<Self, PageError> {
        let page = page.unwrap_or(1);
        if page < 1 {
            return Err(PageError::PageTooSmall);
        }
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if limit < 1 {
            return Err(PageError::LimitTooSmall);
        }

        Ok(Self {
            page,
            limit: limit.min(MAX_PAGE_SIZE),
        })
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub request: PageRequest,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            request,
        }
    }

    pub fn total_pages(&self) -> i64 {
        if self.total <= 0 {
            return 0;
        }
        (self.total + self.request.limit() - 1) / self.request.limit()
    }

    pub fn has_more(&self) -> bool {
        self.request.page() < self.total_pages()
    }
}
