use serde::Serialize;
use speedrun_types::{ChainId, IntentStatus};

/// Filters for `list_intents`, per §4.G. All fields optional (`None` ⇒ no
/// constraint on that column).
#[derive(Debug, Clone, Default)]
pub struct IntentFilter {
    pub status: Option<IntentStatus>,
    pub source_chain: Option<ChainId>,
    pub destination_chain: Option<ChainId>,
}

/// Page request, clamped to the spec's `page_size` bounds (default 10, max
/// 100) so every gateway call sees a sane value regardless of what the API
/// layer validated upstream.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Pagination {
    pub const DEFAULT_PAGE_SIZE: u32 = 10;
    pub const MAX_PAGE_SIZE: u32 = 100;

    pub fn new(page: u32, page_size: u32) -> Self {
        let page = page.max(1);
        let page_size = page_size.clamp(1, Self::MAX_PAGE_SIZE);
        Self { page, page_size }
    }

    pub fn offset(&self) -> i64 {
        ((self.page - 1) as i64) * self.page_size as i64
    }

    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_PAGE_SIZE)
    }
}

/// A paginated result set, mirroring the response envelope in §4.G/§6.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, pagination: Pagination, total_count: u64) -> Self {
        let total_pages = if total_count == 0 {
            0
        } else {
            ((total_count - 1) / pagination.page_size as u64) as u32 + 1
        };
        Self {
            data,
            page: pagination.page,
            page_size: pagination.page_size,
            total_count,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamps_page_size_to_max() {
        let p = Pagination::new(1, 500);
        assert_eq!(p.page_size, 100);
    }

    #[test]
    fn pagination_offset_is_zero_indexed() {
        let p = Pagination::new(3, 10);
        assert_eq!(p.offset(), 20);
        assert_eq!(p.limit(), 10);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = Page::new(Vec::<u8>::new(), Pagination::new(1, 10), 21);
        assert_eq!(page.total_pages, 3);
    }
}
