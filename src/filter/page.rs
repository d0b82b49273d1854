use serde::Serialize;

use crate::config;

/// Caller-supplied paging bounds, normalized against config defaults.
#[derive(Debug, Clone, Copy)]
pub struct PageParams {
    limit: i64,
    offset: i64,
}

impl PageParams {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        let cfg = &config::config().list;
        let limit = limit.unwrap_or(cfg.default_limit).clamp(1, cfg.max_limit);
        let offset = offset.unwrap_or(0).max(0);
        Self { limit, offset }
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }
}

/// List response envelope: one page of rows plus the exact total and the
/// derived page arithmetic.
#[derive(Debug, Serialize)]
pub struct ListResponse<T: Serialize> {
    pub data: Vec<T>,
    pub count: i64,
    pub page: i64,
    pub total_pages: i64,
}

impl<T: Serialize> ListResponse<T> {
    pub fn new(data: Vec<T>, count: i64, page: &PageParams) -> Self {
        Self {
            data,
            count,
            page: current_page(page.offset, page.limit),
            total_pages: total_pages(count, page.limit),
        }
    }
}

pub fn current_page(offset: i64, limit: i64) -> i64 {
    offset / limit + 1
}

pub fn total_pages(total: i64, limit: i64) -> i64 {
    if total <= 0 {
        0
    } else {
        (total + limit - 1) / limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_identity() {
        assert_eq!(current_page(0, 10), 1);
        assert_eq!(current_page(10, 10), 2);
        assert_eq!(current_page(25, 10), 3);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(25, 10), 3);
        assert_eq!(total_pages(30, 10), 3);
        assert_eq!(total_pages(1, 10), 1);
    }

    #[test]
    fn empty_collection_has_zero_pages() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(0, 50), 0);
    }

    #[test]
    fn defaults_and_bounds() {
        let page = PageParams::new(None, None);
        assert_eq!(page.limit(), 50);
        assert_eq!(page.offset(), 0);

        let page = PageParams::new(Some(0), Some(-5));
        assert_eq!(page.limit(), 1);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn limit_is_capped_by_config() {
        let max = crate::config::config().list.max_limit;
        let page = PageParams::new(Some(max + 1000), None);
        assert_eq!(page.limit(), max);
    }
}
