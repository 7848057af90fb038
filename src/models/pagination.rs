//! List-endpoint paging primitives.

use serde::{Deserialize, Serialize};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// Paging query parameters; both fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn limit(&self) -> i64 {
        self.per_page
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.current_page() - 1) * self.limit()
    }

    pub fn current_page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T: Serialize> Page<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: &Pagination) -> Self {
        let per_page = pagination.limit();
        Self {
            items,
            total,
            page: pagination.current_page(),
            per_page,
            total_pages: (total + per_page - 1) / per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_of_twenty() {
        let p = Pagination::default();
        assert_eq!(p.limit(), 20);
        assert_eq!(p.offset(), 0);
        assert_eq!(p.current_page(), 1);
    }

    #[test]
    fn per_page_is_clamped() {
        let p = Pagination {
            page: Some(1),
            per_page: Some(5000),
        };
        assert_eq!(p.limit(), 100);

        let p = Pagination {
            page: Some(1),
            per_page: Some(0),
        };
        assert_eq!(p.limit(), 1);
    }

    #[test]
    fn offset_follows_page_and_size() {
        let p = Pagination {
            page: Some(4),
            per_page: Some(15),
        };
        assert_eq!(p.offset(), 45);
    }

    #[test]
    fn negative_page_is_treated_as_first() {
        let p = Pagination {
            page: Some(-2),
            per_page: None,
        };
        assert_eq!(p.current_page(), 1);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn page_counts_round_up() {
        let p = Pagination {
            page: Some(1),
            per_page: Some(10),
        };
        let page = Page::new(vec![0u8; 10], 31, &p);
        assert_eq!(page.total_pages, 4);

        let exact = Page::new(vec![0u8; 10], 30, &p);
        assert_eq!(exact.total_pages, 3);
    }
}
