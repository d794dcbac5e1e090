//! Page-number pagination shared by every list operation.

use serde::{Deserialize, Serialize};

/// Fixed number of records per page.
pub const PAGE_SIZE: i64 = 50;

/// A 1-indexed page request.
///
/// Pages past the end, and page 0, are not errors: they simply yield no
/// records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default = "first_page")]
    pub page: i64,
}

fn first_page() -> i64 {
    1
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: first_page() }
    }
}

impl PageRequest {
    pub fn new(page: i64) -> Self {
        Self { page }
    }

    /// Row offset for the store scan, or `None` when the page cannot contain
    /// anything.
    pub fn offset(&self) -> Option<i64> {
        if self.page < 1 {
            return None;
        }
        (self.page - 1).checked_mul(PAGE_SIZE)
    }

    pub fn limit(&self) -> i64 {
        PAGE_SIZE
    }

    /// Number of pages needed to hold `total` records.
    pub fn page_count(total: i64) -> i64 {
        if total <= 0 {
            return 0;
        }
        (total + PAGE_SIZE - 1) / PAGE_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_are_one_indexed() {
        assert_eq!(PageRequest::new(1).offset(), Some(0));
        assert_eq!(PageRequest::new(2).offset(), Some(50));
        assert_eq!(PageRequest::new(0).offset(), None);
        assert_eq!(PageRequest::new(-3).offset(), None);
        assert_eq!(PageRequest::new(i64::MAX).offset(), None);
    }

    #[test]
    fn test_page_count() {
        assert_eq!(PageRequest::page_count(0), 0);
        assert_eq!(PageRequest::page_count(1), 1);
        assert_eq!(PageRequest::page_count(50), 1);
        assert_eq!(PageRequest::page_count(51), 2);
        assert_eq!(PageRequest::page_count(120), 3);
    }

    #[test]
    fn test_default_page_from_empty_query() {
        let req: PageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.page, 1);
    }
}
