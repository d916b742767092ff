//! Pagination metadata for list responses

use serde::Serialize;

/// Pagination block returned alongside list results
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Requested page number (1-indexed)
    pub page: i64,
    /// Requested page size
    pub limit: i64,
    /// Total number of pages for the filtered result set
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageInfo {
    /// Calculate pagination metadata for a filtered total
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        Self {
            page,
            limit,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_normal() {
        let p = PageInfo::new(2, 10, 35);
        assert_eq!(p.total_pages, 4);
        assert!(p.has_next);
        assert!(p.has_prev);
    }

    #[test]
    fn test_pagination_first_page() {
        let p = PageInfo::new(1, 10, 35);
        assert!(p.has_next);
        assert!(!p.has_prev);
    }

    #[test]
    fn test_pagination_last_page() {
        let p = PageInfo::new(4, 10, 35);
        assert!(!p.has_next);
        assert!(p.has_prev);
    }

    #[test]
    fn test_pagination_exact_page_boundary() {
        let p = PageInfo::new(2, 10, 20);
        assert_eq!(p.total_pages, 2);
        assert!(!p.has_next);
    }

    #[test]
    fn test_pagination_empty() {
        let p = PageInfo::new(1, 10, 0);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_next);
        assert!(!p.has_prev);
    }

    #[test]
    fn test_pagination_beyond_last_page() {
        // Requesting past the end is not an error; the page is just empty
        let p = PageInfo::new(9, 10, 35);
        assert_eq!(p.total_pages, 4);
        assert!(!p.has_next);
        assert!(p.has_prev);
    }
}
