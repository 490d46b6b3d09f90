// src/pagination.rs
//! Page-based пагинация для списков клиентов и заказов

use serde::{Deserialize, Serialize};

pub const DEFAULT_PER_PAGE: i64 = 20;

// ==================== QUERY PARAMETERS ====================

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,

    // Filters
    pub search: Option<String>,
    pub q: Option<String>, // frontend alias for search
    pub client_type: Option<String>,
    pub status: Option<String>,

    // Sorting
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl PageQuery {
    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, 100)
    }

    /// Clamp the requested page to the valid range once the total is
    /// known: below range lands on the first page, beyond range on the
    /// last, instead of erroring.
    pub fn resolve(&self, total: i64) -> ResolvedPage {
        let per_page = self.per_page();
        let total_pages = ((total + per_page - 1) / per_page).max(1);
        let page = self.page.unwrap_or(1).clamp(1, total_pages);
        let offset = (page - 1) * per_page;

        ResolvedPage {
            page,
            per_page,
            offset,
            total,
            total_pages,
        }
    }

    /// Поисковый запрос (поддержка обоих параметров: search и q)
    pub fn get_search(&self) -> Option<&str> {
        self.search
            .as_deref()
            .or(self.q.as_deref())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    pub fn sort_order(&self) -> &str {
        self.sort_order.as_deref().unwrap_or("DESC")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResolvedPage {
    pub page: i64,
    pub per_page: i64,
    pub offset: i64,
    pub total: i64,
    pub total_pages: i64,
}

// ==================== RESPONSE STRUCTURES ====================

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub has_other_pages: bool,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, resolved: ResolvedPage) -> Self {
        Self {
            data,
            total: resolved.total,
            page: resolved.page,
            per_page: resolved.per_page,
            total_pages: resolved.total_pages,
            has_other_pages: resolved.total_pages > 1,
        }
    }
}

// ==================== SORT FIELD WHITELIST ====================

pub struct ClientSortWhitelist;

impl ClientSortWhitelist {
    /// Whitelist разрешённых полей сортировки: (api_field, sql_column)
    const ALLOWED: &'static [(&'static str, &'static str)] = &[
        ("created_at", "c.created_at"),
        ("updated_at", "c.updated_at"),
        ("last_name", "c.last_name"),
        ("first_name", "c.first_name"),
        ("discount", "c.discount"),
        ("orders_count", "orders_count"),
        ("total_spent", "total_spent"),
    ];

    /// Unknown sort keys fail closed to the default ordering column.
    pub fn validate(field: &str) -> &'static str {
        Self::ALLOWED
            .iter()
            .find(|(api, _)| *api == field)
            .map(|(_, sql)| *sql)
            .unwrap_or("c.created_at")
    }

    pub fn validate_order(order: &str) -> &'static str {
        match order.to_uppercase().as_str() {
            "ASC" => "ASC",
            _ => "DESC",
        }
    }
}

// ==================== TESTS ====================

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<i64>, per_page: Option<i64>) -> PageQuery {
        PageQuery {
            page,
            per_page,
            ..Default::default()
        }
    }

    #[test]
    fn test_page_below_range_returns_first() {
        let resolved = query(Some(0), None).resolve(100);
        assert_eq!(resolved.page, 1);
        assert_eq!(resolved.offset, 0);

        let resolved = query(Some(-3), None).resolve(100);
        assert_eq!(resolved.page, 1);
    }

    #[test]
    fn test_page_beyond_range_returns_last() {
        // 45 records, 20 per page -> 3 pages
        let resolved = query(Some(99), None).resolve(45);
        assert_eq!(resolved.total_pages, 3);
        assert_eq!(resolved.page, 3);
        assert_eq!(resolved.offset, 40);
    }

    #[test]
    fn test_valid_page_is_kept() {
        let resolved = query(Some(2), None).resolve(45);
        assert_eq!(resolved.page, 2);
        assert_eq!(resolved.offset, 20);
    }

    #[test]
    fn test_empty_set_has_one_page() {
        let resolved = query(Some(5), None).resolve(0);
        assert_eq!(resolved.total_pages, 1);
        assert_eq!(resolved.page, 1);
        assert_eq!(resolved.offset, 0);
    }

    #[test]
    fn test_per_page_is_clamped() {
        assert_eq!(query(None, Some(1000)).per_page(), 100);
        assert_eq!(query(None, Some(0)).per_page(), 1);
        assert_eq!(query(None, None).per_page(), DEFAULT_PER_PAGE);
    }

    #[test]
    fn test_sort_whitelist_fails_closed() {
        assert_eq!(ClientSortWhitelist::validate("total_spent"), "total_spent");
        assert_eq!(ClientSortWhitelist::validate("last_name"), "c.last_name");
        assert_eq!(ClientSortWhitelist::validate("phone; DROP TABLE clients"), "c.created_at");
        assert_eq!(ClientSortWhitelist::validate(""), "c.created_at");

        assert_eq!(ClientSortWhitelist::validate_order("asc"), "ASC");
        assert_eq!(ClientSortWhitelist::validate_order("junk"), "DESC");
    }

    #[test]
    fn test_get_search_trims_and_aliases() {
        let mut q = PageQuery::default();
        q.search = Some("  Ivanov ".to_string());
        assert_eq!(q.get_search(), Some("Ivanov"));

        let mut q = PageQuery::default();
        q.q = Some("LLC".to_string());
        assert_eq!(q.get_search(), Some("LLC"));

        let mut q = PageQuery::default();
        q.search = Some("   ".to_string());
        assert_eq!(q.get_search(), None);
    }

    #[test]
    fn test_has_other_pages() {
        let resolved = query(None, None).resolve(15);
        let response = PaginatedResponse::new(vec![1, 2, 3], resolved);
        assert!(!response.has_other_pages);

        let resolved = query(None, None).resolve(25);
        let response = PaginatedResponse::new(vec![1, 2, 3], resolved);
        assert!(response.has_other_pages);
    }
}
