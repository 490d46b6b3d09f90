// src/query_builders/clients.rs
//! Построитель запросов для списка клиентов

use crate::pagination::ClientSortWhitelist;

/// Fields covered by the free-text search. A single term matching any of
/// them includes the record.
const SEARCH_COLUMNS: &[&str] = &[
    "c.first_name",
    "c.last_name",
    "c.patronymic",
    "c.phone",
    "c.email",
    "c.company_name",
    "c.inn",
];

const LIST_COLUMNS: &str = r#"
    c.id, c.created_by, c.client_type, c.first_name, c.last_name, c.patronymic,
    c.phone, c.email, c.additional_phone, c.company_name, c.inn, c.kpp,
    c.discount, c.source, c.tags, c.is_active, c.created_at, c.updated_at,
    COUNT(DISTINCT o.id) AS orders_count,
    COALESCE(SUM(o.total_amount), 0) AS total_spent
"#;

/// Composes the owner-scoped, filtered, sorted client listing with its
/// order aggregates. The scope predicate is applied in the constructor.
pub struct ClientListQuery {
    conditions: Vec<String>,
    params: Vec<String>,
    sort_column: &'static str,
    sort_order: &'static str,
}

impl ClientListQuery {
    pub fn scoped(user_id: &str) -> Self {
        Self {
            conditions: vec!["c.created_by = ?".to_string(), "c.is_active = 1".to_string()],
            params: vec![user_id.to_string()],
            sort_column: "c.created_at",
            sort_order: "DESC",
        }
    }

    pub fn with_search(mut self, term: &str) -> Self {
        let term = term.trim();
        if term.is_empty() {
            return self;
        }

        let pattern = format!("%{}%", term);
        let condition = SEARCH_COLUMNS
            .iter()
            .map(|col| format!("{} LIKE ?", col))
            .collect::<Vec<_>>()
            .join(" OR ");

        self.conditions.push(format!("({})", condition));
        self.params
            .extend(std::iter::repeat(pattern).take(SEARCH_COLUMNS.len()));
        self
    }

    pub fn with_client_type(mut self, client_type: &str) -> Self {
        if client_type.is_empty() {
            return self;
        }
        self.conditions.push("c.client_type = ?".to_string());
        self.params.push(client_type.to_string());
        self
    }

    pub fn sort(mut self, sort_by: &str, sort_order: &str) -> Self {
        self.sort_column = ClientSortWhitelist::validate(sort_by);
        self.sort_order = ClientSortWhitelist::validate_order(sort_order);
        self
    }

    fn where_clause(&self) -> String {
        self.conditions.join(" AND ")
    }

    /// COUNT запрос (без join и сортировки)
    pub fn build_count(&self) -> (String, Vec<String>) {
        let sql = format!(
            "SELECT COUNT(*) FROM clients c WHERE {}",
            self.where_clause()
        );
        (sql, self.params.clone())
    }

    /// Основной запрос с агрегацией заказов
    pub fn build_page(&self, limit: i64, offset: i64) -> (String, Vec<String>) {
        let sql = format!(
            r#"SELECT {columns}
               FROM clients c
               LEFT JOIN orders o ON o.client_id = c.id
               WHERE {where_clause}
               GROUP BY c.id
               ORDER BY {sort_col} {sort_order}, c.id ASC
               LIMIT {limit} OFFSET {offset}"#,
            columns = LIST_COLUMNS,
            where_clause = self.where_clause(),
            sort_col = self.sort_column,
            sort_order = self.sort_order,
            limit = limit,
            offset = offset,
        );
        (sql, self.params.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_is_always_present() {
        let (count_sql, params) = ClientListQuery::scoped("user-1").build_count();
        assert!(count_sql.contains("c.created_by = ?"));
        assert!(count_sql.contains("c.is_active = 1"));
        assert_eq!(params, vec!["user-1".to_string()]);

        let (page_sql, _) = ClientListQuery::scoped("user-1").build_page(20, 0);
        assert!(page_sql.contains("c.created_by = ?"));
        assert!(page_sql.contains("c.is_active = 1"));
    }

    #[test]
    fn test_search_covers_all_seven_fields() {
        let (sql, params) = ClientListQuery::scoped("u")
            .with_search("term")
            .build_count();

        for col in SEARCH_COLUMNS {
            assert!(sql.contains(&format!("{} LIKE ?", col)), "missing {}", col);
        }
        // owner + 7 search patterns
        assert_eq!(params.len(), 8);
        assert_eq!(params[1], "%term%");
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let (sql, params) = ClientListQuery::scoped("u").with_search("   ").build_count();
        assert!(!sql.contains("LIKE"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_type_filter() {
        let (sql, params) = ClientListQuery::scoped("u")
            .with_client_type("legal")
            .build_count();
        assert!(sql.contains("c.client_type = ?"));
        assert_eq!(params.last().unwrap(), "legal");
    }

    #[test]
    fn test_aggregates_use_left_join_with_defaults() {
        let (sql, _) = ClientListQuery::scoped("u").build_page(20, 0);
        assert!(sql.contains("LEFT JOIN orders o"));
        assert!(sql.contains("COUNT(DISTINCT o.id) AS orders_count"));
        assert!(sql.contains("COALESCE(SUM(o.total_amount), 0) AS total_spent"));
    }

    #[test]
    fn test_invalid_sort_falls_back_to_default() {
        let (sql, _) = ClientListQuery::scoped("u")
            .sort("evil; --", "sideways")
            .build_page(20, 0);
        assert!(sql.contains("ORDER BY c.created_at DESC"));
    }

    #[test]
    fn test_sort_by_aggregate_alias() {
        let (sql, _) = ClientListQuery::scoped("u")
            .sort("total_spent", "desc")
            .build_page(10, 0);
        assert!(sql.contains("ORDER BY total_spent DESC"));
    }
}
