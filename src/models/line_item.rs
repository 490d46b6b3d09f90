// src/models/line_item.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Service {
    pub id: String,
    pub order_id: String,
    pub name: String,
    pub quantity: i64,
    pub price: f64,
    pub total: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Part {
    pub id: String,
    pub order_id: String,
    pub name: String,
    pub article: String,
    pub quantity: i64,
    pub price: f64,
    pub total: f64,
    pub created_at: DateTime<Utc>,
}

/// Line-item totals are always derived, callers never supply them.
pub fn compute_line_total(quantity: i64, price: f64) -> f64 {
    quantity as f64 * price
}

#[derive(Debug, Deserialize, Validate, Clone)]
pub struct CreateServiceRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: String,

    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: Option<i64>,

    #[validate(range(min = 0.0, message = "Price must be non-negative"))]
    pub price: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateServiceRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: Option<String>,

    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: Option<i64>,

    #[validate(range(min = 0.0, message = "Price must be non-negative"))]
    pub price: Option<f64>,
}

#[derive(Debug, Deserialize, Validate, Clone)]
pub struct CreatePartRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: String,

    #[validate(length(max = 100, message = "Article cannot exceed 100 characters"))]
    pub article: Option<String>,

    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: Option<i64>,

    #[validate(range(min = 0.0, message = "Price must be non-negative"))]
    pub price: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePartRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 100, message = "Article cannot exceed 100 characters"))]
    pub article: Option<String>,

    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: Option<i64>,

    #[validate(range(min = 0.0, message = "Price must be non-negative"))]
    pub price: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_line_total() {
        assert_eq!(compute_line_total(1, 500.0), 500.0);
        assert_eq!(compute_line_total(3, 250.0), 750.0);
        assert_eq!(compute_line_total(2, 0.0), 0.0);
    }
}
