// src/models/order.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

// ==================== ORDER STATUS ====================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    New,
    Diagnostics,
    AwaitingParts,
    InProgress,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "new" => Some(OrderStatus::New),
            "diagnostics" => Some(OrderStatus::Diagnostics),
            "awaiting_parts" => Some(OrderStatus::AwaitingParts),
            "in_progress" => Some(OrderStatus::InProgress),
            "ready" => Some(OrderStatus::Ready),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Diagnostics => "diagnostics",
            OrderStatus::AwaitingParts => "awaiting_parts",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OrderStatus::New => "New",
            OrderStatus::Diagnostics => "Diagnostics",
            OrderStatus::AwaitingParts => "Awaiting parts",
            OrderStatus::InProgress => "In progress",
            OrderStatus::Ready => "Ready for pickup",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    fn successor(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::New => Some(OrderStatus::Diagnostics),
            OrderStatus::Diagnostics => Some(OrderStatus::AwaitingParts),
            OrderStatus::AwaitingParts => Some(OrderStatus::InProgress),
            OrderStatus::InProgress => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Completed),
            OrderStatus::Completed | OrderStatus::Cancelled => None,
        }
    }

    /// Only the next workflow step is allowed; cancellation is reachable
    /// from every non-terminal state.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == OrderStatus::Cancelled {
            return true;
        }
        self.successor() == Some(next)
    }

    pub fn all() -> Vec<Self> {
        vec![
            OrderStatus::New,
            OrderStatus::Diagnostics,
            OrderStatus::AwaitingParts,
            OrderStatus::InProgress,
            OrderStatus::Ready,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ]
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==================== PAYMENT STATUS ====================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "unpaid" => Some(PaymentStatus::Unpaid),
            "partial" => Some(PaymentStatus::Partial),
            "paid" => Some(PaymentStatus::Paid),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "Unpaid",
            PaymentStatus::Partial => "Partially paid",
            PaymentStatus::Paid => "Paid",
        }
    }
}

// ==================== ORDER ====================

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Order {
    pub id: String,
    pub client_id: String,
    pub car_id: String,
    pub created_by: Option<String>,
    pub order_number: String,
    pub status: String,
    pub payment_status: String,
    pub description: String,
    pub master_notes: String,
    pub appointment_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub labor_cost: f64,
    pub parts_cost: f64,
    pub discount: f64,
    pub prepayment: f64,
    pub total_amount: f64,
    pub warranty_period: i64,
    pub warranty_until: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order row with client/car display columns for listings.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct OrderListItem {
    pub id: String,
    pub order_number: String,
    pub status: String,
    pub payment_status: String,
    pub client_id: String,
    pub client_name: String,
    pub car_id: String,
    pub car_brand: String,
    pub car_model: String,
    pub license_plate: String,
    pub appointment_date: Option<DateTime<Utc>>,
    pub total_amount: f64,
    pub created_at: DateTime<Utc>,
}

/// total_amount is always derived, callers never supply it.
pub fn compute_total(labor_cost: f64, parts_cost: f64, discount: f64) -> f64 {
    labor_cost + parts_cost - discount
}

#[derive(Debug, Deserialize, Validate, Clone)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "Client is required"))]
    pub client_id: String,

    #[validate(length(min = 1, message = "Car is required"))]
    pub car_id: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    pub master_notes: Option<String>,
    pub appointment_date: Option<DateTime<Utc>>,

    #[validate(range(min = 0.0, message = "Labor cost must be non-negative"))]
    pub labor_cost: Option<f64>,

    #[validate(range(min = 0.0, message = "Parts cost must be non-negative"))]
    pub parts_cost: Option<f64>,

    #[validate(range(min = 0.0, message = "Discount must be non-negative"))]
    pub discount: Option<f64>,

    #[validate(range(min = 0.0, message = "Prepayment must be non-negative"))]
    pub prepayment: Option<f64>,

    #[validate(range(min = 0, message = "Warranty period must be non-negative"))]
    pub warranty_period: Option<i64>,

    pub payment_status: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrderRequest {
    pub description: Option<String>,
    pub master_notes: Option<String>,
    pub appointment_date: Option<DateTime<Utc>>,

    #[validate(range(min = 0.0, message = "Labor cost must be non-negative"))]
    pub labor_cost: Option<f64>,

    #[validate(range(min = 0.0, message = "Parts cost must be non-negative"))]
    pub parts_cost: Option<f64>,

    #[validate(range(min = 0.0, message = "Discount must be non-negative"))]
    pub discount: Option<f64>,

    #[validate(range(min = 0.0, message = "Prepayment must be non-negative"))]
    pub prepayment: Option<f64>,

    #[validate(range(min = 0, message = "Warranty period must be non-negative"))]
    pub warranty_period: Option<i64>,

    pub payment_status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_total() {
        assert_eq!(compute_total(2000.0, 800.0, 300.0), 2500.0);
        assert_eq!(compute_total(0.0, 0.0, 0.0), 0.0);
        assert_eq!(compute_total(1000.0, 0.0, 0.0), 1000.0);
    }

    #[test]
    fn test_forward_chain_is_valid() {
        let chain = [
            OrderStatus::New,
            OrderStatus::Diagnostics,
            OrderStatus::AwaitingParts,
            OrderStatus::InProgress,
            OrderStatus::Ready,
            OrderStatus::Completed,
        ];
        for pair in chain.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} must be allowed",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_skipping_steps_is_rejected() {
        assert!(!OrderStatus::New.can_transition_to(OrderStatus::InProgress));
        assert!(!OrderStatus::Diagnostics.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Ready.can_transition_to(OrderStatus::New));
    }

    #[test]
    fn test_cancelled_reachable_from_non_terminal_only() {
        for status in OrderStatus::all() {
            let allowed = status.can_transition_to(OrderStatus::Cancelled);
            assert_eq!(allowed, !status.is_terminal(), "from {}", status);
        }
    }

    #[test]
    fn test_terminal_states_accept_nothing() {
        for next in OrderStatus::all() {
            assert!(!OrderStatus::Completed.can_transition_to(next));
            assert!(!OrderStatus::Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(OrderStatus::from_str("awaiting_parts").unwrap().display_name(), "Awaiting parts");
        assert_eq!(OrderStatus::AwaitingParts.as_str(), "awaiting_parts");
        assert!(OrderStatus::from_str("unknown").is_none());
    }
}
