// src/models/history.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Append-only interaction trail for a client. Order references are
/// nulled when the order is deleted, the entry itself stays.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct ClientHistory {
    pub id: String,
    pub client_id: String,
    pub order_id: Option<String>,
    pub created_by: Option<String>,
    pub action: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}
