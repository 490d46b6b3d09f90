// src/query_builders/mod.rs
//! Query composition with uniform owner scoping.
//!
//! Every client/order read in the application goes through this module so
//! the `created_by = current user` restriction is applied in exactly one
//! place. A record owned by someone else is indistinguishable from a
//! missing one.

pub mod clients;

pub use clients::ClientListQuery;

use crate::error::{ApiError, ApiResult};
use crate::models::{Client, Order};
use sqlx::SqlitePool;

/// Fetch a client if and only if it belongs to the requesting user.
pub async fn fetch_owned_client(
    pool: &SqlitePool,
    client_id: &str,
    user_id: &str,
) -> ApiResult<Client> {
    sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = ? AND created_by = ?")
        .bind(client_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::client_not_found(client_id))
}

/// Fetch an order if and only if its client belongs to the requesting user.
pub async fn fetch_owned_order(
    pool: &SqlitePool,
    order_id: &str,
    user_id: &str,
) -> ApiResult<Order> {
    sqlx::query_as::<_, Order>(
        r#"SELECT o.* FROM orders o
           JOIN clients c ON o.client_id = c.id
           WHERE o.id = ? AND c.created_by = ?"#,
    )
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::order_not_found(order_id))
}
