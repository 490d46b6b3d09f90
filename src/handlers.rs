// src/handlers.rs
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::auth::get_current_user;
use crate::error::ApiResult;
use crate::models::OrderStatus;
use crate::AppState;

// ==================== COMMON STRUCTURES ====================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
        }
    }
}

// ==================== DASHBOARD STATISTICS ====================

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub orders_today: i64,
    pub orders_in_progress: i64,
    pub top_clients: Vec<TopClient>,
    pub orders_by_status: Vec<StatusCount>,
    pub upcoming_appointments: Vec<UpcomingAppointment>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct TopClient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub total_orders: i64,
    pub total_sum: f64,
}

#[derive(Debug, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub status_display: String,
    pub count: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct UpcomingAppointment {
    pub id: String,
    pub order_number: String,
    pub status: String,
    pub appointment_date: Option<DateTime<Utc>>,
    pub client_name: String,
    pub car_brand: String,
    pub car_model: String,
    pub license_plate: String,
}

/// Собрать статистику дашборда, ограниченную клиентами пользователя
pub async fn load_dashboard_stats(pool: &SqlitePool, user_id: &str) -> ApiResult<DashboardStats> {
    let orders_today: (i64,) = sqlx::query_as(
        r#"SELECT COUNT(*) FROM orders o
           JOIN clients c ON o.client_id = c.id
           WHERE c.created_by = ? AND date(o.created_at) = date('now')"#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    let orders_in_progress: (i64,) = sqlx::query_as(
        r#"SELECT COUNT(*) FROM orders o
           JOIN clients c ON o.client_id = c.id
           WHERE c.created_by = ? AND o.status NOT IN ('completed', 'cancelled')"#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    let top_clients: Vec<TopClient> = sqlx::query_as(
        r#"SELECT
            c.id, c.first_name, c.last_name, c.phone,
            COUNT(DISTINCT o.id) AS total_orders,
            COALESCE(SUM(o.total_amount), 0) AS total_sum
           FROM clients c
           LEFT JOIN orders o ON o.client_id = c.id
           WHERE c.created_by = ?
           GROUP BY c.id
           ORDER BY total_sum DESC
           LIMIT 10"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let status_rows: Vec<(String, i64)> = sqlx::query_as(
        r#"SELECT o.status, COUNT(o.id)
           FROM orders o
           JOIN clients c ON o.client_id = c.id
           WHERE c.created_by = ?
           GROUP BY o.status"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let orders_by_status = status_rows
        .into_iter()
        .map(|(status, count)| {
            let status_display = OrderStatus::from_str(&status)
                .map(|s| s.display_name().to_string())
                .unwrap_or_else(|| status.clone());
            StatusCount {
                status,
                status_display,
                count,
            }
        })
        .collect();

    let upcoming_appointments: Vec<UpcomingAppointment> = sqlx::query_as(
        r#"SELECT
            o.id, o.order_number, o.status, o.appointment_date,
            trim(c.last_name || ' ' || c.first_name) AS client_name,
            cars.brand AS car_brand, cars.model AS car_model, cars.license_plate
           FROM orders o
           JOIN clients c ON o.client_id = c.id
           JOIN cars ON o.car_id = cars.id
           WHERE c.created_by = ?
             AND o.status IN ('new', 'diagnostics')
             AND o.appointment_date IS NOT NULL
             AND date(o.appointment_date) >= date('now')
           ORDER BY o.appointment_date ASC
           LIMIT 10"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(DashboardStats {
        orders_today: orders_today.0,
        orders_in_progress: orders_in_progress.0,
        top_clients,
        orders_by_status,
        upcoming_appointments,
    })
}

pub async fn get_dashboard_stats(
    app_state: web::Data<Arc<AppState>>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let claims = get_current_user(&http_request)?;

    let stats = load_dashboard_stats(&app_state.db_pool, &claims.sub).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(stats)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::test_support::{seed_car, seed_client, seed_order, seed_user, set_order_status};

    #[actix_rt::test]
    async fn test_empty_dashboard_is_all_zeros() {
        let pool = test_pool().await;
        seed_user(&pool, "u1").await;

        let stats = load_dashboard_stats(&pool, "u1").await.unwrap();

        assert_eq!(stats.orders_today, 0);
        assert_eq!(stats.orders_in_progress, 0);
        assert!(stats.orders_by_status.is_empty());
        assert!(stats.upcoming_appointments.is_empty());
    }

    #[actix_rt::test]
    async fn test_status_breakdown_counts_and_labels() {
        let pool = test_pool().await;
        seed_user(&pool, "u1").await;
        seed_client(&pool, "c1", "u1", "+70000000001").await;
        seed_car(&pool, "car1", "c1").await;

        for i in 0..3 {
            seed_order(&pool, &format!("o-new-{}", i), "c1", "car1", 100.0).await;
        }
        for i in 0..2 {
            let id = format!("o-done-{}", i);
            seed_order(&pool, &id, "c1", "car1", 100.0).await;
            set_order_status(&pool, &id, "completed").await;
        }

        let stats = load_dashboard_stats(&pool, "u1").await.unwrap();

        assert_eq!(stats.orders_today, 5);
        assert_eq!(stats.orders_in_progress, 3);

        let mut by_status: Vec<(&str, i64)> = stats
            .orders_by_status
            .iter()
            .map(|s| (s.status.as_str(), s.count))
            .collect();
        by_status.sort();
        assert_eq!(by_status, vec![("completed", 2), ("new", 3)]);

        let new_group = stats
            .orders_by_status
            .iter()
            .find(|s| s.status == "new")
            .unwrap();
        assert_eq!(new_group.status_display, "New");
        let done_group = stats
            .orders_by_status
            .iter()
            .find(|s| s.status == "completed")
            .unwrap();
        assert_eq!(done_group.status_display, "Completed");
    }

    #[actix_rt::test]
    async fn test_top_clients_ranked_by_total_spend() {
        let pool = test_pool().await;
        seed_user(&pool, "u1").await;

        seed_client(&pool, "small", "u1", "+70000000001").await;
        seed_car(&pool, "car-s", "small").await;
        seed_order(&pool, "o1", "small", "car-s", 500.0).await;

        seed_client(&pool, "big", "u1", "+70000000002").await;
        seed_car(&pool, "car-b", "big").await;
        seed_order(&pool, "o2", "big", "car-b", 1000.0).await;
        seed_order(&pool, "o3", "big", "car-b", 1500.0).await;

        seed_client(&pool, "idle", "u1", "+70000000003").await;

        let stats = load_dashboard_stats(&pool, "u1").await.unwrap();

        assert_eq!(stats.top_clients.len(), 3);
        assert_eq!(stats.top_clients[0].id, "big");
        assert_eq!(stats.top_clients[0].total_orders, 2);
        assert_eq!(stats.top_clients[0].total_sum, 2500.0);
        assert_eq!(stats.top_clients[1].id, "small");
        // The client with no orders aggregates to zeros, not NULL
        assert_eq!(stats.top_clients[2].id, "idle");
        assert_eq!(stats.top_clients[2].total_orders, 0);
        assert_eq!(stats.top_clients[2].total_sum, 0.0);
    }

    #[actix_rt::test]
    async fn test_dashboard_is_owner_scoped() {
        let pool = test_pool().await;
        seed_user(&pool, "u1").await;
        seed_user(&pool, "u2").await;

        seed_client(&pool, "mine", "u1", "+70000000001").await;
        seed_car(&pool, "car-m", "mine").await;
        seed_order(&pool, "o1", "mine", "car-m", 700.0).await;

        seed_client(&pool, "theirs", "u2", "+70000000002").await;
        seed_car(&pool, "car-t", "theirs").await;
        seed_order(&pool, "o2", "theirs", "car-t", 900.0).await;

        let stats = load_dashboard_stats(&pool, "u1").await.unwrap();

        assert_eq!(stats.orders_today, 1);
        assert_eq!(stats.top_clients.len(), 1);
        assert_eq!(stats.top_clients[0].id, "mine");
    }
}
