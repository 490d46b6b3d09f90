// src/order_handlers.rs
//! Заказы: жизненный цикл, производные суммы, позиции работ и запчастей

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::get_current_user;
use crate::error::{ApiError, ApiResult};
use crate::handlers::ApiResponse;
use crate::history;
use crate::models::{
    compute_line_total, compute_total, ChangeStatusRequest, CreateOrderRequest,
    CreatePartRequest, CreateServiceRequest, Order, OrderListItem, OrderStatus, Part,
    PaymentStatus, Service, UpdateOrderRequest, UpdatePartRequest, UpdateServiceRequest,
};
use crate::pagination::{PageQuery, PaginatedResponse};
use crate::query_builders::{fetch_owned_client, fetch_owned_order};
use crate::AppState;

// ==================== ORDER NUMBER ====================

pub fn format_order_number(date: NaiveDate, seq: i64) -> String {
    format!("WO-{}-{:04}", date.format("%Y%m%d"), seq)
}

/// Next number in the per-day sequence. Runs inside the creating
/// transaction; the UNIQUE constraint backstops races.
async fn next_order_number(
    conn: &mut sqlx::SqliteConnection,
    date: NaiveDate,
) -> ApiResult<String> {
    let prefix = format!("WO-{}-%", date.format("%Y%m%d"));
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE order_number LIKE ?")
        .bind(&prefix)
        .fetch_one(&mut *conn)
        .await?;

    Ok(format_order_number(date, count.0 + 1))
}

fn parse_payment_status(raw: Option<&str>) -> ApiResult<&'static str> {
    match raw {
        None => Ok(PaymentStatus::Unpaid.as_str()),
        Some(s) => PaymentStatus::from_str(s)
            .map(|p| p.as_str())
            .ok_or_else(|| {
                ApiError::ValidationError(format!(
                    "Invalid payment status '{}'. Must be one of: unpaid, partial, paid",
                    s
                ))
            }),
    }
}

// ==================== CREATE ====================

pub async fn create_order_record(
    pool: &SqlitePool,
    user_id: &str,
    username: &str,
    request: &CreateOrderRequest,
) -> ApiResult<Order> {
    let client = fetch_owned_client(pool, &request.client_id, user_id).await?;

    // The car must belong to the same client
    let car_owner: Option<(String,)> = sqlx::query_as("SELECT client_id FROM cars WHERE id = ?")
        .bind(&request.car_id)
        .fetch_optional(pool)
        .await?;

    match car_owner {
        Some((owner_id,)) if owner_id == client.id => {}
        _ => return Err(ApiError::car_not_found(&request.car_id)),
    }

    let payment_status = parse_payment_status(request.payment_status.as_deref())?;

    let labor_cost = request.labor_cost.unwrap_or(0.0);
    let parts_cost = request.parts_cost.unwrap_or(0.0);
    let discount = request.discount.unwrap_or(0.0);
    let total_amount = compute_total(labor_cost, parts_cost, discount);

    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    let mut tx = pool.begin().await?;

    let order_number = next_order_number(&mut tx, now.date_naive()).await?;

    sqlx::query(
        r#"INSERT INTO orders (
            id, client_id, car_id, created_by, order_number, status, payment_status,
            description, master_notes, appointment_date,
            labor_cost, parts_cost, discount, prepayment, total_amount,
            warranty_period, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, 'new', ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(&request.client_id)
    .bind(&request.car_id)
    .bind(user_id)
    .bind(&order_number)
    .bind(payment_status)
    .bind(&request.description)
    .bind(request.master_notes.as_deref().unwrap_or(""))
    .bind(request.appointment_date)
    .bind(labor_cost)
    .bind(parts_cost)
    .bind(discount)
    .bind(request.prepayment.unwrap_or(0.0))
    .bind(total_amount)
    .bind(request.warranty_period.unwrap_or(30))
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    history::record(
        &mut *tx,
        &request.client_id,
        Some(user_id),
        "order_created",
        &format!("Order {} created by {}", order_number, username),
        Some(&id),
    )
    .await?;

    tx.commit().await?;

    let order: Order = sqlx::query_as("SELECT * FROM orders WHERE id = ?")
        .bind(&id)
        .fetch_one(pool)
        .await?;

    Ok(order)
}

pub async fn create_order(
    app_state: web::Data<Arc<AppState>>,
    body: web::Json<CreateOrderRequest>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    body.validate()?;

    let claims = get_current_user(&http_request)?;

    let order =
        create_order_record(&app_state.db_pool, &claims.sub, &claims.username, &body).await?;

    log::info!("Created order {} ({})", order.order_number, order.id);

    Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
        order,
        "Order created successfully".to_string(),
    )))
}

// ==================== LISTING ====================

pub async fn get_orders(
    app_state: web::Data<Arc<AppState>>,
    query: web::Query<PageQuery>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let claims = get_current_user(&http_request)?;

    // Unknown status values fail closed to "no filter"
    let status_filter = query
        .status
        .as_deref()
        .and_then(OrderStatus::from_str)
        .map(|s| s.as_str());

    let mut count_sql = String::from(
        "SELECT COUNT(*) FROM orders o JOIN clients c ON o.client_id = c.id WHERE c.created_by = ?",
    );
    if status_filter.is_some() {
        count_sql.push_str(" AND o.status = ?");
    }

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql).bind(&claims.sub);
    if let Some(status) = status_filter {
        count_query = count_query.bind(status);
    }
    let total: i64 = count_query.fetch_one(&app_state.db_pool).await?;

    let resolved = query.resolve(total);

    let mut sql = String::from(
        r#"SELECT
            o.id, o.order_number, o.status, o.payment_status,
            o.client_id, trim(c.last_name || ' ' || c.first_name) AS client_name,
            o.car_id, cars.brand AS car_brand, cars.model AS car_model, cars.license_plate,
            o.appointment_date, o.total_amount, o.created_at
           FROM orders o
           JOIN clients c ON o.client_id = c.id
           JOIN cars ON o.car_id = cars.id
           WHERE c.created_by = ?"#,
    );
    if status_filter.is_some() {
        sql.push_str(" AND o.status = ?");
    }
    sql.push_str(" ORDER BY o.created_at DESC, o.id ASC LIMIT ? OFFSET ?");

    let mut page_query = sqlx::query_as::<_, OrderListItem>(&sql).bind(&claims.sub);
    if let Some(status) = status_filter {
        page_query = page_query.bind(status);
    }
    let orders = page_query
        .bind(resolved.per_page)
        .bind(resolved.offset)
        .fetch_all(&app_state.db_pool)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(PaginatedResponse::new(
        orders, resolved,
    ))))
}

// ==================== DETAIL ====================

#[derive(Debug, Serialize)]
pub struct OrderDetailResponse {
    #[serde(flatten)]
    pub order: Order,
    pub status_display: String,
    pub services: Vec<Service>,
    pub parts: Vec<Part>,
}

pub async fn get_order(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let claims = get_current_user(&http_request)?;
    let order_id = path.into_inner();

    let order = fetch_owned_order(&app_state.db_pool, &order_id, &claims.sub).await?;

    let services: Vec<Service> =
        sqlx::query_as("SELECT * FROM services WHERE order_id = ? ORDER BY created_at")
            .bind(&order_id)
            .fetch_all(&app_state.db_pool)
            .await?;

    let parts: Vec<Part> =
        sqlx::query_as("SELECT * FROM parts WHERE order_id = ? ORDER BY created_at")
            .bind(&order_id)
            .fetch_all(&app_state.db_pool)
            .await?;

    let status_display = OrderStatus::from_str(&order.status)
        .map(|s| s.display_name().to_string())
        .unwrap_or_else(|| order.status.clone());

    let response = OrderDetailResponse {
        order,
        status_display,
        services,
        parts,
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

// ==================== UPDATE ====================

pub async fn update_order_record(
    pool: &SqlitePool,
    user_id: &str,
    username: &str,
    order_id: &str,
    request: &UpdateOrderRequest,
) -> ApiResult<Order> {
    let existing = fetch_owned_order(pool, order_id, user_id).await?;

    let payment_status = match request.payment_status.as_deref() {
        Some(s) => Some(parse_payment_status(Some(s))?),
        None => None,
    };

    // Derived total is recomputed on every persist from the merged values
    let labor_cost = request.labor_cost.unwrap_or(existing.labor_cost);
    let parts_cost = request.parts_cost.unwrap_or(existing.parts_cost);
    let discount = request.discount.unwrap_or(existing.discount);
    let total_amount = compute_total(labor_cost, parts_cost, discount);

    let now = Utc::now();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"UPDATE orders SET
            description = COALESCE(?, description),
            master_notes = COALESCE(?, master_notes),
            appointment_date = COALESCE(?, appointment_date),
            payment_status = COALESCE(?, payment_status),
            prepayment = COALESCE(?, prepayment),
            warranty_period = COALESCE(?, warranty_period),
            labor_cost = ?,
            parts_cost = ?,
            discount = ?,
            total_amount = ?,
            updated_at = ?
           WHERE id = ?"#,
    )
    .bind(&request.description)
    .bind(&request.master_notes)
    .bind(request.appointment_date)
    .bind(payment_status)
    .bind(request.prepayment)
    .bind(request.warranty_period)
    .bind(labor_cost)
    .bind(parts_cost)
    .bind(discount)
    .bind(total_amount)
    .bind(&now)
    .bind(order_id)
    .execute(&mut *tx)
    .await?;

    history::record(
        &mut *tx,
        &existing.client_id,
        Some(user_id),
        "order_updated",
        &format!("Order {} updated by {}", existing.order_number, username),
        Some(order_id),
    )
    .await?;

    tx.commit().await?;

    let updated: Order = sqlx::query_as("SELECT * FROM orders WHERE id = ?")
        .bind(order_id)
        .fetch_one(pool)
        .await?;

    Ok(updated)
}

pub async fn update_order(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    body: web::Json<UpdateOrderRequest>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    body.validate()?;

    let claims = get_current_user(&http_request)?;
    let order_id = path.into_inner();

    let order = update_order_record(
        &app_state.db_pool,
        &claims.sub,
        &claims.username,
        &order_id,
        &body,
    )
    .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(order)))
}

// ==================== STATUS ====================

pub async fn apply_status_change(
    pool: &SqlitePool,
    user_id: &str,
    username: &str,
    order_id: &str,
    new_status_raw: &str,
) -> ApiResult<Order> {
    let existing = fetch_owned_order(pool, order_id, user_id).await?;

    let current = OrderStatus::from_str(&existing.status)
        .ok_or_else(|| ApiError::InternalServerError("Order has unknown status".to_string()))?;
    let next = OrderStatus::from_str(new_status_raw).ok_or_else(|| {
        ApiError::ValidationError(format!("Invalid status '{}'", new_status_raw))
    })?;

    if !current.can_transition_to(next) {
        return Err(ApiError::ValidationError(format!(
            "Cannot change order status from '{}' to '{}'",
            current, next
        )));
    }

    let now = Utc::now();

    let mut tx = pool.begin().await?;

    if next == OrderStatus::Completed {
        // Completion stamps the date and derives the warranty horizon
        let warranty_until = existing.warranty_until.unwrap_or_else(|| {
            now.date_naive() + Duration::days(existing.warranty_period)
        });

        sqlx::query(
            r#"UPDATE orders SET status = ?, completed_at = ?, warranty_until = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(next.as_str())
        .bind(&now)
        .bind(warranty_until)
        .bind(&now)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;
    } else {
        sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
            .bind(next.as_str())
            .bind(&now)
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
    }

    history::record(
        &mut *tx,
        &existing.client_id,
        Some(user_id),
        "status_changed",
        &format!(
            "Order {} moved from '{}' to '{}' by {}",
            existing.order_number,
            current.display_name(),
            next.display_name(),
            username
        ),
        Some(order_id),
    )
    .await?;

    tx.commit().await?;

    let updated: Order = sqlx::query_as("SELECT * FROM orders WHERE id = ?")
        .bind(order_id)
        .fetch_one(pool)
        .await?;

    Ok(updated)
}

pub async fn change_order_status(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    body: web::Json<ChangeStatusRequest>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let claims = get_current_user(&http_request)?;
    let order_id = path.into_inner();

    let order = apply_status_change(
        &app_state.db_pool,
        &claims.sub,
        &claims.username,
        &order_id,
        &body.status,
    )
    .await?;

    log::info!("Order {} status changed to {}", order.order_number, order.status);

    Ok(HttpResponse::Ok().json(ApiResponse::success(order)))
}

// ==================== DELETE ====================

pub async fn delete_order(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let claims = get_current_user(&http_request)?;
    let order_id = path.into_inner();

    let order = fetch_owned_order(&app_state.db_pool, &order_id, &claims.sub).await?;

    let mut tx = app_state.db_pool.begin().await?;

    // Line items cascade, history entries keep a nulled order reference
    history::record(
        &mut *tx,
        &order.client_id,
        Some(&claims.sub),
        "order_deleted",
        &format!("Order {} deleted by {}", order.order_number, claims.username),
        None,
    )
    .await?;

    sqlx::query("DELETE FROM orders WHERE id = ?")
        .bind(&order_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    log::info!("Deleted order {} ({})", order.order_number, order_id);

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        (),
        "Order deleted successfully".to_string(),
    )))
}

// ==================== SERVICES ====================

pub async fn create_service_record(
    pool: &SqlitePool,
    user_id: &str,
    order_id: &str,
    request: &CreateServiceRequest,
) -> ApiResult<Service> {
    fetch_owned_order(pool, order_id, user_id).await?;

    let quantity = request.quantity.unwrap_or(1);
    let total = compute_line_total(quantity, request.price);
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"INSERT INTO services (id, order_id, name, quantity, price, total, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(order_id)
    .bind(&request.name)
    .bind(quantity)
    .bind(request.price)
    .bind(total)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    let service: Service = sqlx::query_as("SELECT * FROM services WHERE id = ?")
        .bind(&id)
        .fetch_one(pool)
        .await?;

    Ok(service)
}

pub async fn get_order_services(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let claims = get_current_user(&http_request)?;
    let order_id = path.into_inner();

    fetch_owned_order(&app_state.db_pool, &order_id, &claims.sub).await?;

    let services: Vec<Service> =
        sqlx::query_as("SELECT * FROM services WHERE order_id = ? ORDER BY created_at")
            .bind(&order_id)
            .fetch_all(&app_state.db_pool)
            .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(services)))
}

pub async fn add_order_service(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    body: web::Json<CreateServiceRequest>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    body.validate()?;

    let claims = get_current_user(&http_request)?;
    let order_id = path.into_inner();

    let service =
        create_service_record(&app_state.db_pool, &claims.sub, &order_id, &body).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(service)))
}

pub async fn update_service_record(
    pool: &SqlitePool,
    user_id: &str,
    order_id: &str,
    item_id: &str,
    request: &UpdateServiceRequest,
) -> ApiResult<Service> {
    fetch_owned_order(pool, order_id, user_id).await?;

    let existing: Service =
        sqlx::query_as("SELECT * FROM services WHERE id = ? AND order_id = ?")
            .bind(item_id)
            .bind(order_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::line_item_not_found(item_id))?;

    let quantity = request.quantity.unwrap_or(existing.quantity);
    let price = request.price.unwrap_or(existing.price);
    let total = compute_line_total(quantity, price);

    sqlx::query(
        r#"UPDATE services SET name = COALESCE(?, name), quantity = ?, price = ?, total = ?
           WHERE id = ?"#,
    )
    .bind(&request.name)
    .bind(quantity)
    .bind(price)
    .bind(total)
    .bind(item_id)
    .execute(pool)
    .await?;

    let updated: Service = sqlx::query_as("SELECT * FROM services WHERE id = ?")
        .bind(item_id)
        .fetch_one(pool)
        .await?;

    Ok(updated)
}

pub async fn update_order_service(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<(String, String)>,
    body: web::Json<UpdateServiceRequest>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    body.validate()?;

    let claims = get_current_user(&http_request)?;
    let (order_id, item_id) = path.into_inner();

    let service = update_service_record(
        &app_state.db_pool,
        &claims.sub,
        &order_id,
        &item_id,
        &body,
    )
    .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(service)))
}

pub async fn delete_order_service(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<(String, String)>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let claims = get_current_user(&http_request)?;
    let (order_id, item_id) = path.into_inner();

    fetch_owned_order(&app_state.db_pool, &order_id, &claims.sub).await?;

    let result = sqlx::query("DELETE FROM services WHERE id = ? AND order_id = ?")
        .bind(&item_id)
        .bind(&order_id)
        .execute(&app_state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::line_item_not_found(&item_id));
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        (),
        "Service deleted successfully".to_string(),
    )))
}

// ==================== PARTS ====================

pub async fn create_part_record(
    pool: &SqlitePool,
    user_id: &str,
    order_id: &str,
    request: &CreatePartRequest,
) -> ApiResult<Part> {
    fetch_owned_order(pool, order_id, user_id).await?;

    let quantity = request.quantity.unwrap_or(1);
    let total = compute_line_total(quantity, request.price);
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"INSERT INTO parts (id, order_id, name, article, quantity, price, total, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(order_id)
    .bind(&request.name)
    .bind(request.article.as_deref().unwrap_or(""))
    .bind(quantity)
    .bind(request.price)
    .bind(total)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    let part: Part = sqlx::query_as("SELECT * FROM parts WHERE id = ?")
        .bind(&id)
        .fetch_one(pool)
        .await?;

    Ok(part)
}

pub async fn get_order_parts(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let claims = get_current_user(&http_request)?;
    let order_id = path.into_inner();

    fetch_owned_order(&app_state.db_pool, &order_id, &claims.sub).await?;

    let parts: Vec<Part> =
        sqlx::query_as("SELECT * FROM parts WHERE order_id = ? ORDER BY created_at")
            .bind(&order_id)
            .fetch_all(&app_state.db_pool)
            .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(parts)))
}

pub async fn add_order_part(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    body: web::Json<CreatePartRequest>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    body.validate()?;

    let claims = get_current_user(&http_request)?;
    let order_id = path.into_inner();

    let part = create_part_record(&app_state.db_pool, &claims.sub, &order_id, &body).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(part)))
}

pub async fn update_order_part(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<(String, String)>,
    body: web::Json<UpdatePartRequest>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    body.validate()?;

    let claims = get_current_user(&http_request)?;
    let (order_id, item_id) = path.into_inner();

    fetch_owned_order(&app_state.db_pool, &order_id, &claims.sub).await?;

    let existing: Part = sqlx::query_as("SELECT * FROM parts WHERE id = ? AND order_id = ?")
        .bind(&item_id)
        .bind(&order_id)
        .fetch_optional(&app_state.db_pool)
        .await?
        .ok_or_else(|| ApiError::line_item_not_found(&item_id))?;

    let quantity = body.quantity.unwrap_or(existing.quantity);
    let price = body.price.unwrap_or(existing.price);
    let total = compute_line_total(quantity, price);

    sqlx::query(
        r#"UPDATE parts SET name = COALESCE(?, name), article = COALESCE(?, article),
           quantity = ?, price = ?, total = ? WHERE id = ?"#,
    )
    .bind(&body.name)
    .bind(&body.article)
    .bind(quantity)
    .bind(price)
    .bind(total)
    .bind(&item_id)
    .execute(&app_state.db_pool)
    .await?;

    let updated: Part = sqlx::query_as("SELECT * FROM parts WHERE id = ?")
        .bind(&item_id)
        .fetch_one(&app_state.db_pool)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(updated)))
}

pub async fn delete_order_part(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<(String, String)>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let claims = get_current_user(&http_request)?;
    let (order_id, item_id) = path.into_inner();

    fetch_owned_order(&app_state.db_pool, &order_id, &claims.sub).await?;

    let result = sqlx::query("DELETE FROM parts WHERE id = ? AND order_id = ?")
        .bind(&item_id)
        .bind(&order_id)
        .execute(&app_state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::line_item_not_found(&item_id));
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        (),
        "Part deleted successfully".to_string(),
    )))
}

// ==================== TESTS ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::test_support::{seed_car, seed_client, seed_user};

    fn order_request(client_id: &str, car_id: &str) -> CreateOrderRequest {
        CreateOrderRequest {
            client_id: client_id.to_string(),
            car_id: car_id.to_string(),
            description: "Brake pad replacement".to_string(),
            master_notes: None,
            appointment_date: None,
            labor_cost: Some(2000.0),
            parts_cost: Some(800.0),
            discount: Some(300.0),
            prepayment: None,
            warranty_period: None,
            payment_status: None,
        }
    }

    async fn seed_owned_car(pool: &SqlitePool) {
        seed_user(pool, "u1").await;
        seed_client(pool, "c1", "u1", "+79991234567").await;
        seed_car(pool, "car1", "c1").await;
    }

    #[test]
    fn test_order_number_format() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(format_order_number(date, 1), "WO-20250307-0001");
        assert_eq!(format_order_number(date, 42), "WO-20250307-0042");
    }

    #[actix_rt::test]
    async fn test_create_order_computes_total() {
        let pool = test_pool().await;
        seed_owned_car(&pool).await;

        let order = create_order_record(&pool, "u1", "u1", &order_request("c1", "car1"))
            .await
            .unwrap();

        assert_eq!(order.total_amount, 2500.0);
        assert_eq!(order.status, "new");
        assert!(order.order_number.starts_with("WO-"));
        assert!(order.order_number.ends_with("-0001"));
    }

    #[actix_rt::test]
    async fn test_order_numbers_increment_within_a_day() {
        let pool = test_pool().await;
        seed_owned_car(&pool).await;

        let first = create_order_record(&pool, "u1", "u1", &order_request("c1", "car1"))
            .await
            .unwrap();
        let second = create_order_record(&pool, "u1", "u1", &order_request("c1", "car1"))
            .await
            .unwrap();

        assert!(first.order_number.ends_with("-0001"));
        assert!(second.order_number.ends_with("-0002"));
    }

    #[actix_rt::test]
    async fn test_create_order_records_history() {
        let pool = test_pool().await;
        seed_owned_car(&pool).await;

        let order = create_order_record(&pool, "u1", "u1", &order_request("c1", "car1"))
            .await
            .unwrap();

        let history: Vec<(String, Option<String>)> = sqlx::query_as(
            "SELECT action, order_id FROM client_history WHERE client_id = 'c1'",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].0, "order_created");
        assert_eq!(history[0].1.as_deref(), Some(order.id.as_str()));
    }

    #[actix_rt::test]
    async fn test_foreign_client_order_is_not_found() {
        let pool = test_pool().await;
        seed_owned_car(&pool).await;
        seed_user(&pool, "intruder").await;

        let err = create_order_record(&pool, "intruder", "intruder", &order_request("c1", "car1"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[actix_rt::test]
    async fn test_car_must_belong_to_client() {
        let pool = test_pool().await;
        seed_owned_car(&pool).await;
        seed_client(&pool, "c2", "u1", "+79990000000").await;
        seed_car(&pool, "car2", "c2").await;

        let err = create_order_record(&pool, "u1", "u1", &order_request("c1", "car2"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[actix_rt::test]
    async fn test_update_recomputes_total() {
        let pool = test_pool().await;
        seed_owned_car(&pool).await;

        let order = create_order_record(&pool, "u1", "u1", &order_request("c1", "car1"))
            .await
            .unwrap();

        let update = UpdateOrderRequest {
            description: None,
            master_notes: None,
            appointment_date: None,
            labor_cost: Some(5000.0),
            parts_cost: None,
            discount: None,
            prepayment: None,
            warranty_period: None,
            payment_status: None,
        };

        let updated = update_order_record(&pool, "u1", "u1", &order.id, &update)
            .await
            .unwrap();

        // 5000 + 800 - 300
        assert_eq!(updated.total_amount, 5500.0);
    }

    #[actix_rt::test]
    async fn test_status_transitions_are_enforced() {
        let pool = test_pool().await;
        seed_owned_car(&pool).await;

        let order = create_order_record(&pool, "u1", "u1", &order_request("c1", "car1"))
            .await
            .unwrap();

        // Skipping ahead is rejected
        let err = apply_status_change(&pool, "u1", "u1", &order.id, "ready")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));

        // Bogus status values are rejected
        let err = apply_status_change(&pool, "u1", "u1", &order.id, "teleported")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));

        // The next workflow step is accepted
        let updated = apply_status_change(&pool, "u1", "u1", &order.id, "diagnostics")
            .await
            .unwrap();
        assert_eq!(updated.status, "diagnostics");

        // Cancellation works from any non-terminal state
        let cancelled = apply_status_change(&pool, "u1", "u1", &order.id, "cancelled")
            .await
            .unwrap();
        assert_eq!(cancelled.status, "cancelled");

        // Terminal states are final
        let err = apply_status_change(&pool, "u1", "u1", &order.id, "new")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
    }

    #[actix_rt::test]
    async fn test_completion_stamps_warranty() {
        let pool = test_pool().await;
        seed_owned_car(&pool).await;

        let order = create_order_record(&pool, "u1", "u1", &order_request("c1", "car1"))
            .await
            .unwrap();

        for status in ["diagnostics", "awaiting_parts", "in_progress", "ready"] {
            apply_status_change(&pool, "u1", "u1", &order.id, status)
                .await
                .unwrap();
        }

        let completed = apply_status_change(&pool, "u1", "u1", &order.id, "completed")
            .await
            .unwrap();

        let completed_at = completed.completed_at.expect("completed_at must be set");
        let warranty_until = completed.warranty_until.expect("warranty_until must be set");
        assert_eq!(
            warranty_until,
            completed_at.date_naive() + Duration::days(order.warranty_period)
        );
    }

    #[actix_rt::test]
    async fn test_line_item_totals_are_derived() {
        let pool = test_pool().await;
        seed_owned_car(&pool).await;

        let order = create_order_record(&pool, "u1", "u1", &order_request("c1", "car1"))
            .await
            .unwrap();

        let service = create_service_record(
            &pool,
            "u1",
            &order.id,
            &CreateServiceRequest {
                name: "Oil change".to_string(),
                quantity: Some(2),
                price: 750.0,
            },
        )
        .await
        .unwrap();
        assert_eq!(service.total, 1500.0);

        let part = create_part_record(
            &pool,
            "u1",
            &order.id,
            &CreatePartRequest {
                name: "Oil filter".to_string(),
                article: Some("OF-123".to_string()),
                quantity: Some(3),
                price: 250.0,
            },
        )
        .await
        .unwrap();
        assert_eq!(part.total, 750.0);

        let updated = update_service_record(
            &pool,
            "u1",
            &order.id,
            &service.id,
            &UpdateServiceRequest {
                name: None,
                quantity: Some(4),
                price: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.total, 3000.0);
    }
}
