// src/client_handlers.rs
//! Обработчики клиентов: список с агрегатами, карточка, CRUD

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
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
    CarSummary, Client, ClientHistory, ClientListItem, ClientType, CreateClientRequest, Order,
    UpdateClientRequest,
};
use crate::pagination::{PageQuery, PaginatedResponse, ResolvedPage};
use crate::query_builders::{fetch_owned_client, ClientListQuery};
use crate::validator::{FieldValidator, ValidationResult};
use crate::AppState;

// ==================== LISTING ====================

/// Выполнить постраничный запрос списка клиентов
pub async fn fetch_client_page(
    pool: &SqlitePool,
    user_id: &str,
    query: &PageQuery,
) -> ApiResult<(Vec<ClientListItem>, ResolvedPage)> {
    let mut list_query = ClientListQuery::scoped(user_id);

    if let Some(search) = query.get_search() {
        list_query = list_query.with_search(search);
    }
    if let Some(ref client_type) = query.client_type {
        list_query = list_query.with_client_type(client_type);
    }
    if let Some(ref sort_by) = query.sort_by {
        list_query = list_query.sort(sort_by, query.sort_order());
    }

    let (count_sql, count_params) = list_query.build_count();
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for param in &count_params {
        count_query = count_query.bind(param);
    }
    let total: i64 = count_query.fetch_one(pool).await?;

    let resolved = query.resolve(total);

    let (page_sql, page_params) = list_query.build_page(resolved.per_page, resolved.offset);
    let mut page_query = sqlx::query_as::<_, ClientListItem>(&page_sql);
    for param in &page_params {
        page_query = page_query.bind(param);
    }
    let clients = page_query.fetch_all(pool).await?;

    Ok((clients, resolved))
}

pub async fn get_clients(
    app_state: web::Data<Arc<AppState>>,
    query: web::Query<PageQuery>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let claims = get_current_user(&http_request)?;

    let (clients, resolved) = fetch_client_page(&app_state.db_pool, &claims.sub, &query).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(PaginatedResponse::new(
        clients, resolved,
    ))))
}

// ==================== DETAIL ====================

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ClientOrdersStats {
    pub total: i64,
    pub completed: i64,
    pub in_progress: i64,
    pub total_amount: f64,
}

#[derive(Debug, Serialize)]
pub struct ClientDetailResponse {
    #[serde(flatten)]
    pub client: Client,
    pub orders_count: i64,
    pub total_spent: f64,
    pub cars: Vec<crate::models::Car>,
    pub orders: Vec<Order>,
    pub history: Vec<ClientHistory>,
    pub orders_stats: ClientOrdersStats,
}

pub async fn load_client_orders_stats(
    pool: &SqlitePool,
    client_id: &str,
) -> ApiResult<ClientOrdersStats> {
    let stats: ClientOrdersStats = sqlx::query_as(
        r#"SELECT
            COUNT(*) AS total,
            COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0) AS completed,
            COALESCE(SUM(CASE WHEN status NOT IN ('completed', 'cancelled') THEN 1 ELSE 0 END), 0) AS in_progress,
            COALESCE(SUM(total_amount), 0) AS total_amount
           FROM orders WHERE client_id = ?"#,
    )
    .bind(client_id)
    .fetch_one(pool)
    .await?;

    Ok(stats)
}

pub async fn get_client(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let claims = get_current_user(&http_request)?;
    let client_id = path.into_inner();

    let client = fetch_owned_client(&app_state.db_pool, &client_id, &claims.sub).await?;

    let cars: Vec<crate::models::Car> =
        sqlx::query_as("SELECT * FROM cars WHERE client_id = ? ORDER BY created_at")
            .bind(&client_id)
            .fetch_all(&app_state.db_pool)
            .await?;

    let orders: Vec<Order> =
        sqlx::query_as("SELECT * FROM orders WHERE client_id = ? ORDER BY created_at DESC")
            .bind(&client_id)
            .fetch_all(&app_state.db_pool)
            .await?;

    let history: Vec<ClientHistory> = sqlx::query_as(
        "SELECT * FROM client_history WHERE client_id = ? ORDER BY created_at DESC LIMIT 20",
    )
    .bind(&client_id)
    .fetch_all(&app_state.db_pool)
    .await?;

    let orders_stats = load_client_orders_stats(&app_state.db_pool, &client_id).await?;

    let response = ClientDetailResponse {
        orders_count: orders_stats.total,
        total_spent: orders_stats.total_amount,
        client,
        cars,
        orders,
        history,
        orders_stats,
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

// ==================== VALIDATION ====================

fn check_common_fields(
    result: &mut ValidationResult,
    client_type: Option<&str>,
    phone: Option<&str>,
    email: Option<&str>,
    inn: Option<&str>,
    discount: Option<f64>,
) {
    if let Some(client_type) = client_type {
        if ClientType::from_str(client_type).is_none() {
            result.add_error(
                "client_type",
                format!(
                    "Invalid client type '{}'. Must be one of: {}",
                    client_type,
                    ClientType::all_strings().join(", ")
                ),
            );
        }
    }

    if let Some(phone) = phone {
        if let Err(e) = FieldValidator::not_empty(phone, "phone") {
            result.add_error("phone", e);
        } else if let Err(e) = FieldValidator::phone(phone) {
            result.add_error("phone", e);
        }
    }

    if let Some(email) = email {
        if let Err(e) = FieldValidator::email(email) {
            result.add_error("email", e);
        }
    }

    if let Some(inn) = inn {
        if let Err(e) = FieldValidator::inn(inn) {
            result.add_error("inn", e);
        }
    }

    if let Some(discount) = discount {
        if let Err(e) = FieldValidator::discount(discount) {
            result.add_error("discount", e);
        }
    }
}

async fn check_phone_unique(
    pool: &SqlitePool,
    result: &mut ValidationResult,
    phone: &str,
    exclude_id: Option<&str>,
) -> ApiResult<()> {
    let count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM clients WHERE phone = ? AND id != COALESCE(?, '')")
            .bind(phone)
            .bind(exclude_id)
            .fetch_one(pool)
            .await?;

    if count.0 > 0 {
        result.add_error("phone", "A client with this phone already exists");
    }
    Ok(())
}

async fn check_inn_unique(
    pool: &SqlitePool,
    result: &mut ValidationResult,
    inn: &str,
    exclude_id: Option<&str>,
) -> ApiResult<()> {
    let count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM clients WHERE inn = ? AND id != COALESCE(?, '')")
            .bind(inn)
            .bind(exclude_id)
            .fetch_one(pool)
            .await?;

    if count.0 > 0 {
        result.add_error("inn", "A client with this INN already exists");
    }
    Ok(())
}

/// Полная проверка полей нового клиента
pub async fn validate_new_client(
    pool: &SqlitePool,
    request: &CreateClientRequest,
) -> ApiResult<ValidationResult> {
    let mut result = ValidationResult::new();

    if let Err(e) = FieldValidator::not_empty(&request.first_name, "first name") {
        result.add_error("first_name", e);
    }
    if let Err(e) = FieldValidator::not_empty(&request.last_name, "last name") {
        result.add_error("last_name", e);
    }

    let client_type = request.client_type.as_deref().unwrap_or("individual");
    let inn = request.inn.as_deref().filter(|s| !s.trim().is_empty());

    check_common_fields(
        &mut result,
        Some(client_type),
        Some(&request.phone),
        request.email.as_deref(),
        inn,
        request.discount,
    );

    // INN is mandatory for legal entities
    if client_type == "legal" && inn.is_none() {
        result.add_error("inn", "INN is required for legal entities");
    }

    if !request.phone.trim().is_empty() {
        check_phone_unique(pool, &mut result, &request.phone, None).await?;
    }
    if let Some(inn) = inn {
        check_inn_unique(pool, &mut result, inn, None).await?;
    }

    Ok(result)
}

async fn validate_client_update(
    pool: &SqlitePool,
    existing: &Client,
    request: &UpdateClientRequest,
) -> ApiResult<ValidationResult> {
    let mut result = ValidationResult::new();

    if let Some(ref first_name) = request.first_name {
        if let Err(e) = FieldValidator::not_empty(first_name, "first name") {
            result.add_error("first_name", e);
        }
    }
    if let Some(ref last_name) = request.last_name {
        if let Err(e) = FieldValidator::not_empty(last_name, "last name") {
            result.add_error("last_name", e);
        }
    }

    let inn = request.inn.as_deref().filter(|s| !s.trim().is_empty());

    check_common_fields(
        &mut result,
        request.client_type.as_deref(),
        request.phone.as_deref(),
        request.email.as_deref(),
        inn,
        request.discount,
    );

    let effective_type = request
        .client_type
        .as_deref()
        .unwrap_or(&existing.client_type);
    let effective_inn = inn.or(existing.inn.as_deref());
    if effective_type == "legal" && effective_inn.is_none() {
        result.add_error("inn", "INN is required for legal entities");
    }

    if let Some(ref phone) = request.phone {
        if !phone.trim().is_empty() {
            check_phone_unique(pool, &mut result, phone, Some(&existing.id)).await?;
        }
    }
    if let Some(inn) = inn {
        check_inn_unique(pool, &mut result, inn, Some(&existing.id)).await?;
    }

    Ok(result)
}

// ==================== CRUD ====================

pub async fn create_client(
    app_state: web::Data<Arc<AppState>>,
    body: web::Json<CreateClientRequest>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    body.validate()?;

    let claims = get_current_user(&http_request)?;

    validate_new_client(&app_state.db_pool, &body)
        .await?
        .into_result()?;

    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let inn = body.inn.as_deref().filter(|s| !s.trim().is_empty());

    let mut tx = app_state.db_pool.begin().await?;

    sqlx::query(
        r#"INSERT INTO clients (
            id, created_by, client_type, first_name, last_name, patronymic,
            phone, email, additional_phone, company_name, inn, kpp, address,
            discount, notes, source, tags, is_active, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)"#,
    )
    .bind(&id)
    .bind(&claims.sub)
    .bind(body.client_type.as_deref().unwrap_or("individual"))
    .bind(&body.first_name)
    .bind(&body.last_name)
    .bind(body.patronymic.as_deref().unwrap_or(""))
    .bind(&body.phone)
    .bind(body.email.as_deref().unwrap_or(""))
    .bind(body.additional_phone.as_deref().unwrap_or(""))
    .bind(body.company_name.as_deref().unwrap_or(""))
    .bind(inn)
    .bind(body.kpp.as_deref().unwrap_or(""))
    .bind(body.address.as_deref().unwrap_or(""))
    .bind(body.discount.unwrap_or(0.0))
    .bind(body.notes.as_deref().unwrap_or(""))
    .bind(body.source.as_deref().unwrap_or(""))
    .bind(body.tags.as_deref().unwrap_or(""))
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    history::record(
        &mut *tx,
        &id,
        Some(&claims.sub),
        "create",
        &format!("Client created by {}", claims.username),
        None,
    )
    .await?;

    tx.commit().await?;

    let client: Client = sqlx::query_as("SELECT * FROM clients WHERE id = ?")
        .bind(&id)
        .fetch_one(&app_state.db_pool)
        .await?;

    log::info!("Created client: {} ({})", client.full_name(), client.id);

    Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
        client,
        "Client created successfully".to_string(),
    )))
}

pub async fn update_client(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    body: web::Json<UpdateClientRequest>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    body.validate()?;

    let claims = get_current_user(&http_request)?;
    let client_id = path.into_inner();

    let existing = fetch_owned_client(&app_state.db_pool, &client_id, &claims.sub).await?;

    validate_client_update(&app_state.db_pool, &existing, &body)
        .await?
        .into_result()?;

    let mut updates = Vec::new();
    let mut values: Vec<String> = Vec::new();

    if let Some(ref client_type) = body.client_type {
        updates.push("client_type = ?");
        values.push(client_type.clone());
    }
    if let Some(ref first_name) = body.first_name {
        updates.push("first_name = ?");
        values.push(first_name.clone());
    }
    if let Some(ref last_name) = body.last_name {
        updates.push("last_name = ?");
        values.push(last_name.clone());
    }
    if let Some(ref patronymic) = body.patronymic {
        updates.push("patronymic = ?");
        values.push(patronymic.clone());
    }
    if let Some(ref phone) = body.phone {
        updates.push("phone = ?");
        values.push(phone.clone());
    }
    if let Some(ref email) = body.email {
        updates.push("email = ?");
        values.push(email.clone());
    }
    if let Some(ref additional_phone) = body.additional_phone {
        updates.push("additional_phone = ?");
        values.push(additional_phone.clone());
    }
    if let Some(ref company_name) = body.company_name {
        updates.push("company_name = ?");
        values.push(company_name.clone());
    }
    if let Some(ref inn) = body.inn {
        if !inn.trim().is_empty() {
            updates.push("inn = ?");
            values.push(inn.clone());
        }
    }
    if let Some(ref kpp) = body.kpp {
        updates.push("kpp = ?");
        values.push(kpp.clone());
    }
    if let Some(ref address) = body.address {
        updates.push("address = ?");
        values.push(address.clone());
    }
    if let Some(discount) = body.discount {
        updates.push("discount = ?");
        values.push(discount.to_string());
    }
    if let Some(ref notes) = body.notes {
        updates.push("notes = ?");
        values.push(notes.clone());
    }
    if let Some(ref source) = body.source {
        updates.push("source = ?");
        values.push(source.clone());
    }
    if let Some(ref tags) = body.tags {
        updates.push("tags = ?");
        values.push(tags.clone());
    }

    if updates.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    updates.push("updated_at = ?");
    values.push(Utc::now().to_rfc3339());

    let sql = format!("UPDATE clients SET {} WHERE id = ?", updates.join(", "));

    let mut tx = app_state.db_pool.begin().await?;

    let mut query = sqlx::query(&sql);
    for value in values {
        query = query.bind(value);
    }
    query = query.bind(&client_id);
    query.execute(&mut *tx).await?;

    history::record(
        &mut *tx,
        &client_id,
        Some(&claims.sub),
        "update",
        &format!("Client data updated by {}", claims.username),
        None,
    )
    .await?;

    tx.commit().await?;

    let updated: Client = sqlx::query_as("SELECT * FROM clients WHERE id = ?")
        .bind(&client_id)
        .fetch_one(&app_state.db_pool)
        .await?;

    log::info!("Updated client: {} ({})", updated.full_name(), updated.id);

    Ok(HttpResponse::Ok().json(ApiResponse::success(updated)))
}

pub async fn delete_client(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let claims = get_current_user(&http_request)?;
    let client_id = path.into_inner();

    let client = fetch_owned_client(&app_state.db_pool, &client_id, &claims.sub).await?;

    // Orders hold a protective reference to the client
    let orders: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE client_id = ?")
        .bind(&client_id)
        .fetch_one(&app_state.db_pool)
        .await?;

    if orders.0 > 0 {
        return Err(ApiError::client_has_orders(orders.0));
    }

    let mut tx = app_state.db_pool.begin().await?;

    sqlx::query("UPDATE clients SET is_active = 0, updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(&client_id)
        .execute(&mut *tx)
        .await?;

    history::record(
        &mut *tx,
        &client_id,
        Some(&claims.sub),
        "deactivate",
        &format!("Client deactivated by {}", claims.username),
        None,
    )
    .await?;

    tx.commit().await?;

    log::info!("Deactivated client: {} ({})", client.full_name(), client_id);

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        (),
        "Client deleted successfully".to_string(),
    )))
}

// ==================== CARS LOOKUP API ====================

pub async fn get_client_cars(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let claims = get_current_user(&http_request)?;
    let client_id = path.into_inner();

    // A foreign client's id answers 404, never 403
    fetch_owned_client(&app_state.db_pool, &client_id, &claims.sub).await?;

    let cars: Vec<CarSummary> = sqlx::query_as(
        "SELECT id, brand, model, license_plate FROM cars WHERE client_id = ? ORDER BY created_at",
    )
    .bind(&client_id)
    .fetch_all(&app_state.db_pool)
    .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(cars)))
}

// ==================== TESTS ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::pagination::PageQuery;
    use crate::test_support::{seed_car, seed_client, seed_order, seed_user};

    fn list_query() -> PageQuery {
        PageQuery::default()
    }

    #[actix_rt::test]
    async fn test_aggregates_for_client_with_orders() {
        let pool = test_pool().await;
        seed_user(&pool, "u1").await;
        seed_client(&pool, "c1", "u1", "+79991234567").await;
        seed_car(&pool, "car1", "c1").await;
        seed_order(&pool, "o1", "c1", "car1", 1000.0).await;
        seed_order(&pool, "o2", "c1", "car1", 500.0).await;

        let (clients, resolved) = fetch_client_page(&pool, "u1", &list_query()).await.unwrap();

        assert_eq!(resolved.total, 1);
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].orders_count, 2);
        assert_eq!(clients[0].total_spent, 1500.0);
    }

    #[actix_rt::test]
    async fn test_zero_order_client_reports_zeros() {
        let pool = test_pool().await;
        seed_user(&pool, "u1").await;
        seed_client(&pool, "c1", "u1", "+79991234567").await;

        let (clients, _) = fetch_client_page(&pool, "u1", &list_query()).await.unwrap();

        assert_eq!(clients[0].orders_count, 0);
        assert_eq!(clients[0].total_spent, 0.0);
    }

    #[actix_rt::test]
    async fn test_listing_is_owner_scoped() {
        let pool = test_pool().await;
        seed_user(&pool, "owner").await;
        seed_user(&pool, "other").await;
        seed_client(&pool, "mine", "owner", "+70000000001").await;
        seed_client(&pool, "foreign", "other", "+70000000002").await;

        let (clients, resolved) = fetch_client_page(&pool, "owner", &list_query())
            .await
            .unwrap();

        assert_eq!(resolved.total, 1);
        assert!(clients.iter().all(|c| c.id != "foreign"));
    }

    #[actix_rt::test]
    async fn test_search_matches_company_name_alone() {
        let pool = test_pool().await;
        seed_user(&pool, "u1").await;
        seed_client(&pool, "c1", "u1", "+70000000001").await;
        seed_client(&pool, "c2", "u1", "+70000000002").await;

        sqlx::query("UPDATE clients SET company_name = 'Horns and Hooves LLC' WHERE id = 'c1'")
            .execute(&pool)
            .await
            .unwrap();

        let mut query = list_query();
        query.search = Some("Hooves".to_string());

        let (clients, resolved) = fetch_client_page(&pool, "u1", &query).await.unwrap();

        assert_eq!(resolved.total, 1);
        assert_eq!(clients[0].id, "c1");
    }

    #[actix_rt::test]
    async fn test_type_filter_and_sort() {
        let pool = test_pool().await;
        seed_user(&pool, "u1").await;
        seed_client(&pool, "c1", "u1", "+70000000001").await;
        seed_client(&pool, "c2", "u1", "+70000000002").await;
        sqlx::query("UPDATE clients SET client_type = 'legal' WHERE id = 'c2'")
            .execute(&pool)
            .await
            .unwrap();

        let mut query = list_query();
        query.client_type = Some("legal".to_string());

        let (clients, _) = fetch_client_page(&pool, "u1", &query).await.unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].id, "c2");
    }

    #[actix_rt::test]
    async fn test_sort_by_total_spent() {
        let pool = test_pool().await;
        seed_user(&pool, "u1").await;
        seed_client(&pool, "poor", "u1", "+70000000001").await;
        seed_client(&pool, "rich", "u1", "+70000000002").await;
        seed_car(&pool, "car-r", "rich").await;
        seed_order(&pool, "o1", "rich", "car-r", 9000.0).await;

        let mut query = list_query();
        query.sort_by = Some("total_spent".to_string());
        query.sort_order = Some("desc".to_string());

        let (clients, _) = fetch_client_page(&pool, "u1", &query).await.unwrap();
        assert_eq!(clients[0].id, "rich");
        assert_eq!(clients[1].id, "poor");
    }

    #[actix_rt::test]
    async fn test_soft_deleted_clients_are_hidden() {
        let pool = test_pool().await;
        seed_user(&pool, "u1").await;
        seed_client(&pool, "c1", "u1", "+70000000001").await;
        sqlx::query("UPDATE clients SET is_active = 0 WHERE id = 'c1'")
            .execute(&pool)
            .await
            .unwrap();

        let (clients, resolved) = fetch_client_page(&pool, "u1", &list_query()).await.unwrap();
        assert_eq!(resolved.total, 0);
        assert!(clients.is_empty());
    }

    #[actix_rt::test]
    async fn test_duplicate_phone_is_a_field_error() {
        let pool = test_pool().await;
        seed_user(&pool, "u1").await;
        seed_client(&pool, "c1", "u1", "+79991234567").await;

        let request = CreateClientRequest {
            client_type: None,
            first_name: "Petr".to_string(),
            last_name: "Sidorov".to_string(),
            patronymic: None,
            phone: "+79991234567".to_string(),
            email: None,
            additional_phone: None,
            company_name: None,
            inn: None,
            kpp: None,
            address: None,
            discount: None,
            notes: None,
            source: None,
            tags: None,
        };

        let result = validate_new_client(&pool, &request).await.unwrap();
        assert!(!result.is_valid());
        assert!(result.errors.contains_key("phone"));
    }

    #[actix_rt::test]
    async fn test_legal_client_requires_valid_inn() {
        let pool = test_pool().await;
        seed_user(&pool, "u1").await;

        let mut request = CreateClientRequest {
            client_type: Some("legal".to_string()),
            first_name: "Anna".to_string(),
            last_name: "Orlova".to_string(),
            patronymic: None,
            phone: "+79991112233".to_string(),
            email: None,
            additional_phone: None,
            company_name: Some("Orlova and Co".to_string()),
            inn: None,
            kpp: None,
            address: None,
            discount: None,
            notes: None,
            source: None,
            tags: None,
        };

        let result = validate_new_client(&pool, &request).await.unwrap();
        assert!(result.errors.contains_key("inn"));

        request.inn = Some("12345".to_string());
        let result = validate_new_client(&pool, &request).await.unwrap();
        assert!(result.errors.contains_key("inn"));

        request.inn = Some("1234567890".to_string());
        let result = validate_new_client(&pool, &request).await.unwrap();
        assert!(result.is_valid(), "errors: {:?}", result.errors);
    }

    #[actix_rt::test]
    async fn test_multiple_errors_are_collected() {
        let pool = test_pool().await;
        seed_user(&pool, "u1").await;

        let request = CreateClientRequest {
            client_type: Some("vip".to_string()),
            first_name: "  ".to_string(),
            last_name: "Ivanov".to_string(),
            patronymic: None,
            phone: "".to_string(),
            email: Some("broken".to_string()),
            additional_phone: None,
            company_name: None,
            inn: None,
            kpp: None,
            address: None,
            discount: Some(150.0),
            notes: None,
            source: None,
            tags: None,
        };

        let result = validate_new_client(&pool, &request).await.unwrap();
        for field in ["client_type", "first_name", "phone", "email", "discount"] {
            assert!(result.errors.contains_key(field), "missing error for {}", field);
        }
    }
}
