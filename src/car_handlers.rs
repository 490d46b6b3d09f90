// src/car_handlers.rs
//! Автомобили клиента

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::get_current_user;
use crate::error::{ApiError, ApiResult};
use crate::handlers::ApiResponse;
use crate::models::{Car, CreateCarRequest, UpdateCarRequest, FUEL_TYPES, TRANSMISSIONS};
use crate::query_builders::fetch_owned_client;
use crate::AppState;

async fn check_vin_unique(
    pool: &SqlitePool,
    vin: &str,
    exclude_id: Option<&str>,
) -> ApiResult<()> {
    let count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM cars WHERE vin = ? AND id != COALESCE(?, '')")
            .bind(vin)
            .bind(exclude_id)
            .fetch_one(pool)
            .await?;

    if count.0 > 0 {
        return Err(ApiError::ValidationError(format!(
            "A car with VIN '{}' is already registered",
            vin
        )));
    }
    Ok(())
}

fn check_enum_field(value: &str, allowed: &[&str], field: &str) -> ApiResult<()> {
    if !value.is_empty() && !allowed.contains(&value) {
        return Err(ApiError::ValidationError(format!(
            "Invalid {} '{}'. Must be one of: {}",
            field,
            value,
            allowed.join(", ")
        )));
    }
    Ok(())
}

async fn fetch_owned_car(
    pool: &SqlitePool,
    client_id: &str,
    car_id: &str,
) -> ApiResult<Car> {
    sqlx::query_as::<_, Car>("SELECT * FROM cars WHERE id = ? AND client_id = ?")
        .bind(car_id)
        .bind(client_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::car_not_found(car_id))
}

pub async fn create_car(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    body: web::Json<CreateCarRequest>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    body.validate()?;

    let claims = get_current_user(&http_request)?;
    let client_id = path.into_inner();

    fetch_owned_client(&app_state.db_pool, &client_id, &claims.sub).await?;

    let transmission = body.transmission.as_deref().unwrap_or("");
    let fuel_type = body.fuel_type.as_deref().unwrap_or("");
    check_enum_field(transmission, TRANSMISSIONS, "transmission")?;
    check_enum_field(fuel_type, FUEL_TYPES, "fuel type")?;

    let vin = body.vin.as_deref().filter(|s| !s.trim().is_empty());
    if let Some(vin) = vin {
        check_vin_unique(&app_state.db_pool, vin, None).await?;
    }

    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        r#"INSERT INTO cars (
            id, client_id, brand, model, year, vin, license_plate,
            engine_volume, engine_power, transmission, fuel_type,
            mileage, color, notes, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(&client_id)
    .bind(&body.brand)
    .bind(&body.model)
    .bind(body.year)
    .bind(vin)
    .bind(body.license_plate.as_deref().unwrap_or(""))
    .bind(body.engine_volume)
    .bind(body.engine_power)
    .bind(transmission)
    .bind(fuel_type)
    .bind(body.mileage.unwrap_or(0))
    .bind(body.color.as_deref().unwrap_or(""))
    .bind(body.notes.as_deref().unwrap_or(""))
    .bind(&now)
    .bind(&now)
    .execute(&app_state.db_pool)
    .await?;

    let car: Car = sqlx::query_as("SELECT * FROM cars WHERE id = ?")
        .bind(&id)
        .fetch_one(&app_state.db_pool)
        .await?;

    log::info!("Created car: {} {} ({})", car.brand, car.model, car.id);

    Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
        car,
        "Car created successfully".to_string(),
    )))
}

pub async fn update_car(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<(String, String)>,
    body: web::Json<UpdateCarRequest>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    body.validate()?;

    let claims = get_current_user(&http_request)?;
    let (client_id, car_id) = path.into_inner();

    fetch_owned_client(&app_state.db_pool, &client_id, &claims.sub).await?;
    let existing = fetch_owned_car(&app_state.db_pool, &client_id, &car_id).await?;

    if let Some(ref transmission) = body.transmission {
        check_enum_field(transmission, TRANSMISSIONS, "transmission")?;
    }
    if let Some(ref fuel_type) = body.fuel_type {
        check_enum_field(fuel_type, FUEL_TYPES, "fuel type")?;
    }

    let vin = body.vin.as_deref().filter(|s| !s.trim().is_empty());
    if let Some(vin) = vin {
        check_vin_unique(&app_state.db_pool, vin, Some(&existing.id)).await?;
    }

    let mut updates = Vec::new();
    let mut values: Vec<String> = Vec::new();

    if let Some(ref brand) = body.brand {
        updates.push("brand = ?");
        values.push(brand.clone());
    }
    if let Some(ref model) = body.model {
        updates.push("model = ?");
        values.push(model.clone());
    }
    if let Some(year) = body.year {
        updates.push("year = ?");
        values.push(year.to_string());
    }
    if let Some(vin) = vin {
        updates.push("vin = ?");
        values.push(vin.to_string());
    }
    if let Some(ref license_plate) = body.license_plate {
        updates.push("license_plate = ?");
        values.push(license_plate.clone());
    }
    if let Some(engine_volume) = body.engine_volume {
        updates.push("engine_volume = ?");
        values.push(engine_volume.to_string());
    }
    if let Some(engine_power) = body.engine_power {
        updates.push("engine_power = ?");
        values.push(engine_power.to_string());
    }
    if let Some(ref transmission) = body.transmission {
        updates.push("transmission = ?");
        values.push(transmission.clone());
    }
    if let Some(ref fuel_type) = body.fuel_type {
        updates.push("fuel_type = ?");
        values.push(fuel_type.clone());
    }
    if let Some(mileage) = body.mileage {
        updates.push("mileage = ?");
        values.push(mileage.to_string());
    }
    if let Some(ref color) = body.color {
        updates.push("color = ?");
        values.push(color.clone());
    }
    if let Some(ref notes) = body.notes {
        updates.push("notes = ?");
        values.push(notes.clone());
    }

    if updates.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    updates.push("updated_at = ?");
    values.push(Utc::now().to_rfc3339());

    let sql = format!("UPDATE cars SET {} WHERE id = ?", updates.join(", "));

    let mut query = sqlx::query(&sql);
    for value in values {
        query = query.bind(value);
    }
    query = query.bind(&car_id);
    query.execute(&app_state.db_pool).await?;

    let updated: Car = sqlx::query_as("SELECT * FROM cars WHERE id = ?")
        .bind(&car_id)
        .fetch_one(&app_state.db_pool)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(updated)))
}

pub async fn delete_car(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<(String, String)>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let claims = get_current_user(&http_request)?;
    let (client_id, car_id) = path.into_inner();

    fetch_owned_client(&app_state.db_pool, &client_id, &claims.sub).await?;
    fetch_owned_car(&app_state.db_pool, &client_id, &car_id).await?;

    // Orders hold a protective reference to the car
    let orders: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE car_id = ?")
        .bind(&car_id)
        .fetch_one(&app_state.db_pool)
        .await?;

    if orders.0 > 0 {
        return Err(ApiError::car_has_orders(orders.0));
    }

    sqlx::query("DELETE FROM cars WHERE id = ?")
        .bind(&car_id)
        .execute(&app_state.db_pool)
        .await?;

    log::info!("Deleted car: {}", car_id);

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        (),
        "Car deleted successfully".to_string(),
    )))
}
