// src/models/car.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const TRANSMISSIONS: &[&str] = &["manual", "automatic", "robot", "variator"];
pub const FUEL_TYPES: &[&str] = &["petrol", "diesel", "gas", "electric", "hybrid"];

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Car {
    pub id: String,
    pub client_id: String,
    pub brand: String,
    pub model: String,
    pub year: Option<i64>,
    pub vin: Option<String>,
    pub license_plate: String,
    pub engine_volume: Option<f64>,
    pub engine_power: Option<i64>,
    pub transmission: String,
    pub fuel_type: String,
    pub mileage: i64,
    pub color: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The reduced shape returned by the client cars lookup API.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CarSummary {
    pub id: String,
    pub brand: String,
    pub model: String,
    pub license_plate: String,
}

#[derive(Debug, Deserialize, Validate, Clone)]
pub struct CreateCarRequest {
    #[validate(length(min = 1, max = 100, message = "Brand must be between 1 and 100 characters"))]
    pub brand: String,

    #[validate(length(min = 1, max = 100, message = "Model must be between 1 and 100 characters"))]
    pub model: String,

    #[validate(range(min = 1900, message = "Year must be 1900 or later"))]
    pub year: Option<i64>,

    #[validate(length(max = 17, message = "VIN cannot exceed 17 characters"))]
    pub vin: Option<String>,

    #[validate(length(max = 10, message = "License plate cannot exceed 10 characters"))]
    pub license_plate: Option<String>,

    #[validate(range(min = 0.1, message = "Engine volume must be positive"))]
    pub engine_volume: Option<f64>,

    #[validate(range(min = 1, message = "Engine power must be positive"))]
    pub engine_power: Option<i64>,

    pub transmission: Option<String>,
    pub fuel_type: Option<String>,

    #[validate(range(min = 0, message = "Mileage must be non-negative"))]
    pub mileage: Option<i64>,

    #[validate(length(max = 50, message = "Color cannot exceed 50 characters"))]
    pub color: Option<String>,

    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCarRequest {
    #[validate(length(min = 1, max = 100, message = "Brand must be between 1 and 100 characters"))]
    pub brand: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Model must be between 1 and 100 characters"))]
    pub model: Option<String>,

    #[validate(range(min = 1900, message = "Year must be 1900 or later"))]
    pub year: Option<i64>,

    #[validate(length(max = 17, message = "VIN cannot exceed 17 characters"))]
    pub vin: Option<String>,

    #[validate(length(max = 10, message = "License plate cannot exceed 10 characters"))]
    pub license_plate: Option<String>,

    #[validate(range(min = 0.1, message = "Engine volume must be positive"))]
    pub engine_volume: Option<f64>,

    #[validate(range(min = 1, message = "Engine power must be positive"))]
    pub engine_power: Option<i64>,

    pub transmission: Option<String>,
    pub fuel_type: Option<String>,

    #[validate(range(min = 0, message = "Mileage must be non-negative"))]
    pub mileage: Option<i64>,

    #[validate(length(max = 50, message = "Color cannot exceed 50 characters"))]
    pub color: Option<String>,

    pub notes: Option<String>,
}
