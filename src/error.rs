use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    InternalServerError(String),
    ValidationError(String),
    /// Per-field validation errors, returned as a structured map.
    ValidationFailed(HashMap<String, Vec<String>>),
    /// A record is still referenced through a protected foreign key.
    ReferentialIntegrity(String),
    DatabaseError(sqlx::Error),
    AuthError(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<HashMap<String, Vec<String>>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            ApiError::ValidationFailed(errors) => {
                let summary = errors
                    .iter()
                    .map(|(field, msgs)| format!("{}: {}", field, msgs.join(", ")))
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "Validation Error: {}", summary)
            }
            ApiError::ReferentialIntegrity(msg) => write!(f, "Conflict: {}", msg),
            ApiError::DatabaseError(err) => write!(f, "Database Error: {}", err),
            ApiError::AuthError(msg) => write!(f, "Auth Error: {}", msg),
        }
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        let error_response = ErrorResponse {
            success: false,
            message: self.to_string(),
            errors: match self {
                ApiError::ValidationFailed(errors) => Some(errors.clone()),
                _ => None,
            },
        };

        match self {
            ApiError::BadRequest(_) => HttpResponse::BadRequest().json(error_response),
            ApiError::NotFound(_) => HttpResponse::NotFound().json(error_response),
            ApiError::Unauthorized(_) => HttpResponse::Unauthorized().json(error_response),
            ApiError::Forbidden(_) => HttpResponse::Forbidden().json(error_response),
            ApiError::ValidationError(_) => HttpResponse::UnprocessableEntity().json(error_response),
            ApiError::ValidationFailed(_) => HttpResponse::UnprocessableEntity().json(error_response),
            ApiError::ReferentialIntegrity(_) => HttpResponse::Conflict().json(error_response),
            ApiError::DatabaseError(_) => HttpResponse::InternalServerError().json(error_response),
            ApiError::AuthError(_) => HttpResponse::Unauthorized().json(error_response),
            ApiError::InternalServerError(_) => HttpResponse::InternalServerError().json(error_response),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::DatabaseError(err)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

// Специфичные ошибки для автосервиса
impl ApiError {
    pub fn client_not_found(id: &str) -> Self {
        ApiError::NotFound(format!("Client with ID '{}' not found", id))
    }

    pub fn car_not_found(id: &str) -> Self {
        ApiError::NotFound(format!("Car with ID '{}' not found", id))
    }

    pub fn order_not_found(id: &str) -> Self {
        ApiError::NotFound(format!("Order with ID '{}' not found", id))
    }

    pub fn line_item_not_found(id: &str) -> Self {
        ApiError::NotFound(format!("Line item with ID '{}' not found", id))
    }

    pub fn client_has_orders(count: i64) -> Self {
        ApiError::ReferentialIntegrity(format!(
            "Cannot delete client with {} existing orders",
            count
        ))
    }

    pub fn car_has_orders(count: i64) -> Self {
        ApiError::ReferentialIntegrity(format!(
            "Cannot delete car with {} existing orders",
            count
        ))
    }

    pub fn bad_request(msg: &str) -> Self {
        ApiError::BadRequest(msg.to_string())
    }

    pub fn not_found(entity: &str) -> Self {
        ApiError::NotFound(format!("{} not found", entity))
    }
}
