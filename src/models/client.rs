// src/models/client.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

// ==================== CLIENT TYPE ====================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum ClientType {
    Individual,
    Legal,
    Regular,
}

impl ClientType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "individual" => Some(ClientType::Individual),
            "legal" => Some(ClientType::Legal),
            "regular" => Some(ClientType::Regular),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClientType::Individual => "individual",
            ClientType::Legal => "legal",
            ClientType::Regular => "regular",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ClientType::Individual => "Individual",
            ClientType::Legal => "Legal entity",
            ClientType::Regular => "Regular client",
        }
    }

    pub fn all_strings() -> Vec<&'static str> {
        vec!["individual", "legal", "regular"]
    }
}

// ==================== CLIENT ====================

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Client {
    pub id: String,
    pub created_by: Option<String>,
    pub client_type: String,
    pub first_name: String,
    pub last_name: String,
    pub patronymic: String,
    pub phone: String,
    pub email: String,
    pub additional_phone: String,
    pub company_name: String,
    pub inn: Option<String>,
    pub kpp: String,
    pub address: String,
    pub discount: f64,
    pub notes: String,
    pub source: String,
    pub tags: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    pub fn full_name(&self) -> String {
        format!("{} {} {}", self.last_name, self.first_name, self.patronymic)
            .trim()
            .to_string()
    }
}

/// Client row annotated with order aggregates. Clients without orders
/// report zeros, never NULL.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ClientListItem {
    pub id: String,
    pub created_by: Option<String>,
    pub client_type: String,
    pub first_name: String,
    pub last_name: String,
    pub patronymic: String,
    pub phone: String,
    pub email: String,
    pub additional_phone: String,
    pub company_name: String,
    pub inn: Option<String>,
    pub kpp: String,
    pub discount: f64,
    pub source: String,
    pub tags: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub orders_count: i64,
    pub total_spent: f64,
}

#[derive(Debug, Deserialize, Validate, Clone)]
pub struct CreateClientRequest {
    pub client_type: Option<String>,

    #[validate(length(max = 100, message = "First name cannot exceed 100 characters"))]
    pub first_name: String,

    #[validate(length(max = 100, message = "Last name cannot exceed 100 characters"))]
    pub last_name: String,

    #[validate(length(max = 100, message = "Patronymic cannot exceed 100 characters"))]
    pub patronymic: Option<String>,

    #[validate(length(max = 20, message = "Phone cannot exceed 20 characters"))]
    pub phone: String,

    #[validate(length(max = 255, message = "Email cannot exceed 255 characters"))]
    pub email: Option<String>,

    #[validate(length(max = 20, message = "Additional phone cannot exceed 20 characters"))]
    pub additional_phone: Option<String>,

    #[validate(length(max = 200, message = "Company name cannot exceed 200 characters"))]
    pub company_name: Option<String>,

    #[validate(length(max = 12, message = "INN cannot exceed 12 characters"))]
    pub inn: Option<String>,

    #[validate(length(max = 9, message = "KPP cannot exceed 9 characters"))]
    pub kpp: Option<String>,

    pub address: Option<String>,
    pub discount: Option<f64>,
    pub notes: Option<String>,

    #[validate(length(max = 100, message = "Source cannot exceed 100 characters"))]
    pub source: Option<String>,

    #[validate(length(max = 200, message = "Tags cannot exceed 200 characters"))]
    pub tags: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateClientRequest {
    pub client_type: Option<String>,

    #[validate(length(max = 100, message = "First name cannot exceed 100 characters"))]
    pub first_name: Option<String>,

    #[validate(length(max = 100, message = "Last name cannot exceed 100 characters"))]
    pub last_name: Option<String>,

    #[validate(length(max = 100, message = "Patronymic cannot exceed 100 characters"))]
    pub patronymic: Option<String>,

    #[validate(length(max = 20, message = "Phone cannot exceed 20 characters"))]
    pub phone: Option<String>,

    #[validate(length(max = 255, message = "Email cannot exceed 255 characters"))]
    pub email: Option<String>,

    #[validate(length(max = 20, message = "Additional phone cannot exceed 20 characters"))]
    pub additional_phone: Option<String>,

    #[validate(length(max = 200, message = "Company name cannot exceed 200 characters"))]
    pub company_name: Option<String>,

    #[validate(length(max = 12, message = "INN cannot exceed 12 characters"))]
    pub inn: Option<String>,

    #[validate(length(max = 9, message = "KPP cannot exceed 9 characters"))]
    pub kpp: Option<String>,

    pub address: Option<String>,
    pub discount: Option<f64>,
    pub notes: Option<String>,

    #[validate(length(max = 100, message = "Source cannot exceed 100 characters"))]
    pub source: Option<String>,

    #[validate(length(max = 200, message = "Tags cannot exceed 200 characters"))]
    pub tags: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_type_round_trip() {
        for raw in ClientType::all_strings() {
            let parsed = ClientType::from_str(raw).unwrap();
            assert_eq!(parsed.as_str(), raw);
        }
        assert!(ClientType::from_str("vip").is_none());
    }

    #[test]
    fn test_full_name_trims_missing_patronymic() {
        let client = Client {
            id: "c1".to_string(),
            created_by: None,
            client_type: "individual".to_string(),
            first_name: "Ivan".to_string(),
            last_name: "Petrov".to_string(),
            patronymic: String::new(),
            phone: "+79991234567".to_string(),
            email: String::new(),
            additional_phone: String::new(),
            company_name: String::new(),
            inn: None,
            kpp: String::new(),
            address: String::new(),
            discount: 0.0,
            notes: String::new(),
            source: String::new(),
            tags: String::new(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(client.full_name(), "Petrov Ivan");
    }
}
