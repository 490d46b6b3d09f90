// src/validator.rs - Centralized validation module
use crate::error::ApiError;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

lazy_static! {
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9 ()\-]{5,20}$").unwrap();
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    static ref INN_REGEX: Regex = Regex::new(r"^\d+$").unwrap();
}

// ==================== VALIDATION RESULT ====================

#[derive(Debug, Default, Serialize)]
pub struct ValidationResult {
    pub errors: HashMap<String, Vec<String>>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn merge(&mut self, other: ValidationResult) {
        for (field, errors) in other.errors {
            self.errors.entry(field).or_default().extend(errors);
        }
    }

    pub fn into_api_error(self) -> ApiError {
        ApiError::ValidationFailed(self.errors)
    }

    /// Err when any field collected an error, otherwise Ok.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(self.into_api_error())
        }
    }
}

// ==================== FIELD VALIDATORS ====================

pub struct FieldValidator;

impl FieldValidator {
    pub fn not_empty(value: &str, field: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            Err(format!("{} cannot be empty", field))
        } else {
            Ok(())
        }
    }

    pub fn length(
        value: &str,
        field: &str,
        min: Option<usize>,
        max: Option<usize>,
    ) -> Result<(), String> {
        let len = value.chars().count();

        if let Some(min_len) = min {
            if len < min_len {
                return Err(format!("{} must be at least {} characters", field, min_len));
            }
        }

        if let Some(max_len) = max {
            if len > max_len {
                return Err(format!("{} must not exceed {} characters", field, max_len));
            }
        }

        Ok(())
    }

    pub fn range<T: PartialOrd + std::fmt::Display>(
        value: T,
        field: &str,
        min: Option<T>,
        max: Option<T>,
    ) -> Result<(), String> {
        if let Some(min_val) = min {
            if value < min_val {
                return Err(format!("{} must be at least {}", field, min_val));
            }
        }

        if let Some(max_val) = max {
            if value > max_val {
                return Err(format!("{} must not exceed {}", field, max_val));
            }
        }

        Ok(())
    }

    pub fn phone(value: &str) -> Result<(), String> {
        if !PHONE_REGEX.is_match(value.trim()) {
            return Err("Invalid phone number format".to_string());
        }
        Ok(())
    }

    pub fn email(value: &str) -> Result<(), String> {
        if value.is_empty() {
            return Ok(());
        }
        if !EMAIL_REGEX.is_match(value) {
            return Err("Invalid email format".to_string());
        }
        Ok(())
    }

    /// INN is 10 digits for organizations, 12 for individuals.
    pub fn inn(value: &str) -> Result<(), String> {
        if !INN_REGEX.is_match(value) {
            return Err("INN must contain only digits".to_string());
        }
        if value.len() != 10 && value.len() != 12 {
            return Err("INN must contain 10 or 12 digits".to_string());
        }
        Ok(())
    }

    pub fn discount(value: f64) -> Result<(), String> {
        Self::range(value, "discount", Some(0.0), Some(100.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_result_collects_per_field() {
        let mut result = ValidationResult::new();
        assert!(result.is_valid());

        result.add_error("phone", "Phone is required");
        result.add_error("phone", "Invalid phone number format");
        result.add_error("inn", "INN must contain 10 or 12 digits");

        assert!(!result.is_valid());
        assert_eq!(result.errors.get("phone").unwrap().len(), 2);
        assert_eq!(result.errors.get("inn").unwrap().len(), 1);

        match result.into_api_error() {
            ApiError::ValidationFailed(errors) => {
                assert_eq!(errors.len(), 2);
            }
            other => panic!("expected ValidationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_phone_format() {
        assert!(FieldValidator::phone("+79991234567").is_ok());
        assert!(FieldValidator::phone("8 (999) 123-45-67").is_ok());
        assert!(FieldValidator::phone("").is_err());
        assert!(FieldValidator::phone("not-a-phone").is_err());
    }

    #[test]
    fn test_inn_length() {
        assert!(FieldValidator::inn("1234567890").is_ok());
        assert!(FieldValidator::inn("123456789012").is_ok());
        assert!(FieldValidator::inn("12345").is_err());
        assert!(FieldValidator::inn("12345678901").is_err());
        assert!(FieldValidator::inn("12345abcde").is_err());
    }

    #[test]
    fn test_discount_range() {
        assert!(FieldValidator::discount(0.0).is_ok());
        assert!(FieldValidator::discount(100.0).is_ok());
        assert!(FieldValidator::discount(-0.5).is_err());
        assert!(FieldValidator::discount(100.5).is_err());
    }

    #[test]
    fn test_email_optional() {
        assert!(FieldValidator::email("").is_ok());
        assert!(FieldValidator::email("user@example.com").is_ok());
        assert!(FieldValidator::email("not-an-email").is_err());
    }
}
