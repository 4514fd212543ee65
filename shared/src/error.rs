//! Domain errors raised by the pure inventory logic

use thiserror::Error;
use uuid::Uuid;

/// Errors produced by accounting, alerting and catalog rules.
///
/// These carry no transport concerns; the backend maps them onto HTTP
/// responses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Quantity must be greater than zero (got {0})")]
    InvalidQuantity(i64),

    #[error("Insufficient stock for this operation: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },

    #[error("Inventory batch {0} does not belong to this supply")]
    BatchNotFound(Uuid),

    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Conflict on {resource}: {message}")]
    Conflict { resource: String, message: String },
}

impl DomainError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        DomainError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn conflict(resource: &str, message: impl Into<String>) -> Self {
        DomainError::Conflict {
            resource: resource.to_string(),
            message: message.into(),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
