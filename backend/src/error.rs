//! Error handling for the Medical Supply Inventory Platform
//!
//! Every handler returns [`AppResult`]; errors render as
//! `{"error": {"code", "message", "field"?}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::DomainError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Insufficient permissions: requires {0}")]
    InsufficientPermissions(String),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Conflict: {message}")]
    Conflict { resource: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorDetail {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
        }
    }

    fn with_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }
}

impl AppError {
    /// HTTP status and response body for this error
    fn status_and_detail(&self) -> (StatusCode, ErrorDetail) {
        match self {
            AppError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("UNAUTHORIZED", message.clone()),
            ),
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("TOKEN_EXPIRED", "Token has expired"),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("INVALID_TOKEN", "Invalid token"),
            ),
            AppError::InsufficientPermissions(permission) => (
                StatusCode::FORBIDDEN,
                ErrorDetail::new(
                    "INSUFFICIENT_PERMISSIONS",
                    format!("You do not have permission to perform this action ({})", permission),
                ),
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("VALIDATION_ERROR", message.clone()).with_field(field),
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("VALIDATION_ERROR", msg.clone()),
            ),
            AppError::DuplicateEntry(field) => (
                StatusCode::CONFLICT,
                ErrorDetail::new(
                    "DUPLICATE_ENTRY",
                    format!("A record with this {} already exists", field),
                )
                .with_field(field),
            ),
            AppError::Conflict { resource, message } => (
                StatusCode::CONFLICT,
                ErrorDetail::new("CONFLICT", message.clone()).with_field(resource),
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource)),
            ),
            AppError::InsufficientStock(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new("INSUFFICIENT_STOCK", msg.clone()),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("DATABASE_ERROR", "A database error occurred"),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", msg.clone()),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", "An internal server error occurred"),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = self.status_and_detail();

        if status.is_server_error() {
            tracing::error!("Request failed: {:?}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidQuantity(_) => AppError::Validation {
                field: "quantity".to_string(),
                message: err.to_string(),
            },
            DomainError::InsufficientStock { .. } => AppError::InsufficientStock(err.to_string()),
            DomainError::BatchNotFound(_) => AppError::NotFound("Inventory batch".to_string()),
            DomainError::Validation { field, message } => AppError::Validation { field, message },
            DomainError::Conflict { resource, message } => AppError::Conflict { resource, message },
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let first = errors.field_errors().into_iter().next().map(|(field, errs)| {
            let message = errs
                .first()
                .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| format!("{} is invalid", field));
            (field.to_string(), message)
        });

        match first {
            Some((field, message)) => AppError::Validation { field, message },
            None => AppError::ValidationError(errors.to_string()),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        }
    }
}

/// Map a unique-constraint violation onto `DuplicateEntry`.
///
/// The reported field is the first of `fields` named by the violated
/// constraint (`supplies_barcode_key` → `barcode`), else the first entry.
pub fn map_unique_violation(err: sqlx::Error, fields: &[&str]) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let field = field_for_constraint(db_err.constraint(), fields);
            return AppError::DuplicateEntry(field.to_string());
        }
    }
    AppError::DatabaseError(err)
}

fn field_for_constraint<'a>(constraint: Option<&str>, fields: &[&'a str]) -> &'a str {
    constraint
        .and_then(|name| {
            fields
                .iter()
                .find(|field| name.split('_').any(|part| part == **field))
        })
        .or_else(|| fields.first())
        .copied()
        .unwrap_or("value")
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_statuses() {
        let stock: AppError = DomainError::InsufficientStock {
            requested: 5,
            available: 2,
        }
        .into();
        assert_eq!(stock.status_and_detail().0, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(stock.status_and_detail().1.code, "INSUFFICIENT_STOCK");

        let conflict: AppError = shared::ensure_no_dependents("category", 2)
            .unwrap_err()
            .into();
        let (status, detail) = conflict.status_and_detail();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(detail.message, "Cannot delete category with 2 associated supplies");

        let quantity: AppError = DomainError::InvalidQuantity(0).into();
        let (status, detail) = quantity.status_and_detail();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(detail.field.as_deref(), Some("quantity"));
    }

    #[test]
    fn test_not_found_and_permission_codes() {
        let (status, detail) = AppError::NotFound("Supply".to_string()).status_and_detail();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(detail.message, "Supply not found");

        let (status, detail) =
            AppError::InsufficientPermissions("stock_movements".to_string()).status_and_detail();
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(detail.code, "INSUFFICIENT_PERMISSIONS");
    }

    #[test]
    fn test_foreign_batch_is_not_found() {
        let err: AppError = DomainError::BatchNotFound(uuid::Uuid::nil()).into();
        let (status, detail) = err.status_and_detail();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(detail.message, "Inventory batch not found");
    }

    #[test]
    fn test_unknown_user_and_missing_role_are_not_found() {
        for resource in ["User", "User role"] {
            let (status, detail) = AppError::NotFound(resource.to_string()).status_and_detail();
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(detail.code, "NOT_FOUND");
            assert_eq!(detail.message, format!("{resource} not found"));
        }
    }

    #[test]
    fn test_unique_violation_field_follows_constraint() {
        let fields = ["sku", "barcode"];
        assert_eq!(field_for_constraint(Some("supplies_barcode_key"), &fields), "barcode");
        assert_eq!(field_for_constraint(Some("supplies_sku_key"), &fields), "sku");
        assert_eq!(field_for_constraint(Some("supplies_pkey"), &fields), "sku");
        assert_eq!(field_for_constraint(None, &fields), "sku");
    }
}
