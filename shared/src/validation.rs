//! Validation utilities for catalog and stock inputs
//!
//! Field-level checks return [`validator::ValidationError`] so they can be used
//! from `#[validate(custom = "...")]` on request types.

use std::borrow::Cow;

use validator::ValidationError;

use crate::error::{DomainError, DomainResult};

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

// ============================================================================
// Field Validations
// ============================================================================

/// SKU: 2-32 characters of uppercase letters, digits and dashes
pub fn validate_sku(sku: &str) -> Result<(), ValidationError> {
    if sku.len() < 2 || sku.len() > 32 {
        return Err(invalid("sku_length", "SKU must be 2 to 32 characters"));
    }
    if !sku
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(invalid(
            "sku_format",
            "SKU must contain only uppercase letters, digits and dashes",
        ));
    }
    Ok(())
}

/// Display color in `#RRGGBB` form
pub fn validate_color(color: &str) -> Result<(), ValidationError> {
    let hex = color.strip_prefix('#').unwrap_or("");
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(invalid("color_format", "Color must be in #RRGGBB format"))
    }
}

/// Barcodes are digits only (EAN/UPC style), 8 to 14 long
pub fn validate_barcode(barcode: &str) -> Result<(), ValidationError> {
    let len_ok = (8..=14).contains(&barcode.len());
    if len_ok && barcode.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(invalid("barcode_format", "Barcode must be 8 to 14 digits"))
    }
}

// ============================================================================
// Stock Rules
// ============================================================================

/// Validate a supply's stock thresholds as a whole
pub fn validate_stock_thresholds(
    minimum_stock: i64,
    maximum_stock: i64,
    reorder_point: i64,
    reorder_quantity: i64,
) -> DomainResult<()> {
    let fields = [
        ("minimum_stock", minimum_stock),
        ("maximum_stock", maximum_stock),
        ("reorder_point", reorder_point),
        ("reorder_quantity", reorder_quantity),
    ];
    for (field, value) in fields {
        if value < 0 {
            return Err(DomainError::validation(field, "must not be negative"));
        }
    }
    if minimum_stock > maximum_stock {
        return Err(DomainError::validation(
            "maximum_stock",
            "must be greater than or equal to minimum_stock",
        ));
    }
    if reorder_quantity == 0 {
        return Err(DomainError::validation(
            "reorder_quantity",
            "must be greater than zero",
        ));
    }
    Ok(())
}

/// Movement and batch quantities are whole positive units
pub fn validate_positive_quantity(quantity: i64) -> DomainResult<()> {
    if quantity <= 0 {
        return Err(DomainError::InvalidQuantity(quantity));
    }
    Ok(())
}
