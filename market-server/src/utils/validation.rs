//! Input validation helpers
//!
//! Centralized text length constants and validation functions used by
//! CRUD handlers before data reaches the repositories.

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: product, recipe, training lesson, etc.
pub const MAX_NAME_LEN: usize = 200;

/// Notes, descriptions, reasons (customization notes, rejection reason, ...)
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: phone, IFSC, category, oil type, spice level, etc.
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// URLs / image paths
pub const MAX_URL_LEN: usize = 2048;

/// Addresses
pub const MAX_ADDRESS_LEN: usize = 500;

/// Aadhaar numbers are exactly 12 digits
pub const AADHAAR_LEN: usize = 12;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Validate an Aadhaar number: exactly 12 digits.
pub fn validate_aadhaar(value: &str) -> Result<(), AppError> {
    if value.len() != AADHAAR_LEN || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::validation(
            "aadhaar_number must be exactly 12 digits".to_string(),
        ));
    }
    Ok(())
}

/// Validate a latitude/longitude pair.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), AppError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(AppError::validation(format!(
            "latitude must be between -90 and 90, got {latitude}"
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::validation(format!(
            "longitude must be between -180 and 180, got {longitude}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text_rejects_empty() {
        assert!(validate_required_text("  ", "name", MAX_NAME_LEN).is_err());
        assert!(validate_required_text("Mango Achar", "name", MAX_NAME_LEN).is_ok());
    }

    #[test]
    fn test_required_text_rejects_too_long() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(validate_required_text(&long, "name", MAX_NAME_LEN).is_err());
    }

    #[test]
    fn test_aadhaar_shape() {
        assert!(validate_aadhaar("123456789012").is_ok());
        assert!(validate_aadhaar("12345678901").is_err());
        assert!(validate_aadhaar("12345678901a").is_err());
    }

    #[test]
    fn test_coordinates_bounds() {
        assert!(validate_coordinates(26.8467, 80.9462).is_ok());
        assert!(validate_coordinates(91.0, 0.0).is_err());
        assert!(validate_coordinates(0.0, 181.0).is_err());
    }
}
