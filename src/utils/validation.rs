//! Validation utilities for simulation parameters
//!
//! Range and consistency checks shared by the configuration sections.

use std::fmt;

/// Validation result type
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Value out of valid range
    OutOfRange {
        field: String,
        value: String,
        min: String,
        max: String,
    },
    /// Invalid field format
    InvalidFormat {
        field: String,
        value: String,
        expected: String,
    },
    /// A list that must hold at least one entry is empty
    EmptyList(String),
    /// Cross-field validation failure
    ConstraintViolation {
        fields: Vec<String>,
        message: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::OutOfRange { field, value, min, max } => {
                write!(f, "Field '{}' value '{}' is out of range [{}, {}]", field, value, min, max)
            }
            ValidationError::InvalidFormat { field, value, expected } => {
                write!(f, "Field '{}' has invalid format '{}', expected {}", field, value, expected)
            }
            ValidationError::EmptyList(field) => {
                write!(f, "Field '{}' must contain at least one entry", field)
            }
            ValidationError::ConstraintViolation { fields, message } => {
                write!(f, "Constraint violation for fields [{}]: {}", fields.join(", "), message)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check `min <= value <= max`; NaN always fails
pub fn validate_range(field: &str, value: f64, min: f64, max: f64) -> ValidationResult<()> {
    if value.is_nan() || value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value: value.to_string(),
            min: min.to_string(),
            max: if max == f64::MAX { "unbounded".to_string() } else { max.to_string() },
        });
    }
    Ok(())
}

/// Check a probability-like value in `[0, 1]`
pub fn validate_unit_interval(field: &str, value: f64) -> ValidationResult<()> {
    validate_range(field, value, 0.0, 1.0)
}

/// Check a strictly positive, finite value
pub fn validate_positive(field: &str, value: f64) -> ValidationResult<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value: value.to_string(),
            min: "0 (exclusive)".to_string(),
            max: "unbounded".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_range() {
        assert!(validate_range("strength", 0.6, 0.0, 1.0).is_ok());
        assert!(validate_range("strength", 0.0, 0.0, 1.0).is_ok());
        assert!(validate_range("strength", 1.2, 0.0, 1.0).is_err());
        assert!(validate_range("strength", f64::NAN, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive("smup_min", 0.025).is_ok());
        assert!(validate_positive("smup_min", 0.0).is_err());
        assert!(validate_positive("smup_min", f64::INFINITY).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = validate_unit_interval("experiment.reinnervation_strengths", 1.5).unwrap_err();
        let display = err.to_string();
        assert!(display.contains("experiment.reinnervation_strengths"));
        assert!(display.contains("1.5"));

        let err = validate_range("scan.margin", -1.0, 0.0, f64::MAX).unwrap_err();
        assert!(err.to_string().contains("unbounded"));
    }
}
