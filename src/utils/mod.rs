//! Common utility functions
//!
//! Parameter validation helpers shared by the configuration sections.

pub mod validation;

pub use validation::{
    validate_positive,
    validate_range,
    validate_unit_interval,
    ValidationError,
    ValidationResult,
};
