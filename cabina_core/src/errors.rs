//! # Error Types
//!
//! Structured error types for cabina_core. These errors carry enough context
//! for a caller (human or program) to understand which input was rejected
//! and why.
//!
//! ## Example
//!
//! ```rust
//! use cabina_core::errors::{CalcError, CalcResult};
//!
//! fn validate_current(current_a: f64) -> CalcResult<()> {
//!     if current_a <= 0.0 {
//!         return Err(CalcError::InvalidInput {
//!             field: "current_a".to_string(),
//!             value: current_a.to_string(),
//!             reason: "Current must be positive".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for cabina_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for calculation operations.
///
/// Each variant provides specific context about what went wrong,
/// enabling programmatic error handling by callers.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is invalid (out of range, not finite, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Time-current curve family not supported by the relay model
    #[error("Unsupported curve family: '{family}' (expected normal, very or extremely inverse)")]
    UnsupportedCurve { family: String },

    /// No catalog entry satisfies the requested value
    #[error("No standard {catalog} rating for {requested}")]
    RatingNotFound { catalog: String, requested: String },

    /// Calculation failed (non-physical intermediate result, etc.)
    #[error("Calculation failed: {calculation_type} - {reason}")]
    CalculationFailed {
        calculation_type: String,
        reason: String,
    },

    /// Configuration is inconsistent or could not be parsed
    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField {
            field: field.into(),
        }
    }

    /// Create an UnsupportedCurve error
    pub fn unsupported_curve(family: impl Into<String>) -> Self {
        CalcError::UnsupportedCurve {
            family: family.into(),
        }
    }

    /// Create a RatingNotFound error
    pub fn rating_not_found(catalog: impl Into<String>, requested: impl Into<String>) -> Self {
        CalcError::RatingNotFound {
            catalog: catalog.into(),
            requested: requested.into(),
        }
    }

    /// Create a CalculationFailed error
    pub fn calculation_failed(calculation_type: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::CalculationFailed {
            calculation_type: calculation_type.into(),
            reason: reason.into(),
        }
    }

    /// Create a ConfigError
    pub fn config(reason: impl Into<String>) -> Self {
        CalcError::ConfigError {
            reason: reason.into(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::UnsupportedCurve { .. } => "UNSUPPORTED_CURVE",
            CalcError::RatingNotFound { .. } => "RATING_NOT_FOUND",
            CalcError::CalculationFailed { .. } => "CALCULATION_FAILED",
            CalcError::ConfigError { .. } => "CONFIG_ERROR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

/// Reject values that are not finite and strictly positive.
///
/// Used by every `validate()` in the crate so the wording stays uniform.
pub(crate) fn require_positive(field: &str, value: f64) -> CalcResult<()> {
    if !value.is_finite() {
        return Err(CalcError::invalid_input(field, value.to_string(), "Value must be finite"));
    }
    if value <= 0.0 {
        return Err(CalcError::invalid_input(field, value.to_string(), "Value must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::invalid_input("rated_current_a", "-5.0", "Value must be positive");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"InvalidInput\""));
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::missing_field("test").error_code(), "MISSING_FIELD");
        assert_eq!(CalcError::unsupported_curve("ultra").error_code(), "UNSUPPORTED_CURVE");
        assert_eq!(
            CalcError::rating_not_found("transformer", "4000 kVA").error_code(),
            "RATING_NOT_FOUND"
        );
    }

    #[test]
    fn test_unsupported_curve_message_names_family() {
        let msg = CalcError::unsupported_curve("moderately inverse").to_string();
        assert!(msg.contains("moderately inverse"));
    }

    #[test]
    fn test_require_positive() {
        assert!(require_positive("x", 1.0).is_ok());
        assert!(require_positive("x", 0.0).is_err());
        assert!(require_positive("x", -3.0).is_err());
        assert!(require_positive("x", f64::NAN).is_err());
        assert!(require_positive("x", f64::INFINITY).is_err());
    }
}
