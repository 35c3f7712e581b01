//! # Error Types
//!
//! Structured error types for estimate_core. The engine's calculators are
//! total and never return these; errors only surface from validation at
//! declaration time, from the strict lookup policies, and from file I/O.
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::errors::{CalcError, CalcResult};
//!
//! fn validate_length(length_m: f64) -> CalcResult<()> {
//!     if length_m <= 0.0 {
//!         return Err(CalcError::InvalidInput {
//!             field: "length_m".to_string(),
//!             value: length_m.to_string(),
//!             reason: "Scrap length must be positive".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for estimate_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// How a lookup miss is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LookupPolicy {
    /// Fall back to a default (straight bar, 0 kg/m) and log a warning
    #[default]
    Lenient,
    /// Report a typed error
    Strict,
}

/// Structured error type for estimation operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is invalid (out of range, wrong type, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// A bar line item references a shape that is not in the registry
    #[error("Unknown shape: {shape_ref}")]
    UnknownShape { shape_ref: String },

    /// Bar diameter has no entry in the unit weight table
    #[error("Unsupported bar diameter: {diameter_mm} mm")]
    UnsupportedDiameter { diameter_mm: u32 },

    /// A legacy cutting-length formula could not be evaluated
    #[error("Formula error in '{formula}' at {position}: {reason}")]
    FormulaError {
        formula: String,
        position: usize,
        reason: String,
    },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

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

    /// Create an UnknownShape error
    pub fn unknown_shape(shape_ref: impl Into<String>) -> Self {
        CalcError::UnknownShape {
            shape_ref: shape_ref.into(),
        }
    }

    /// Create an UnsupportedDiameter error
    pub fn unsupported_diameter(diameter_mm: u32) -> Self {
        CalcError::UnsupportedDiameter { diameter_mm }
    }

    /// Create a FormulaError
    pub fn formula(formula: impl Into<String>, position: usize, reason: impl Into<String>) -> Self {
        CalcError::FormulaError {
            formula: formula.into(),
            position,
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error stems from bad data entry rather than I/O
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CalcError::InvalidInput { .. }
                | CalcError::MissingField { .. }
                | CalcError::UnknownShape { .. }
                | CalcError::UnsupportedDiameter { .. }
                | CalcError::FormulaError { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::UnknownShape { .. } => "UNKNOWN_SHAPE",
            CalcError::UnsupportedDiameter { .. } => "UNSUPPORTED_DIAMETER",
            CalcError::FormulaError { .. } => "FORMULA_ERROR",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(err: serde_json::Error) -> Self {
        CalcError::SerializationError {
            reason: err.to_string(),
        }
    }
}
