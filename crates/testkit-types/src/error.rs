//! Type conversion error types.

use thiserror::Error;

/// Errors raised when a value cannot be read as, or coerced into, a type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeError {
    /// A NULL was found where a value was required.
    #[error("unexpected NULL value")]
    UnexpectedNull,

    /// The value is of a different type than requested.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type.
        expected: &'static str,
        /// Actual type or description.
        actual: String,
    },

    /// The value does not fit in the target type.
    #[error("value {value} is out of range for {target}")]
    OutOfRange {
        /// Target type name.
        target: &'static str,
        /// Offending value.
        value: String,
    },

    /// A type carries a length, precision or scale outside its limits.
    #[error("invalid {field}: {value}")]
    InvalidParameter {
        /// Parameter name.
        field: &'static str,
        /// Offending value.
        value: u64,
    },

    /// A decimal has more digits than the column precision allows.
    #[error("value {value} exceeds DECIMAL({precision},{scale})")]
    Precision {
        /// Column precision.
        precision: u8,
        /// Column scale.
        scale: u8,
        /// Offending value.
        value: String,
    },
}

impl TypeError {
    pub(crate) fn mismatch(expected: &'static str, actual: &crate::SqlValue) -> Self {
        Self::TypeMismatch {
            expected,
            actual: actual.type_name().to_string(),
        }
    }
}
