//! Error types for records, sets and readers.
//!
//! Every error belongs to one [`ErrorKind`], matching the exception family
//! a tabular data reader raises for the same misuse.

use testkit_protocol::ProtocolError;
use testkit_types::TypeError;
use thiserror::Error;

use crate::fakes::SqlException;

/// Result type alias using this crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by records, sets, readers and cached readers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The reader has been closed.
    #[error("reader is closed")]
    ReaderClosed,

    /// The reader is not positioned on a result set.
    #[error("no current result set")]
    NoCurrentResultSet,

    /// The reader is not positioned on a record.
    #[error("no current record, call read() first")]
    NoCurrentRecord,

    /// The reader's sets can no longer change because reading has started.
    #[error("result sets cannot be modified once reading has started")]
    ReadStarted,

    /// A record was added to a set with a different definition.
    #[error("record does not belong to this set's record set definition")]
    DefinitionMismatch,

    /// A column already belongs to another definition.
    #[error("column '{name}' already belongs to a record set definition (ordinal {ordinal})")]
    ColumnOwned {
        /// Column name.
        name: String,
        /// Ordinal in its owning definition.
        ordinal: usize,
    },

    /// A definition was created without columns.
    #[error("a record set definition requires at least one column")]
    EmptyDefinition,

    /// Column ordinal outside `0..field_count`.
    #[error("ordinal {ordinal} is out of range for {field_count} columns")]
    OrdinalOutOfRange {
        /// Requested ordinal.
        ordinal: usize,
        /// Number of columns.
        field_count: usize,
    },

    /// No column has the requested name.
    #[error("no column named '{0}'")]
    UnknownColumn(String),

    /// Index outside a collection.
    #[error("index {index} is out of range for {len} items")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Collection length.
        len: usize,
    },

    /// Wrong number of values for a record.
    #[error("expected {expected} values, got {actual}")]
    ValueCount {
        /// Field count of the definition.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },

    /// NULL written to a non-nullable column.
    #[error("column '{column}' does not accept NULL")]
    NotNullable {
        /// Column name.
        column: String,
    },

    /// A column type with a length, precision or scale outside its limits.
    #[error("column '{column}' has an invalid type: {source}")]
    InvalidColumnType {
        /// Column name.
        column: String,
        /// Underlying parameter failure.
        #[source]
        source: TypeError,
    },

    /// A value was rejected by its column.
    #[error("invalid value for column '{column}': {source}")]
    Validation {
        /// Column name.
        column: String,
        /// Underlying coercion failure.
        #[source]
        source: TypeError,
    },

    /// Typed access to a NULL value.
    #[error("data is NULL at ordinal {ordinal}")]
    NullValue {
        /// Column ordinal.
        ordinal: usize,
    },

    /// Typed access with the wrong type.
    #[error("invalid cast at ordinal {ordinal}: {source}")]
    InvalidCast {
        /// Column ordinal.
        ordinal: usize,
        /// Underlying conversion failure.
        #[source]
        source: TypeError,
    },

    /// A column declaration names an unknown SQL type.
    #[error("unknown SQL type: {0}")]
    UnknownType(String),

    /// Snapshot encoding or decoding failed.
    #[error("snapshot error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A fabricated server error.
    #[error(transparent)]
    Sql(#[from] SqlException),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Exception family of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The object is in the wrong state for the call.
    InvalidOperation,
    /// A typed getter found NULL.
    NullValue,
    /// A typed getter found another type.
    InvalidCast,
    /// An argument was rejected.
    Argument,
    /// An index, ordinal or name is out of range.
    OutOfRange,
    /// A snapshot buffer is malformed.
    Format,
    /// Configuration is invalid.
    Config,
    /// A fabricated server error was raised.
    Server,
}

impl Error {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ReaderClosed
            | Self::NoCurrentResultSet
            | Self::NoCurrentRecord
            | Self::ReadStarted
            | Self::ColumnOwned { .. } => ErrorKind::InvalidOperation,
            Self::NullValue { .. } => ErrorKind::NullValue,
            Self::InvalidCast { .. } => ErrorKind::InvalidCast,
            Self::DefinitionMismatch
            | Self::ValueCount { .. }
            | Self::NotNullable { .. }
            | Self::Validation { .. }
            | Self::InvalidColumnType { .. }
            | Self::UnknownType(_) => ErrorKind::Argument,
            Self::EmptyDefinition
            | Self::OrdinalOutOfRange { .. }
            | Self::UnknownColumn(_)
            | Self::IndexOutOfRange { .. } => ErrorKind::OutOfRange,
            Self::Protocol(_) => ErrorKind::Format,
            Self::Config(_) => ErrorKind::Config,
            Self::Sql(_) => ErrorKind::Server,
        }
    }

    /// Map a conversion failure on a typed getter.
    pub(crate) fn from_getter(ordinal: usize, source: TypeError) -> Self {
        match source {
            TypeError::UnexpectedNull => Self::NullValue { ordinal },
            source => Self::InvalidCast { ordinal, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::ReaderClosed.kind(), ErrorKind::InvalidOperation);
        assert_eq!(Error::ReadStarted.kind(), ErrorKind::InvalidOperation);
        assert_eq!(Error::DefinitionMismatch.kind(), ErrorKind::Argument);
        assert_eq!(Error::EmptyDefinition.kind(), ErrorKind::OutOfRange);
        assert_eq!(
            Error::from_getter(2, TypeError::UnexpectedNull).kind(),
            ErrorKind::NullValue
        );
        assert_eq!(
            Error::from_getter(
                2,
                TypeError::TypeMismatch {
                    expected: "i32",
                    actual: "String".into()
                }
            )
            .kind(),
            ErrorKind::InvalidCast
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::OrdinalOutOfRange {
            ordinal: 5,
            field_count: 2,
        };
        assert_eq!(err.to_string(), "ordinal 5 is out of range for 2 columns");
        assert_eq!(
            Error::NullValue { ordinal: 1 }.to_string(),
            "data is NULL at ordinal 1"
        );
    }
}
