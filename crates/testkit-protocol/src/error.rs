//! Snapshot format error types.

use thiserror::Error;

/// Errors that can occur while decoding a snapshot buffer.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The buffer does not start with the snapshot magic.
    #[error("invalid snapshot magic: {0:02x?}")]
    InvalidMagic([u8; 4]),

    /// Snapshot format version this decoder does not understand.
    #[error("unsupported snapshot version: {0}")]
    UnsupportedVersion(u16),

    /// Token data is truncated or incomplete.
    #[error("incomplete token: expected {expected} bytes, got {actual}")]
    IncompleteToken {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes available.
        actual: usize,
    },

    /// Invalid token type value.
    #[error("invalid token type: {0:#x}")]
    InvalidTokenType(u8),

    /// Invalid data type value.
    #[error("invalid data type: {0:#x}")]
    InvalidDataType(u8),

    /// String encoding error.
    #[error("string encoding error: {0}")]
    StringEncoding(String),

    /// Unexpected end of stream.
    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// Invalid field value in a snapshot structure.
    #[error("invalid {field} value: {value}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// Invalid value.
        value: u64,
    },

    /// A value does not match the type declared by its column.
    #[error("column {column} holds {actual}, which {sql_type} cannot encode")]
    ValueMismatch {
        /// Column ordinal.
        column: usize,
        /// Declared column type.
        sql_type: String,
        /// Type of the offending value.
        actual: &'static str,
    },

    /// A string or binary value is too large for its length prefix.
    #[error("value too large: {length} bytes (max {max})")]
    ValueTooLarge {
        /// Actual length.
        length: usize,
        /// Maximum encodable length.
        max: usize,
    },
}
