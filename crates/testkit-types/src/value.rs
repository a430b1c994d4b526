//! Dynamic SQL values.

use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A single cell value of a synthetic resultset.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SqlValue {
    /// SQL NULL.
    #[default]
    Null,
    /// BIT value.
    Bool(bool),
    /// TINYINT value.
    TinyInt(u8),
    /// SMALLINT value.
    SmallInt(i16),
    /// INT value.
    Int(i32),
    /// BIGINT value.
    BigInt(i64),
    /// REAL value.
    Float(f32),
    /// FLOAT value.
    Double(f64),
    /// DECIMAL/NUMERIC value.
    Decimal(Decimal),
    /// Character data.
    String(String),
    /// Binary data.
    Binary(Bytes),
    /// UNIQUEIDENTIFIER value.
    Uuid(Uuid),
    /// DATE value.
    Date(NaiveDate),
    /// TIME value.
    Time(NaiveTime),
    /// DATETIME2 value.
    DateTime(NaiveDateTime),
    /// DATETIMEOFFSET value.
    DateTimeOffset(DateTime<FixedOffset>),
    /// XML document text.
    Xml(String),
}

impl SqlValue {
    /// Check if this value is NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Name of the variant, used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "bool",
            Self::TinyInt(_) => "u8",
            Self::SmallInt(_) => "i16",
            Self::Int(_) => "i32",
            Self::BigInt(_) => "i64",
            Self::Float(_) => "f32",
            Self::Double(_) => "f64",
            Self::Decimal(_) => "Decimal",
            Self::String(_) => "String",
            Self::Binary(_) => "Bytes",
            Self::Uuid(_) => "Uuid",
            Self::Date(_) => "NaiveDate",
            Self::Time(_) => "NaiveTime",
            Self::DateTime(_) => "NaiveDateTime",
            Self::DateTimeOffset(_) => "DateTime<FixedOffset>",
            Self::Xml(_) => "Xml",
        }
    }

    /// Widen any integer variant to `i64`.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::TinyInt(v) => Some(*v as i64),
            Self::SmallInt(v) => Some(*v as i64),
            Self::Int(v) => Some(*v as i64),
            Self::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Borrow the text of a string or XML value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Xml(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for SqlValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::TinyInt(v) => write!(f, "{v}"),
            Self::SmallInt(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::BigInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::String(v) | Self::Xml(v) => f.write_str(v),
            Self::Binary(v) => write!(f, "<{} bytes>", v.len()),
            Self::Uuid(v) => write!(f, "{v}"),
            Self::Date(v) => write!(f, "{v}"),
            Self::Time(v) => write!(f, "{v}"),
            Self::DateTime(v) => write!(f, "{v}"),
            Self::DateTimeOffset(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_default() {
        assert!(SqlValue::default().is_null());
        assert!(!SqlValue::Int(0).is_null());
    }

    #[test]
    fn test_integer_widening() {
        assert_eq!(SqlValue::TinyInt(200).as_i64(), Some(200));
        assert_eq!(SqlValue::SmallInt(-3).as_i64(), Some(-3));
        assert_eq!(SqlValue::Double(1.0).as_i64(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(SqlValue::Null.to_string(), "NULL");
        assert_eq!(SqlValue::String("abc".into()).to_string(), "abc");
        assert_eq!(
            SqlValue::Binary(Bytes::from_static(&[1, 2, 3])).to_string(),
            "<3 bytes>"
        );
    }
}
