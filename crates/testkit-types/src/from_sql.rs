//! Strict extraction of Rust values from [`SqlValue`]s.

use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{SqlValue, TypeError};

/// Conversion from a [`SqlValue`] into a Rust type.
///
/// Conversions are strict: the value must already hold the requested type.
/// A value stored as `Int` cannot be read as `i64`, mirroring the typed
/// getters of a tabular data reader.
pub trait FromSql: Sized {
    /// Convert a non-NULL value, failing on NULL or a type mismatch.
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError>;

    /// Convert a value, mapping NULL to `None`.
    fn from_sql_nullable(value: &SqlValue) -> Result<Option<Self>, TypeError> {
        if value.is_null() {
            Ok(None)
        } else {
            Self::from_sql(value).map(Some)
        }
    }
}

macro_rules! impl_from_sql {
    ($ty:ty, $expected:literal, $($variant:ident)|+) => {
        impl FromSql for $ty {
            fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
                match value {
                    $(SqlValue::$variant(v) => Ok(v.clone()),)+
                    SqlValue::Null => Err(TypeError::UnexpectedNull),
                    other => Err(TypeError::mismatch($expected, other)),
                }
            }
        }
    };
}

impl_from_sql!(bool, "bool", Bool);
impl_from_sql!(u8, "u8", TinyInt);
impl_from_sql!(i16, "i16", SmallInt);
impl_from_sql!(i32, "i32", Int);
impl_from_sql!(i64, "i64", BigInt);
impl_from_sql!(f32, "f32", Float);
impl_from_sql!(f64, "f64", Double);
impl_from_sql!(Decimal, "Decimal", Decimal);
impl_from_sql!(String, "String", String | Xml);
impl_from_sql!(Bytes, "Bytes", Binary);
impl_from_sql!(Uuid, "Uuid", Uuid);
impl_from_sql!(NaiveDate, "NaiveDate", Date);
impl_from_sql!(NaiveTime, "NaiveTime", Time);
impl_from_sql!(NaiveDateTime, "NaiveDateTime", DateTime);
impl_from_sql!(DateTime<FixedOffset>, "DateTime<FixedOffset>", DateTimeOffset);

impl FromSql for Vec<u8> {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        Bytes::from_sql(value).map(|b| b.to_vec())
    }
}

impl FromSql for SqlValue {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        Ok(value.clone())
    }

    fn from_sql_nullable(value: &SqlValue) -> Result<Option<Self>, TypeError> {
        Ok(Some(value.clone()))
    }
}

impl<T: FromSql> FromSql for Option<T> {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        T::from_sql_nullable(value)
    }
}
