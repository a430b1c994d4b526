//! Conversion of Rust values into [`SqlValue`]s.

use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::SqlValue;

/// Conversion of a Rust value into a [`SqlValue`].
pub trait ToSql {
    /// Convert to a dynamic value.
    fn to_sql(&self) -> SqlValue;
}

macro_rules! impl_to_sql {
    ($ty:ty, $variant:ident) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> SqlValue {
                SqlValue::$variant(self.clone())
            }
        }
    };
}

impl_to_sql!(bool, Bool);
impl_to_sql!(u8, TinyInt);
impl_to_sql!(i16, SmallInt);
impl_to_sql!(i32, Int);
impl_to_sql!(i64, BigInt);
impl_to_sql!(f32, Float);
impl_to_sql!(f64, Double);
impl_to_sql!(Decimal, Decimal);
impl_to_sql!(String, String);
impl_to_sql!(Bytes, Binary);
impl_to_sql!(Uuid, Uuid);
impl_to_sql!(NaiveDate, Date);
impl_to_sql!(NaiveTime, Time);
impl_to_sql!(NaiveDateTime, DateTime);
impl_to_sql!(DateTime<FixedOffset>, DateTimeOffset);

impl ToSql for str {
    fn to_sql(&self) -> SqlValue {
        SqlValue::String(self.to_string())
    }
}

impl ToSql for [u8] {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Binary(Bytes::copy_from_slice(self))
    }
}

impl ToSql for Vec<u8> {
    fn to_sql(&self) -> SqlValue {
        self.as_slice().to_sql()
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> SqlValue {
        self.clone()
    }
}

impl<T: ToSql + ?Sized> ToSql for &T {
    fn to_sql(&self) -> SqlValue {
        (**self).to_sql()
    }
}

impl<T: ToSql> ToSql for Option<T> {
    fn to_sql(&self) -> SqlValue {
        self.as_ref().map_or(SqlValue::Null, ToSql::to_sql)
    }
}
