//! The tabular record and reader contract.
//!
//! [`DataRecord`] is implemented by everything that exposes one row of
//! columns ([`ObjectRecord`](crate::ObjectRecord), and readers positioned on
//! a row). [`DataReader`] adds forward-only cursor movement over rows and
//! resultsets.

use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use testkit_types::{FromSql, SqlType, SqlValue, TypeError};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Read access to a single row of columns.
///
/// Typed getters are strict: a NULL yields [`Error::NullValue`] and any
/// other type than the requested one yields [`Error::InvalidCast`].
pub trait DataRecord {
    /// Number of columns.
    fn field_count(&self) -> Result<usize>;

    /// Name of the column at `ordinal`.
    fn name(&self, ordinal: usize) -> Result<&str>;

    /// Ordinal of the column called `name` (case-insensitive).
    fn ordinal(&self, name: &str) -> Result<usize>;

    /// Declared type of the column at `ordinal`.
    fn sql_type(&self, ordinal: usize) -> Result<SqlType>;

    /// Whether the column at `ordinal` accepts NULL.
    fn is_nullable(&self, ordinal: usize) -> Result<bool>;

    /// Raw value at `ordinal`.
    fn value(&self, ordinal: usize) -> Result<&SqlValue>;

    /// SQL declaration of the column type, e.g. `NVARCHAR(50)`.
    fn data_type_name(&self, ordinal: usize) -> Result<String> {
        self.sql_type(ordinal).map(|t| t.name())
    }

    /// Raw value of the column called `name`.
    fn value_by_name(&self, name: &str) -> Result<&SqlValue> {
        self.value(self.ordinal(name)?)
    }

    /// Copy values into `buffer`, returning how many were copied.
    ///
    /// Copies `min(buffer.len(), field_count)` values starting at ordinal 0.
    fn values(&self, buffer: &mut [SqlValue]) -> Result<usize> {
        let count = buffer.len().min(self.field_count()?);
        for (ordinal, slot) in buffer.iter_mut().take(count).enumerate() {
            *slot = self.value(ordinal)?.clone();
        }
        Ok(count)
    }

    /// Whether the value at `ordinal` is NULL.
    fn is_null(&self, ordinal: usize) -> Result<bool> {
        self.value(ordinal).map(SqlValue::is_null)
    }

    /// Read the value at `ordinal` as `bool`.
    fn get_bool(&self, ordinal: usize) -> Result<bool> {
        convert(self.value(ordinal)?, ordinal)
    }

    /// Read the value at `ordinal` as `u8`.
    fn get_u8(&self, ordinal: usize) -> Result<u8> {
        convert(self.value(ordinal)?, ordinal)
    }

    /// Read the value at `ordinal` as `i16`.
    fn get_i16(&self, ordinal: usize) -> Result<i16> {
        convert(self.value(ordinal)?, ordinal)
    }

    /// Read the value at `ordinal` as `i32`.
    fn get_i32(&self, ordinal: usize) -> Result<i32> {
        convert(self.value(ordinal)?, ordinal)
    }

    /// Read the value at `ordinal` as `i64`.
    fn get_i64(&self, ordinal: usize) -> Result<i64> {
        convert(self.value(ordinal)?, ordinal)
    }

    /// Read the value at `ordinal` as `f32`.
    fn get_f32(&self, ordinal: usize) -> Result<f32> {
        convert(self.value(ordinal)?, ordinal)
    }

    /// Read the value at `ordinal` as `f64`.
    fn get_f64(&self, ordinal: usize) -> Result<f64> {
        convert(self.value(ordinal)?, ordinal)
    }

    /// Read the value at `ordinal` as a decimal.
    fn get_decimal(&self, ordinal: usize) -> Result<Decimal> {
        convert(self.value(ordinal)?, ordinal)
    }

    /// Read the value at `ordinal` as a string (character or XML data).
    fn get_string(&self, ordinal: usize) -> Result<String> {
        convert(self.value(ordinal)?, ordinal)
    }

    /// Read the value at `ordinal` as a UUID.
    fn get_uuid(&self, ordinal: usize) -> Result<Uuid> {
        convert(self.value(ordinal)?, ordinal)
    }

    /// Read the value at `ordinal` as a date.
    fn get_date(&self, ordinal: usize) -> Result<NaiveDate> {
        convert(self.value(ordinal)?, ordinal)
    }

    /// Read the value at `ordinal` as a time of day.
    fn get_time(&self, ordinal: usize) -> Result<NaiveTime> {
        convert(self.value(ordinal)?, ordinal)
    }

    /// Read the value at `ordinal` as a datetime.
    fn get_datetime(&self, ordinal: usize) -> Result<NaiveDateTime> {
        convert(self.value(ordinal)?, ordinal)
    }

    /// Read the value at `ordinal` as a datetime with offset.
    fn get_datetime_offset(&self, ordinal: usize) -> Result<DateTime<FixedOffset>> {
        convert(self.value(ordinal)?, ordinal)
    }

    /// Copy binary data starting at `field_offset` into `buffer`.
    ///
    /// Returns the number of bytes copied, which is zero once
    /// `field_offset` reaches the end of the value.
    fn get_bytes(&self, ordinal: usize, field_offset: usize, buffer: &mut [u8]) -> Result<usize> {
        let data: Bytes = convert(self.value(ordinal)?, ordinal)?;
        let available = data.get(field_offset..).unwrap_or_default();
        let count = available.len().min(buffer.len());
        buffer[..count].copy_from_slice(&available[..count]);
        Ok(count)
    }

    /// Copy characters starting at `field_offset` into `buffer`.
    ///
    /// Offsets count characters, not bytes.
    fn get_chars(&self, ordinal: usize, field_offset: usize, buffer: &mut [char]) -> Result<usize> {
        let value = self.value(ordinal)?;
        let text = value
            .as_str()
            .ok_or_else(|| getter_error(value, ordinal, "String"))?;
        let mut count = 0;
        for (slot, c) in buffer.iter_mut().zip(text.chars().skip(field_offset)) {
            *slot = c;
            count += 1;
        }
        Ok(count)
    }

    /// Read the value at `ordinal` as any [`FromSql`] type.
    fn get<T: FromSql>(&self, ordinal: usize) -> Result<T>
    where
        Self: Sized,
    {
        field(self, ordinal)
    }

    /// Read the column called `name` as any [`FromSql`] type.
    fn get_by_name<T: FromSql>(&self, name: &str) -> Result<T>
    where
        Self: Sized,
    {
        field_by_name(self, name)
    }
}

/// Forward-only cursor over the rows of one or more resultsets.
pub trait DataReader: DataRecord {
    /// Advance to the next row of the current resultset.
    ///
    /// Returns `false` once the resultset is exhausted.
    fn read(&mut self) -> Result<bool>;

    /// Advance to the next resultset.
    ///
    /// Returns `false` once there are no more resultsets.
    fn next_result(&mut self) -> Result<bool>;

    /// Close the reader; further access fails.
    fn close(&mut self);

    /// Whether the reader has been closed.
    fn is_closed(&self) -> bool;

    /// Nesting depth of the current row.
    fn depth(&self) -> Result<usize>;

    /// Records affected by the current statement, -1 when not applicable.
    fn records_affected(&self) -> i32;
}

/// Construction of a value from a [`DataRecord`].
///
/// Usually derived with `#[derive(FromRecord)]` from the `testkit-derive`
/// crate, which reads each field by column name.
pub trait FromRecord: Sized {
    /// Build `Self` from the current values of `record`.
    fn from_record<R: DataRecord + ?Sized>(record: &R) -> Result<Self>;
}

/// Read the value at `ordinal` of any record as `T`.
pub fn field<T: FromSql, R: DataRecord + ?Sized>(record: &R, ordinal: usize) -> Result<T> {
    convert(record.value(ordinal)?, ordinal)
}

/// Read the column called `name` of any record as `T`.
pub fn field_by_name<T: FromSql, R: DataRecord + ?Sized>(record: &R, name: &str) -> Result<T> {
    field(record, record.ordinal(name)?)
}

fn convert<T: FromSql>(value: &SqlValue, ordinal: usize) -> Result<T> {
    T::from_sql(value).map_err(|e| Error::from_getter(ordinal, e))
}

fn getter_error(value: &SqlValue, ordinal: usize, expected: &'static str) -> Error {
    if value.is_null() {
        return Error::NullValue { ordinal };
    }
    Error::InvalidCast {
        ordinal,
        source: TypeError::TypeMismatch {
            expected,
            actual: value.type_name().to_string(),
        },
    }
}
