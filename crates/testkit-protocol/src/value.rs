//! Column value encoding.
//!
//! Values are written without a per-value type byte: the column's
//! [`SqlType`] from COLMETADATA decides the layout. NULLs never reach this
//! module, they live in the row's null bitmap.

use bytes::{Buf, BufMut};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::Decimal;
use testkit_types::{SqlType, SqlValue};
use uuid::Uuid;

use crate::codec::{ensure_remaining, read_l_bytes, read_l_utf16, write_l_bytes, write_l_utf16};
use crate::error::ProtocolError;

const NANOS_PER_SECOND: u64 = 1_000_000_000;
const SECONDS_PER_DAY: u64 = 86_400;

/// Largest decimal scale `rust_decimal` can represent.
const MAX_DECIMAL_SCALE: u8 = 28;

/// Encode a non-NULL value for a column of type `sql_type`.
///
/// `column` is only used to report mismatches.
pub fn encode_value(
    dst: &mut impl BufMut,
    sql_type: &SqlType,
    value: &SqlValue,
    column: usize,
) -> Result<(), ProtocolError> {
    match (sql_type, value) {
        (SqlType::Bit, SqlValue::Bool(v)) => dst.put_u8(u8::from(*v)),
        (SqlType::TinyInt, SqlValue::TinyInt(v)) => dst.put_u8(*v),
        (SqlType::SmallInt, SqlValue::SmallInt(v)) => dst.put_i16_le(*v),
        (SqlType::Int, SqlValue::Int(v)) => dst.put_i32_le(*v),
        (SqlType::BigInt, SqlValue::BigInt(v)) => dst.put_i64_le(*v),
        (SqlType::Real, SqlValue::Float(v)) => dst.put_f32_le(*v),
        (SqlType::Float, SqlValue::Double(v)) => dst.put_f64_le(*v),
        (SqlType::Decimal { .. }, SqlValue::Decimal(v)) => dst.put_slice(&v.serialize()),
        (SqlType::NVarChar { .. }, SqlValue::String(v)) | (SqlType::Xml, SqlValue::Xml(v)) => {
            write_l_utf16(dst, v)?;
        }
        (SqlType::VarChar { .. }, SqlValue::String(v)) => write_l_bytes(dst, v.as_bytes())?,
        (SqlType::VarBinary { .. }, SqlValue::Binary(v)) => write_l_bytes(dst, v)?,
        (SqlType::UniqueIdentifier, SqlValue::Uuid(v)) => dst.put_slice(v.as_bytes()),
        (SqlType::Date, SqlValue::Date(v)) => put_date(dst, v),
        (SqlType::Time { .. }, SqlValue::Time(v)) => put_time(dst, v)?,
        (SqlType::DateTime2 { .. }, SqlValue::DateTime(v)) => {
            put_date(dst, &v.date());
            put_time(dst, &v.time())?;
        }
        (SqlType::DateTimeOffset { .. }, SqlValue::DateTimeOffset(v)) => {
            let utc = v.naive_utc();
            put_date(dst, &utc.date());
            put_time(dst, &utc.time())?;
            dst.put_i32_le(v.offset().local_minus_utc());
        }
        (sql_type, value) => {
            return Err(ProtocolError::ValueMismatch {
                column,
                sql_type: sql_type.name(),
                actual: value.type_name(),
            });
        }
    }
    Ok(())
}

/// Decode a non-NULL value of type `sql_type`.
pub fn decode_value(src: &mut impl Buf, sql_type: &SqlType) -> Result<SqlValue, ProtocolError> {
    let value = match sql_type {
        SqlType::Bit => {
            ensure_remaining(src, 1)?;
            match src.get_u8() {
                0 => SqlValue::Bool(false),
                1 => SqlValue::Bool(true),
                other => {
                    return Err(ProtocolError::InvalidField {
                        field: "bit",
                        value: u64::from(other),
                    });
                }
            }
        }
        SqlType::TinyInt => {
            ensure_remaining(src, 1)?;
            SqlValue::TinyInt(src.get_u8())
        }
        SqlType::SmallInt => {
            ensure_remaining(src, 2)?;
            SqlValue::SmallInt(src.get_i16_le())
        }
        SqlType::Int => {
            ensure_remaining(src, 4)?;
            SqlValue::Int(src.get_i32_le())
        }
        SqlType::BigInt => {
            ensure_remaining(src, 8)?;
            SqlValue::BigInt(src.get_i64_le())
        }
        SqlType::Real => {
            ensure_remaining(src, 4)?;
            SqlValue::Float(src.get_f32_le())
        }
        SqlType::Float => {
            ensure_remaining(src, 8)?;
            SqlValue::Double(src.get_f64_le())
        }
        SqlType::Decimal { .. } => {
            ensure_remaining(src, 16)?;
            let mut raw = [0u8; 16];
            src.copy_to_slice(&mut raw);
            // Flags are little endian; the scale lives in bits 16..24.
            if raw[2] > MAX_DECIMAL_SCALE {
                return Err(ProtocolError::InvalidField {
                    field: "decimal scale",
                    value: u64::from(raw[2]),
                });
            }
            SqlValue::Decimal(Decimal::deserialize(raw))
        }
        SqlType::NVarChar { .. } => SqlValue::String(read_l_utf16(src)?),
        SqlType::Xml => SqlValue::Xml(read_l_utf16(src)?),
        SqlType::VarChar { .. } => {
            let raw = read_l_bytes(src)?;
            SqlValue::String(
                String::from_utf8(raw.to_vec())
                    .map_err(|e| ProtocolError::StringEncoding(e.to_string()))?,
            )
        }
        SqlType::VarBinary { .. } => SqlValue::Binary(read_l_bytes(src)?),
        SqlType::UniqueIdentifier => {
            ensure_remaining(src, 16)?;
            let mut raw = [0u8; 16];
            src.copy_to_slice(&mut raw);
            SqlValue::Uuid(Uuid::from_bytes(raw))
        }
        SqlType::Date => SqlValue::Date(get_date(src)?),
        SqlType::Time { .. } => SqlValue::Time(get_time(src)?),
        SqlType::DateTime2 { .. } => {
            let date = get_date(src)?;
            let time = get_time(src)?;
            SqlValue::DateTime(NaiveDateTime::new(date, time))
        }
        SqlType::DateTimeOffset { .. } => {
            let date = get_date(src)?;
            let time = get_time(src)?;
            ensure_remaining(src, 4)?;
            let seconds = src.get_i32_le();
            let offset = FixedOffset::east_opt(seconds).ok_or(ProtocolError::InvalidField {
                field: "offset seconds",
                value: u64::from(seconds.unsigned_abs()),
            })?;
            SqlValue::DateTimeOffset(DateTime::from_naive_utc_and_offset(
                NaiveDateTime::new(date, time),
                offset,
            ))
        }
    };
    Ok(value)
}

fn put_date(dst: &mut impl BufMut, date: &NaiveDate) {
    dst.put_i32_le(date.num_days_from_ce());
}

fn get_date(src: &mut impl Buf) -> Result<NaiveDate, ProtocolError> {
    ensure_remaining(src, 4)?;
    let days = src.get_i32_le();
    NaiveDate::from_num_days_from_ce_opt(days).ok_or(ProtocolError::InvalidField {
        field: "date days",
        value: u64::from(days.unsigned_abs()),
    })
}

fn put_time(dst: &mut impl BufMut, time: &NaiveTime) -> Result<(), ProtocolError> {
    // chrono keeps a leap second as an extra second of nanoseconds.
    let fraction = u64::from(time.nanosecond());
    if fraction >= NANOS_PER_SECOND {
        return Err(ProtocolError::InvalidField {
            field: "time nanoseconds",
            value: fraction,
        });
    }
    let nanos = u64::from(time.num_seconds_from_midnight()) * NANOS_PER_SECOND + fraction;
    dst.put_u64_le(nanos);
    Ok(())
}

fn get_time(src: &mut impl Buf) -> Result<NaiveTime, ProtocolError> {
    ensure_remaining(src, 8)?;
    let nanos = src.get_u64_le();
    let invalid = ProtocolError::InvalidField {
        field: "time nanoseconds",
        value: nanos,
    };

    let seconds = nanos / NANOS_PER_SECOND;
    if seconds >= SECONDS_PER_DAY {
        return Err(invalid);
    }
    // Both parts were range checked above.
    NaiveTime::from_num_seconds_from_midnight_opt(
        seconds as u32,
        (nanos % NANOS_PER_SECOND) as u32,
    )
    .ok_or(invalid)
}

/// Encoded size of a value whose layout does not depend on its content.
#[must_use]
pub const fn fixed_width(sql_type: &SqlType) -> Option<usize> {
    match sql_type {
        SqlType::Bit | SqlType::TinyInt => Some(1),
        SqlType::SmallInt => Some(2),
        SqlType::Int | SqlType::Real | SqlType::Date => Some(4),
        SqlType::BigInt | SqlType::Float | SqlType::Time { .. } => Some(8),
        SqlType::Decimal { .. } | SqlType::UniqueIdentifier => Some(16),
        SqlType::DateTime2 { .. } => Some(12),
        SqlType::DateTimeOffset { .. } => Some(16),
        SqlType::NVarChar { .. }
        | SqlType::VarChar { .. }
        | SqlType::VarBinary { .. }
        | SqlType::Xml => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bytes::{Bytes, BytesMut};

    fn round_trip(sql_type: SqlType, value: SqlValue) -> SqlValue {
        let mut buf = BytesMut::new();
        encode_value(&mut buf, &sql_type, &value, 0).unwrap();
        if let Some(width) = fixed_width(&sql_type) {
            assert_eq!(buf.len(), width, "width of {sql_type}");
        }
        let mut src = buf.freeze();
        let decoded = decode_value(&mut src, &sql_type).unwrap();
        assert!(src.is_empty());
        decoded
    }

    #[test]
    fn test_temporal_values_survive() {
        let date = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
        let dt = date.and_hms_nano_opt(23, 59, 59, 999_999_900).unwrap();
        let offset = FixedOffset::east_opt(-5 * 3600).unwrap();
        let dto = DateTime::from_naive_utc_and_offset(dt, offset);

        assert_eq!(
            round_trip(SqlType::DateTime2 { scale: 7 }, SqlValue::DateTime(dt)),
            SqlValue::DateTime(dt)
        );
        let SqlValue::DateTimeOffset(decoded) = round_trip(
            SqlType::DateTimeOffset { scale: 7 },
            SqlValue::DateTimeOffset(dto),
        ) else {
            unreachable!("DATETIMEOFFSET decodes to an offset datetime");
        };
        assert_eq!(decoded, dto);
        assert_eq!(decoded.offset().local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn test_strings_and_binary() {
        assert_eq!(
            round_trip(
                SqlType::NVarChar { max_length: 10 },
                SqlValue::String("日本語".into())
            ),
            SqlValue::String("日本語".into())
        );
        assert_eq!(
            round_trip(SqlType::VarChar { max_length: 10 }, SqlValue::String("abc".into())),
            SqlValue::String("abc".into())
        );
        assert_eq!(
            round_trip(
                SqlType::VarBinary { max_length: 4 },
                SqlValue::Binary(Bytes::from_static(&[0, 1, 2]))
            ),
            SqlValue::Binary(Bytes::from_static(&[0, 1, 2]))
        );
    }

    #[test]
    fn test_decimal_keeps_scale() {
        let value = SqlValue::Decimal(Decimal::new(-12_345, 3));
        assert_eq!(
            round_trip(
                SqlType::Decimal {
                    precision: 9,
                    scale: 3
                },
                value.clone()
            ),
            value
        );
    }

    #[test]
    fn test_mismatched_value_is_rejected() {
        let mut buf = BytesMut::new();
        let err = encode_value(&mut buf, &SqlType::Int, &SqlValue::BigInt(1), 4).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::ValueMismatch {
                column: 4,
                actual: "i64",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_bit_and_time() {
        let mut src = Bytes::from_static(&[2]);
        assert!(decode_value(&mut src, &SqlType::Bit).is_err());

        let mut buf = BytesMut::new();
        buf.put_u64_le(SECONDS_PER_DAY * NANOS_PER_SECOND);
        let mut src = buf.freeze();
        assert!(matches!(
            decode_value(&mut src, &SqlType::Time { scale: 7 }),
            Err(ProtocolError::InvalidField { field: "time nanoseconds", .. })
        ));
    }

    #[test]
    fn test_leap_second_not_encoded() {
        let leap = NaiveTime::from_hms_nano_opt(10, 0, 59, 1_500_000_000).unwrap();
        let mut buf = BytesMut::new();
        assert!(matches!(
            encode_value(&mut buf, &SqlType::Time { scale: 7 }, &SqlValue::Time(leap), 0),
            Err(ProtocolError::InvalidField { field: "time nanoseconds", .. })
        ));

        let last = NaiveTime::from_hms_nano_opt(10, 0, 59, 999_999_999).unwrap();
        assert_eq!(
            round_trip(SqlType::Time { scale: 7 }, SqlValue::Time(last)),
            SqlValue::Time(last)
        );
    }

    #[test]
    fn test_truncated_value() {
        let mut src = Bytes::from_static(&[1, 2]);
        assert!(matches!(
            decode_value(&mut src, &SqlType::Int),
            Err(ProtocolError::IncompleteToken { expected: 4, actual: 2 })
        ));
    }
}
