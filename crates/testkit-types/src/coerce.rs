//! Value coercion against a column type.
//!
//! [`SqlType::coerce`] is the write-time rule a column applies to every
//! value stored in it: lossless conversions are performed, oversized text
//! and binary is truncated, and anything else is rejected.

use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::sql_type::MAX_LENGTH;

const NANOS_PER_SECOND: u32 = 1_000_000_000;
use crate::{SqlType, SqlValue, TypeError};

impl SqlType {
    /// Coerce a non-NULL value into the representation this type stores.
    ///
    /// NULL is passed through unchanged; nullability is a column concern.
    pub fn coerce(&self, value: SqlValue) -> Result<SqlValue, TypeError> {
        if value.is_null() {
            return Ok(value);
        }

        match *self {
            Self::Bit => match value {
                SqlValue::Bool(_) => Ok(value),
                ref other => match other.as_i64() {
                    Some(0) => Ok(SqlValue::Bool(false)),
                    Some(1) => Ok(SqlValue::Bool(true)),
                    Some(v) => Err(out_of_range("bool", v)),
                    None => Err(TypeError::mismatch("bool", other)),
                },
            },
            Self::TinyInt => integer(&value, "u8").and_then(|v| {
                u8::try_from(v)
                    .map(SqlValue::TinyInt)
                    .map_err(|_| out_of_range("u8", v))
            }),
            Self::SmallInt => integer(&value, "i16").and_then(|v| {
                i16::try_from(v)
                    .map(SqlValue::SmallInt)
                    .map_err(|_| out_of_range("i16", v))
            }),
            Self::Int => integer(&value, "i32").and_then(|v| {
                i32::try_from(v)
                    .map(SqlValue::Int)
                    .map_err(|_| out_of_range("i32", v))
            }),
            Self::BigInt => integer(&value, "i64").map(SqlValue::BigInt),
            Self::Real => coerce_real(value),
            Self::Float => match value {
                SqlValue::Double(_) => Ok(value),
                SqlValue::Float(v) => Ok(SqlValue::Double(f64::from(v))),
                ref other => other
                    .as_i64()
                    .map(|v| SqlValue::Double(v as f64))
                    .ok_or_else(|| TypeError::mismatch("f64", other)),
            },
            Self::Decimal { precision, scale } => coerce_decimal(value, precision, scale),
            Self::NVarChar { max_length } => match value {
                SqlValue::String(s) => Ok(SqlValue::String(truncate_chars(s, max_length))),
                ref other => Err(TypeError::mismatch("String", other)),
            },
            Self::VarChar { max_length } => match value {
                SqlValue::String(s) if s.is_ascii() => {
                    Ok(SqlValue::String(truncate_chars(s, max_length)))
                }
                SqlValue::String(s) => Err(TypeError::OutOfRange {
                    target: "VARCHAR",
                    value: s,
                }),
                ref other => Err(TypeError::mismatch("String", other)),
            },
            Self::Xml => match value {
                SqlValue::Xml(_) => Ok(value),
                SqlValue::String(s) => Ok(SqlValue::Xml(s)),
                ref other => Err(TypeError::mismatch("Xml", other)),
            },
            Self::VarBinary { max_length } => match value {
                SqlValue::Binary(b) => Ok(SqlValue::Binary(truncate_bytes(b, max_length))),
                ref other => Err(TypeError::mismatch("Bytes", other)),
            },
            Self::UniqueIdentifier => match value {
                SqlValue::Uuid(_) => Ok(value),
                SqlValue::String(s) => Uuid::parse_str(s.trim())
                    .map(SqlValue::Uuid)
                    .map_err(|_| TypeError::OutOfRange {
                        target: "Uuid",
                        value: s,
                    }),
                ref other => Err(TypeError::mismatch("Uuid", other)),
            },
            Self::Date => match value {
                SqlValue::Date(_) => Ok(value),
                SqlValue::DateTime(dt) => Ok(SqlValue::Date(dt.date())),
                ref other => Err(TypeError::mismatch("NaiveDate", other)),
            },
            Self::Time { scale } => match value {
                SqlValue::Time(t) => truncate_time(t, scale).map(SqlValue::Time),
                ref other => Err(TypeError::mismatch("NaiveTime", other)),
            },
            Self::DateTime2 { scale } => match value {
                SqlValue::DateTime(dt) => truncate_datetime(dt, scale).map(SqlValue::DateTime),
                SqlValue::Date(d) => Ok(SqlValue::DateTime(d.and_time(NaiveTime::MIN))),
                ref other => Err(TypeError::mismatch("NaiveDateTime", other)),
            },
            Self::DateTimeOffset { scale } => match value {
                SqlValue::DateTimeOffset(dto) => {
                    let utc = truncate_datetime(dto.naive_utc(), scale)?;
                    Ok(SqlValue::DateTimeOffset(
                        DateTime::from_naive_utc_and_offset(utc, *dto.offset()),
                    ))
                }
                SqlValue::DateTime(dt) => {
                    let utc = truncate_datetime(dt, scale)?;
                    Ok(SqlValue::DateTimeOffset(
                        DateTime::<Utc>::from_naive_utc_and_offset(utc, Utc).fixed_offset(),
                    ))
                }
                ref other => Err(TypeError::mismatch("DateTime<FixedOffset>", other)),
            },
        }
    }
}

fn out_of_range(target: &'static str, value: impl ToString) -> TypeError {
    TypeError::OutOfRange {
        target,
        value: value.to_string(),
    }
}

fn integer(value: &SqlValue, expected: &'static str) -> Result<i64, TypeError> {
    value
        .as_i64()
        .ok_or_else(|| TypeError::mismatch(expected, value))
}

fn coerce_real(value: SqlValue) -> Result<SqlValue, TypeError> {
    match value {
        SqlValue::Float(_) => Ok(value),
        SqlValue::Double(v) if v.is_nan() => Ok(SqlValue::Float(f32::NAN)),
        SqlValue::Double(v) if v.is_finite() && v.abs() <= f64::from(f32::MAX) => {
            Ok(SqlValue::Float(v as f32))
        }
        SqlValue::Double(v) => Err(out_of_range("f32", v)),
        ref other => other
            .as_i64()
            .map(|v| SqlValue::Float(v as f32))
            .ok_or_else(|| TypeError::mismatch("f32", other)),
    }
}

fn coerce_decimal(value: SqlValue, precision: u8, scale: u8) -> Result<SqlValue, TypeError> {
    let decimal = match value {
        SqlValue::Decimal(d) => d,
        ref other => other
            .as_i64()
            .map(Decimal::from)
            .ok_or_else(|| TypeError::mismatch("Decimal", other))?,
    };

    let rounded = decimal.round_dp(u32::from(scale));
    if integer_digits(&rounded) > u32::from(precision.saturating_sub(scale)) {
        return Err(TypeError::Precision {
            precision,
            scale,
            value: decimal.to_string(),
        });
    }
    Ok(SqlValue::Decimal(rounded))
}

/// Number of digits left of the decimal point.
fn integer_digits(value: &Decimal) -> u32 {
    let mut mantissa = value.mantissa().unsigned_abs();
    let mut count: u32 = 0;
    while mantissa > 0 {
        mantissa /= 10;
        count += 1;
    }
    count.saturating_sub(value.scale())
}

fn truncate_chars(s: String, max_length: u16) -> String {
    if max_length == MAX_LENGTH {
        return s;
    }
    match s.char_indices().nth(usize::from(max_length)) {
        Some((end, _)) => s[..end].to_string(),
        None => s,
    }
}

fn truncate_bytes(b: Bytes, max_length: u16) -> Bytes {
    if max_length == MAX_LENGTH || b.len() <= usize::from(max_length) {
        b
    } else {
        b.slice(..usize::from(max_length))
    }
}

/// Truncate fractional seconds to `scale` digits.
///
/// Leap seconds (`nanosecond() >= 1e9` in chrono) have no SQL Server
/// representation and are rejected.
fn truncate_time(t: NaiveTime, scale: u8) -> Result<NaiveTime, TypeError> {
    if t.nanosecond() >= NANOS_PER_SECOND {
        return Err(out_of_range("NaiveTime", t));
    }
    let unit = 10u32.pow(9 - u32::from(scale.min(9)));
    let nanos = t.nanosecond() - t.nanosecond() % unit;
    Ok(t.with_nanosecond(nanos).unwrap_or(t))
}

fn truncate_datetime(dt: NaiveDateTime, scale: u8) -> Result<NaiveDateTime, TypeError> {
    Ok(dt.date().and_time(truncate_time(dt.time(), scale)?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_null_passes_through() {
        assert_eq!(SqlType::Int.coerce(SqlValue::Null).unwrap(), SqlValue::Null);
    }

    #[test]
    fn test_integer_widening_and_range() {
        assert_eq!(
            SqlType::BigInt.coerce(SqlValue::TinyInt(5)).unwrap(),
            SqlValue::BigInt(5)
        );
        assert_eq!(
            SqlType::TinyInt.coerce(SqlValue::Int(255)).unwrap(),
            SqlValue::TinyInt(255)
        );
        assert!(matches!(
            SqlType::TinyInt.coerce(SqlValue::Int(256)),
            Err(TypeError::OutOfRange { target: "u8", .. })
        ));
        assert!(matches!(
            SqlType::Int.coerce(SqlValue::String("1".into())),
            Err(TypeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_bit_accepts_zero_and_one() {
        assert_eq!(
            SqlType::Bit.coerce(SqlValue::Int(1)).unwrap(),
            SqlValue::Bool(true)
        );
        assert!(SqlType::Bit.coerce(SqlValue::Int(2)).is_err());
    }

    #[test]
    fn test_string_truncation() {
        let ty = SqlType::NVarChar { max_length: 3 };
        assert_eq!(
            ty.coerce(SqlValue::String("héllo".into())).unwrap(),
            SqlValue::String("hél".into())
        );
        let max = SqlType::NVarChar {
            max_length: MAX_LENGTH,
        };
        assert_eq!(
            max.coerce(SqlValue::String("unbounded".into())).unwrap(),
            SqlValue::String("unbounded".into())
        );
    }

    #[test]
    fn test_varchar_rejects_non_ascii() {
        let ty = SqlType::VarChar { max_length: 10 };
        assert!(ty.coerce(SqlValue::String("naïve".into())).is_err());
        assert!(ty.coerce(SqlValue::String("plain".into())).is_ok());
    }

    #[test]
    fn test_binary_truncation() {
        let ty = SqlType::VarBinary { max_length: 2 };
        assert_eq!(
            ty.coerce(SqlValue::Binary(Bytes::from_static(&[1, 2, 3])))
                .unwrap(),
            SqlValue::Binary(Bytes::from_static(&[1, 2]))
        );
    }

    #[test]
    fn test_decimal_rounding_and_precision() {
        let ty = SqlType::Decimal {
            precision: 5,
            scale: 2,
        };
        assert_eq!(
            ty.coerce(SqlValue::Decimal(Decimal::new(123_456, 4))).unwrap(),
            SqlValue::Decimal(Decimal::new(1235, 2))
        );
        assert_eq!(
            ty.coerce(SqlValue::Int(999)).unwrap(),
            SqlValue::Decimal(Decimal::from(999))
        );
        assert!(matches!(
            ty.coerce(SqlValue::Int(1000)),
            Err(TypeError::Precision { .. })
        ));
    }

    #[test]
    fn test_real_narrowing() {
        assert_eq!(
            SqlType::Real.coerce(SqlValue::Double(1.5)).unwrap(),
            SqlValue::Float(1.5)
        );
        assert!(SqlType::Real.coerce(SqlValue::Double(f64::MAX)).is_err());
    }

    #[test]
    fn test_uuid_from_string() {
        let id = Uuid::from_u128(0x1234);
        assert_eq!(
            SqlType::UniqueIdentifier
                .coerce(SqlValue::String(id.to_string()))
                .unwrap(),
            SqlValue::Uuid(id)
        );
        assert!(
            SqlType::UniqueIdentifier
                .coerce(SqlValue::String("nope".into()))
                .is_err()
        );
    }

    #[test]
    fn test_temporal_coercion() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let dt = date.and_hms_nano_opt(10, 30, 15, 123_456_789).unwrap();

        assert_eq!(
            SqlType::Date.coerce(SqlValue::DateTime(dt)).unwrap(),
            SqlValue::Date(date)
        );
        assert_eq!(
            SqlType::DateTime2 { scale: 3 }
                .coerce(SqlValue::DateTime(dt))
                .unwrap(),
            SqlValue::DateTime(date.and_hms_nano_opt(10, 30, 15, 123_000_000).unwrap())
        );
        assert_eq!(
            SqlType::DateTime2 { scale: 7 }
                .coerce(SqlValue::Date(date))
                .unwrap(),
            SqlValue::DateTime(date.and_hms_opt(0, 0, 0).unwrap())
        );

        let SqlValue::DateTimeOffset(dto) = SqlType::DateTimeOffset { scale: 0 }
            .coerce(SqlValue::DateTime(dt))
            .unwrap()
        else {
            unreachable!("DATETIMEOFFSET coerces to an offset datetime");
        };
        assert_eq!(dto.offset().local_minus_utc(), 0);
        assert_eq!(dto.naive_utc(), date.and_hms_opt(10, 30, 15).unwrap());
    }

    #[test]
    fn test_decimal_wide_precision() {
        // Decimal::MAX has 29 integer digits.
        assert_eq!(integer_digits(&Decimal::MAX), 29);
        assert_eq!(integer_digits(&Decimal::new(-12_345, 3)), 2);
        assert_eq!(integer_digits(&Decimal::new(5, 1)), 0);

        let wide = SqlType::Decimal {
            precision: 38,
            scale: 0,
        };
        assert_eq!(
            wide.coerce(SqlValue::Decimal(Decimal::MAX)).unwrap(),
            SqlValue::Decimal(Decimal::MAX)
        );
        let narrow = SqlType::Decimal {
            precision: 28,
            scale: 0,
        };
        assert!(matches!(
            narrow.coerce(SqlValue::Decimal(Decimal::MAX)),
            Err(TypeError::Precision { .. })
        ));
    }

    #[test]
    fn test_leap_second_rejected() {
        let leap = NaiveTime::from_hms_nano_opt(10, 0, 59, 1_500_000_000).unwrap();
        let date = NaiveDate::from_ymd_opt(2016, 12, 31).unwrap();

        assert!(matches!(
            SqlType::Time { scale: 7 }.coerce(SqlValue::Time(leap)),
            Err(TypeError::OutOfRange { target: "NaiveTime", .. })
        ));
        assert!(matches!(
            SqlType::DateTime2 { scale: 3 }.coerce(SqlValue::DateTime(date.and_time(leap))),
            Err(TypeError::OutOfRange { .. })
        ));
        assert!(matches!(
            SqlType::DateTimeOffset { scale: 7 }.coerce(SqlValue::DateTime(date.and_time(leap))),
            Err(TypeError::OutOfRange { .. })
        ));

        let last = NaiveTime::from_hms_nano_opt(10, 0, 59, 999_999_999).unwrap();
        assert_eq!(
            SqlType::Time { scale: 7 }.coerce(SqlValue::Time(last)).unwrap(),
            SqlValue::Time(NaiveTime::from_hms_nano_opt(10, 0, 59, 999_999_900).unwrap())
        );
    }
}
