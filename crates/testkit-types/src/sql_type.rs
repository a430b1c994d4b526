//! Column type declarations.
//!
//! A [`SqlType`] describes what a synthetic column may hold. It is parsed
//! from SQL declarations (`INT`, `NVARCHAR(100)`, `DECIMAL(18,2)`) and
//! carries a one-byte type identifier used by the snapshot format.
//!
//! Identifiers follow the fixed-length TDS type ids so the width of an
//! integer or float column can be recovered from the id alone.

use crate::TypeError;

/// Maximum length marker for `(MAX)` declarations.
pub const MAX_LENGTH: u16 = u16::MAX;

/// Largest precision accepted for DECIMAL columns.
pub const MAX_DECIMAL_PRECISION: u8 = 38;

/// Largest fractional seconds scale accepted for temporal columns.
pub const MAX_TIME_SCALE: u8 = 7;

/// Column type of a synthetic resultset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    /// BIT type (boolean).
    Bit,
    /// TINYINT type (u8).
    TinyInt,
    /// SMALLINT type (i16).
    SmallInt,
    /// INT type (i32).
    Int,
    /// BIGINT type (i64).
    BigInt,
    /// REAL type (f32).
    Real,
    /// FLOAT type (f64).
    Float,
    /// DECIMAL/NUMERIC type with precision and scale.
    Decimal {
        /// Maximum number of digits.
        precision: u8,
        /// Number of digits after decimal point.
        scale: u8,
    },
    /// NVARCHAR type with max length in characters.
    NVarChar {
        /// Maximum length in characters. Use [`MAX_LENGTH`] for MAX.
        max_length: u16,
    },
    /// VARCHAR type with max length in characters (ASCII only).
    VarChar {
        /// Maximum length in characters. Use [`MAX_LENGTH`] for MAX.
        max_length: u16,
    },
    /// VARBINARY type with max length.
    VarBinary {
        /// Maximum length in bytes. Use [`MAX_LENGTH`] for MAX.
        max_length: u16,
    },
    /// UNIQUEIDENTIFIER type (UUID).
    UniqueIdentifier,
    /// DATE type.
    Date,
    /// TIME type with scale.
    Time {
        /// Fractional seconds precision (0-7).
        scale: u8,
    },
    /// DATETIME2 type with scale.
    DateTime2 {
        /// Fractional seconds precision (0-7).
        scale: u8,
    },
    /// DATETIMEOFFSET type with scale.
    DateTimeOffset {
        /// Fractional seconds precision (0-7).
        scale: u8,
    },
    /// XML type.
    Xml,
}

impl SqlType {
    /// Infer the column type from an SQL type name string.
    ///
    /// This parses SQL type declarations like "INT", "NVARCHAR(100)", "DECIMAL(18,2)".
    #[must_use]
    pub fn from_sql_type(sql_type: &str) -> Option<Self> {
        Self::parse_declaration(&sql_type.trim().to_uppercase()).filter(|ty| ty.check().is_ok())
    }

    fn parse_declaration(sql_type: &str) -> Option<Self> {
        // Handle parameterized types
        if Self::has_base(sql_type, "NVARCHAR") {
            let max_length = Self::declared(sql_type, Self::parse_length, 4000)?;
            return Some(Self::NVarChar { max_length });
        }
        if Self::has_base(sql_type, "VARCHAR") {
            let max_length = Self::declared(sql_type, Self::parse_length, 8000)?;
            return Some(Self::VarChar { max_length });
        }
        if Self::has_base(sql_type, "VARBINARY") {
            let max_length = Self::declared(sql_type, Self::parse_length, 8000)?;
            return Some(Self::VarBinary { max_length });
        }
        if Self::has_base(sql_type, "DECIMAL") || Self::has_base(sql_type, "NUMERIC") {
            let (precision, scale) = Self::declared(sql_type, Self::parse_precision_scale, (18, 0))?;
            return Some(Self::Decimal { precision, scale });
        }
        if Self::has_base(sql_type, "DATETIMEOFFSET") {
            let scale = Self::declared(sql_type, Self::parse_scale, MAX_TIME_SCALE)?;
            return Some(Self::DateTimeOffset { scale });
        }
        if Self::has_base(sql_type, "DATETIME2") {
            let scale = Self::declared(sql_type, Self::parse_scale, MAX_TIME_SCALE)?;
            return Some(Self::DateTime2 { scale });
        }
        if Self::has_base(sql_type, "TIME") {
            let scale = Self::declared(sql_type, Self::parse_scale, MAX_TIME_SCALE)?;
            return Some(Self::Time { scale });
        }

        match sql_type {
            "BIT" => Some(Self::Bit),
            "TINYINT" => Some(Self::TinyInt),
            "SMALLINT" => Some(Self::SmallInt),
            "INT" | "INTEGER" => Some(Self::Int),
            "BIGINT" => Some(Self::BigInt),
            "REAL" => Some(Self::Real),
            "FLOAT" => Some(Self::Float),
            "UNIQUEIDENTIFIER" => Some(Self::UniqueIdentifier),
            "DATE" => Some(Self::Date),
            "XML" => Some(Self::Xml),
            _ => None,
        }
    }

    /// Check that lengths, precision and scale are within SQL Server limits.
    ///
    /// The variants are public, so a hand-built type can carry parameters
    /// no declaration would produce: a zero length, `DECIMAL(2,5)`,
    /// `DECIMAL(40,0)` or `TIME(9)`.
    pub fn check(&self) -> Result<(), TypeError> {
        match *self {
            Self::NVarChar { max_length: 0 }
            | Self::VarChar { max_length: 0 }
            | Self::VarBinary { max_length: 0 } => Err(TypeError::InvalidParameter {
                field: "max length",
                value: 0,
            }),
            Self::Decimal { precision, .. }
                if precision == 0 || precision > MAX_DECIMAL_PRECISION =>
            {
                Err(TypeError::InvalidParameter {
                    field: "decimal precision",
                    value: u64::from(precision),
                })
            }
            Self::Decimal { precision, scale } if scale > precision => {
                Err(TypeError::InvalidParameter {
                    field: "decimal scale",
                    value: u64::from(scale),
                })
            }
            Self::Time { scale } | Self::DateTime2 { scale } | Self::DateTimeOffset { scale }
                if scale > MAX_TIME_SCALE =>
            {
                Err(TypeError::InvalidParameter {
                    field: "time scale",
                    value: u64::from(scale),
                })
            }
            _ => Ok(()),
        }
    }

    /// Whether `sql_type` is `base` alone or `base(...)`.
    fn has_base(sql_type: &str, base: &str) -> bool {
        sql_type
            .strip_prefix(base)
            .is_some_and(|rest| rest.is_empty() || rest.trim_start().starts_with('('))
    }

    /// Apply `parse` when the declaration has arguments, else use `default`.
    fn declared<T>(sql_type: &str, parse: fn(&str) -> Option<T>, default: T) -> Option<T> {
        if sql_type.contains('(') {
            parse(sql_type)
        } else {
            Some(default)
        }
    }

    /// Parse length from types like "NVARCHAR(100)" or "NVARCHAR(MAX)".
    fn parse_length(sql_type: &str) -> Option<u16> {
        let inner = Self::parenthesized(sql_type)?;

        if inner.eq_ignore_ascii_case("MAX") {
            Some(MAX_LENGTH)
        } else {
            inner.parse().ok().filter(|len| *len > 0)
        }
    }

    /// Parse precision and scale from types like "DECIMAL(18,2)".
    fn parse_precision_scale(sql_type: &str) -> Option<(u8, u8)> {
        let inner = Self::parenthesized(sql_type)?;

        if let Some((precision, scale)) = inner.split_once(',') {
            Some((precision.trim().parse().ok()?, scale.trim().parse().ok()?))
        } else {
            Some((inner.parse().ok()?, 0))
        }
    }

    /// Parse scale from types like "TIME(3)" or "DATETIME2(7)".
    fn parse_scale(sql_type: &str) -> Option<u8> {
        Self::parenthesized(sql_type)?.parse().ok()
    }

    fn parenthesized(sql_type: &str) -> Option<&str> {
        let start = sql_type.find('(')?;
        let end = sql_type.find(')')?;
        sql_type.get(start + 1..end).map(str::trim)
    }

    /// Get the one-byte type identifier for this column type.
    #[must_use]
    pub const fn type_id(&self) -> u8 {
        match self {
            Self::Bit => 0x32,                   // BITTYPE
            Self::TinyInt => 0x30,               // INT1TYPE
            Self::SmallInt => 0x34,              // INT2TYPE
            Self::Int => 0x38,                   // INT4TYPE
            Self::BigInt => 0x7F,                // INT8TYPE
            Self::Real => 0x3B,                  // FLT4TYPE
            Self::Float => 0x3E,                 // FLT8TYPE
            Self::Decimal { .. } => 0x6C,        // DECIMALNTYPE
            Self::NVarChar { .. } => 0xE7,       // NVARCHARTYPE
            Self::VarChar { .. } => 0xA7,        // BIGVARCHARTYPE
            Self::VarBinary { .. } => 0xA5,      // BIGVARBINTYPE
            Self::UniqueIdentifier => 0x24,      // GUIDTYPE
            Self::Date => 0x28,                  // DATETYPE
            Self::Time { .. } => 0x29,           // TIMETYPE
            Self::DateTime2 { .. } => 0x2A,      // DATETIME2TYPE
            Self::DateTimeOffset { .. } => 0x2B, // DATETIMEOFFSETTYPE
            Self::Xml => 0xF1,                   // XMLTYPE
        }
    }

    /// Get the max length for this column type, if it has one.
    ///
    /// Fixed-width types report their byte width, character types their
    /// length in characters.
    #[must_use]
    pub const fn max_length(&self) -> Option<u16> {
        match self {
            Self::Bit | Self::TinyInt => Some(1),
            Self::SmallInt => Some(2),
            Self::Int | Self::Real => Some(4),
            Self::BigInt | Self::Float => Some(8),
            Self::Decimal { .. } => Some(17),
            Self::NVarChar { max_length }
            | Self::VarChar { max_length }
            | Self::VarBinary { max_length } => Some(*max_length),
            Self::UniqueIdentifier => Some(16),
            Self::Date
            | Self::Time { .. }
            | Self::DateTime2 { .. }
            | Self::DateTimeOffset { .. } => None,
            Self::Xml => Some(MAX_LENGTH),
        }
    }

    /// Whether values of this type are variable-length character data.
    #[must_use]
    pub const fn is_character(&self) -> bool {
        matches!(
            self,
            Self::NVarChar { .. } | Self::VarChar { .. } | Self::Xml
        )
    }

    /// SQL declaration text, e.g. `NVARCHAR(100)` or `DECIMAL(18,2)`.
    #[must_use]
    pub fn name(&self) -> String {
        fn length(max_length: u16) -> String {
            if max_length == MAX_LENGTH {
                "MAX".to_string()
            } else {
                max_length.to_string()
            }
        }

        match self {
            Self::Bit => "BIT".to_string(),
            Self::TinyInt => "TINYINT".to_string(),
            Self::SmallInt => "SMALLINT".to_string(),
            Self::Int => "INT".to_string(),
            Self::BigInt => "BIGINT".to_string(),
            Self::Real => "REAL".to_string(),
            Self::Float => "FLOAT".to_string(),
            Self::Decimal { precision, scale } => format!("DECIMAL({precision},{scale})"),
            Self::NVarChar { max_length } => format!("NVARCHAR({})", length(*max_length)),
            Self::VarChar { max_length } => format!("VARCHAR({})", length(*max_length)),
            Self::VarBinary { max_length } => format!("VARBINARY({})", length(*max_length)),
            Self::UniqueIdentifier => "UNIQUEIDENTIFIER".to_string(),
            Self::Date => "DATE".to_string(),
            Self::Time { scale } => format!("TIME({scale})"),
            Self::DateTime2 { scale } => format!("DATETIME2({scale})"),
            Self::DateTimeOffset { scale } => format!("DATETIMEOFFSET({scale})"),
            Self::Xml => "XML".to_string(),
        }
    }
}

impl std::fmt::Display for SqlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}
