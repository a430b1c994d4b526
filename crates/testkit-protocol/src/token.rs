//! Snapshot token definitions.
//!
//! A snapshot is a stream of tokens borrowed from the TDS response layout:
//! column metadata opens a resultset, null-bitmap compressed rows carry its
//! data and a done token closes it.

use bitflags::bitflags;
use bytes::{Buf, BufMut};
use testkit_types::{SqlType, TypeError};

use crate::codec::{ensure_remaining, read_b_varchar, write_b_varchar};
use crate::error::ProtocolError;

/// Token type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TokenType {
    /// End of snapshot.
    End = 0x00,
    /// Column metadata (COLMETADATA).
    ColMetaData = 0x81,
    /// Null bitmap compressed row (NBCROW).
    NbcRow = 0xD2,
    /// Done (DONE).
    Done = 0xFD,
}

impl TokenType {
    /// Create a token type from a raw byte.
    pub fn from_u8(value: u8) -> Result<Self, ProtocolError> {
        match value {
            0x00 => Ok(Self::End),
            0x81 => Ok(Self::ColMetaData),
            0xD2 => Ok(Self::NbcRow),
            0xFD => Ok(Self::Done),
            _ => Err(ProtocolError::InvalidTokenType(value)),
        }
    }
}

bitflags! {
    /// Column flags stored in COLMETADATA.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ColumnFlags: u16 {
        /// Column accepts NULL.
        const NULLABLE = 0x0001;
    }
}

bitflags! {
    /// Done status flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DoneStatus: u16 {
        /// More results follow.
        const MORE = 0x0001;
        /// Row count is valid.
        const COUNT = 0x0010;
    }
}

/// Column definition within metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    /// Column name.
    pub name: String,
    /// Declared column type.
    pub sql_type: SqlType,
    /// Whether the column is nullable.
    pub nullable: bool,
}

impl ColumnMeta {
    /// Create column metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: SqlType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            sql_type,
            nullable,
        }
    }

    /// Column flags for this column.
    #[must_use]
    pub fn flags(&self) -> ColumnFlags {
        if self.nullable {
            ColumnFlags::NULLABLE
        } else {
            ColumnFlags::empty()
        }
    }

    /// Encode TYPE_ID TYPE_INFO FLAGS NAME.
    ///
    /// Types the decoder would reject are refused here, so every buffer
    /// written can be read back.
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<(), ProtocolError> {
        check_type(&self.sql_type)?;
        dst.put_u8(self.sql_type.type_id());
        encode_type_info(dst, &self.sql_type);
        dst.put_u16_le(self.flags().bits());
        write_b_varchar(dst, &self.name)
    }

    /// Decode a column definition.
    pub fn decode(src: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure_remaining(src, 1)?;
        let sql_type = decode_type_info(src.get_u8(), src)?;

        ensure_remaining(src, 2)?;
        let flags = ColumnFlags::from_bits_truncate(src.get_u16_le());
        let name = read_b_varchar(src)?;

        Ok(Self {
            name,
            sql_type,
            nullable: flags.contains(ColumnFlags::NULLABLE),
        })
    }
}

fn encode_type_info(dst: &mut impl BufMut, sql_type: &SqlType) {
    match *sql_type {
        SqlType::NVarChar { max_length }
        | SqlType::VarChar { max_length }
        | SqlType::VarBinary { max_length } => dst.put_u16_le(max_length),
        SqlType::Decimal { precision, scale } => {
            dst.put_u8(precision);
            dst.put_u8(scale);
        }
        SqlType::Time { scale }
        | SqlType::DateTime2 { scale }
        | SqlType::DateTimeOffset { scale } => dst.put_u8(scale),
        SqlType::Bit
        | SqlType::TinyInt
        | SqlType::SmallInt
        | SqlType::Int
        | SqlType::BigInt
        | SqlType::Real
        | SqlType::Float
        | SqlType::UniqueIdentifier
        | SqlType::Date
        | SqlType::Xml => {}
    }
}

/// Rebuild a [`SqlType`] from its type id and the TYPE_INFO that follows it.
pub fn decode_type_info(type_id: u8, src: &mut impl Buf) -> Result<SqlType, ProtocolError> {
    let sql_type = match type_id {
        0x32 => SqlType::Bit,
        0x30 => SqlType::TinyInt,
        0x34 => SqlType::SmallInt,
        0x38 => SqlType::Int,
        0x7F => SqlType::BigInt,
        0x3B => SqlType::Real,
        0x3E => SqlType::Float,
        0x24 => SqlType::UniqueIdentifier,
        0x28 => SqlType::Date,
        0xF1 => SqlType::Xml,
        0xE7 | 0xA7 | 0xA5 => {
            ensure_remaining(src, 2)?;
            let max_length = src.get_u16_le();
            match type_id {
                0xE7 => SqlType::NVarChar { max_length },
                0xA7 => SqlType::VarChar { max_length },
                _ => SqlType::VarBinary { max_length },
            }
        }
        0x6C => {
            ensure_remaining(src, 2)?;
            let precision = src.get_u8();
            let scale = src.get_u8();
            SqlType::Decimal { precision, scale }
        }
        0x29 | 0x2A | 0x2B => {
            ensure_remaining(src, 1)?;
            let scale = src.get_u8();
            match type_id {
                0x29 => SqlType::Time { scale },
                0x2A => SqlType::DateTime2 { scale },
                _ => SqlType::DateTimeOffset { scale },
            }
        }
        other => return Err(ProtocolError::InvalidDataType(other)),
    };
    check_type(&sql_type)?;
    Ok(sql_type)
}

fn check_type(sql_type: &SqlType) -> Result<(), ProtocolError> {
    sql_type.check().map_err(|err| match err {
        TypeError::InvalidParameter { field, value } => ProtocolError::InvalidField { field, value },
        _ => ProtocolError::InvalidDataType(sql_type.type_id()),
    })
}

/// Column metadata token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColMetaData {
    /// Column definitions.
    pub columns: Vec<ColumnMeta>,
}

impl ColMetaData {
    /// Encode the token, including its type byte.
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<(), ProtocolError> {
        let count = u16::try_from(self.columns.len()).map_err(|_| ProtocolError::ValueTooLarge {
            length: self.columns.len(),
            max: u16::MAX as usize,
        })?;
        dst.put_u8(TokenType::ColMetaData as u8);
        dst.put_u16_le(count);
        for column in &self.columns {
            column.encode(dst)?;
        }
        Ok(())
    }

    /// Decode the token body (the type byte has already been consumed).
    pub fn decode(src: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure_remaining(src, 2)?;
        let count = src.get_u16_le();
        if count == 0 {
            return Err(ProtocolError::InvalidField {
                field: "column count",
                value: 0,
            });
        }

        let mut columns = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            columns.push(ColumnMeta::decode(src)?);
        }
        Ok(Self { columns })
    }
}

/// Done token closing a resultset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Done {
    /// Status flags.
    pub status: DoneStatus,
    /// Number of rows in the resultset.
    pub row_count: u64,
    /// Records affected by the statement, -1 when not applicable.
    pub records_affected: i32,
}

impl Done {
    /// Size of the token body in bytes.
    pub const BODY_LEN: usize = 2 + 8 + 4;

    /// Encode the token, including its type byte.
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u8(TokenType::Done as u8);
        dst.put_u16_le(self.status.bits());
        dst.put_u64_le(self.row_count);
        dst.put_i32_le(self.records_affected);
    }

    /// Decode the token body (the type byte has already been consumed).
    pub fn decode(src: &mut impl Buf) -> Result<Self, ProtocolError> {
        ensure_remaining(src, Self::BODY_LEN)?;
        Ok(Self {
            status: DoneStatus::from_bits_truncate(src.get_u16_le()),
            row_count: src.get_u64_le(),
            records_affected: src.get_i32_le(),
        })
    }

    /// Whether another resultset follows.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.status.contains(DoneStatus::MORE)
    }
}
