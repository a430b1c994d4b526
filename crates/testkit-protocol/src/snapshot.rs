//! Whole-reader snapshots.
//!
//! ```text
//! SNAPSHOT    = MAGIC VERSION *RESULTSET END
//! RESULTSET   = COLMETADATA *NBCROW DONE
//! NBCROW      = 0xD2 NULL_BITMAP *VALUE
//! ```
//!
//! The null bitmap holds one bit per column (bit set = NULL), least
//! significant bit first, and only non-NULL values follow it.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use testkit_types::SqlValue;

use crate::codec::ensure_remaining;
use crate::error::ProtocolError;
use crate::token::{ColMetaData, ColumnMeta, Done, DoneStatus, TokenType};
use crate::value::{decode_value, encode_value};

/// Leading bytes of every snapshot.
pub const MAGIC: [u8; 4] = *b"TKSN";

/// Current snapshot format version.
pub const VERSION: u16 = 1;

/// One captured resultset.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSetSnapshot {
    /// Column metadata.
    pub columns: Vec<ColumnMeta>,
    /// Row values, one `Vec` per row with one value per column.
    pub rows: Vec<Vec<SqlValue>>,
    /// Records affected by the statement, -1 when not applicable.
    pub records_affected: i32,
}

impl ResultSetSnapshot {
    /// Create an empty resultset with the given columns.
    #[must_use]
    pub fn new(columns: Vec<ColumnMeta>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            records_affected: -1,
        }
    }

    /// Set the records affected count.
    #[must_use]
    pub fn with_records_affected(mut self, records_affected: i32) -> Self {
        self.records_affected = records_affected;
        self
    }

    /// Append a row.
    pub fn push_row(&mut self, row: Vec<SqlValue>) {
        self.rows.push(row);
    }

    fn bitmap_len(&self) -> usize {
        self.columns.len().div_ceil(8)
    }

    fn encode(&self, dst: &mut BytesMut, more: bool) -> Result<(), ProtocolError> {
        ColMetaData {
            columns: self.columns.clone(),
        }
        .encode(dst)?;

        for row in &self.rows {
            if row.len() != self.columns.len() {
                return Err(ProtocolError::InvalidField {
                    field: "row value count",
                    value: row.len() as u64,
                });
            }

            let mut bitmap = vec![0u8; self.bitmap_len()];
            for (i, value) in row.iter().enumerate() {
                if value.is_null() {
                    bitmap[i / 8] |= 1 << (i % 8);
                }
            }

            dst.put_u8(TokenType::NbcRow as u8);
            dst.put_slice(&bitmap);
            for (i, (column, value)) in self.columns.iter().zip(row).enumerate() {
                if !value.is_null() {
                    encode_value(dst, &column.sql_type, value, i)?;
                }
            }
        }

        let mut status = DoneStatus::COUNT;
        if more {
            status |= DoneStatus::MORE;
        }
        Done {
            status,
            row_count: self.rows.len() as u64,
            records_affected: self.records_affected,
        }
        .encode(dst);
        Ok(())
    }

    /// Decode a resultset whose COLMETADATA type byte has been consumed.
    ///
    /// Returns the resultset and whether its DONE token announced more.
    fn decode(src: &mut impl Buf) -> Result<(Self, bool), ProtocolError> {
        let meta = ColMetaData::decode(src)?;
        let mut set = Self::new(meta.columns);
        let bitmap_len = set.bitmap_len();

        loop {
            ensure_remaining(src, 1)?;
            match TokenType::from_u8(src.get_u8())? {
                TokenType::NbcRow => {
                    ensure_remaining(src, bitmap_len)?;
                    let mut bitmap = vec![0u8; bitmap_len];
                    src.copy_to_slice(&mut bitmap);

                    let mut row = Vec::with_capacity(set.columns.len());
                    for (i, column) in set.columns.iter().enumerate() {
                        if bitmap[i / 8] & (1 << (i % 8)) != 0 {
                            row.push(SqlValue::Null);
                        } else {
                            row.push(decode_value(src, &column.sql_type)?);
                        }
                    }
                    set.rows.push(row);
                }
                TokenType::Done => {
                    let done = Done::decode(src)?;
                    if done.row_count != set.rows.len() as u64 {
                        return Err(ProtocolError::InvalidField {
                            field: "done row count",
                            value: done.row_count,
                        });
                    }
                    set.records_affected = done.records_affected;
                    return Ok((set, done.has_more()));
                }
                other => return Err(ProtocolError::InvalidTokenType(other as u8)),
            }
        }
    }
}

/// A captured sequence of resultsets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Resultsets in reader order.
    pub result_sets: Vec<ResultSetSnapshot>,
}

impl Snapshot {
    /// Create a snapshot from resultsets.
    #[must_use]
    pub fn new(result_sets: Vec<ResultSetSnapshot>) -> Self {
        Self { result_sets }
    }

    /// Total number of rows across all resultsets.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.result_sets.iter().map(|set| set.rows.len()).sum()
    }

    /// Encode the snapshot into a byte buffer.
    pub fn encode(&self) -> Result<Bytes, ProtocolError> {
        let mut buf = BytesMut::with_capacity(64);
        buf.put_slice(&MAGIC);
        buf.put_u16_le(VERSION);

        let last = self.result_sets.len().saturating_sub(1);
        for (i, set) in self.result_sets.iter().enumerate() {
            set.encode(&mut buf, i < last)?;
        }

        buf.put_u8(TokenType::End as u8);
        Ok(buf.freeze())
    }

    /// Decode a snapshot from a byte buffer.
    ///
    /// The whole buffer must be consumed; trailing bytes are an error.
    pub fn decode(mut src: impl Buf) -> Result<Self, ProtocolError> {
        if src.remaining() < MAGIC.len() + 2 {
            return Err(ProtocolError::UnexpectedEof);
        }

        let mut magic = [0u8; 4];
        src.copy_to_slice(&mut magic);
        if magic != MAGIC {
            return Err(ProtocolError::InvalidMagic(magic));
        }
        let version = src.get_u16_le();
        if version != VERSION {
            return Err(ProtocolError::UnsupportedVersion(version));
        }

        let mut result_sets = Vec::new();
        let mut expect_more: Option<bool> = None;
        loop {
            if !src.has_remaining() {
                return Err(ProtocolError::UnexpectedEof);
            }
            let token = TokenType::from_u8(src.get_u8())?;
            match (token, expect_more) {
                (TokenType::ColMetaData, None | Some(true)) => {
                    let (set, more) = ResultSetSnapshot::decode(&mut src)?;
                    result_sets.push(set);
                    expect_more = Some(more);
                }
                (TokenType::End, None | Some(false)) => break,
                (other, _) => return Err(ProtocolError::InvalidTokenType(other as u8)),
            }
        }

        if src.has_remaining() {
            return Err(ProtocolError::InvalidField {
                field: "trailing bytes",
                value: src.remaining() as u64,
            });
        }

        Ok(Self { result_sets })
    }
}
