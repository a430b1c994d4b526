//! Readers buffered into a byte snapshot.

use bytes::Bytes;
use testkit_protocol::{ColumnMeta, ResultSetSnapshot, Snapshot};
use testkit_types::{SqlType, SqlValue};

use crate::column::ColumnDefinition;
use crate::data_record::{DataReader, DataRecord};
use crate::definition::RecordSetDefinition;
use crate::error::{Error, Result};
use crate::reader::ObjectReader;
use crate::set::ObjectSet;

/// A data reader replayed from a byte snapshot.
///
/// [`from_reader`](Self::from_reader) drains another reader into a
/// snapshot buffer; the buffer can be stored with
/// [`to_bytes`](Self::to_bytes) and replayed later with
/// [`from_bytes`](Self::from_bytes), without the original source.
///
/// ```
/// use sql_testkit::{CachedDataReader, DataReader, DataRecord, ObjectReader, ObjectSet,
///     RecordSetDefinition, SqlValue};
///
/// let definition = RecordSetDefinition::from_declarations(&[("Name", "NVARCHAR(10)")])?;
/// let mut set = ObjectSet::new(definition);
/// set.add_values(vec![SqlValue::String("alpha".into())])?;
///
/// let cached = CachedDataReader::from_reader(&mut ObjectReader::from_sets([set]))?;
/// let mut replay = CachedDataReader::from_bytes(cached.to_bytes())?;
/// assert!(replay.read()?);
/// assert_eq!(replay.get_string(0)?, "alpha");
/// # Ok::<(), sql_testkit::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct CachedDataReader {
    buffer: Bytes,
    reader: ObjectReader,
}

impl CachedDataReader {
    /// Drain every remaining resultset of `source` into a snapshot.
    ///
    /// Reading starts at the source's current position, so rows already
    /// consumed are not captured. A result set that raises a server error
    /// aborts the capture with that error.
    pub fn from_reader<R: DataReader + ?Sized>(source: &mut R) -> Result<Self> {
        let mut result_sets = Vec::new();

        loop {
            let field_count = match source.field_count() {
                Ok(count) => count,
                Err(Error::NoCurrentResultSet) => break,
                Err(e) => return Err(e),
            };

            let columns = (0..field_count)
                .map(|ordinal| {
                    Ok(ColumnMeta::new(
                        source.name(ordinal)?,
                        source.sql_type(ordinal)?,
                        source.is_nullable(ordinal)?,
                    ))
                })
                .collect::<Result<Vec<_>>>()?;

            let mut result_set =
                ResultSetSnapshot::new(columns).with_records_affected(source.records_affected());
            while source.read()? {
                let mut row = vec![SqlValue::Null; field_count];
                source.values(&mut row)?;
                result_set.push_row(row);
            }
            result_sets.push(result_set);

            if !source.next_result()? {
                break;
            }
        }

        let snapshot = Snapshot::new(result_sets);
        let buffer = snapshot.encode()?;
        tracing::debug!(
            result_sets = snapshot.result_sets.len(),
            rows = snapshot.row_count(),
            bytes = buffer.len(),
            "reader cached"
        );

        Ok(Self {
            reader: replay(snapshot)?,
            buffer,
        })
    }

    /// Replay a buffer produced by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(buffer: Bytes) -> Result<Self> {
        let snapshot = Snapshot::decode(buffer.clone())?;
        tracing::debug!(
            result_sets = snapshot.result_sets.len(),
            bytes = buffer.len(),
            "snapshot loaded"
        );
        Ok(Self {
            reader: replay(snapshot)?,
            buffer,
        })
    }

    /// The snapshot buffer.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        self.buffer.clone()
    }

    /// Size of the snapshot buffer in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the snapshot buffer is empty. Encoded snapshots never are.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Rewind the replay to the first resultset.
    pub fn reset(&mut self) {
        self.reader.reset();
    }

    /// Take the replay reader, rewound to the start.
    #[must_use]
    pub fn into_object_reader(mut self) -> ObjectReader {
        self.reader.reset();
        self.reader
    }
}

/// Rebuild in-memory sets from a decoded snapshot.
fn replay(snapshot: Snapshot) -> Result<ObjectReader> {
    let sets = snapshot
        .result_sets
        .into_iter()
        .map(|result_set| {
            let definition = RecordSetDefinition::new(result_set.columns.into_iter().map(
                |meta| ColumnDefinition::new(meta.name, meta.sql_type).with_nullable(meta.nullable),
            ))?;
            let mut set =
                ObjectSet::new(definition).with_records_affected(result_set.records_affected);
            for row in result_set.rows {
                set.add_values(row)?;
            }
            Ok(set)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ObjectReader::from_sets(sets))
}

impl DataRecord for CachedDataReader {
    fn field_count(&self) -> Result<usize> {
        self.reader.field_count()
    }

    fn name(&self, ordinal: usize) -> Result<&str> {
        self.reader.name(ordinal)
    }

    fn ordinal(&self, name: &str) -> Result<usize> {
        self.reader.ordinal(name)
    }

    fn sql_type(&self, ordinal: usize) -> Result<SqlType> {
        self.reader.sql_type(ordinal)
    }

    fn is_nullable(&self, ordinal: usize) -> Result<bool> {
        self.reader.is_nullable(ordinal)
    }

    fn value(&self, ordinal: usize) -> Result<&SqlValue> {
        self.reader.value(ordinal)
    }
}

impl DataReader for CachedDataReader {
    fn read(&mut self) -> Result<bool> {
        self.reader.read()
    }

    fn next_result(&mut self) -> Result<bool> {
        self.reader.next_result()
    }

    fn close(&mut self) {
        self.reader.close();
    }

    fn is_closed(&self) -> bool {
        self.reader.is_closed()
    }

    fn depth(&self) -> Result<usize> {
        self.reader.depth()
    }

    fn records_affected(&self) -> i32 {
        self.reader.records_affected()
    }
}
