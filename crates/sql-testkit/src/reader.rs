//! Forward-only reader over in-memory record sets.

use testkit_types::{SqlType, SqlValue};

use crate::data_record::{DataReader, DataRecord, FromRecord};
use crate::definition::RecordSetDefinition;
use crate::error::{Error, Result};
use crate::record::ObjectRecord;
use crate::set::ObjectSet;
use crate::state::ReaderState;

/// A multi-resultset data reader over [`ObjectSet`]s.
///
/// Sets can be added while the reader is [`Building`](ReaderState::Building).
/// The first call to [`read`](DataReader::read),
/// [`next_result`](DataReader::next_result) or
/// [`result_sets`](Self::result_sets) starts iteration and freezes the set
/// list until [`reset`](Self::reset).
///
/// ```
/// use sql_testkit::{DataReader, DataRecord, ObjectReader, ObjectSet, RecordSetDefinition, SqlValue};
///
/// let definition = RecordSetDefinition::from_declarations(&[("Id", "INT")])?;
/// let mut set = ObjectSet::new(definition);
/// set.add_values(vec![SqlValue::Int(1)])?;
/// set.add_values(vec![SqlValue::Int(2)])?;
///
/// let mut reader = ObjectReader::from_sets([set]);
/// let mut ids = Vec::new();
/// while reader.read()? {
///     ids.push(reader.get_i32(0)?);
/// }
/// assert_eq!(ids, [1, 2]);
/// assert!(!reader.next_result()?);
/// # Ok::<(), sql_testkit::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ObjectReader {
    sets: Vec<ObjectSet>,
    state: ReaderState,
    /// Index of the current set; `None` before the first set or past the last.
    set_cursor: Option<usize>,
    /// Index of the current record; a value equal to the set length means
    /// the set is exhausted.
    record_cursor: Option<usize>,
}

impl ObjectReader {
    /// Create a reader with no sets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a reader over `sets`, in order.
    pub fn from_sets(sets: impl IntoIterator<Item = ObjectSet>) -> Self {
        Self {
            sets: sets.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Number of sets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Whether the reader has no sets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Append a set.
    pub fn add(&mut self, set: ObjectSet) -> Result<()> {
        self.ensure_modifiable()?;
        self.sets.push(set);
        Ok(())
    }

    /// Remove and return the set at `index`.
    pub fn remove(&mut self, index: usize) -> Result<ObjectSet> {
        self.ensure_modifiable()?;
        if index >= self.sets.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.sets.len(),
            });
        }
        Ok(self.sets.remove(index))
    }

    /// Remove all sets.
    pub fn clear(&mut self) -> Result<()> {
        self.ensure_modifiable()?;
        self.sets.clear();
        Ok(())
    }

    /// Enumerate the sets, starting iteration.
    pub fn result_sets(&mut self) -> Result<std::slice::Iter<'_, ObjectSet>> {
        self.ensure_open()?;
        self.begin();
        Ok(self.sets.iter())
    }

    /// Return to [`Building`](ReaderState::Building), rewinding both
    /// cursors. This also reopens a closed reader.
    pub fn reset(&mut self) {
        tracing::debug!(from = %self.state, "reader reset");
        self.state = ReaderState::Building;
        self.set_cursor = None;
        self.record_cursor = None;
    }

    /// Whether the current set has any records.
    pub fn has_rows(&self) -> Result<bool> {
        self.schema_set().map(|set| !set.is_empty())
    }

    /// Definition of the current set.
    ///
    /// Before iteration starts this is the first set's definition.
    pub fn schema(&self) -> Result<&RecordSetDefinition> {
        self.schema_set().map(ObjectSet::definition)
    }

    /// The record the reader is positioned on.
    pub fn current_record(&self) -> Result<&ObjectRecord> {
        self.ensure_open()?;
        if !self.state.has_started() {
            return Err(Error::NoCurrentRecord);
        }
        let set = self.current_set()?;
        self.record_cursor
            .and_then(|index| set.get(index))
            .ok_or(Error::NoCurrentRecord)
    }

    /// Read the remaining records of the current set into `T`s.
    pub fn read_all<T: FromRecord>(&mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while self.read()? {
            items.push(T::from_record(self.current_record()?)?);
        }
        Ok(items)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state == ReaderState::Closed {
            return Err(Error::ReaderClosed);
        }
        Ok(())
    }

    fn ensure_modifiable(&self) -> Result<()> {
        self.ensure_open()?;
        if !self.state.can_modify() {
            return Err(Error::ReadStarted);
        }
        Ok(())
    }

    /// Move from `Building` to `Reading`, positioned before the first
    /// record of the first set.
    fn begin(&mut self) {
        if self.state != ReaderState::Building {
            return;
        }
        self.state = ReaderState::Reading;
        self.set_cursor = (!self.sets.is_empty()).then_some(0);
        self.record_cursor = None;
        tracing::debug!(sets = self.sets.len(), "reader started");
    }

    fn current_set(&self) -> Result<&ObjectSet> {
        self.set_cursor
            .and_then(|index| self.sets.get(index))
            .ok_or(Error::NoCurrentResultSet)
    }

    /// The set whose schema accessors describe: the first set while
    /// building, the current set while reading.
    fn schema_set(&self) -> Result<&ObjectSet> {
        match self.state {
            ReaderState::Closed => Err(Error::ReaderClosed),
            ReaderState::Building => self.sets.first().ok_or(Error::NoCurrentResultSet),
            ReaderState::Reading => self.current_set(),
        }
    }

    fn raise_set_error(set: &ObjectSet) -> Result<()> {
        match set.error() {
            Some(error) => {
                tracing::debug!(number = error.number(), "result set raised error");
                Err(Error::Sql(error.clone()))
            }
            None => Ok(()),
        }
    }
}

impl DataRecord for ObjectReader {
    fn field_count(&self) -> Result<usize> {
        self.schema().map(RecordSetDefinition::field_count)
    }

    fn name(&self, ordinal: usize) -> Result<&str> {
        self.schema()?.name(ordinal)
    }

    fn ordinal(&self, name: &str) -> Result<usize> {
        self.schema()?.ordinal(name)
    }

    fn sql_type(&self, ordinal: usize) -> Result<SqlType> {
        self.schema()?.column(ordinal).map(|c| c.sql_type())
    }

    fn is_nullable(&self, ordinal: usize) -> Result<bool> {
        self.schema()?.column(ordinal).map(|c| c.is_nullable())
    }

    fn value(&self, ordinal: usize) -> Result<&SqlValue> {
        self.current_record()?.value(ordinal)
    }
}

impl DataReader for ObjectReader {
    fn read(&mut self) -> Result<bool> {
        self.ensure_open()?;
        self.begin();

        let Some(set_index) = self.set_cursor else {
            return Ok(false);
        };
        let set = &self.sets[set_index];
        Self::raise_set_error(set)?;

        let len = set.len();
        let next = self.record_cursor.map_or(0, |index| (index + 1).min(len));
        self.record_cursor = Some(next);

        let has_row = next < len;
        tracing::trace!(set = set_index, record = next, has_row, "read");
        Ok(has_row)
    }

    fn next_result(&mut self) -> Result<bool> {
        self.ensure_open()?;
        self.begin();
        self.record_cursor = None;

        let Some(current) = self.set_cursor else {
            return Ok(false);
        };
        let next = current + 1;
        if next >= self.sets.len() {
            self.set_cursor = None;
            tracing::trace!("no more result sets");
            return Ok(false);
        }

        self.set_cursor = Some(next);
        tracing::trace!(set = next, "next result set");
        Self::raise_set_error(&self.sets[next])?;
        Ok(true)
    }

    fn close(&mut self) {
        if self.state != ReaderState::Closed {
            tracing::debug!(sets = self.sets.len(), "reader closed");
        }
        self.state = ReaderState::Closed;
        self.set_cursor = None;
        self.record_cursor = None;
    }

    fn is_closed(&self) -> bool {
        self.state == ReaderState::Closed
    }

    fn depth(&self) -> Result<usize> {
        self.ensure_open()?;
        Ok(0)
    }

    fn records_affected(&self) -> i32 {
        self.schema_set()
            .map_or(-1, ObjectSet::records_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::fakes::{SqlError, SqlException};

    fn set(name: &str, ids: &[i32]) -> ObjectSet {
        let definition = RecordSetDefinition::from_declarations(&[(name, "INT")]).unwrap();
        let mut set = ObjectSet::new(definition);
        for id in ids {
            set.add_values(vec![SqlValue::Int(*id)]).unwrap();
        }
        set
    }

    #[test]
    fn test_reads_rows_and_sets_in_order() {
        let mut reader = ObjectReader::from_sets([set("A", &[1, 2]), set("B", &[]), set("C", &[3])]);

        let mut seen = Vec::new();
        loop {
            let name = reader.name(0).unwrap().to_string();
            while reader.read().unwrap() {
                seen.push((name.clone(), reader.get_i32(0).unwrap()));
            }
            if !reader.next_result().unwrap() {
                break;
            }
        }

        assert_eq!(
            seen,
            [("A".to_string(), 1), ("A".to_string(), 2), ("C".to_string(), 3)]
        );
        assert!(matches!(reader.field_count(), Err(Error::NoCurrentResultSet)));
    }

    #[test]
    fn test_read_past_end_stays_false() {
        let mut reader = ObjectReader::from_sets([set("A", &[1])]);
        assert!(reader.read().unwrap());
        assert!(!reader.read().unwrap());
        assert!(!reader.read().unwrap());
        assert!(matches!(reader.get_i32(0), Err(Error::NoCurrentRecord)));
    }

    #[test]
    fn test_next_result_count() {
        let mut reader = ObjectReader::from_sets([set("A", &[1]), set("B", &[2]), set("C", &[])]);
        let mut advanced = 0;
        while reader.next_result().unwrap() {
            advanced += 1;
        }
        assert_eq!(advanced, 2);
        assert!(!reader.next_result().unwrap());
    }

    #[test]
    fn test_schema_visible_before_reading() {
        let mut reader = ObjectReader::from_sets([set("Id", &[5])]);
        assert_eq!(reader.state(), ReaderState::Building);
        assert_eq!(reader.field_count().unwrap(), 1);
        assert_eq!(reader.ordinal("ID").unwrap(), 0);
        assert!(reader.has_rows().unwrap());
        assert!(matches!(reader.get_i32(0), Err(Error::NoCurrentRecord)));

        // Peeking does not start iteration.
        reader.add(set("More", &[])).unwrap();
        assert_eq!(reader.len(), 2);
    }

    #[test]
    fn test_mutation_after_read_fails() {
        let mut reader = ObjectReader::from_sets([set("A", &[1])]);
        reader.read().unwrap();
        assert_eq!(reader.state(), ReaderState::Reading);

        let err = reader.add(set("B", &[])).unwrap_err();
        assert!(matches!(err, Error::ReadStarted));
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
        assert!(reader.remove(0).is_err());
        assert!(reader.clear().is_err());
    }

    #[test]
    fn test_enumeration_starts_reading() {
        let mut reader = ObjectReader::from_sets([set("A", &[1]), set("B", &[2])]);
        assert_eq!(reader.result_sets().unwrap().count(), 2);
        assert!(reader.add(set("C", &[])).is_err());
    }

    #[test]
    fn test_close_and_reset() {
        let mut reader = ObjectReader::from_sets([set("A", &[1, 2])]);
        assert!(reader.read().unwrap());
        reader.close();

        assert!(reader.is_closed());
        assert!(matches!(reader.read(), Err(Error::ReaderClosed)));
        assert!(matches!(reader.field_count(), Err(Error::ReaderClosed)));
        assert!(matches!(reader.value(0), Err(Error::ReaderClosed)));
        assert!(matches!(reader.depth(), Err(Error::ReaderClosed)));
        assert!(matches!(reader.add(set("B", &[])), Err(Error::ReaderClosed)));

        reader.reset();
        assert!(!reader.is_closed());
        reader.add(set("B", &[])).unwrap();
        assert!(reader.read().unwrap());
        assert_eq!(reader.get_i32(0).unwrap(), 1);
        assert_eq!(reader.depth().unwrap(), 0);
    }

    #[test]
    fn test_records_affected_follows_current_set() {
        let mut reader = ObjectReader::from_sets([
            set("A", &[]).with_records_affected(3),
            set("B", &[]),
        ]);
        assert_eq!(reader.records_affected(), 3);
        reader.next_result().unwrap();
        assert_eq!(reader.records_affected(), -1);
    }

    #[test]
    fn test_set_error_raised_on_entry() {
        let failing = set("B", &[9]).with_error(SqlException::new(SqlError::deadlock()));
        let mut reader = ObjectReader::from_sets([set("A", &[1]), failing]);

        assert!(reader.read().unwrap());
        let err = reader.next_result().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Server);
        assert!(matches!(err, Error::Sql(ref e) if e.number() == 1205));
        assert!(matches!(reader.read(), Err(Error::Sql(_))));
        assert!(!reader.next_result().unwrap());
    }

    #[test]
    fn test_empty_reader() {
        let mut reader = ObjectReader::new();
        assert!(reader.is_empty());
        assert!(matches!(reader.field_count(), Err(Error::NoCurrentResultSet)));
        assert!(!reader.read().unwrap());
        assert!(!reader.next_result().unwrap());
        assert_eq!(reader.records_affected(), -1);
    }

    #[test]
    fn test_remove_while_building() {
        let mut reader = ObjectReader::from_sets([set("A", &[]), set("B", &[])]);
        let removed = reader.remove(0).unwrap();
        assert_eq!(removed.definition().name(0).unwrap(), "A");
        assert!(matches!(
            reader.remove(3),
            Err(Error::IndexOutOfRange { index: 3, len: 1 })
        ));
        reader.clear().unwrap();
        assert!(reader.is_empty());
    }
}
