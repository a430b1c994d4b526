//! Record sets.

use testkit_types::SqlValue;

use crate::definition::RecordSetDefinition;
use crate::error::{Error, Result};
use crate::fakes::SqlException;
use crate::generator::Generator;
use crate::record::ObjectRecord;

/// An ordered collection of records sharing one [`RecordSetDefinition`].
///
/// A set becomes one resultset when handed to an
/// [`ObjectReader`](crate::ObjectReader).
#[derive(Debug, Clone)]
pub struct ObjectSet {
    definition: RecordSetDefinition,
    records: Vec<ObjectRecord>,
    records_affected: i32,
    error: Option<SqlException>,
}

impl ObjectSet {
    /// Create an empty set.
    #[must_use]
    pub fn new(definition: RecordSetDefinition) -> Self {
        Self {
            definition,
            records: Vec::new(),
            records_affected: -1,
            error: None,
        }
    }

    /// Set the records-affected count reported while this set is current.
    #[must_use]
    pub fn with_records_affected(mut self, records_affected: i32) -> Self {
        self.records_affected = records_affected;
        self
    }

    /// Make a reader fail with `error` when it advances into this set.
    ///
    /// This emulates a batch whose statement fails after earlier
    /// resultsets have been streamed.
    #[must_use]
    pub fn with_error(mut self, error: SqlException) -> Self {
        self.error = Some(error);
        self
    }

    /// Append a record built on this set's definition.
    pub fn add(&mut self, record: ObjectRecord) -> Result<()> {
        if !record.definition().same_as(&self.definition) {
            return Err(Error::DefinitionMismatch);
        }
        self.records.push(record);
        Ok(())
    }

    /// Validate `values` into a new record and append it.
    pub fn add_values(&mut self, values: Vec<SqlValue>) -> Result<()> {
        let record = ObjectRecord::new(&self.definition, values)?;
        self.records.push(record);
        Ok(())
    }

    /// Append `count` random records.
    pub fn add_random(&mut self, count: usize, generator: &mut Generator) {
        self.records.reserve(count);
        for _ in 0..count {
            self.records
                .push(ObjectRecord::random(&self.definition, generator));
        }
    }

    /// Remove and return the record at `index`.
    pub fn remove(&mut self, index: usize) -> Result<ObjectRecord> {
        if index >= self.records.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.records.len(),
            });
        }
        Ok(self.records.remove(index))
    }

    /// Remove all records.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the set has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ObjectRecord> {
        self.records.get(index)
    }

    /// Iterate over the records in order.
    pub fn iter(&self) -> std::slice::Iter<'_, ObjectRecord> {
        self.records.iter()
    }

    /// The shared definition.
    #[must_use]
    pub fn definition(&self) -> &RecordSetDefinition {
        &self.definition
    }

    /// Records affected, -1 unless set.
    #[must_use]
    pub fn records_affected(&self) -> i32 {
        self.records_affected
    }

    /// The error raised when a reader enters this set.
    #[must_use]
    pub fn error(&self) -> Option<&SqlException> {
        self.error.as_ref()
    }
}

impl<'a> IntoIterator for &'a ObjectSet {
    type Item = &'a ObjectRecord;
    type IntoIter = std::slice::Iter<'a, ObjectRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::data_record::DataRecord;
    use crate::error::ErrorKind;
    use crate::fakes::SqlError;

    fn definition() -> RecordSetDefinition {
        RecordSetDefinition::from_declarations(&[("Id", "INT"), ("Name", "NVARCHAR(20)")])
            .unwrap()
    }

    #[test]
    fn test_add_requires_same_definition() {
        let shared = definition();
        let mut set = ObjectSet::new(shared.clone());

        let own = ObjectRecord::new(&shared, vec![SqlValue::Int(1), SqlValue::Null]).unwrap();
        set.add(own).unwrap();

        // Structurally equal but a distinct definition.
        let other = definition();
        let foreign = ObjectRecord::new(&other, vec![SqlValue::Int(2), SqlValue::Null]).unwrap();
        let err = set.add(foreign).unwrap_err();
        assert!(matches!(err, Error::DefinitionMismatch));
        assert_eq!(err.kind(), ErrorKind::Argument);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_collection_operations() {
        let mut set = ObjectSet::new(definition());
        assert!(set.is_empty());
        assert_eq!(set.records_affected(), -1);

        set.add_values(vec![SqlValue::Int(1), SqlValue::String("a".into())])
            .unwrap();
        set.add_values(vec![SqlValue::Int(2), SqlValue::String("b".into())])
            .unwrap();
        assert!(set.add_values(vec![SqlValue::Int(3)]).is_err());
        assert_eq!(set.len(), 2);

        let removed = set.remove(0).unwrap();
        assert_eq!(removed.get_i32(0).unwrap(), 1);
        assert_eq!(set.get(0).unwrap().get_i32(0).unwrap(), 2);

        let err = set.remove(5).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 5, len: 1 }));
        assert_eq!(err.kind(), ErrorKind::OutOfRange);

        set.clear();
        assert!(set.is_empty());
        assert!(set.get(0).is_none());
    }

    #[test]
    fn test_add_random() {
        let mut set = ObjectSet::new(definition()).with_records_affected(4);
        set.add_random(4, &mut Generator::seeded(2));
        assert_eq!(set.len(), 4);
        assert_eq!(set.records_affected(), 4);
        assert_eq!((&set).into_iter().count(), 4);
    }

    #[test]
    fn test_error_attached() {
        let set = ObjectSet::new(definition()).with_error(SqlException::new(SqlError::deadlock()));
        assert_eq!(set.error().unwrap().number(), 1205);
    }
}
