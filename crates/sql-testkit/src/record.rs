//! Synthetic records.

use testkit_types::{SqlType, SqlValue};

use crate::column::ColumnDefinition;
use crate::data_record::DataRecord;
use crate::definition::RecordSetDefinition;
use crate::error::{Error, Result};
use crate::generator::Generator;

/// One row of values conforming to a [`RecordSetDefinition`].
///
/// Values are validated against their column on every write, so a record
/// never holds a value its column would reject.
#[derive(Debug, Clone)]
pub struct ObjectRecord {
    definition: RecordSetDefinition,
    values: Vec<SqlValue>,
}

impl ObjectRecord {
    /// Create a record, validating one value per column.
    ///
    /// ```
    /// use sql_testkit::{DataRecord, ObjectRecord, RecordSetDefinition, SqlValue};
    ///
    /// let definition = RecordSetDefinition::from_declarations(&[
    ///     ("Id", "INT"),
    ///     ("Code", "VARCHAR(3)"),
    /// ])?;
    /// let record = ObjectRecord::new(
    ///     &definition,
    ///     vec![SqlValue::Int(7), SqlValue::String("ABCD".into())],
    /// )?;
    /// assert_eq!(record.get_string(1)?, "ABC");
    /// # Ok::<(), sql_testkit::Error>(())
    /// ```
    pub fn new(definition: &RecordSetDefinition, values: Vec<SqlValue>) -> Result<Self> {
        if values.len() != definition.field_count() {
            return Err(Error::ValueCount {
                expected: definition.field_count(),
                actual: values.len(),
            });
        }

        let values = definition
            .columns()
            .iter()
            .zip(values)
            .map(|(column, value)| column.validate(value))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            definition: definition.clone(),
            values,
        })
    }

    /// Create a record of random values.
    pub fn random(definition: &RecordSetDefinition, generator: &mut Generator) -> Self {
        let values = definition
            .columns()
            .iter()
            .map(|column| column.random_value(generator))
            .collect();
        Self {
            definition: definition.clone(),
            values,
        }
    }

    /// Replace the value at `ordinal`, validating it against its column.
    ///
    /// On failure the record is unchanged.
    pub fn set(&mut self, ordinal: usize, value: SqlValue) -> Result<()> {
        let validated = self.definition.column(ordinal)?.validate(value)?;
        self.values[ordinal] = validated;
        Ok(())
    }

    /// Replace the value of the column called `name`.
    pub fn set_by_name(&mut self, name: &str, value: SqlValue) -> Result<()> {
        let ordinal = self.definition.ordinal(name)?;
        self.set(ordinal, value)
    }

    /// The definition this record conforms to.
    #[must_use]
    pub fn definition(&self) -> &RecordSetDefinition {
        &self.definition
    }

    /// All values in ordinal order.
    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Consume the record, returning its values.
    #[must_use]
    pub fn into_values(self) -> Vec<SqlValue> {
        self.values
    }

    fn column(&self, ordinal: usize) -> Result<&ColumnDefinition> {
        self.definition.column(ordinal)
    }
}

impl PartialEq for ObjectRecord {
    fn eq(&self, other: &Self) -> bool {
        self.definition.same_as(&other.definition) && self.values == other.values
    }
}

impl DataRecord for ObjectRecord {
    fn field_count(&self) -> Result<usize> {
        Ok(self.definition.field_count())
    }

    fn name(&self, ordinal: usize) -> Result<&str> {
        self.definition.name(ordinal)
    }

    fn ordinal(&self, name: &str) -> Result<usize> {
        self.definition.ordinal(name)
    }

    fn sql_type(&self, ordinal: usize) -> Result<SqlType> {
        self.column(ordinal).map(ColumnDefinition::sql_type)
    }

    fn is_nullable(&self, ordinal: usize) -> Result<bool> {
        self.column(ordinal).map(ColumnDefinition::is_nullable)
    }

    fn value(&self, ordinal: usize) -> Result<&SqlValue> {
        self.values.get(ordinal).ok_or(Error::OrdinalOutOfRange {
            ordinal,
            field_count: self.values.len(),
        })
    }
}
