//! Record set definitions.

use std::sync::Arc;

use crate::column::ColumnDefinition;
use crate::error::{Error, Result};

/// Ordered column list describing one synthetic resultset.
///
/// Definitions are cheap to clone; clones share identity, which is what
/// [`ObjectSet`](crate::ObjectSet) checks when records are added.
#[derive(Debug, Clone)]
pub struct RecordSetDefinition {
    inner: Arc<DefinitionInner>,
}

#[derive(Debug)]
struct DefinitionInner {
    columns: Vec<ColumnDefinition>,
}

impl RecordSetDefinition {
    /// Create a definition, assigning ordinals `0..N` in order.
    ///
    /// Fails if `columns` is empty, if any column already belongs to
    /// another definition, or if a column type carries a length,
    /// precision or scale outside SQL Server limits.
    pub fn new(columns: impl IntoIterator<Item = ColumnDefinition>) -> Result<Self> {
        let mut columns: Vec<_> = columns.into_iter().collect();
        if columns.is_empty() {
            return Err(Error::EmptyDefinition);
        }

        for (ordinal, column) in columns.iter_mut().enumerate() {
            column.adopt(ordinal)?;
        }

        tracing::trace!(field_count = columns.len(), "record set definition created");

        Ok(Self {
            inner: Arc::new(DefinitionInner { columns }),
        })
    }

    /// Create a definition from `(name, declaration)` pairs.
    ///
    /// ```
    /// use sql_testkit::RecordSetDefinition;
    ///
    /// let definition = RecordSetDefinition::from_declarations(&[
    ///     ("Id", "INT"),
    ///     ("Name", "NVARCHAR(50)"),
    /// ])?;
    /// assert_eq!(definition.field_count(), 2);
    /// # Ok::<(), sql_testkit::Error>(())
    /// ```
    pub fn from_declarations(columns: &[(&str, &str)]) -> Result<Self> {
        let columns = columns
            .iter()
            .map(|(name, declaration)| ColumnDefinition::from_declaration(*name, declaration))
            .collect::<Result<Vec<_>>>()?;
        Self::new(columns)
    }

    /// Number of columns.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.inner.columns.len()
    }

    /// All columns in ordinal order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.inner.columns
    }

    /// Column at `ordinal`.
    pub fn column(&self, ordinal: usize) -> Result<&ColumnDefinition> {
        self.inner
            .columns
            .get(ordinal)
            .ok_or(Error::OrdinalOutOfRange {
                ordinal,
                field_count: self.field_count(),
            })
    }

    /// Name of the column at `ordinal`.
    pub fn name(&self, ordinal: usize) -> Result<&str> {
        self.column(ordinal).map(ColumnDefinition::name)
    }

    /// Ordinal of the first column named `name`, ignoring ASCII case.
    pub fn ordinal(&self, name: &str) -> Result<usize> {
        self.inner
            .columns
            .iter()
            .position(|c| c.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    /// Whether `other` is this very definition (not merely an equal one).
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
