//! Column definitions.

use testkit_types::{SqlType, SqlValue};

use crate::error::{Error, Result};
use crate::generator::Generator;

/// A column of a [`RecordSetDefinition`](crate::RecordSetDefinition).
///
/// A column is unowned until a definition adopts it, at which point it
/// receives its ordinal. Clones keep the ordinal, so a column taken from
/// one definition cannot be adopted by another.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    name: String,
    sql_type: SqlType,
    nullable: bool,
    ordinal: Option<usize>,
}

impl ColumnDefinition {
    /// Create a nullable column.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            nullable: true,
            ordinal: None,
        }
    }

    /// Create a column from an SQL declaration such as `NVARCHAR(50)`.
    pub fn from_declaration(name: impl Into<String>, declaration: &str) -> Result<Self> {
        let sql_type = SqlType::from_sql_type(declaration)
            .ok_or_else(|| Error::UnknownType(declaration.to_string()))?;
        Ok(Self::new(name, sql_type))
    }

    /// Make the column reject NULL.
    #[must_use]
    pub fn not_null(self) -> Self {
        self.with_nullable(false)
    }

    /// Set whether the column accepts NULL.
    #[must_use]
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type.
    #[must_use]
    pub fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    /// Whether the column accepts NULL.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Ordinal within the owning definition, `None` while unowned.
    #[must_use]
    pub fn ordinal(&self) -> Option<usize> {
        self.ordinal
    }

    /// Whether a definition owns this column.
    #[must_use]
    pub fn is_owned(&self) -> bool {
        self.ordinal.is_some()
    }

    pub(crate) fn adopt(&mut self, ordinal: usize) -> Result<()> {
        if let Some(owned) = self.ordinal {
            return Err(Error::ColumnOwned {
                name: self.name.clone(),
                ordinal: owned,
            });
        }
        self.sql_type
            .check()
            .map_err(|source| Error::InvalidColumnType {
                column: self.name.clone(),
                source,
            })?;
        self.ordinal = Some(ordinal);
        Ok(())
    }

    /// Validate a value for this column, returning the value to store.
    ///
    /// The value may be coerced: integers widen, text and binary are
    /// truncated to the column length, decimals are rounded to its scale.
    pub fn validate(&self, value: SqlValue) -> Result<SqlValue> {
        if value.is_null() {
            if self.nullable {
                return Ok(value);
            }
            tracing::warn!(column = %self.name, "NULL rejected by non-nullable column");
            return Err(Error::NotNullable {
                column: self.name.clone(),
            });
        }

        self.sql_type.coerce(value).map_err(|source| {
            tracing::warn!(
                column = %self.name,
                sql_type = %self.sql_type,
                error = %source,
                "value rejected"
            );
            Error::Validation {
                column: self.name.clone(),
                source,
            }
        })
    }

    /// Produce a random value that passes [`validate`](Self::validate).
    pub fn random_value(&self, generator: &mut Generator) -> SqlValue {
        generator.value_for(self.sql_type, self.nullable)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_from_declaration() {
        let column = ColumnDefinition::from_declaration("Name", "nvarchar(5)").unwrap();
        assert_eq!(column.sql_type(), SqlType::NVarChar { max_length: 5 });
        assert!(column.is_nullable());
        assert!(!column.is_owned());

        let err = ColumnDefinition::from_declaration("Shape", "GEOMETRY").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
    }

    #[test]
    fn test_validate_null() {
        let nullable = ColumnDefinition::new("A", SqlType::Int);
        assert_eq!(nullable.validate(SqlValue::Null).unwrap(), SqlValue::Null);

        let required = ColumnDefinition::new("B", SqlType::Int).not_null();
        let err = required.validate(SqlValue::Null).unwrap_err();
        assert!(matches!(err, Error::NotNullable { ref column } if column == "B"));
        assert_eq!(err.kind(), ErrorKind::Argument);
    }

    #[test]
    fn test_validate_coerces_and_rejects() {
        let column = ColumnDefinition::new("Code", SqlType::NVarChar { max_length: 2 });
        assert_eq!(
            column.validate(SqlValue::String("ABC".into())).unwrap(),
            SqlValue::String("AB".into())
        );

        let err = column.validate(SqlValue::Int(1)).unwrap_err();
        assert!(matches!(err, Error::Validation { ref column, .. } if column == "Code"));
        assert_eq!(err.kind(), ErrorKind::Argument);
    }

    #[test]
    fn test_adopt_once() {
        let mut column = ColumnDefinition::new("Id", SqlType::Int);
        column.adopt(3).unwrap();
        assert_eq!(column.ordinal(), Some(3));

        let mut copy = column.clone();
        let err = copy.adopt(0).unwrap_err();
        assert!(matches!(err, Error::ColumnOwned { ordinal: 3, .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_adopt_rejects_invalid_type() {
        let mut column = ColumnDefinition::new("Amount", SqlType::Decimal {
            precision: 2,
            scale: 5,
        });
        let err = column.adopt(0).unwrap_err();
        assert!(matches!(err, Error::InvalidColumnType { ref column, .. } if column == "Amount"));
        assert_eq!(err.kind(), ErrorKind::Argument);
        assert!(!column.is_owned());
    }
}
