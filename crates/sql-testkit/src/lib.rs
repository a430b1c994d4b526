//! # sql-testkit
//!
//! In-memory data readers and error fakes for testing database code.
//!
//! Code that consumes tabular results can be exercised against synthetic
//! resultsets instead of a live server:
//!
//! - [`RecordSetDefinition`] / [`ColumnDefinition`]: the schema of a resultset
//! - [`ObjectRecord`]: one validated row
//! - [`ObjectSet`]: the rows of one resultset
//! - [`ObjectReader`]: a forward-only, multi-resultset reader over sets
//! - [`CachedDataReader`]: any reader buffered into a replayable byte snapshot
//! - [`SqlError`] / [`SqlException`]: fabricated server errors
//! - [`Generator`]: random values that always satisfy their columns
//!
//! ## Example
//!
//! ```rust
//! use sql_testkit::{
//!     DataReader, DataRecord, ObjectReader, ObjectSet, RecordSetDefinition, SqlValue,
//! };
//!
//! let users = RecordSetDefinition::from_declarations(&[
//!     ("Id", "INT"),
//!     ("Name", "NVARCHAR(50)"),
//! ])?;
//!
//! let mut set = ObjectSet::new(users).with_records_affected(1);
//! set.add_values(vec![SqlValue::Int(1), SqlValue::String("Ada".into())])?;
//!
//! let mut reader = ObjectReader::from_sets([set]);
//! while reader.read()? {
//!     let name: String = reader.get_by_name("name")?;
//!     assert_eq!(name, "Ada");
//! }
//! # Ok::<(), sql_testkit::Error>(())
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod cached;
pub mod column;
pub mod config;
pub mod data_record;
pub mod definition;
pub mod error;
pub mod fakes;
pub mod generator;
pub mod reader;
pub mod record;
pub mod set;
pub mod state;

// Re-export commonly used types
pub use cached::CachedDataReader;
pub use column::ColumnDefinition;
pub use config::GeneratorConfig;
pub use data_record::{DataReader, DataRecord, FromRecord};
pub use definition::RecordSetDefinition;
pub use error::{Error, ErrorKind, Result};
pub use fakes::{SqlError, SqlException};
pub use generator::Generator;
pub use reader::ObjectReader;
pub use record::ObjectRecord;
pub use set::ObjectSet;
pub use state::ReaderState;
pub use testkit_types::{FromSql, SqlType, SqlValue, ToSql};
