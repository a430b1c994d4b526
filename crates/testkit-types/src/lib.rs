//! # testkit-types
//!
//! Column types, dynamic values and conversions for synthetic resultsets.
//!
//! - [`SqlType`]: declared column type, parsed from SQL declarations
//! - [`SqlValue`]: a single cell value
//! - [`FromSql`] / [`ToSql`]: strict extraction and conversion
//! - [`SqlType::coerce`]: the write-time validation rule of a column

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod coerce;
pub mod error;
pub mod from_sql;
pub mod sql_type;
pub mod to_sql;
pub mod value;

pub use error::TypeError;
pub use from_sql::FromSql;
pub use sql_type::{MAX_LENGTH, SqlType};
pub use to_sql::ToSql;
pub use value::SqlValue;
