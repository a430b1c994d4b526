//! # testkit-protocol
//!
//! Byte-buffer snapshot format for cached resultsets.
//!
//! A snapshot captures every resultset of a data reader (column metadata,
//! rows and completion information) so it can be replayed later without
//! the original source. The layout borrows the COLMETADATA / NBCROW / DONE
//! token structure of the TDS response stream.
//!
//! This crate is pure: no I/O, no logging, just encode and decode.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod codec;
pub mod error;
pub mod snapshot;
pub mod token;
pub mod value;

pub use error::ProtocolError;
pub use snapshot::{ResultSetSnapshot, Snapshot};
pub use token::{ColMetaData, ColumnFlags, ColumnMeta, Done, DoneStatus, TokenType};
