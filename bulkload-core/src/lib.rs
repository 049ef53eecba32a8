//! Bulkload core library
//!
//! Converts delimited text records into typed rows and writes them to an
//! SSTable-style bulk-load data file. The conversion pipeline is stateless
//! and per-row; the writer presents a single-writer contract.

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod convert;
pub mod error;
pub mod schema;
pub mod sstable;
pub mod types;

// Re-export main types for convenience
pub use crate::{
    config::WriterConfig,
    convert::{RowConverter, TimestampPolicy},
    error::{Error, Result},
    schema::{InsertStatement, TableSchema},
    sstable::SSTableBuilder,
    types::{DataType, RowKey, Value},
};
