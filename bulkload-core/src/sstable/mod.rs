//! SSTable bulk-load sink
//!
//! The builder mirrors the bulk-writer construction flow: point it at a
//! directory, give it the target schema and the insert statement, and it
//! hands back a single-writer sink. Schema/insert mismatches are rejected
//! here, before any row is processed.

pub mod writer;

pub use writer::{SSTableWriter, WriterStats};

use crate::config::WriterConfig;
use crate::error::{Error, Result};
use crate::schema::{InsertStatement, TableSchema};
use std::fs;
use std::path::{Path, PathBuf};

/// Builder for [`SSTableWriter`]
#[derive(Debug, Default)]
pub struct SSTableBuilder {
    directory: Option<PathBuf>,
    schema: Option<TableSchema>,
    insert: Option<InsertStatement>,
    config: WriterConfig,
}

impl SSTableBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output directory
    pub fn in_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    /// Set the target table schema
    pub fn for_table(mut self, schema: TableSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Set the insert statement driving the column order
    pub fn using(mut self, insert: InsertStatement) -> Self {
        self.insert = Some(insert);
        self
    }

    /// Override the writer configuration
    pub fn with_config(mut self, config: WriterConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate schema and insert binding, create the data file, and return
    /// the writer. Fails with a schema error on any column count/order
    /// mismatch, before any row is written.
    pub fn build(self) -> Result<SSTableWriter> {
        let directory = self
            .directory
            .ok_or_else(|| Error::storage("output directory not set"))?;
        let schema = self
            .schema
            .ok_or_else(|| Error::schema("target table schema not set"))?;
        let insert = self
            .insert
            .ok_or_else(|| Error::schema("insert statement not set"))?;

        schema.validate()?;
        let specs = insert.bind(&schema)?;

        let partition_positions = key_positions(&schema.partition_keys, &specs)?;
        let clustering_positions = key_positions(&schema.clustering_keys, &specs)?;

        fs::create_dir_all(&directory)?;
        let path = next_data_file(&directory, &schema)?;

        SSTableWriter::create(
            path,
            self.config,
            specs.len(),
            partition_positions,
            clustering_positions,
        )
    }
}

fn key_positions(
    keys: &[crate::schema::KeyColumn],
    specs: &[crate::convert::ColumnSpec],
) -> Result<Vec<usize>> {
    keys.iter()
        .map(|key| {
            specs
                .iter()
                .position(|spec| spec.name == key.name)
                .ok_or_else(|| {
                    Error::schema(format!("key column `{}` missing from insert", key.name))
                })
        })
        .collect()
}

/// Component file name: `<keyspace>-<table>-<generation>-Data.db`
fn data_file_name(schema: &TableSchema, generation: u32) -> String {
    format!("{}-{}-{}-Data.db", schema.keyspace, schema.table, generation)
}

/// Pick the first unused generation number in the directory
fn next_data_file(directory: &Path, schema: &TableSchema) -> Result<PathBuf> {
    for generation in 1..u32::MAX {
        let path = directory.join(data_file_name(schema, generation));
        if !path.exists() {
            return Ok(path);
        }
    }
    Err(Error::storage("no free generation number"))
}
