use anyhow::{ensure, Result};
use bulkload_core::{TableSchema, TimestampPolicy};
use std::path::PathBuf;

/// Run configuration, built once from parsed arguments and passed down.
/// Never mutated after construction.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub policy: TimestampPolicy,
    pub delimiter: u8,
}

impl LoadConfig {
    pub fn new(
        input: PathBuf,
        output_dir: PathBuf,
        policy: TimestampPolicy,
        delimiter: char,
    ) -> Result<Self> {
        ensure!(
            delimiter.is_ascii(),
            "delimiter must be a single ASCII character, got `{}`",
            delimiter
        );
        Ok(Self {
            input,
            output_dir,
            policy,
            delimiter: delimiter as u8,
        })
    }

    /// `<output>/<keyspace>/<table>`, the directory the data file lands in
    pub fn table_directory(&self, schema: &TableSchema) -> PathBuf {
        self.output_dir.join(&schema.keyspace).join(&schema.table)
    }
}
