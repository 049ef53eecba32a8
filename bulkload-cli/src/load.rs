//! The bulk-load run: read header-skipped CSV records, convert each one,
//! forward successes to the writer, collect per-row failures for the
//! end-of-run report.

use crate::config::LoadConfig;
use crate::orders;
use crate::report::LoadReport;
use anyhow::{bail, Context, Result};
use bulkload_core::convert::{Diagnostic, RawRow, RowError};
use bulkload_core::{RowConverter, SSTableBuilder, TimestampPolicy};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io::BufReader;
use std::time::Instant;

pub fn run(config: &LoadConfig) -> Result<LoadReport> {
    let start = Instant::now();

    let schema = orders::schema();
    let insert = orders::insert();
    log::debug!("target schema: {}", schema.create_table_cql());
    log::debug!("insert statement: {}", insert.cql(&schema));

    // Output directory carries keyspace and table name in the path
    let table_dir = config.table_directory(&schema);
    fs::create_dir_all(&table_dir)
        .with_context(|| format!("cannot create output directory: {}", table_dir.display()))?;

    let specs = insert.bind(&schema)?;
    let converter = RowConverter::new(specs, config.policy);

    let mut writer = SSTableBuilder::new()
        .in_directory(&table_dir)
        .for_table(schema.clone())
        .using(insert)
        .build()?;

    let file = File::open(&config.input)
        .with_context(|| format!("cannot open input file: {}", config.input.display()))?;
    let mut reader = csv::ReaderBuilder::new()
        // header line is discarded, not validated against the schema
        .has_headers(true)
        .delimiter(config.delimiter)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {pos} rows processed")
    {
        pb.set_style(style);
    }

    let mut rows_read = 0u64;
    let mut rows_written = 0u64;
    let mut skipped: Vec<(u64, RowError)> = Vec::new();
    let mut diagnostics: Vec<(u64, Diagnostic)> = Vec::new();

    for (index, record) in reader.records().enumerate() {
        let line = index as u64 + 2; // 1-based, after the header line
        // a malformed record or read failure is run-fatal
        let record =
            record.with_context(|| format!("failed to read CSV record at line {}", line))?;
        rows_read += 1;
        pb.set_position(rows_read);

        // A present-but-empty field stays present; only fields the record
        // does not carry at all read as absent (the null marker).
        let raw: RawRow = record.iter().map(|field| Some(field.to_string())).collect();

        match converter.convert(&raw) {
            Ok(conversion) => {
                for diagnostic in conversion.diagnostics {
                    diagnostics.push((line, diagnostic));
                }
                writer.add_row(conversion.row)?;
                rows_written += 1;
            }
            Err(err) => {
                if config.policy == TimestampPolicy::FailRun
                    && matches!(err, RowError::UnparseableTimestamp { .. })
                {
                    bail!("aborting at line {}: {}", line, err);
                }
                log::warn!("skipping line {}: {}", line, err);
                skipped.push((line, err));
            }
        }
    }

    let stats = writer.finish()?;
    pb.finish_and_clear();

    Ok(LoadReport {
        table: schema.qualified_name(),
        rows_read,
        rows_written,
        skipped,
        diagnostics,
        stats,
        elapsed: start.elapsed(),
    })
}
