//! Aggregated end-of-run reporting.
//!
//! Per-row failures and timestamp diagnostics are collected during the run
//! and rendered once at the end, instead of interleaving with processing.

use bulkload_core::convert::{Diagnostic, RowError};
use bulkload_core::sstable::WriterStats;
use colored::Colorize;
use prettytable::{Cell, Row, Table};
use std::time::Duration;

/// Outcome of one bulk-load run
#[derive(Debug)]
pub struct LoadReport {
    /// Qualified target table name
    pub table: String,
    /// Data rows read from the input (header excluded)
    pub rows_read: u64,
    /// Rows forwarded to the writer
    pub rows_written: u64,
    /// Skipped rows with their input line numbers
    pub skipped: Vec<(u64, RowError)>,
    /// Timestamp recovery diagnostics with their input line numbers
    pub diagnostics: Vec<(u64, Diagnostic)>,
    /// Writer statistics
    pub stats: WriterStats,
    /// Wall-clock run duration
    pub elapsed: Duration,
}

impl LoadReport {
    /// One-line run summary
    pub fn summary(&self) -> String {
        format!(
            "Loaded {} of {} rows into {} ({} block(s), {} bytes) in {:.2?}",
            self.rows_written,
            self.rows_read,
            self.table,
            self.stats.blocks,
            self.stats.compressed_bytes,
            self.elapsed
        )
    }

    /// Print the report to stdout
    pub fn print(&self, quiet: bool) {
        if quiet {
            return;
        }

        let summary = self.summary();
        if self.skipped.is_empty() {
            println!("{}", summary.green());
        } else {
            println!("{}", summary.yellow());
        }
        println!("Data file: {}", self.stats.path.display());

        if !self.diagnostics.is_empty() {
            println!(
                "{}",
                format!(
                    "{} timestamp value(s) substituted:",
                    self.diagnostics.len()
                )
                .yellow()
            );
            for (line, diagnostic) in &self.diagnostics {
                println!(
                    "  line {}: `{}` in {} ({})",
                    line, diagnostic.value, diagnostic.field, diagnostic.note
                );
            }
        }

        if !self.skipped.is_empty() {
            println!("{}", format!("{} row(s) skipped:", self.skipped.len()).red());
            let mut table = Table::new();
            let mut header = Row::empty();
            header.add_cell(Cell::new("Line"));
            header.add_cell(Cell::new("Error"));
            table.add_row(header);
            for (line, err) in &self.skipped {
                let mut row = Row::empty();
                row.add_cell(Cell::new(&line.to_string()));
                row.add_cell(Cell::new(&err.to_string()));
                table.add_row(row);
            }
            table.printstd();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn report(skipped: Vec<(u64, RowError)>) -> LoadReport {
        LoadReport {
            table: "test.orders".to_string(),
            rows_read: 3,
            rows_written: 3 - skipped.len() as u64,
            skipped,
            diagnostics: Vec::new(),
            stats: WriterStats {
                rows_written: 3,
                blocks: 1,
                uncompressed_bytes: 128,
                compressed_bytes: 96,
                path: PathBuf::from("/tmp/test-orders-1-Data.db"),
            },
            elapsed: Duration::from_millis(1500),
        }
    }

    #[test]
    fn test_summary_counts() {
        let report = report(vec![(
            4,
            RowError::MalformedUuid {
                field: "id".to_string(),
                value: "oops".to_string(),
            },
        )]);
        let summary = report.summary();
        assert!(summary.starts_with("Loaded 2 of 3 rows into test.orders"));
        assert!(summary.contains("1 block(s)"));
    }

    #[test]
    fn test_print_does_not_panic() {
        report(Vec::new()).print(false);
        report(Vec::new()).print(true);
    }
}
