//! SSTable writer implementation
//!
//! Synchronous single-writer sink producing one Data component per run.
//! Rows are buffered, sorted by key within each block, checksummed, and
//! optionally LZ4-compressed; an index of block locations and a footer are
//! written at finish time.

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::{CompressionAlgorithm, WriterConfig};
use crate::convert::TypedRow;
use crate::error::{Error, Result};
use crate::types::RowKey;

/// Magic bytes identifying a bulkload data file
pub const MAGIC: [u8; 4] = *b"BLKD";

/// On-disk format version
const FORMAT_VERSION: &[u8; 2] = b"ba";

/// Byte offset of the entry-count field inside the 32-byte header
const HEADER_ENTRY_COUNT_OFFSET: u64 = 10;

/// Location of one flushed data block
#[derive(Debug, Clone)]
struct BlockIndexEntry {
    offset: u64,
    len: u32,
    uncompressed_len: u32,
    checksum: u32,
    entries: u32,
}

/// Statistics reported when a writer is finished
#[derive(Debug, Clone)]
pub struct WriterStats {
    /// Rows written to the data file
    pub rows_written: u64,
    /// Number of data blocks
    pub blocks: u32,
    /// Total uncompressed block bytes
    pub uncompressed_bytes: u64,
    /// Total on-disk block bytes
    pub compressed_bytes: u64,
    /// Path of the data file
    pub path: PathBuf,
}

/// SSTable writer for creating one bulk-load data file
pub struct SSTableWriter {
    /// Output file writer
    writer: BufWriter<File>,

    /// Path of the data file
    path: PathBuf,

    /// Configuration
    config: WriterConfig,

    /// Expected number of values per row
    column_count: usize,

    /// Row positions of the partition key columns
    partition_positions: Vec<usize>,

    /// Row positions of the clustering key columns
    clustering_positions: Vec<usize>,

    /// Current offset in the file
    offset: u64,

    /// Rows buffered for the current block
    pending: Vec<(RowKey, Vec<u8>)>,
    pending_bytes: usize,

    /// Index entries for the footer
    index_entries: Vec<BlockIndexEntry>,

    /// Statistics
    entry_count: u64,
    uncompressed_size: u64,
    compressed_size: u64,

    /// File creation timestamp (microseconds since Unix epoch)
    created_at: u64,

    /// Whether the writer is finalized
    finalized: bool,
}

impl SSTableWriter {
    /// Create a new writer and emit the file header
    pub(crate) fn create(
        path: PathBuf,
        config: WriterConfig,
        column_count: usize,
        partition_positions: Vec<usize>,
        clustering_positions: Vec<usize>,
    ) -> Result<Self> {
        let file = File::create(&path)?;
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros() as u64;

        let mut writer = Self {
            writer: BufWriter::new(file),
            path,
            config,
            column_count,
            partition_positions,
            clustering_positions,
            offset: 0,
            pending: Vec::new(),
            pending_bytes: 0,
            index_entries: Vec::new(),
            entry_count: 0,
            uncompressed_size: 0,
            compressed_size: 0,
            created_at,
            finalized: false,
        };
        writer.write_header()?;
        Ok(writer)
    }

    /// Path of the data file being written
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the 32-byte file header
    fn write_header(&mut self) -> Result<()> {
        let mut header = Vec::with_capacity(32);

        header.extend_from_slice(&MAGIC);
        header.extend_from_slice(FORMAT_VERSION);

        let mut flags = 0u32;
        if self.compression_enabled() {
            flags |= 0x01;
        }
        header.extend_from_slice(&flags.to_be_bytes());

        // Entry count placeholder, patched at finish
        header.extend_from_slice(&0u64.to_be_bytes());

        header.extend_from_slice(&self.created_at.to_be_bytes());

        // Reserved padding to reach the fixed 32-byte header
        header.extend_from_slice(&[0u8; 6]);
        debug_assert_eq!(header.len(), 32);

        self.writer.write_all(&header)?;
        self.offset += header.len() as u64;
        Ok(())
    }

    fn compression_enabled(&self) -> bool {
        self.config.compression.enabled
            && self.config.compression.algorithm != CompressionAlgorithm::None
    }

    /// Add one typed row.
    ///
    /// The row must carry exactly one value per bound column; key columns
    /// must be non-null. Rows are buffered and flushed in sorted blocks.
    pub fn add_row(&mut self, row: TypedRow) -> Result<()> {
        if self.finalized {
            return Err(Error::storage("cannot add row to finalized SSTable"));
        }
        if row.len() != self.column_count {
            return Err(Error::schema(format!(
                "row has {} values, expected {}",
                row.len(),
                self.column_count
            )));
        }

        let key = self.row_key(&row)?;
        let payload = bincode::serialize(&(&key, &row))?;

        self.pending_bytes += payload.len();
        self.pending.push((key, payload));
        self.entry_count += 1;

        if self.pending_bytes >= self.config.block_size as usize {
            self.flush_block()?;
        }
        Ok(())
    }

    /// Derive the block-ordering key from partition and clustering columns
    fn row_key(&self, row: &TypedRow) -> Result<RowKey> {
        let mut key_values = Vec::with_capacity(
            self.partition_positions.len() + self.clustering_positions.len(),
        );
        for positions in [&self.partition_positions, &self.clustering_positions] {
            for &position in positions.iter() {
                let value = &row[position];
                if value.is_null() {
                    return Err(Error::type_conversion(format!(
                        "null key value at position {}",
                        position
                    )));
                }
                key_values.push(value.clone());
            }
        }
        RowKey::from_values(&key_values)
    }

    /// Sort the pending rows by key and write them out as one block
    fn flush_block(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        self.pending.sort_by(|a, b| a.0.cmp(&b.0));

        let mut block = Vec::with_capacity(self.pending_bytes + self.pending.len() * 4);
        for (_, payload) in &self.pending {
            block.extend_from_slice(&(payload.len() as u32).to_be_bytes());
            block.extend_from_slice(payload);
        }
        let entries = self.pending.len() as u32;
        self.pending.clear();
        self.pending_bytes = 0;

        let uncompressed_len = block.len() as u32;
        let payload = if self.compression_enabled() {
            lz4_flex::compress_prepend_size(&block)
        } else {
            block
        };
        let checksum = crc32fast::hash(&payload);

        self.writer
            .write_all(&(payload.len() as u32).to_be_bytes())?;
        self.writer.write_all(&payload)?;

        self.index_entries.push(BlockIndexEntry {
            offset: self.offset,
            len: payload.len() as u32,
            uncompressed_len,
            checksum,
            entries,
        });

        self.uncompressed_size += uncompressed_len as u64;
        self.compressed_size += payload.len() as u64;
        self.offset += 4 + payload.len() as u64;
        Ok(())
    }

    /// Flush the tail block, write index and footer, patch the header, and
    /// sync the file. The writer accepts no rows afterwards.
    pub fn finish(&mut self) -> Result<WriterStats> {
        if self.finalized {
            return Err(Error::storage("SSTable already finalized"));
        }
        self.flush_block()?;

        let index_offset = self.offset;
        self.writer
            .write_all(&(self.index_entries.len() as u32).to_be_bytes())?;
        for entry in &self.index_entries {
            self.writer.write_all(&entry.offset.to_be_bytes())?;
            self.writer.write_all(&entry.len.to_be_bytes())?;
            self.writer.write_all(&entry.uncompressed_len.to_be_bytes())?;
            self.writer.write_all(&entry.checksum.to_be_bytes())?;
            self.writer.write_all(&entry.entries.to_be_bytes())?;
        }

        // Footer: index location, entry count, closing magic
        self.writer.write_all(&index_offset.to_be_bytes())?;
        self.writer.write_all(&self.entry_count.to_be_bytes())?;
        self.writer.write_all(&MAGIC)?;

        // Patch the entry-count placeholder in the header
        self.writer
            .seek(SeekFrom::Start(HEADER_ENTRY_COUNT_OFFSET))?;
        self.writer.write_all(&self.entry_count.to_be_bytes())?;

        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        self.finalized = true;

        Ok(WriterStats {
            rows_written: self.entry_count,
            blocks: self.index_entries.len() as u32,
            uncompressed_bytes: self.uncompressed_size,
            compressed_bytes: self.compressed_size,
            path: self.path.clone(),
        })
    }
}

impl std::fmt::Debug for SSTableWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SSTableWriter")
            .field("path", &self.path)
            .field("entry_count", &self.entry_count)
            .field("finalized", &self.finalized)
            .finish()
    }
}
