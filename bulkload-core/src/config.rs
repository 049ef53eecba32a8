//! Writer configuration

use serde::{Deserialize, Serialize};

/// Configuration for the SSTable bulk writer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Block size for data blocks in bytes (default: 64KB)
    pub block_size: u32,

    /// Compression configuration
    pub compression: CompressionConfig,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            block_size: 64 * 1024,
            compression: CompressionConfig::default(),
        }
    }
}

/// Block compression configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    /// Whether block compression is enabled
    pub enabled: bool,

    /// Compression algorithm to use
    pub algorithm: CompressionAlgorithm,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            algorithm: CompressionAlgorithm::Lz4,
        }
    }
}

/// Supported block compression algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionAlgorithm {
    /// No compression
    None,
    /// LZ4 block compression
    Lz4,
}
