//! Key-value engine error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by the file-backed key-value engine.
#[derive(Debug, Error)]
pub enum KvError {
    /// Disk I/O failure outside the record framing.
    #[error("i/o failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Another handle holds the exclusive lock on this wallet file.
    #[error("wallet file {0} is locked by another handle")]
    Locked(PathBuf),

    /// The file does not start with the wallet database magic.
    #[error("{0} is not a wallet database file")]
    BadMagic(PathBuf),

    /// Structural damage detected inside the log framing.
    #[error("corruption at byte offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },
}

impl KvError {
    pub(crate) fn io(path: &std::path::Path, source: io::Error) -> Self {
        KvError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn corrupt(offset: u64, reason: impl Into<String>) -> Self {
        KvError::Corrupt {
            offset,
            reason: reason.into(),
        }
    }
}

/// Result type for engine operations.
pub type KvResult<T> = Result<T, KvError>;
