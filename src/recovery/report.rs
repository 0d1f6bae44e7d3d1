//! Recovery report: what survived, what did not.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Per-run summary of a recovery, returned to the caller and written as
/// JSON beside the destination file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// RFC 3339 UTC timestamp of the run.
    pub created_at: String,
    /// Whether the keys-only filter was active.
    pub keys_only: bool,
    /// Checksum-valid log records the salvage pass read.
    pub records_salvaged: u64,
    /// Bytes the salvage pass had to skip over.
    pub bytes_skipped: u64,
    /// Records written to the destination, by type tag.
    pub kept: BTreeMap<String, u64>,
    /// Records dropped because their schema no longer decoded, by tag;
    /// pairs whose tag was unreadable count under `"?"`.
    pub dropped: BTreeMap<String, u64>,
    /// Decodable records excluded by the keys-only filter.
    pub filtered_out: u64,
}

impl RecoveryReport {
    pub fn new(source: &Path, destination: &Path, keys_only: bool) -> Self {
        Self {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            created_at: Utc::now().to_rfc3339(),
            keys_only,
            records_salvaged: 0,
            bytes_skipped: 0,
            kept: BTreeMap::new(),
            dropped: BTreeMap::new(),
            filtered_out: 0,
        }
    }

    pub fn kept_total(&self) -> u64 {
        self.kept.values().sum()
    }

    pub fn dropped_total(&self) -> u64 {
        self.dropped.values().sum()
    }

    /// Path the JSON report is written to: the destination file's name
    /// with a `.recovery.json` suffix appended.
    pub fn path_for(destination: &Path) -> PathBuf {
        let mut name = destination.file_name().map_or_else(
            || std::ffi::OsString::from("wallet"),
            |n| n.to_os_string(),
        );
        name.push(".recovery.json");
        destination.with_file_name(name)
    }

    pub fn write_beside(&self, destination: &Path) -> io::Result<PathBuf> {
        let path = Self::path_for(destination);
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(&path, json)?;
        Ok(path)
    }
}
