//! Periodic flush and point-in-time backup of the wallet file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;

use crate::db::{WalletDb, WalletDbError};
use crate::logging;

/// When a best-effort flush is worth the fsync.
#[derive(Debug, Clone)]
pub struct FlushPolicy {
    /// Minimum time between flushes.
    pub min_interval: Duration,
    /// Dirty writes that trigger a flush regardless of the interval.
    pub dirty_threshold: u64,
}

impl Default for FlushPolicy {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(2),
            dirty_threshold: 64,
        }
    }
}

#[derive(Debug, Error)]
pub enum BackupError {
    #[error(transparent)]
    Db(#[from] WalletDbError),

    #[error("failed to copy wallet to {path}: {source}")]
    Copy {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Best-effort flush driven by `policy`. Returns whether a flush ran.
///
/// Failures are logged and swallowed; a missed flush costs durability of
/// recent writes, not correctness, and the next call retries. When churn
/// has piled up, the flush is upgraded to a full compaction.
pub fn maybe_flush(db: &mut WalletDb, policy: &FlushPolicy) -> bool {
    let due = db.dirty_writes() >= policy.dirty_threshold
        || (db.dirty_writes() > 0 && db.last_flush().elapsed() >= policy.min_interval);
    if !due {
        return false;
    }

    let result = if db.needs_rewrite() {
        db.compact()
    } else {
        db.flush()
    };
    if let Err(err) = result {
        logging::warn(
            "wallet_flush_failed",
            &[
                ("error", &err.to_string()),
                ("path", &db.path().display().to_string()),
            ],
        );
        return false;
    }
    true
}

/// Copy the wallet file to `dest` after forcing it to stable storage.
///
/// `dest` may be a directory, in which case the copy gets a timestamped
/// filename. A partial copy left by a failed attempt is removed.
pub fn backup_wallet(db: &mut WalletDb, dest: &Path) -> Result<PathBuf, BackupError> {
    db.flush()?;

    let target = if dest.is_dir() {
        let stamp = Utc::now().format("%Y-%m-%d-%H%M%S");
        let name = db
            .path()
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("wallet");
        dest.join(format!("{name}-{stamp}.dat"))
    } else {
        dest.to_path_buf()
    };

    if let Err(source) = copy_and_sync(db.path(), &target) {
        let _ = fs::remove_file(&target);
        return Err(BackupError::Copy {
            path: target,
            source,
        });
    }

    logging::info(
        "wallet_backup",
        &[
            ("source", &db.path().display().to_string()),
            ("target", &target.display().to_string()),
        ],
    );
    Ok(target)
}

fn copy_and_sync(source: &Path, target: &Path) -> std::io::Result<()> {
    fs::copy(source, target)?;
    fs::File::open(target)?.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::{load_wallet, DbLoadStatus, WalletState};
    use tempfile::TempDir;

    #[test]
    fn test_maybe_flush_only_when_dirty() {
        let dir = TempDir::new().unwrap();
        let mut db = WalletDb::open(&dir.path().join("wallet.dat")).unwrap();
        let policy = FlushPolicy {
            min_interval: Duration::ZERO,
            dirty_threshold: 1,
        };

        assert!(!maybe_flush(&mut db, &policy));
        db.write_name("addr", "label").unwrap();
        assert!(maybe_flush(&mut db, &policy));
        assert_eq!(db.dirty_writes(), 0);
        assert!(!maybe_flush(&mut db, &policy));
    }

    #[test]
    fn test_backup_to_file_is_loadable() {
        let dir = TempDir::new().unwrap();
        let mut db = WalletDb::open(&dir.path().join("wallet.dat")).unwrap();
        db.write_name("addr", "label").unwrap();

        let target = dir.path().join("copy.dat");
        let written = backup_wallet(&mut db, &target).unwrap();
        assert_eq!(written, target);
        drop(db);

        let copy = WalletDb::open(&target).unwrap();
        let mut state = WalletState::new();
        assert_eq!(load_wallet(&copy, &mut state), DbLoadStatus::Ok);
        assert_eq!(state.names["addr"], "label");
    }

    #[test]
    fn test_backup_copy_failure_surfaces_target_path() {
        let dir = TempDir::new().unwrap();
        let mut db = WalletDb::open(&dir.path().join("wallet.dat")).unwrap();
        db.write_name("addr", "label").unwrap();

        // Destination inside a directory that does not exist.
        let target = dir.path().join("missing").join("copy.dat");
        let err = backup_wallet(&mut db, &target).unwrap_err();
        match err {
            BackupError::Copy { path, .. } => assert_eq!(path, target),
            other => panic!("wrong error: {other}"),
        }
    }

    #[test]
    fn test_db_error_converts() {
        use crate::kv::KvError;
        let err = BackupError::from(WalletDbError::Kv(KvError::Locked("w.dat".into())));
        assert!(matches!(err, BackupError::Db(_)));
    }

    #[test]
    fn test_backup_to_directory_gets_timestamped_name() {
        let dir = TempDir::new().unwrap();
        let mut db = WalletDb::open(&dir.path().join("wallet.dat")).unwrap();
        db.write_name("addr", "label").unwrap();

        let out = dir.path().join("backups");
        fs::create_dir(&out).unwrap();
        let written = backup_wallet(&mut db, &out).unwrap();
        assert_eq!(written.parent(), Some(out.as_path()));
        let name = written.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("wallet-"));
        assert!(name.ends_with(".dat"));
    }
}
