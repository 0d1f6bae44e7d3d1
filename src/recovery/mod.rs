//! Recovery controller: rebuild a readable wallet from a damaged file.
//!
//! The pipeline is salvage, re-validate, rewrite. Engine-level salvage
//! pulls every checksum-valid pair out of the source; each pair is then
//! re-decoded against the record catalog and dropped if its schema no
//! longer parses; the survivors are committed into a fresh destination
//! file in one batch. The source file is never written.

mod report;

pub use report::RecoveryReport;

use std::path::Path;

use thiserror::Error;

use crate::kv::{self, Batch, FileKv, FileLock, KvError};
use crate::logging;
use crate::records::{decode_record, parse_record_key, RecordKind};

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error(transparent)]
    Kv(#[from] KvError),

    #[error("nothing recoverable in {0}")]
    NothingSalvaged(std::path::PathBuf),

    #[error("no key material recovered from {0}")]
    NoKeyMaterial(std::path::PathBuf),

    #[error("destination {0} already exists")]
    DestinationExists(std::path::PathBuf),

    #[error("failed to write recovery report: {0}")]
    Report(#[from] std::io::Error),
}

/// Rebuild `source` into a fresh wallet file at `dest`.
///
/// With `only_keys` set, only the kinds carrying key material survive;
/// everything else a later chain rescan can regenerate. Requires that no
/// live handle holds the source (its lock is taken for the duration) and
/// that `dest` does not exist yet.
pub fn recover(
    source: &Path,
    dest: &Path,
    only_keys: bool,
) -> Result<RecoveryReport, RecoveryError> {
    if dest.exists() {
        return Err(RecoveryError::DestinationExists(dest.to_path_buf()));
    }
    let _source_lock = FileLock::acquire(source)?;

    let salvaged = kv::salvage(source)?;
    let mut report = RecoveryReport::new(source, dest, only_keys);
    report.records_salvaged = salvaged.records_recovered;
    report.bytes_skipped = salvaged.bytes_skipped;

    let mut batch = Batch::new();
    for (key, value) in salvaged.pairs {
        // A salvaged pair only counts if the catalog still understands it.
        let (tag, subkey) = match parse_record_key(&key) {
            Ok(parts) => parts,
            Err(_) => {
                *report.dropped.entry("?".into()).or_insert(0) += 1;
                continue;
            }
        };
        let kind = match RecordKind::from_tag(&tag) {
            Some(kind) => kind,
            None => {
                *report.dropped.entry(tag).or_insert(0) += 1;
                continue;
            }
        };
        if decode_record(kind, &subkey, &value).is_err() {
            *report.dropped.entry(tag).or_insert(0) += 1;
            continue;
        }
        if only_keys && !kind.carries_key_material() {
            report.filtered_out += 1;
            continue;
        }
        *report.kept.entry(tag).or_insert(0) += 1;
        batch.put(key, value);
    }

    if batch.is_empty() {
        return Err(if only_keys && report.filtered_out > 0 {
            RecoveryError::NoKeyMaterial(source.to_path_buf())
        } else {
            RecoveryError::NothingSalvaged(source.to_path_buf())
        });
    }

    let mut fresh = FileKv::open(dest)?;
    fresh.commit(batch)?;
    fresh.flush()?;

    logging::info(
        "wallet_recovered",
        &[
            ("dest", &dest.display().to_string()),
            ("dropped", &report.dropped_total().to_string()),
            ("kept", &report.kept_total().to_string()),
            ("source", &source.display().to_string()),
        ],
    );
    report.write_beside(dest)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::WalletDb;
    use crate::load::{load_wallet, DbLoadStatus, WalletState};
    use crate::records::keys::KeyMetadata;
    use crate::records::tx::WalletTx;
    use crate::records::{PubKey, TxHash};
    use std::fs;
    use tempfile::TempDir;

    fn seeded_wallet(path: &Path) -> (PubKey, TxHash) {
        let mut db = WalletDb::open(path).unwrap();
        let pk = PubKey(vec![2u8; 33]);
        db.write_key(&pk, &[7u8; 32], &KeyMetadata::new(1_700_000_000))
            .unwrap();
        let hash = TxHash([4u8; 32]);
        db.write_tx(&hash, &WalletTx::new(b"tx".to_vec())).unwrap();
        db.write_name("addr", "label").unwrap();
        (pk, hash)
    }

    #[test]
    fn test_full_recovery_preserves_everything() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("wallet.dat");
        let dest = dir.path().join("restored.dat");
        let (pk, hash) = seeded_wallet(&source);

        let report = recover(&source, &dest, false).unwrap();
        assert_eq!(report.dropped_total(), 0);
        assert_eq!(report.filtered_out, 0);

        let db = WalletDb::open(&dest).unwrap();
        let mut state = WalletState::new();
        assert_eq!(load_wallet(&db, &mut state), DbLoadStatus::Ok);
        assert!(state.keys.contains_key(&pk));
        assert!(state.txs.contains_key(&hash));
        assert_eq!(state.names["addr"], "label");
    }

    #[test]
    fn test_keys_only_drops_non_key_records() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("wallet.dat");
        let dest = dir.path().join("restored.dat");
        let (pk, hash) = seeded_wallet(&source);

        let report = recover(&source, &dest, true).unwrap();
        assert!(report.filtered_out >= 2);
        assert_eq!(report.kept.get("key"), Some(&1));
        assert_eq!(report.kept.get("keymeta"), Some(&1));

        let db = WalletDb::open(&dest).unwrap();
        let mut state = WalletState::new();
        assert_eq!(load_wallet(&db, &mut state), DbLoadStatus::Ok);
        assert!(state.keys.contains_key(&pk));
        assert!(!state.txs.contains_key(&hash));
        assert!(state.names.is_empty());
    }

    #[test]
    fn test_recovery_refused_while_source_open() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("wallet.dat");
        seeded_wallet(&source);
        let _held = WalletDb::open(&source).unwrap();

        let err = recover(&source, &dir.path().join("out.dat"), false).unwrap_err();
        assert!(matches!(err, RecoveryError::Kv(KvError::Locked(_))));
    }

    #[test]
    fn test_recovery_refuses_existing_destination() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("wallet.dat");
        let dest = dir.path().join("restored.dat");
        seeded_wallet(&source);
        fs::write(&dest, b"occupied").unwrap();

        let err = recover(&source, &dest, false).unwrap_err();
        assert!(matches!(err, RecoveryError::DestinationExists(_)));
    }

    #[test]
    fn test_recovery_fails_on_hopeless_file() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("wallet.dat");
        fs::write(&source, vec![0xa5u8; 64]).unwrap();

        let err = recover(&source, &dir.path().join("out.dat"), false).unwrap_err();
        assert!(matches!(err, RecoveryError::NothingSalvaged(_)));
    }

    #[test]
    fn test_report_written_beside_destination() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("wallet.dat");
        let dest = dir.path().join("restored.dat");
        seeded_wallet(&source);

        recover(&source, &dest, false).unwrap();
        let report_path = RecoveryReport::path_for(&dest);
        let json = fs::read_to_string(report_path).unwrap();
        let report: RecoveryReport = serde_json::from_str(&json).unwrap();
        assert!(report.records_salvaged > 0);
    }
}
