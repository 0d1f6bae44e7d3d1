//! Selective erase of transaction records.
//!
//! Zapping touches nothing but `tx`-tagged records; key material, the
//! address book, and every other kind stay exactly as stored. All erases
//! of one call land in a single commit batch.

use crate::db::{DbResult, WalletDb};
use crate::kv::Batch;
use crate::logging;
use crate::records::{self, Reader, RecordKind, TxHash};

/// Outcome of a whole-wallet zap.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ZapOutcome {
    pub kept: Vec<TxHash>,
    pub removed: Vec<TxHash>,
}

fn stored_tx_hashes(db: &WalletDb) -> DbResult<Vec<TxHash>> {
    let prefix = records::kind_prefix(RecordKind::Tx);
    let mut hashes = Vec::new();
    for (raw_key, _) in db.kv().iter_prefix(&prefix) {
        let mut subkey = Reader::new(&raw_key[prefix.len()..]);
        hashes.push(subkey.tx_hash("tx hash")?);
    }
    Ok(hashes)
}

fn erase_tx_batch(db: &mut WalletDb, hashes: &[TxHash]) -> DbResult<()> {
    let mut batch = Batch::new();
    for hash in hashes {
        batch.erase(records::tx_key(hash));
    }
    db.commit_batch(batch)
}

/// Remove transaction records, returning which hashes were kept and
/// which were removed. An empty `filter` removes every transaction; a
/// non-empty one removes only the listed hashes.
pub fn zap_wallet_tx(db: &mut WalletDb, filter: &[TxHash]) -> DbResult<ZapOutcome> {
    let stored = stored_tx_hashes(db)?;
    let mut outcome = ZapOutcome::default();
    for hash in stored {
        if filter.is_empty() || filter.contains(&hash) {
            outcome.removed.push(hash);
        } else {
            outcome.kept.push(hash);
        }
    }
    erase_tx_batch(db, &outcome.removed)?;
    logging::info(
        "wallet_zap",
        &[
            ("kept", &outcome.kept.len().to_string()),
            ("removed", &outcome.removed.len().to_string()),
        ],
    );
    Ok(outcome)
}

/// Remove exactly the requested transactions. Hashes with no stored
/// record are silently omitted from the returned list.
pub fn zap_select_tx(db: &mut WalletDb, requested: &[TxHash]) -> DbResult<Vec<TxHash>> {
    let stored = stored_tx_hashes(db)?;
    let removed: Vec<TxHash> = requested
        .iter()
        .copied()
        .filter(|hash| stored.contains(hash))
        .collect();
    erase_tx_batch(db, &removed)?;
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::tx::WalletTx;
    use tempfile::TempDir;

    fn db_with_txs(dir: &TempDir, hashes: &[TxHash]) -> WalletDb {
        let mut db = WalletDb::open(&dir.path().join("wallet.dat")).unwrap();
        for hash in hashes {
            db.write_tx(hash, &WalletTx::new(hash.as_bytes().to_vec()))
                .unwrap();
        }
        db
    }

    #[test]
    fn test_empty_filter_removes_all() {
        let dir = TempDir::new().unwrap();
        let hashes = [TxHash([1u8; 32]), TxHash([2u8; 32])];
        let mut db = db_with_txs(&dir, &hashes);

        let outcome = zap_wallet_tx(&mut db, &[]).unwrap();
        assert!(outcome.kept.is_empty());
        assert_eq!(outcome.removed.len(), 2);
        assert!(db.read_tx(&hashes[0]).unwrap().is_none());
    }

    #[test]
    fn test_filter_leaves_others_untouched() {
        let dir = TempDir::new().unwrap();
        let h1 = TxHash([1u8; 32]);
        let h2 = TxHash([2u8; 32]);
        let h3 = TxHash([3u8; 32]);
        let mut db = db_with_txs(&dir, &[h1, h2, h3]);
        db.write_name("addr", "label").unwrap();

        let outcome = zap_wallet_tx(&mut db, &[h2]).unwrap();
        assert_eq!(outcome.removed, vec![h2]);
        assert_eq!(outcome.kept, vec![h1, h3]);
        assert!(db.read_tx(&h1).unwrap().is_some());
        assert!(db.read_tx(&h2).unwrap().is_none());
        assert!(db.kv().contains(&records::name_key("addr")));
    }

    #[test]
    fn test_select_missing_hash_omitted() {
        let dir = TempDir::new().unwrap();
        let h1 = TxHash([1u8; 32]);
        let absent = TxHash([9u8; 32]);
        let mut db = db_with_txs(&dir, &[h1]);

        let removed = zap_select_tx(&mut db, &[h1, absent]).unwrap();
        assert_eq!(removed, vec![h1]);
    }

    #[test]
    fn test_select_nothing_on_empty_request() {
        let dir = TempDir::new().unwrap();
        let h1 = TxHash([1u8; 32]);
        let mut db = db_with_txs(&dir, &[h1]);

        let removed = zap_select_tx(&mut db, &[]).unwrap();
        assert!(removed.is_empty());
        assert!(db.read_tx(&h1).unwrap().is_some());
    }
}
