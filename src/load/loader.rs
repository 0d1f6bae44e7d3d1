//! The wallet load scan.
//!
//! Walks the store's ordered cursor once, decoding every record into the
//! caller's sink. The scan never writes; its outcome is a
//! [`DbLoadStatus`] classification rather than an error, because a
//! partially readable wallet is still a wallet the caller may decide to
//! keep using (or to send to recovery).

use std::collections::BTreeMap;
use std::path::Path;

use crate::db::{WalletDb, WalletDbError};
use crate::kv::KvError;
use crate::logging;
use crate::records::keys::KeyMetadata;
use crate::records::tx::WalletTx;
use crate::records::{
    self, parse_record_key, PubKey, Record, RecordKind, Reader, TxHash,
};

use super::state::WalletSink;

/// Highest wallet structural feature version this build understands. A
/// stored `minversion` above it means the wallet was written by software
/// with requirements this build cannot honor.
pub const SUPPORTED_FORMAT_VERSION: u32 = 120_200;

/// Outcome classification of a load, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DbLoadStatus {
    /// Everything decoded.
    Ok,
    /// Readable, but churn warrants a compaction pass.
    NeedRewrite,
    /// One or more non-essential records were skipped.
    NoncriticalError,
    /// The store could not be opened (locked, I/O failure).
    LoadFail,
    /// The store declares a minimum version above what this build supports.
    TooNew,
    /// Structural damage, or an essential record failed to decode.
    Corrupt,
}

enum SecretKind {
    Plain,
    Crypted,
}

/// Open the wallet file and run a full load scan in one step.
///
/// Open failures are classified rather than returned: a held lock or an
/// I/O error is `LoadFail`, structural damage is `Corrupt`. The handle is
/// returned alongside the status whenever the open itself succeeded, so
/// callers can still reach a partially loaded wallet.
pub fn open_and_load(
    path: &Path,
    sink: &mut dyn WalletSink,
) -> (DbLoadStatus, Option<WalletDb>) {
    match WalletDb::open(path) {
        Ok(db) => {
            let status = load_wallet(&db, sink);
            (status, Some(db))
        }
        Err(WalletDbError::Kv(KvError::Locked(_) | KvError::Io { .. })) => {
            (DbLoadStatus::LoadFail, None)
        }
        Err(_) => (DbLoadStatus::Corrupt, None),
    }
}

/// Scan every live record into `sink` and classify the result.
pub fn load_wallet(db: &WalletDb, sink: &mut dyn WalletSink) -> DbLoadStatus {
    let mut status = DbLoadStatus::Ok;
    let mut pending_secrets: Vec<(PubKey, SecretKind, Vec<u8>)> = Vec::new();
    let mut pending_meta: BTreeMap<PubKey, KeyMetadata> = BTreeMap::new();
    let mut highest_pool_index: Option<i64> = None;

    for (raw_key, raw_value) in db.kv().iter() {
        let (tag, subkey) = match parse_record_key(raw_key) {
            Ok(parts) => parts,
            Err(err) => {
                logging::error("wallet_load_malformed_key", &[("error", &err.to_string())]);
                return DbLoadStatus::Corrupt;
            }
        };

        let kind = match RecordKind::from_tag(&tag) {
            Some(kind) => kind,
            None => {
                logging::warn("wallet_load_unknown_record", &[("tag", &tag)]);
                sink.unknown_record(&tag);
                continue;
            }
        };

        let decoded = match records::decode_record(kind, &subkey, raw_value) {
            Ok(decoded) => decoded,
            Err(err) => {
                let fields = [("tag", tag.as_str()), ("error", &err.to_string())];
                if kind.is_essential() {
                    logging::error("wallet_load_essential_corrupt", &fields);
                    return DbLoadStatus::Corrupt;
                }
                logging::warn("wallet_load_record_skipped", &fields);
                status = status.max(DbLoadStatus::NoncriticalError);
                continue;
            }
        };

        if decoded.future_version {
            logging::warn(
                "wallet_load_future_version",
                &[("tag", tag.as_str()), ("version", &decoded.version.to_string())],
            );
        }

        match decoded.value {
            // Key material and metadata may arrive in either order; pair
            // them up once the whole store has been seen.
            Record::Key { pubkey, secret } => {
                pending_secrets.push((pubkey, SecretKind::Plain, secret));
            }
            Record::CryptedKey { pubkey, secret } => {
                pending_secrets.push((pubkey, SecretKind::Crypted, secret));
            }
            Record::KeyMeta { pubkey, meta } => {
                pending_meta.insert(pubkey, meta);
            }
            Record::Pool { index, entry } => {
                highest_pool_index = Some(highest_pool_index.map_or(index, |h| h.max(index)));
                sink.pool(index, entry);
            }
            Record::MinVersion(version) => {
                sink.min_version(version);
                // Data written under a newer structural version must not
                // be partially interpreted; stop right here.
                if version > SUPPORTED_FORMAT_VERSION {
                    logging::error(
                        "wallet_load_too_new",
                        &[
                            ("required", &version.to_string()),
                            ("supported", &SUPPORTED_FORMAT_VERSION.to_string()),
                        ],
                    );
                    return DbLoadStatus::TooNew;
                }
            }
            Record::Name { address, label } => sink.name(address, label),
            Record::Purpose { address, purpose } => sink.purpose(address, purpose),
            Record::Tx { hash, tx } => sink.tx(hash, tx),
            Record::Token { hash, info } => sink.token(hash, info),
            Record::TokenTx { hash, token_tx } => sink.token_tx(hash, token_tx),
            Record::NodeConfig { alias, config } => sink.node_config(alias, config),
            Record::MasterKey { id, key } => sink.master_key(id, key),
            Record::CScript { hash, script } => sink.cscript(hash, script),
            Record::WatchOnly { script, meta } => sink.watch_only(script, meta),
            Record::BestBlock(locator) => sink.best_block(locator),
            Record::OrderPosNext(pos) => sink.order_pos_next(pos),
            Record::SplitThreshold(threshold) => sink.split_threshold(threshold),
            Record::MultiSend(rules) => sink.multisend(rules),
            Record::MSettings(settings) => sink.msettings(settings),
            Record::MsDisabled(disabled) => sink.ms_disabled(disabled),
            Record::AutoCombine(settings) => sink.auto_combine(settings),
            Record::DefaultKey(pubkey) => sink.default_key(pubkey),
            Record::AcEntry {
                account,
                seq,
                entry,
            } => sink.accounting_entry(account, seq, entry),
            Record::Account { name, account } => sink.account(name, account),
            Record::DestData {
                address,
                key,
                value,
            } => sink.dest_data(address, key, value),
            Record::ContractData {
                address,
                key,
                value,
            } => sink.contract_data(address, key, value),
            Record::HdChain(chain) => sink.hd_chain(chain),
        }
    }

    // A key without stored metadata loads with a synthesized default,
    // never fails.
    for (pubkey, secret_kind, secret) in pending_secrets {
        let meta = pending_meta
            .remove(&pubkey)
            .unwrap_or_else(KeyMetadata::unknown);
        match secret_kind {
            SecretKind::Plain => sink.key(pubkey, secret, meta),
            SecretKind::Crypted => sink.crypted_key(pubkey, secret, meta),
        }
    }
    for (pubkey, meta) in pending_meta {
        sink.loose_key_metadata(pubkey, meta);
    }
    if let Some(index) = highest_pool_index {
        sink.highest_pool_index(index);
    }

    if status == DbLoadStatus::Ok && db.needs_rewrite() {
        status = DbLoadStatus::NeedRewrite;
    }
    status
}

/// Narrow scan over transaction records only.
pub fn find_wallet_tx(db: &WalletDb) -> Result<Vec<(TxHash, WalletTx)>, WalletDbError> {
    let prefix = records::kind_prefix(RecordKind::Tx);
    let mut out = Vec::new();
    for (raw_key, raw_value) in db.kv().iter_prefix(&prefix) {
        let mut subkey = Reader::new(&raw_key[prefix.len()..]);
        let hash = subkey.tx_hash("tx hash")?;
        let tx = WalletTx::decode(raw_value)?;
        out.push((hash, tx.value));
    }
    Ok(out)
}
