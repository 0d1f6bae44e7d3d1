//! Typed wallet database handle.
//!
//! `WalletDb` wraps one open [`FileKv`] and exposes write/read/erase
//! operations per record kind. Composite writes that must land together
//! (a key plus its metadata) go through a single commit batch, so a crash
//! can never persist one half without the other. Every committed mutation
//! bumps the update counter exactly once; reads leave it untouched.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use thiserror::Error;

use crate::kv::{Batch, FileKv, KvError};
use crate::records::{
    self, accounting::Account, accounting::AccountingEntry, chainstate::BestBlock,
    hdchain::HdChainState, keys, keys::KeyMetadata, keys::MasterKey, masternode::NodeConfig,
    policy::AutoCombineSettings, policy::MsDisabledAddresses, policy::MultiSendRules,
    policy::MultiSendSettings, pool::KeyPoolEntry, token::TokenInfo, token::TokenTxRecord,
    tx::WalletTx, DecodeError, KeyId, PubKey, Reader, RecordKind, TxHash, Versioned,
};

/// Failure of a single database operation.
#[derive(Debug, Error)]
pub enum WalletDbError {
    #[error(transparent)]
    Kv(#[from] KvError),

    #[error("stored record is malformed: {0}")]
    Decode(#[from] DecodeError),
}

pub type DbResult<T> = Result<T, WalletDbError>;

pub struct WalletDb {
    kv: FileKv,
    update_counter: AtomicU64,
    dirty_writes: u64,
    last_flush: Instant,
}

impl WalletDb {
    /// Open (or create) the wallet file and take its exclusive lock.
    pub fn open(path: &Path) -> DbResult<Self> {
        let kv = FileKv::open(path)?;
        Ok(Self {
            kv,
            update_counter: AtomicU64::new(0),
            dirty_writes: 0,
            last_flush: Instant::now(),
        })
    }

    pub fn path(&self) -> &Path {
        self.kv.path()
    }

    pub(crate) fn kv(&self) -> &FileKv {
        &self.kv
    }

    pub(crate) fn kv_mut(&mut self) -> &mut FileKv {
        &mut self.kv
    }

    /// Number of committed mutations since this handle was opened.
    pub fn update_counter(&self) -> u64 {
        self.update_counter.load(Ordering::SeqCst)
    }

    pub(crate) fn bump_counter(&mut self) {
        self.update_counter.fetch_add(1, Ordering::SeqCst);
        self.dirty_writes += 1;
    }

    /// Writes committed since the last successful flush.
    pub fn dirty_writes(&self) -> u64 {
        self.dirty_writes
    }

    pub fn last_flush(&self) -> Instant {
        self.last_flush
    }

    /// Force buffered log data to stable storage.
    pub fn flush(&mut self) -> DbResult<()> {
        self.kv.flush()?;
        self.dirty_writes = 0;
        self.last_flush = Instant::now();
        Ok(())
    }

    /// Whether accumulated churn warrants rewriting the log.
    pub fn needs_rewrite(&self) -> bool {
        self.kv.needs_rewrite()
    }

    /// Rewrite the log to its live contents only.
    pub fn compact(&mut self) -> DbResult<()> {
        self.kv.compact()?;
        self.dirty_writes = 0;
        self.last_flush = Instant::now();
        Ok(())
    }

    fn write(&mut self, key: Vec<u8>, value: Vec<u8>) -> DbResult<()> {
        self.kv.put(key, value)?;
        self.bump_counter();
        Ok(())
    }

    fn erase(&mut self, key: Vec<u8>) -> DbResult<bool> {
        let erased = self.kv.erase(key)?;
        if erased {
            self.bump_counter();
        }
        Ok(erased)
    }

    /// Commit a prepared batch as one mutation. Empty batches are a no-op
    /// and do not touch the counter.
    pub(crate) fn commit_batch(&mut self, batch: Batch) -> DbResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        self.kv.commit(batch)?;
        self.bump_counter();
        Ok(())
    }

    // -- address book -------------------------------------------------------

    pub fn write_name(&mut self, address: &str, label: &str) -> DbResult<()> {
        self.write(
            records::name_key(address),
            records::address::encode_string_value(label),
        )
    }

    pub fn erase_name(&mut self, address: &str) -> DbResult<bool> {
        self.erase(records::name_key(address))
    }

    pub fn write_purpose(&mut self, address: &str, purpose: &str) -> DbResult<()> {
        self.write(
            records::purpose_key(address),
            records::address::encode_string_value(purpose),
        )
    }

    pub fn erase_purpose(&mut self, address: &str) -> DbResult<bool> {
        self.erase(records::purpose_key(address))
    }

    pub fn write_dest_data(&mut self, address: &str, key: &str, value: &str) -> DbResult<()> {
        self.write(
            records::dest_data_key(address, key),
            records::address::encode_string_value(value),
        )
    }

    pub fn erase_dest_data(&mut self, address: &str, key: &str) -> DbResult<bool> {
        self.erase(records::dest_data_key(address, key))
    }

    pub fn write_contract_data(&mut self, address: &str, key: &str, value: &str) -> DbResult<()> {
        self.write(
            records::contract_data_key(address, key),
            records::address::encode_string_value(value),
        )
    }

    pub fn erase_contract_data(&mut self, address: &str, key: &str) -> DbResult<bool> {
        self.erase(records::contract_data_key(address, key))
    }

    // -- transactions and tokens --------------------------------------------

    pub fn write_tx(&mut self, hash: &TxHash, tx: &WalletTx) -> DbResult<()> {
        self.write(records::tx_key(hash), tx.encode())
    }

    pub fn read_tx(&self, hash: &TxHash) -> DbResult<Option<Versioned<WalletTx>>> {
        match self.kv.get(&records::tx_key(hash)) {
            Some(raw) => Ok(Some(WalletTx::decode(raw)?)),
            None => Ok(None),
        }
    }

    pub fn erase_tx(&mut self, hash: &TxHash) -> DbResult<bool> {
        self.erase(records::tx_key(hash))
    }

    pub fn write_token(&mut self, hash: &TxHash, info: &TokenInfo) -> DbResult<()> {
        self.write(records::token_key(hash), info.encode())
    }

    pub fn erase_token(&mut self, hash: &TxHash) -> DbResult<bool> {
        self.erase(records::token_key(hash))
    }

    pub fn write_token_tx(&mut self, hash: &TxHash, record: &TokenTxRecord) -> DbResult<()> {
        self.write(records::token_tx_key(hash), record.encode())
    }

    pub fn erase_token_tx(&mut self, hash: &TxHash) -> DbResult<bool> {
        self.erase(records::token_tx_key(hash))
    }

    // -- masternode configuration -------------------------------------------

    pub fn write_node_config(&mut self, alias: &str, config: &NodeConfig) -> DbResult<()> {
        self.write(records::node_config_key(alias), config.encode())
    }

    pub fn read_node_config(&self, alias: &str) -> DbResult<Option<Versioned<NodeConfig>>> {
        match self.kv.get(&records::node_config_key(alias)) {
            Some(raw) => Ok(Some(NodeConfig::decode(raw)?)),
            None => Ok(None),
        }
    }

    pub fn erase_node_config(&mut self, alias: &str) -> DbResult<bool> {
        self.erase(records::node_config_key(alias))
    }

    // -- key material -------------------------------------------------------

    /// Store a plaintext key and its metadata in one atomic batch.
    pub fn write_key(
        &mut self,
        pubkey: &PubKey,
        secret: &[u8],
        meta: &KeyMetadata,
    ) -> DbResult<()> {
        let mut batch = Batch::new();
        batch.put(records::key_key(pubkey), keys::encode_secret(secret));
        batch.put(records::key_meta_key(pubkey), meta.encode());
        self.commit_batch(batch)
    }

    /// Store an encrypted key and its metadata; the plaintext record for
    /// the same public key is erased in the same batch.
    pub fn write_crypted_key(
        &mut self,
        pubkey: &PubKey,
        crypted_secret: &[u8],
        meta: &KeyMetadata,
    ) -> DbResult<()> {
        let mut batch = Batch::new();
        batch.put(
            records::crypted_key_key(pubkey),
            keys::encode_secret(crypted_secret),
        );
        batch.put(records::key_meta_key(pubkey), meta.encode());
        batch.erase(records::key_key(pubkey));
        self.commit_batch(batch)
    }

    pub fn write_master_key(&mut self, id: u32, key: &MasterKey) -> DbResult<()> {
        self.write(records::master_key_key(id), key.encode())
    }

    pub fn write_cscript(&mut self, hash: &KeyId, script: &[u8]) -> DbResult<()> {
        self.write(
            records::cscript_key(hash),
            records::address::encode_script_value(script),
        )
    }

    pub fn write_watch_only(&mut self, script: &[u8], meta: &KeyMetadata) -> DbResult<()> {
        self.write(records::watch_only_key(script), meta.encode())
    }

    pub fn erase_watch_only(&mut self, script: &[u8]) -> DbResult<bool> {
        self.erase(records::watch_only_key(script))
    }

    pub fn write_default_key(&mut self, pubkey: &PubKey) -> DbResult<()> {
        self.write(
            records::singleton_key(RecordKind::DefaultKey),
            records::encode_pubkey_value(pubkey),
        )
    }

    pub fn write_hd_chain(&mut self, chain: &HdChainState) -> DbResult<()> {
        self.write(records::singleton_key(RecordKind::HdChain), chain.encode())
    }

    pub fn read_hd_chain(&self) -> DbResult<Option<Versioned<HdChainState>>> {
        match self.kv.get(&records::singleton_key(RecordKind::HdChain)) {
            Some(raw) => Ok(Some(HdChainState::decode(raw)?)),
            None => Ok(None),
        }
    }

    // -- key pool -----------------------------------------------------------

    pub fn write_pool(&mut self, index: i64, entry: &KeyPoolEntry) -> DbResult<()> {
        self.write(records::pool_key(index), entry.encode())
    }

    pub fn read_pool(&self, index: i64) -> DbResult<Option<Versioned<KeyPoolEntry>>> {
        match self.kv.get(&records::pool_key(index)) {
            Some(raw) => Ok(Some(KeyPoolEntry::decode(raw)?)),
            None => Ok(None),
        }
    }

    pub fn erase_pool(&mut self, index: i64) -> DbResult<bool> {
        self.erase(records::pool_key(index))
    }

    // -- chain state singletons ---------------------------------------------

    pub fn write_best_block(&mut self, locator: &BestBlock) -> DbResult<()> {
        self.write(
            records::singleton_key(RecordKind::BestBlock),
            locator.encode(),
        )
    }

    pub fn read_best_block(&self) -> DbResult<Option<Versioned<BestBlock>>> {
        match self.kv.get(&records::singleton_key(RecordKind::BestBlock)) {
            Some(raw) => Ok(Some(BestBlock::decode(raw)?)),
            None => Ok(None),
        }
    }

    pub fn write_order_pos_next(&mut self, pos: i64) -> DbResult<()> {
        self.write(
            records::singleton_key(RecordKind::OrderPosNext),
            records::chainstate::encode_order_pos_next(pos),
        )
    }

    pub fn write_min_version(&mut self, version: u32) -> DbResult<()> {
        self.write(
            records::singleton_key(RecordKind::MinVersion),
            records::chainstate::encode_min_version(version),
        )
    }

    // -- staking and spend policy -------------------------------------------

    pub fn write_split_threshold(&mut self, threshold: u64) -> DbResult<()> {
        self.write(
            records::singleton_key(RecordKind::SplitThreshold),
            records::policy::encode_split_threshold(threshold),
        )
    }

    pub fn write_multisend(&mut self, rules: &MultiSendRules) -> DbResult<()> {
        self.write(records::singleton_key(RecordKind::MultiSend), rules.encode())
    }

    /// Erase the multisend rules only if the stored record still matches
    /// `prior`; a stale caller cannot clobber a newer configuration.
    pub fn erase_multisend(&mut self, prior: &MultiSendRules) -> DbResult<bool> {
        let key = records::singleton_key(RecordKind::MultiSend);
        let unchanged = self
            .kv
            .get(&key)
            .is_some_and(|raw| raw == prior.encode().as_slice());
        if unchanged {
            self.erase(key)
        } else {
            Ok(false)
        }
    }

    pub fn write_msettings(&mut self, settings: &MultiSendSettings) -> DbResult<()> {
        self.write(
            records::singleton_key(RecordKind::MSettings),
            settings.encode(),
        )
    }

    pub fn write_ms_disabled(&mut self, disabled: &MsDisabledAddresses) -> DbResult<()> {
        self.write(
            records::singleton_key(RecordKind::MsDisabled),
            disabled.encode(),
        )
    }

    /// Guarded erase, same contract as [`WalletDb::erase_multisend`].
    pub fn erase_ms_disabled(&mut self, prior: &MsDisabledAddresses) -> DbResult<bool> {
        let key = records::singleton_key(RecordKind::MsDisabled);
        let unchanged = self
            .kv
            .get(&key)
            .is_some_and(|raw| raw == prior.encode().as_slice());
        if unchanged {
            self.erase(key)
        } else {
            Ok(false)
        }
    }

    pub fn write_auto_combine(&mut self, settings: &AutoCombineSettings) -> DbResult<()> {
        self.write(
            records::singleton_key(RecordKind::AutoCombine),
            settings.encode(),
        )
    }

    // -- accounting ---------------------------------------------------------

    pub fn write_account(&mut self, name: &str, account: &Account) -> DbResult<()> {
        self.write(records::account_key(name), account.encode())
    }

    pub fn read_account(&self, name: &str) -> DbResult<Option<Versioned<Account>>> {
        match self.kv.get(&records::account_key(name)) {
            Some(raw) => Ok(Some(Account::decode(raw)?)),
            None => Ok(None),
        }
    }

    /// Append an accounting entry under the account's next free sequence
    /// number and return that number.
    pub fn append_accounting_entry(
        &mut self,
        account: &str,
        entry: &AccountingEntry,
    ) -> DbResult<u64> {
        let prefix = records::acentry_account_prefix(account);
        let next = self
            .kv
            .iter_prefix(&prefix)
            .last()
            .and_then(|(key, _)| acentry_seq(key, &prefix))
            .map_or(0, |seq| seq + 1);
        self.write(records::acentry_key(account, next), entry.encode())?;
        Ok(next)
    }

    /// All accounting entries, in (account, sequence) order. Pass `None`
    /// to list every account.
    pub fn list_accounting_entries(
        &self,
        account: Option<&str>,
    ) -> DbResult<Vec<(String, u64, AccountingEntry)>> {
        let prefix = match account {
            Some(name) => records::acentry_account_prefix(name),
            None => records::kind_prefix(RecordKind::AcEntry),
        };
        let tag_prefix = records::kind_prefix(RecordKind::AcEntry);
        let mut out = Vec::new();
        for (key, value) in self.kv.iter_prefix(&prefix) {
            let mut r = Reader::new(&key[tag_prefix.len()..]);
            let name = r.string("accounting account")?;
            let seq = u64::from_be_bytes(r.array::<8>("accounting seq")?);
            out.push((name, seq, AccountingEntry::decode(value)?.value));
        }
        // The raw cursor orders account names by their length prefix, not
        // lexicographically.
        out.sort_by(|a, b| (a.0.as_str(), a.1).cmp(&(b.0.as_str(), b.1)));
        Ok(out)
    }

    /// Net credit/debit across the account's entries.
    pub fn account_credit_debit(&self, account: &str) -> DbResult<i64> {
        let mut total = 0i64;
        for (_, _, entry) in self.list_accounting_entries(Some(account))? {
            total += entry.credit_debit;
        }
        Ok(total)
    }
}

/// Extract the sequence number from a full acentry key, given the
/// account prefix it is known to start with.
fn acentry_seq(key: &[u8], prefix: &[u8]) -> Option<u64> {
    let tail = key.get(prefix.len()..)?;
    Some(u64::from_be_bytes(tail.try_into().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_db(dir: &TempDir) -> WalletDb {
        WalletDb::open(&dir.path().join("wallet.dat")).unwrap()
    }

    #[test]
    fn test_name_roundtrip_and_erase() {
        let dir = TempDir::new().unwrap();
        let mut db = open_db(&dir);
        db.write_name("addr1", "savings").unwrap();
        assert!(db.erase_name("addr1").unwrap());
        assert!(!db.erase_name("addr1").unwrap());
    }

    #[test]
    fn test_counter_counts_commits_not_reads() {
        let dir = TempDir::new().unwrap();
        let mut db = open_db(&dir);
        assert_eq!(db.update_counter(), 0);

        db.write_name("a", "one").unwrap();
        assert_eq!(db.update_counter(), 1);

        // A composite key write is one commit, one increment.
        let pk = PubKey(vec![2u8; 33]);
        db.write_key(&pk, &[7u8; 32], &KeyMetadata::new(1_700_000_000))
            .unwrap();
        assert_eq!(db.update_counter(), 2);

        db.read_tx(&TxHash::ZERO).unwrap();
        assert_eq!(db.update_counter(), 2);

        // Erasing a missing record commits nothing.
        assert!(!db.erase_name("missing").unwrap());
        assert_eq!(db.update_counter(), 2);
    }

    #[test]
    fn test_write_crypted_key_drops_plaintext() {
        let dir = TempDir::new().unwrap();
        let mut db = open_db(&dir);
        let pk = PubKey(vec![3u8; 33]);
        let meta = KeyMetadata::new(1_700_000_000);
        db.write_key(&pk, &[9u8; 32], &meta).unwrap();
        assert!(db.kv().contains(&records::key_key(&pk)));

        db.write_crypted_key(&pk, &[1u8; 48], &meta).unwrap();
        assert!(!db.kv().contains(&records::key_key(&pk)));
        assert!(db.kv().contains(&records::crypted_key_key(&pk)));
        assert!(db.kv().contains(&records::key_meta_key(&pk)));
    }

    #[test]
    fn test_guarded_erase_multisend() {
        let dir = TempDir::new().unwrap();
        let mut db = open_db(&dir);
        let old = MultiSendRules {
            recipients: vec![("addr1".into(), 60)],
        };
        let new = MultiSendRules {
            recipients: vec![("addr2".into(), 100)],
        };
        db.write_multisend(&new).unwrap();

        // Stale snapshot must not erase the newer record.
        assert!(!db.erase_multisend(&old).unwrap());
        assert!(db.erase_multisend(&new).unwrap());
    }

    #[test]
    fn test_accounting_append_and_sum() {
        let dir = TempDir::new().unwrap();
        let mut db = open_db(&dir);

        let mut entry = AccountingEntry {
            credit_debit: 500,
            time: 1_700_000_000,
            other_account: "peer".into(),
            comment: "inbound".into(),
        };
        assert_eq!(db.append_accounting_entry("default", &entry).unwrap(), 0);
        entry.credit_debit = -200;
        assert_eq!(db.append_accounting_entry("default", &entry).unwrap(), 1);
        entry.credit_debit = 42;
        assert_eq!(db.append_accounting_entry("other", &entry).unwrap(), 0);

        assert_eq!(db.account_credit_debit("default").unwrap(), 300);
        assert_eq!(db.account_credit_debit("other").unwrap(), 42);

        // Lexicographic by account, then by sequence: "default" sorts
        // before the shorter name "other".
        let all = db.list_accounting_entries(None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].0, "default");
        assert_eq!(all[0].1, 0);
        assert_eq!(all[1].0, "default");
        assert_eq!(all[1].1, 1);
        assert_eq!(all[2].0, "other");
    }

    #[test]
    fn test_hd_chain_reopen_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wallet.dat");
        {
            let mut db = WalletDb::open(&path).unwrap();
            let chain = HdChainState {
                external_chain_counter: 17,
                internal_chain_counter: 4,
                master_key_id: KeyId([5u8; 20]),
            };
            db.write_hd_chain(&chain).unwrap();
            db.flush().unwrap();
        }
        let db = WalletDb::open(&path).unwrap();
        let chain = db.read_hd_chain().unwrap().unwrap();
        assert_eq!(chain.value.external_chain_counter, 17);
        assert_eq!(chain.value.internal_chain_counter, 4);
    }
}
