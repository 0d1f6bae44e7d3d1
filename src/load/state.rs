//! The wallet object as seen by the load scan.
//!
//! The scan pushes decoded records into a [`WalletSink`]; every setter
//! defaults to a no-op so callers only implement the kinds they care
//! about. [`WalletState`] is the full in-memory accumulation used by the
//! crate's own tests and by callers that want the whole wallet at once.

use std::collections::BTreeMap;

use crate::records::accounting::{Account, AccountingEntry};
use crate::records::chainstate::BestBlock;
use crate::records::hdchain::HdChainState;
use crate::records::keys::{KeyMetadata, MasterKey};
use crate::records::masternode::NodeConfig;
use crate::records::policy::{
    AutoCombineSettings, MsDisabledAddresses, MultiSendRules, MultiSendSettings,
};
use crate::records::pool::KeyPoolEntry;
use crate::records::token::{TokenInfo, TokenTxRecord};
use crate::records::tx::WalletTx;
use crate::records::{KeyId, PubKey, TxHash};

/// Receiver for decoded wallet records during a load scan.
///
/// Key records arrive already paired with their metadata; when the store
/// held no metadata for a key, the scan synthesizes
/// [`KeyMetadata::unknown`] before delivery. Metadata with no matching
/// key record is handed to `loose_key_metadata`.
pub trait WalletSink {
    fn name(&mut self, _address: String, _label: String) {}
    fn purpose(&mut self, _address: String, _purpose: String) {}
    fn tx(&mut self, _hash: TxHash, _tx: WalletTx) {}
    fn token(&mut self, _hash: TxHash, _info: TokenInfo) {}
    fn token_tx(&mut self, _hash: TxHash, _record: TokenTxRecord) {}
    fn node_config(&mut self, _alias: String, _config: NodeConfig) {}
    fn key(&mut self, _pubkey: PubKey, _secret: Vec<u8>, _meta: KeyMetadata) {}
    fn crypted_key(&mut self, _pubkey: PubKey, _secret: Vec<u8>, _meta: KeyMetadata) {}
    fn master_key(&mut self, _id: u32, _key: MasterKey) {}
    fn loose_key_metadata(&mut self, _pubkey: PubKey, _meta: KeyMetadata) {}
    fn cscript(&mut self, _hash: KeyId, _script: Vec<u8>) {}
    fn watch_only(&mut self, _script: Vec<u8>, _meta: KeyMetadata) {}
    fn best_block(&mut self, _locator: BestBlock) {}
    fn order_pos_next(&mut self, _pos: i64) {}
    fn split_threshold(&mut self, _threshold: u64) {}
    fn multisend(&mut self, _rules: MultiSendRules) {}
    fn msettings(&mut self, _settings: MultiSendSettings) {}
    fn ms_disabled(&mut self, _disabled: MsDisabledAddresses) {}
    fn auto_combine(&mut self, _settings: AutoCombineSettings) {}
    fn default_key(&mut self, _pubkey: PubKey) {}
    fn pool(&mut self, _index: i64, _entry: KeyPoolEntry) {}
    fn min_version(&mut self, _version: u32) {}
    fn accounting_entry(&mut self, _account: String, _seq: u64, _entry: AccountingEntry) {}
    fn account(&mut self, _name: String, _account: Account) {}
    fn dest_data(&mut self, _address: String, _key: String, _value: String) {}
    fn contract_data(&mut self, _address: String, _key: String, _value: String) {}
    fn hd_chain(&mut self, _chain: HdChainState) {}
    /// A record whose type tag this build does not know. Skipped.
    fn unknown_record(&mut self, _tag: &str) {}
    /// Highest key-pool index seen, delivered once at scan end.
    fn highest_pool_index(&mut self, _index: i64) {}
}

/// Complete in-memory wallet image.
#[derive(Debug, Default)]
pub struct WalletState {
    pub names: BTreeMap<String, String>,
    pub purposes: BTreeMap<String, String>,
    pub txs: BTreeMap<TxHash, WalletTx>,
    pub tokens: BTreeMap<TxHash, TokenInfo>,
    pub token_txs: BTreeMap<TxHash, TokenTxRecord>,
    pub node_configs: BTreeMap<String, NodeConfig>,
    pub keys: BTreeMap<PubKey, (Vec<u8>, KeyMetadata)>,
    pub crypted_keys: BTreeMap<PubKey, (Vec<u8>, KeyMetadata)>,
    pub master_keys: BTreeMap<u32, MasterKey>,
    pub loose_key_metadata: BTreeMap<PubKey, KeyMetadata>,
    pub scripts: BTreeMap<KeyId, Vec<u8>>,
    pub watch_only: BTreeMap<Vec<u8>, KeyMetadata>,
    pub best_block: Option<BestBlock>,
    pub order_pos_next: Option<i64>,
    pub split_threshold: Option<u64>,
    pub multisend: Option<MultiSendRules>,
    pub msettings: Option<MultiSendSettings>,
    pub ms_disabled: Option<MsDisabledAddresses>,
    pub auto_combine: Option<AutoCombineSettings>,
    pub default_key: Option<PubKey>,
    pub pool: BTreeMap<i64, KeyPoolEntry>,
    pub min_version: Option<u32>,
    pub accounting: Vec<(String, u64, AccountingEntry)>,
    pub accounts: BTreeMap<String, Account>,
    pub dest_data: BTreeMap<(String, String), String>,
    pub contract_data: BTreeMap<(String, String), String>,
    pub hd_chain: Option<HdChainState>,
    pub unknown_tags: BTreeMap<String, u64>,
    pub highest_pool_index: Option<i64>,
}

impl WalletState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of spendable key records (plain and encrypted).
    pub fn key_count(&self) -> usize {
        self.keys.len() + self.crypted_keys.len()
    }
}

impl WalletSink for WalletState {
    fn name(&mut self, address: String, label: String) {
        self.names.insert(address, label);
    }

    fn purpose(&mut self, address: String, purpose: String) {
        self.purposes.insert(address, purpose);
    }

    fn tx(&mut self, hash: TxHash, tx: WalletTx) {
        self.txs.insert(hash, tx);
    }

    fn token(&mut self, hash: TxHash, info: TokenInfo) {
        self.tokens.insert(hash, info);
    }

    fn token_tx(&mut self, hash: TxHash, record: TokenTxRecord) {
        self.token_txs.insert(hash, record);
    }

    fn node_config(&mut self, alias: String, config: NodeConfig) {
        self.node_configs.insert(alias, config);
    }

    fn key(&mut self, pubkey: PubKey, secret: Vec<u8>, meta: KeyMetadata) {
        self.keys.insert(pubkey, (secret, meta));
    }

    fn crypted_key(&mut self, pubkey: PubKey, secret: Vec<u8>, meta: KeyMetadata) {
        self.crypted_keys.insert(pubkey, (secret, meta));
    }

    fn master_key(&mut self, id: u32, key: MasterKey) {
        self.master_keys.insert(id, key);
    }

    fn loose_key_metadata(&mut self, pubkey: PubKey, meta: KeyMetadata) {
        self.loose_key_metadata.insert(pubkey, meta);
    }

    fn cscript(&mut self, hash: KeyId, script: Vec<u8>) {
        self.scripts.insert(hash, script);
    }

    fn watch_only(&mut self, script: Vec<u8>, meta: KeyMetadata) {
        self.watch_only.insert(script, meta);
    }

    fn best_block(&mut self, locator: BestBlock) {
        self.best_block = Some(locator);
    }

    fn order_pos_next(&mut self, pos: i64) {
        self.order_pos_next = Some(pos);
    }

    fn split_threshold(&mut self, threshold: u64) {
        self.split_threshold = Some(threshold);
    }

    fn multisend(&mut self, rules: MultiSendRules) {
        self.multisend = Some(rules);
    }

    fn msettings(&mut self, settings: MultiSendSettings) {
        self.msettings = Some(settings);
    }

    fn ms_disabled(&mut self, disabled: MsDisabledAddresses) {
        self.ms_disabled = Some(disabled);
    }

    fn auto_combine(&mut self, settings: AutoCombineSettings) {
        self.auto_combine = Some(settings);
    }

    fn default_key(&mut self, pubkey: PubKey) {
        self.default_key = Some(pubkey);
    }

    fn pool(&mut self, index: i64, entry: KeyPoolEntry) {
        self.pool.insert(index, entry);
    }

    fn min_version(&mut self, version: u32) {
        self.min_version = Some(version);
    }

    fn accounting_entry(&mut self, account: String, seq: u64, entry: AccountingEntry) {
        self.accounting.push((account, seq, entry));
    }

    fn account(&mut self, name: String, account: Account) {
        self.accounts.insert(name, account);
    }

    fn dest_data(&mut self, address: String, key: String, value: String) {
        self.dest_data.insert((address, key), value);
    }

    fn contract_data(&mut self, address: String, key: String, value: String) {
        self.contract_data.insert((address, key), value);
    }

    fn hd_chain(&mut self, chain: HdChainState) {
        self.hd_chain = Some(chain);
    }

    fn unknown_record(&mut self, tag: &str) {
        *self.unknown_tags.entry(tag.to_string()).or_insert(0) += 1;
    }

    fn highest_pool_index(&mut self, index: i64) {
        self.highest_pool_index = Some(index);
    }
}
