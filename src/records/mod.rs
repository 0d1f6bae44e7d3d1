//! Record catalog: every kind of record the wallet persists, its type
//! tag, composite key shape, and versioned payload codec.
//!
//! All records share one keyspace. A composite key is the length-prefixed
//! type tag followed by the kind-specific subkey bytes; a value is a
//! versioned payload decoded by the matching codec. The catalog is the
//! single place that maps tags to codecs, so the load scan and the
//! recovery controller dispatch through one fixed table instead of
//! inspecting payloads.

pub mod accounting;
pub mod address;
pub mod chainstate;
pub mod codec;
pub mod hdchain;
pub mod ids;
pub mod keys;
pub mod masternode;
pub mod policy;
pub mod pool;
pub mod token;
pub mod tx;

pub use codec::{DecodeError, Reader, Versioned, Writer};
pub use ids::{KeyId, PubKey, TxHash};

use accounting::{Account, AccountingEntry};
use chainstate::BestBlock;
use hdchain::HdChainState;
use keys::{KeyMetadata, MasterKey};
use masternode::NodeConfig;
use policy::{AutoCombineSettings, MsDisabledAddresses, MultiSendRules, MultiSendSettings};
use pool::KeyPoolEntry;
use token::{TokenInfo, TokenTxRecord};
use tx::WalletTx;

/// Every record kind the wallet persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKind {
    Name,
    Purpose,
    Tx,
    Token,
    TokenTx,
    NodeConfig,
    Key,
    CryptedKey,
    MasterKey,
    KeyMeta,
    CScript,
    WatchOnly,
    BestBlock,
    OrderPosNext,
    SplitThreshold,
    MultiSend,
    MSettings,
    MsDisabled,
    AutoCombine,
    DefaultKey,
    Pool,
    MinVersion,
    AcEntry,
    Account,
    DestData,
    ContractData,
    HdChain,
}

impl RecordKind {
    pub const ALL: [RecordKind; 27] = [
        RecordKind::Name,
        RecordKind::Purpose,
        RecordKind::Tx,
        RecordKind::Token,
        RecordKind::TokenTx,
        RecordKind::NodeConfig,
        RecordKind::Key,
        RecordKind::CryptedKey,
        RecordKind::MasterKey,
        RecordKind::KeyMeta,
        RecordKind::CScript,
        RecordKind::WatchOnly,
        RecordKind::BestBlock,
        RecordKind::OrderPosNext,
        RecordKind::SplitThreshold,
        RecordKind::MultiSend,
        RecordKind::MSettings,
        RecordKind::MsDisabled,
        RecordKind::AutoCombine,
        RecordKind::DefaultKey,
        RecordKind::Pool,
        RecordKind::MinVersion,
        RecordKind::AcEntry,
        RecordKind::Account,
        RecordKind::DestData,
        RecordKind::ContractData,
        RecordKind::HdChain,
    ];

    /// On-disk type tag.
    pub fn tag(&self) -> &'static str {
        match self {
            RecordKind::Name => "name",
            RecordKind::Purpose => "purpose",
            RecordKind::Tx => "tx",
            RecordKind::Token => "token",
            RecordKind::TokenTx => "tokentx",
            RecordKind::NodeConfig => "nodeconfig",
            RecordKind::Key => "key",
            RecordKind::CryptedKey => "ckey",
            RecordKind::MasterKey => "mkey",
            RecordKind::KeyMeta => "keymeta",
            RecordKind::CScript => "cscript",
            RecordKind::WatchOnly => "watchs",
            RecordKind::BestBlock => "bestblock",
            RecordKind::OrderPosNext => "orderposnext",
            RecordKind::SplitThreshold => "splitthreshold",
            RecordKind::MultiSend => "multisend",
            RecordKind::MSettings => "msettings",
            RecordKind::MsDisabled => "msdisabled",
            RecordKind::AutoCombine => "autocombine",
            RecordKind::DefaultKey => "defaultkey",
            RecordKind::Pool => "pool",
            RecordKind::MinVersion => "minversion",
            RecordKind::AcEntry => "acentry",
            RecordKind::Account => "acc",
            RecordKind::DestData => "destdata",
            RecordKind::ContractData => "contractdata",
            RecordKind::HdChain => "hdchain",
        }
    }

    /// Reverse tag lookup; `None` for tags this catalog does not know
    /// (future record kinds are tolerated, not rejected).
    pub fn from_tag(tag: &str) -> Option<Self> {
        RecordKind::ALL.iter().copied().find(|k| k.tag() == tag)
    }

    /// Whether a decode failure on this kind is unrecoverable structural
    /// damage. Continuing a load past corrupt cryptographic material
    /// risks silently losing fund control, so these abort the scan.
    pub fn is_essential(&self) -> bool {
        matches!(
            self,
            RecordKind::Key
                | RecordKind::CryptedKey
                | RecordKind::MasterKey
                | RecordKind::KeyMeta
                | RecordKind::HdChain
                | RecordKind::DefaultKey
        )
    }

    /// Whether the kind is retained by keys-only recovery.
    pub fn carries_key_material(&self) -> bool {
        self.is_essential() || matches!(self, RecordKind::MinVersion)
    }
}

/// A fully decoded record: subkey identity plus payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Name { address: String, label: String },
    Purpose { address: String, purpose: String },
    Tx { hash: TxHash, tx: WalletTx },
    Token { hash: TxHash, info: TokenInfo },
    TokenTx { hash: TxHash, token_tx: TokenTxRecord },
    NodeConfig { alias: String, config: NodeConfig },
    Key { pubkey: PubKey, secret: Vec<u8> },
    CryptedKey { pubkey: PubKey, secret: Vec<u8> },
    MasterKey { id: u32, key: MasterKey },
    KeyMeta { pubkey: PubKey, meta: KeyMetadata },
    CScript { hash: KeyId, script: Vec<u8> },
    WatchOnly { script: Vec<u8>, meta: KeyMetadata },
    BestBlock(BestBlock),
    OrderPosNext(i64),
    SplitThreshold(u64),
    MultiSend(MultiSendRules),
    MSettings(MultiSendSettings),
    MsDisabled(MsDisabledAddresses),
    AutoCombine(AutoCombineSettings),
    DefaultKey(PubKey),
    Pool { index: i64, entry: KeyPoolEntry },
    MinVersion(u32),
    AcEntry { account: String, seq: u64, entry: AccountingEntry },
    Account { name: String, account: Account },
    DestData { address: String, key: String, value: String },
    ContractData { address: String, key: String, value: String },
    HdChain(HdChainState),
}

// ---------------------------------------------------------------------------
// Composite key construction

fn key_with(kind: RecordKind, build: impl FnOnce(&mut Writer)) -> Vec<u8> {
    let mut w = Writer::new();
    w.put_str(kind.tag());
    build(&mut w);
    w.finish()
}

/// Key for a singleton record: the type tag alone.
pub fn singleton_key(kind: RecordKind) -> Vec<u8> {
    key_with(kind, |_| {})
}

/// Byte prefix shared by every record of `kind`; drives prefix cursors.
pub fn kind_prefix(kind: RecordKind) -> Vec<u8> {
    singleton_key(kind)
}

pub fn name_key(address: &str) -> Vec<u8> {
    key_with(RecordKind::Name, |w| {
        w.put_str(address);
    })
}

pub fn purpose_key(address: &str) -> Vec<u8> {
    key_with(RecordKind::Purpose, |w| {
        w.put_str(address);
    })
}

pub fn tx_key(hash: &TxHash) -> Vec<u8> {
    key_with(RecordKind::Tx, |w| {
        w.put_tx_hash(hash);
    })
}

pub fn token_key(hash: &TxHash) -> Vec<u8> {
    key_with(RecordKind::Token, |w| {
        w.put_tx_hash(hash);
    })
}

pub fn token_tx_key(hash: &TxHash) -> Vec<u8> {
    key_with(RecordKind::TokenTx, |w| {
        w.put_tx_hash(hash);
    })
}

pub fn node_config_key(alias: &str) -> Vec<u8> {
    key_with(RecordKind::NodeConfig, |w| {
        w.put_str(alias);
    })
}

pub fn key_key(pubkey: &PubKey) -> Vec<u8> {
    key_with(RecordKind::Key, |w| {
        w.put_pubkey(pubkey);
    })
}

pub fn crypted_key_key(pubkey: &PubKey) -> Vec<u8> {
    key_with(RecordKind::CryptedKey, |w| {
        w.put_pubkey(pubkey);
    })
}

/// Master key ids are stored big-endian so the cursor yields them in
/// numeric order.
pub fn master_key_key(id: u32) -> Vec<u8> {
    key_with(RecordKind::MasterKey, |w| {
        w.put_raw(&id.to_be_bytes());
    })
}

pub fn key_meta_key(pubkey: &PubKey) -> Vec<u8> {
    key_with(RecordKind::KeyMeta, |w| {
        w.put_pubkey(pubkey);
    })
}

pub fn cscript_key(hash: &KeyId) -> Vec<u8> {
    key_with(RecordKind::CScript, |w| {
        w.put_key_id(hash);
    })
}

pub fn watch_only_key(script: &[u8]) -> Vec<u8> {
    key_with(RecordKind::WatchOnly, |w| {
        w.put_bytes(script);
    })
}

/// Pool indices are stored big-endian for numeric cursor order.
pub fn pool_key(index: i64) -> Vec<u8> {
    key_with(RecordKind::Pool, |w| {
        w.put_raw(&(index as u64).to_be_bytes());
    })
}

/// Sequence numbers are stored big-endian so entries of one account list
/// in append order.
pub fn acentry_key(account: &str, seq: u64) -> Vec<u8> {
    key_with(RecordKind::AcEntry, |w| {
        w.put_str(account);
        w.put_raw(&seq.to_be_bytes());
    })
}

/// Prefix covering every accounting entry of one account.
pub fn acentry_account_prefix(account: &str) -> Vec<u8> {
    key_with(RecordKind::AcEntry, |w| {
        w.put_str(account);
    })
}

pub fn account_key(name: &str) -> Vec<u8> {
    key_with(RecordKind::Account, |w| {
        w.put_str(name);
    })
}

pub fn dest_data_key(address: &str, key: &str) -> Vec<u8> {
    key_with(RecordKind::DestData, |w| {
        w.put_str(address);
        w.put_str(key);
    })
}

pub fn contract_data_key(address: &str, key: &str) -> Vec<u8> {
    key_with(RecordKind::ContractData, |w| {
        w.put_str(address);
        w.put_str(key);
    })
}

// ---------------------------------------------------------------------------
// Key parsing and record dispatch

/// Split a raw composite key into its type tag and subkey bytes.
pub fn parse_record_key(key: &[u8]) -> Result<(String, Vec<u8>), DecodeError> {
    let mut r = Reader::new(key);
    let tag = r.string("record type tag")?;
    Ok((tag, r.rest()))
}

const PUBKEY_VALUE_VERSION: u32 = 1;

/// Payload codec for `defaultkey`: the wallet's default public key.
pub fn encode_pubkey_value(pk: &PubKey) -> Vec<u8> {
    let mut w = Writer::versioned(PUBKEY_VALUE_VERSION);
    w.put_pubkey(pk);
    w.finish()
}

pub fn decode_pubkey_value(data: &[u8]) -> Result<Versioned<PubKey>, DecodeError> {
    let mut r = Reader::new(data);
    let (version, future_version) = r.version(PUBKEY_VALUE_VERSION)?;
    let value = r.pubkey("default key")?;
    Ok(Versioned {
        value,
        version,
        future_version,
    })
}

/// Decode one (subkey, value) pair of a known kind into a typed record.
///
/// The returned `Versioned` carries the payload's stored schema version
/// and the future-version flag; the subkey shape itself is not versioned.
pub fn decode_record(
    kind: RecordKind,
    subkey: &[u8],
    value: &[u8],
) -> Result<Versioned<Record>, DecodeError> {
    let mut sk = Reader::new(subkey);
    match kind {
        RecordKind::Name => {
            let address = sk.string("address")?;
            let v = address::decode_string_value(value)?;
            Ok(map(v, |label| Record::Name { address, label }))
        }
        RecordKind::Purpose => {
            let address = sk.string("address")?;
            let v = address::decode_string_value(value)?;
            Ok(map(v, |purpose| Record::Purpose { address, purpose }))
        }
        RecordKind::Tx => {
            let hash = sk.tx_hash("tx hash")?;
            let v = WalletTx::decode(value)?;
            Ok(map(v, |tx| Record::Tx { hash, tx }))
        }
        RecordKind::Token => {
            let hash = sk.tx_hash("token hash")?;
            let v = TokenInfo::decode(value)?;
            Ok(map(v, |info| Record::Token { hash, info }))
        }
        RecordKind::TokenTx => {
            let hash = sk.tx_hash("token tx hash")?;
            let v = TokenTxRecord::decode(value)?;
            Ok(map(v, |token_tx| Record::TokenTx { hash, token_tx }))
        }
        RecordKind::NodeConfig => {
            let alias = sk.string("masternode alias")?;
            let v = NodeConfig::decode(value)?;
            Ok(map(v, |config| Record::NodeConfig { alias, config }))
        }
        RecordKind::Key => {
            let pubkey = sk.pubkey("key pubkey")?;
            let v = keys::decode_secret(value)?;
            Ok(map(v, |secret| Record::Key { pubkey, secret }))
        }
        RecordKind::CryptedKey => {
            let pubkey = sk.pubkey("ckey pubkey")?;
            let v = keys::decode_secret(value)?;
            Ok(map(v, |secret| Record::CryptedKey { pubkey, secret }))
        }
        RecordKind::MasterKey => {
            let id = u32::from_be_bytes(sk.array::<4>("master key id")?);
            let v = MasterKey::decode(value)?;
            Ok(map(v, |key| Record::MasterKey { id, key }))
        }
        RecordKind::KeyMeta => {
            let pubkey = sk.pubkey("keymeta pubkey")?;
            let v = KeyMetadata::decode(value)?;
            Ok(map(v, |meta| Record::KeyMeta { pubkey, meta }))
        }
        RecordKind::CScript => {
            let hash = sk.key_id("script hash")?;
            let v = address::decode_script_value(value)?;
            Ok(map(v, |script| Record::CScript { hash, script }))
        }
        RecordKind::WatchOnly => {
            let script = sk.bytes("watch-only script")?;
            let v = KeyMetadata::decode(value)?;
            Ok(map(v, |meta| Record::WatchOnly { script, meta }))
        }
        RecordKind::BestBlock => {
            let v = BestBlock::decode(value)?;
            Ok(map(v, Record::BestBlock))
        }
        RecordKind::OrderPosNext => {
            let v = chainstate::decode_order_pos_next(value)?;
            Ok(map(v, Record::OrderPosNext))
        }
        RecordKind::SplitThreshold => {
            let v = policy::decode_split_threshold(value)?;
            Ok(map(v, Record::SplitThreshold))
        }
        RecordKind::MultiSend => {
            let v = MultiSendRules::decode(value)?;
            Ok(map(v, Record::MultiSend))
        }
        RecordKind::MSettings => {
            let v = MultiSendSettings::decode(value)?;
            Ok(map(v, Record::MSettings))
        }
        RecordKind::MsDisabled => {
            let v = MsDisabledAddresses::decode(value)?;
            Ok(map(v, Record::MsDisabled))
        }
        RecordKind::AutoCombine => {
            let v = AutoCombineSettings::decode(value)?;
            Ok(map(v, Record::AutoCombine))
        }
        RecordKind::DefaultKey => {
            let v = decode_pubkey_value(value)?;
            Ok(map(v, Record::DefaultKey))
        }
        RecordKind::Pool => {
            let index = u64::from_be_bytes(sk.array::<8>("pool index")?) as i64;
            let v = KeyPoolEntry::decode(value)?;
            Ok(map(v, |entry| Record::Pool { index, entry }))
        }
        RecordKind::MinVersion => {
            let v = chainstate::decode_min_version(value)?;
            Ok(map(v, Record::MinVersion))
        }
        RecordKind::AcEntry => {
            let account = sk.string("accounting account")?;
            let seq = u64::from_be_bytes(sk.array::<8>("accounting seq")?);
            let v = AccountingEntry::decode(value)?;
            Ok(map(v, |entry| Record::AcEntry {
                account,
                seq,
                entry,
            }))
        }
        RecordKind::Account => {
            let name = sk.string("account name")?;
            let v = Account::decode(value)?;
            Ok(map(v, |account| Record::Account { name, account }))
        }
        RecordKind::DestData => {
            let address = sk.string("destdata address")?;
            let key = sk.string("destdata key")?;
            let v = address::decode_string_value(value)?;
            Ok(map(v, |value| Record::DestData {
                address,
                key,
                value,
            }))
        }
        RecordKind::ContractData => {
            let address = sk.string("contractdata address")?;
            let key = sk.string("contractdata key")?;
            let v = address::decode_string_value(value)?;
            Ok(map(v, |value| Record::ContractData {
                address,
                key,
                value,
            }))
        }
        RecordKind::HdChain => {
            let v = HdChainState::decode(value)?;
            Ok(map(v, Record::HdChain))
        }
    }
}

fn map<T, U>(v: Versioned<T>, f: impl FnOnce(T) -> U) -> Versioned<U> {
    Versioned {
        value: f(v.value),
        version: v.version,
        future_version: v.future_version,
    }
}
