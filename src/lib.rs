//! walletdb - persistence and recovery layer for a wallet file
//!
//! One append-only, checksummed key/value file holds every record a
//! wallet needs to survive a restart: key material, transactions, the
//! address book, staking policy, and chain-position bookkeeping. This
//! crate owns the file format, the typed record catalog on top of it,
//! the load scan that rebuilds a wallet object, and the recovery path
//! for files that no longer open cleanly.

pub mod backup;
pub mod db;
pub mod kv;
pub mod load;
pub mod logging;
pub mod records;
pub mod recovery;
pub mod zap;

pub use backup::{backup_wallet, maybe_flush, BackupError, FlushPolicy};
pub use db::{DbResult, WalletDb, WalletDbError};
pub use load::{
    find_wallet_tx, load_wallet, open_and_load, DbLoadStatus, WalletSink, WalletState,
    SUPPORTED_FORMAT_VERSION,
};
pub use recovery::{recover, RecoveryError, RecoveryReport};
pub use zap::{zap_select_tx, zap_wallet_tx, ZapOutcome};
