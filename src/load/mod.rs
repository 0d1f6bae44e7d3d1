//! Wallet load/scan engine: one pass over the store into a caller sink,
//! classified by [`DbLoadStatus`].

mod loader;
mod state;

pub use loader::{
    find_wallet_tx, load_wallet, open_and_load, DbLoadStatus, SUPPORTED_FORMAT_VERSION,
};
pub use state::{WalletSink, WalletState};
