//! Wallet transaction records.
//!
//! The ledger wire format of a transaction is not this layer's concern:
//! the payload after the version prefix is carried as opaque bytes the
//! surrounding wallet serializes and interprets.

use super::codec::{DecodeError, Reader, Versioned, Writer};

/// A full wallet transaction record, keyed by its hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletTx {
    pub raw: Vec<u8>,
}

impl WalletTx {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(raw: Vec<u8>) -> Self {
        Self { raw }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::versioned(Self::CURRENT_VERSION);
        w.put_raw(&self.raw);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Versioned<Self>, DecodeError> {
        let mut r = Reader::new(data);
        let (version, future_version) = r.version(Self::CURRENT_VERSION)?;
        Ok(Versioned {
            value: Self { raw: r.rest() },
            version,
            future_version,
        })
    }
}
