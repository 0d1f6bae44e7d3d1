//! Wallet-wide chain-position singletons: best block locator, next
//! transaction ordering position, and the minimum supported format version.

use super::codec::{DecodeError, Reader, Versioned, Writer};
use super::ids::TxHash;

/// Block locator: block hashes from the wallet's best-known tip backwards,
/// densest near the tip. Stored so a restarted wallet knows where to
/// resume scanning the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BestBlock {
    pub hashes: Vec<TxHash>,
}

impl BestBlock {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::versioned(Self::CURRENT_VERSION);
        w.put_u32(self.hashes.len() as u32);
        for h in &self.hashes {
            w.put_tx_hash(h);
        }
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Versioned<Self>, DecodeError> {
        let mut r = Reader::new(data);
        let (version, future_version) = r.version(Self::CURRENT_VERSION)?;
        let count = r.u32("locator hash count")? as usize;
        if count > r.remaining() / 32 {
            return Err(DecodeError::BadLength {
                what: "locator hash count",
                len: count,
            });
        }
        let mut hashes = Vec::with_capacity(count);
        for _ in 0..count {
            hashes.push(r.tx_hash("locator hash")?);
        }
        Ok(Versioned {
            value: Self { hashes },
            version,
            future_version,
        })
    }
}

const SCALAR_VERSION: u32 = 1;

/// Next value for the wallet's global transaction ordering counter.
pub fn encode_order_pos_next(v: i64) -> Vec<u8> {
    let mut w = Writer::versioned(SCALAR_VERSION);
    w.put_i64(v);
    w.finish()
}

pub fn decode_order_pos_next(data: &[u8]) -> Result<Versioned<i64>, DecodeError> {
    let mut r = Reader::new(data);
    let (version, future_version) = r.version(SCALAR_VERSION)?;
    let value = r.i64("order pos next")?;
    Ok(Versioned {
        value,
        version,
        future_version,
    })
}

/// Minimum wallet format version required to read this file. A stored
/// value above [`crate::load::SUPPORTED_FORMAT_VERSION`] blocks loading.
pub fn encode_min_version(v: u32) -> Vec<u8> {
    let mut w = Writer::versioned(SCALAR_VERSION);
    w.put_u32(v);
    w.finish()
}

pub fn decode_min_version(data: &[u8]) -> Result<Versioned<u32>, DecodeError> {
    let mut r = Reader::new(data);
    let (version, future_version) = r.version(SCALAR_VERSION)?;
    let value = r.u32("min version")?;
    Ok(Versioned {
        value,
        version,
        future_version,
    })
}
