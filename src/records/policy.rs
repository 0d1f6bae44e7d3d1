//! Wallet-wide spend-policy singletons: multisend rules, their settings
//! and disabled-address list, auto-combine, and the stake split threshold.
//!
//! Each of these is a singleton blob: a write replaces the prior value
//! wholesale. The list-shaped ones (`multisend`, `msdisabled`) are erased
//! only when the caller supplies the exact stored value, so an erase
//! racing a concurrent edit cannot clobber it.

use super::codec::{DecodeError, Reader, Versioned, Writer};

/// Multisend: after each stake/masternode reward, send fixed percentages
/// of it to the listed addresses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MultiSendRules {
    /// (destination address, percentage) pairs.
    pub recipients: Vec<(String, u32)>,
}

impl MultiSendRules {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::versioned(Self::CURRENT_VERSION);
        w.put_u32(self.recipients.len() as u32);
        for (address, percent) in &self.recipients {
            w.put_str(address);
            w.put_u32(*percent);
        }
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Versioned<Self>, DecodeError> {
        let mut r = Reader::new(data);
        let (version, future_version) = r.version(Self::CURRENT_VERSION)?;
        let count = r.u32("multisend recipient count")? as usize;
        let mut recipients = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let address = r.string("multisend address")?;
            let percent = r.u32("multisend percent")?;
            recipients.push((address, percent));
        }
        Ok(Versioned {
            value: Self { recipients },
            version,
            future_version,
        })
    }
}

/// Activation flags for multisend plus the last ledger height it ran at.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MultiSendSettings {
    pub multisend_stake: bool,
    pub multisend_masternode: bool,
    pub last_multisend_height: i32,
}

impl MultiSendSettings {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::versioned(Self::CURRENT_VERSION);
        w.put_bool(self.multisend_stake);
        w.put_bool(self.multisend_masternode);
        w.put_i32(self.last_multisend_height);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Versioned<Self>, DecodeError> {
        let mut r = Reader::new(data);
        let (version, future_version) = r.version(Self::CURRENT_VERSION)?;
        let value = Self {
            multisend_stake: r.bool("multisend stake flag")?,
            multisend_masternode: r.bool("multisend masternode flag")?,
            last_multisend_height: r.i32("last multisend height")?,
        };
        Ok(Versioned {
            value,
            version,
            future_version,
        })
    }
}

/// Addresses excluded from multisend processing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MsDisabledAddresses {
    pub addresses: Vec<String>,
}

impl MsDisabledAddresses {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::versioned(Self::CURRENT_VERSION);
        w.put_u32(self.addresses.len() as u32);
        for address in &self.addresses {
            w.put_str(address);
        }
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Versioned<Self>, DecodeError> {
        let mut r = Reader::new(data);
        let (version, future_version) = r.version(Self::CURRENT_VERSION)?;
        let count = r.u32("disabled address count")? as usize;
        let mut addresses = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            addresses.push(r.string("disabled address")?);
        }
        Ok(Versioned {
            value: Self { addresses },
            version,
            future_version,
        })
    }
}

/// Auto-combine: sweep small UTXOs below the threshold into one output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AutoCombineSettings {
    pub enabled: bool,
    /// Combine threshold in base ledger units.
    pub threshold: i64,
}

impl AutoCombineSettings {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::versioned(Self::CURRENT_VERSION);
        w.put_bool(self.enabled);
        w.put_i64(self.threshold);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Versioned<Self>, DecodeError> {
        let mut r = Reader::new(data);
        let (version, future_version) = r.version(Self::CURRENT_VERSION)?;
        let value = Self {
            enabled: r.bool("autocombine enabled")?,
            threshold: r.i64("autocombine threshold")?,
        };
        Ok(Versioned {
            value,
            version,
            future_version,
        })
    }
}

const SCALAR_VERSION: u32 = 1;

/// Stake outputs above this size are split when staking.
pub fn encode_split_threshold(v: u64) -> Vec<u8> {
    let mut w = Writer::versioned(SCALAR_VERSION);
    w.put_u64(v);
    w.finish()
}

pub fn decode_split_threshold(data: &[u8]) -> Result<Versioned<u64>, DecodeError> {
    let mut r = Reader::new(data);
    let (version, future_version) = r.version(SCALAR_VERSION)?;
    let value = r.u64("stake split threshold")?;
    Ok(Versioned {
        value,
        version,
        future_version,
    })
}
