//! Hierarchical-deterministic chain state, a per-wallet singleton.

use super::codec::{DecodeError, Reader, Versioned, Writer};
use super::ids::KeyId;

/// Derivation counters and owning master key for the wallet's HD chain.
///
/// Version 1 predates the external/internal chain split and carries only
/// the external counter; version 2 added the internal (change) counter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HdChainState {
    pub external_chain_counter: u32,
    pub internal_chain_counter: u32,
    pub master_key_id: KeyId,
}

impl HdChainState {
    pub const VERSION_HD_BASE: u32 = 1;
    pub const VERSION_HD_CHAIN_SPLIT: u32 = 2;
    pub const CURRENT_VERSION: u32 = Self::VERSION_HD_CHAIN_SPLIT;

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::versioned(Self::CURRENT_VERSION);
        w.put_u32(self.external_chain_counter);
        w.put_u32(self.internal_chain_counter);
        w.put_key_id(&self.master_key_id);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Versioned<Self>, DecodeError> {
        let mut r = Reader::new(data);
        let (version, future_version) = r.version(Self::CURRENT_VERSION)?;
        let external_chain_counter = r.u32("external chain counter")?;
        let internal_chain_counter = if version >= Self::VERSION_HD_CHAIN_SPLIT {
            r.u32("internal chain counter")?
        } else {
            0
        };
        let master_key_id = r.key_id("hd master key id")?;
        Ok(Versioned {
            value: Self {
                external_chain_counter,
                internal_chain_counter,
                master_key_id,
            },
            version,
            future_version,
        })
    }
}
