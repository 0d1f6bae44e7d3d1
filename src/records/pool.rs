//! Key-pool entries: pre-generated look-ahead keys, keyed by a
//! monotonically increasing integer index.

use super::codec::{DecodeError, Reader, Versioned, Writer};
use super::ids::PubKey;

/// One reserve key waiting to be handed out.
///
/// Version 2 added the internal flag distinguishing change-chain keys
/// from receive-chain keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPoolEntry {
    /// Unix timestamp the key was generated.
    pub time: i64,
    pub pubkey: PubKey,
    /// True for internal (change) keys.
    pub internal: bool,
}

impl KeyPoolEntry {
    pub const VERSION_BASE: u32 = 1;
    pub const VERSION_INTERNAL: u32 = 2;
    pub const CURRENT_VERSION: u32 = Self::VERSION_INTERNAL;

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::versioned(Self::CURRENT_VERSION);
        w.put_i64(self.time);
        w.put_pubkey(&self.pubkey);
        w.put_bool(self.internal);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Versioned<Self>, DecodeError> {
        let mut r = Reader::new(data);
        let (version, future_version) = r.version(Self::CURRENT_VERSION)?;
        let time = r.i64("pool entry time")?;
        let pubkey = r.pubkey("pool entry pubkey")?;
        let internal = if version >= Self::VERSION_INTERNAL {
            r.bool("pool entry internal flag")?
        } else {
            false
        };
        Ok(Versioned {
            value: Self {
                time,
                pubkey,
                internal,
            },
            version,
            future_version,
        })
    }
}
