//! Identifier newtypes shared across record kinds.

use std::fmt;

use super::codec::{DecodeError, Reader, Writer};

/// 32-byte transaction / token hash.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    pub const ZERO: TxHash = TxHash([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self)
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// 20-byte hash identifying a key or script (RIPEMD160-sized).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct KeyId(pub [u8; 20]);

impl KeyId {
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId(")?;
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ")")
    }
}

/// Serialized public key bytes (33 or 65 bytes for EC keys; opaque here —
/// this layer never interprets cryptographic content).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PubKey(pub Vec<u8>);

impl PubKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for PubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PubKey({} bytes)", self.0.len())
    }
}

impl Writer {
    pub fn put_tx_hash(&mut self, h: &TxHash) -> &mut Self {
        self.put_raw(&h.0)
    }

    pub fn put_key_id(&mut self, id: &KeyId) -> &mut Self {
        self.put_raw(&id.0)
    }

    pub fn put_pubkey(&mut self, pk: &PubKey) -> &mut Self {
        self.put_bytes(&pk.0)
    }
}

impl<'a> Reader<'a> {
    pub fn tx_hash(&mut self, what: &'static str) -> Result<TxHash, DecodeError> {
        Ok(TxHash(self.array::<32>(what)?))
    }

    pub fn key_id(&mut self, what: &'static str) -> Result<KeyId, DecodeError> {
        Ok(KeyId(self.array::<20>(what)?))
    }

    pub fn pubkey(&mut self, what: &'static str) -> Result<PubKey, DecodeError> {
        Ok(PubKey(self.bytes(what)?))
    }
}
