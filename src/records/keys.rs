//! Cryptographic key records: plaintext/encrypted secrets, master keys,
//! and per-key metadata.
//!
//! Secrets are opaque byte blobs produced by the crypto layer; this layer
//! stores them verbatim and never interprets them.

use super::codec::{DecodeError, Reader, Versioned, Writer};
use super::ids::KeyId;

/// Metadata paired 1:1 with every stored key.
///
/// Version 1 carries only the creation time. Version 10 added HD
/// derivation data (keypath and owning master key). The jump in version
/// numbers is inherited from the original wallet format and kept so that
/// old wallet files decode unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMetadata {
    /// Unix timestamp of key creation; 0 means unknown.
    pub create_time: i64,
    /// BIP32 keypath, empty when the key is not HD-derived.
    pub hd_keypath: String,
    /// Id of the HD master key this key derives from; null when not HD.
    pub hd_master_key_id: KeyId,
}

impl KeyMetadata {
    pub const VERSION_BASIC: u32 = 1;
    pub const VERSION_WITH_HDDATA: u32 = 10;
    pub const CURRENT_VERSION: u32 = Self::VERSION_WITH_HDDATA;

    pub fn new(create_time: i64) -> Self {
        Self {
            create_time,
            hd_keypath: String::new(),
            hd_master_key_id: KeyId::default(),
        }
    }

    /// Synthesized default for keys discovered without metadata:
    /// creation time unknown.
    pub fn unknown() -> Self {
        Self::new(0)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::versioned(Self::CURRENT_VERSION);
        w.put_i64(self.create_time);
        w.put_str(&self.hd_keypath);
        w.put_key_id(&self.hd_master_key_id);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Versioned<Self>, DecodeError> {
        let mut r = Reader::new(data);
        let (version, future_version) = r.version(Self::CURRENT_VERSION)?;
        let create_time = r.i64("key creation time")?;
        let (hd_keypath, hd_master_key_id) = if version >= Self::VERSION_WITH_HDDATA {
            (r.string("hd keypath")?, r.key_id("hd master key id")?)
        } else {
            (String::new(), KeyId::default())
        };
        Ok(Versioned {
            value: Self {
                create_time,
                hd_keypath,
                hd_master_key_id,
            },
            version,
            future_version,
        })
    }
}

/// Wallet master key: an encrypted key blob plus the KDF parameters needed
/// to re-derive the wrapping key from the passphrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterKey {
    pub crypted_key: Vec<u8>,
    pub salt: Vec<u8>,
    pub derivation_method: u32,
    pub derive_iterations: u32,
    /// Extra parameters for future derivation methods, opaque.
    pub other_params: Vec<u8>,
}

impl MasterKey {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::versioned(Self::CURRENT_VERSION);
        w.put_bytes(&self.crypted_key);
        w.put_bytes(&self.salt);
        w.put_u32(self.derivation_method);
        w.put_u32(self.derive_iterations);
        w.put_bytes(&self.other_params);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Versioned<Self>, DecodeError> {
        let mut r = Reader::new(data);
        let (version, future_version) = r.version(Self::CURRENT_VERSION)?;
        let value = Self {
            crypted_key: r.bytes("master crypted key")?,
            salt: r.bytes("master key salt")?,
            derivation_method: r.u32("derivation method")?,
            derive_iterations: r.u32("derive iterations")?,
            other_params: r.bytes("derivation params")?,
        };
        Ok(Versioned {
            value,
            version,
            future_version,
        })
    }
}

/// Payload codec shared by `key` (plaintext private key) and `ckey`
/// (encrypted secret) records: version prefix plus the opaque blob.
pub fn encode_secret(secret: &[u8]) -> Vec<u8> {
    let mut w = Writer::versioned(SECRET_VERSION);
    w.put_bytes(secret);
    w.finish()
}

pub fn decode_secret(data: &[u8]) -> Result<Versioned<Vec<u8>>, DecodeError> {
    let mut r = Reader::new(data);
    let (version, future_version) = r.version(SECRET_VERSION)?;
    let secret = r.bytes("key secret")?;
    Ok(Versioned {
        value: secret,
        version,
        future_version,
    })
}

const SECRET_VERSION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_roundtrip_current_version() {
        let meta = KeyMetadata {
            create_time: 1_700_000_000,
            hd_keypath: "m/44'/0'/0'/0/7".to_string(),
            hd_master_key_id: KeyId([3u8; 20]),
        };
        let decoded = KeyMetadata::decode(&meta.encode()).unwrap();
        assert_eq!(decoded.value, meta);
        assert_eq!(decoded.version, KeyMetadata::CURRENT_VERSION);
        assert!(!decoded.future_version);
    }

    #[test]
    fn test_metadata_basic_version_defaults_hd_fields() {
        // A v1 payload carries only the creation time.
        let mut w = Writer::versioned(KeyMetadata::VERSION_BASIC);
        w.put_i64(1234);
        let decoded = KeyMetadata::decode(&w.finish()).unwrap();
        assert_eq!(decoded.value.create_time, 1234);
        assert!(decoded.value.hd_keypath.is_empty());
        assert!(decoded.value.hd_master_key_id.is_null());
        assert!(!decoded.future_version);
    }

    #[test]
    fn test_metadata_future_version_tolerated() {
        let mut w = Writer::versioned(KeyMetadata::CURRENT_VERSION + 5);
        w.put_i64(99);
        w.put_str("m/0'");
        w.put_key_id(&KeyId([1u8; 20]));
        w.put_u64(0xdead_beef); // field this codec does not know
        let decoded = KeyMetadata::decode(&w.finish()).unwrap();
        assert!(decoded.future_version);
        assert_eq!(decoded.value.create_time, 99);
        assert_eq!(decoded.value.hd_keypath, "m/0'");
    }

    #[test]
    fn test_master_key_roundtrip() {
        let mk = MasterKey {
            crypted_key: vec![1; 48],
            salt: vec![2; 8],
            derivation_method: 0,
            derive_iterations: 25_000,
            other_params: Vec::new(),
        };
        let decoded = MasterKey::decode(&mk.encode()).unwrap();
        assert_eq!(decoded.value, mk);
    }

    #[test]
    fn test_secret_roundtrip() {
        let secret = vec![0xabu8; 32];
        let decoded = decode_secret(&encode_secret(&secret)).unwrap();
        assert_eq!(decoded.value, secret);
    }

    #[test]
    fn test_truncated_metadata_fails() {
        let meta = KeyMetadata::new(55);
        let bytes = meta.encode();
        assert!(KeyMetadata::decode(&bytes[..bytes.len() - 4]).is_err());
    }
}
