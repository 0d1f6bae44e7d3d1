//! Masternode configuration records, keyed by operator-chosen alias.

use super::codec::{DecodeError, Reader, Versioned, Writer};

/// One configured masternode: network endpoint, collateral address, and
/// the node's operating private key (opaque to this layer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    pub alias: String,
    pub address: String,
    pub collateral_address: String,
    pub masternode_privkey: String,
}

impl NodeConfig {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::versioned(Self::CURRENT_VERSION);
        w.put_str(&self.alias);
        w.put_str(&self.address);
        w.put_str(&self.collateral_address);
        w.put_str(&self.masternode_privkey);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Versioned<Self>, DecodeError> {
        let mut r = Reader::new(data);
        let (version, future_version) = r.version(Self::CURRENT_VERSION)?;
        let value = Self {
            alias: r.string("masternode alias")?,
            address: r.string("masternode address")?,
            collateral_address: r.string("collateral address")?,
            masternode_privkey: r.string("masternode privkey")?,
        };
        Ok(Versioned {
            value,
            version,
            future_version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let config = NodeConfig {
            alias: "mn1".to_string(),
            address: "203.0.113.7:9999".to_string(),
            collateral_address: "LCollateralAddr".to_string(),
            masternode_privkey: "7privkeybase58".to_string(),
        };
        let decoded = NodeConfig::decode(&config.encode()).unwrap();
        assert_eq!(decoded.value, config);
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(NodeConfig::decode(&[0xff; 6]).is_err());
    }
}
