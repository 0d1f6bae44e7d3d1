//! Contract-token records: per-token metadata/balance state and the
//! token-transfer history, both keyed by hash and independent of the
//! UTXO transaction records.

use super::codec::{DecodeError, Reader, Versioned, Writer};
use super::ids::TxHash;

/// 256-bit token amount, stored as raw little-endian bytes. Token
/// balances routinely exceed u64; arithmetic on them is the wallet's
/// concern, not this layer's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenAmount(pub [u8; 32]);

impl TokenAmount {
    pub fn from_u64(v: u64) -> Self {
        let mut raw = [0u8; 32];
        raw[..8].copy_from_slice(&v.to_le_bytes());
        Self(raw)
    }
}

/// Metadata and last-known balance for one watched contract token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub contract_address: String,
    pub token_name: String,
    pub token_symbol: String,
    pub decimals: u8,
    pub sender_address: String,
    pub block_hash: TxHash,
    pub block_number: i64,
    /// Hash of the transaction that registered the token; also the subkey.
    pub create_tx_hash: TxHash,
}

impl TokenInfo {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::versioned(Self::CURRENT_VERSION);
        w.put_str(&self.contract_address);
        w.put_str(&self.token_name);
        w.put_str(&self.token_symbol);
        w.put_u8(self.decimals);
        w.put_str(&self.sender_address);
        w.put_tx_hash(&self.block_hash);
        w.put_i64(self.block_number);
        w.put_tx_hash(&self.create_tx_hash);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Versioned<Self>, DecodeError> {
        let mut r = Reader::new(data);
        let (version, future_version) = r.version(Self::CURRENT_VERSION)?;
        let value = Self {
            contract_address: r.string("token contract address")?,
            token_name: r.string("token name")?,
            token_symbol: r.string("token symbol")?,
            decimals: r.u8("token decimals")?,
            sender_address: r.string("token sender address")?,
            block_hash: r.tx_hash("token block hash")?,
            block_number: r.i64("token block number")?,
            create_tx_hash: r.tx_hash("token create tx hash")?,
        };
        Ok(Versioned {
            value,
            version,
            future_version,
        })
    }
}

/// One token transfer involving a wallet address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTxRecord {
    pub contract_address: String,
    pub sender_address: String,
    pub receiver_address: String,
    pub value: TokenAmount,
    pub block_hash: TxHash,
    pub block_number: i64,
    /// Hash of the carrying transaction; also the subkey.
    pub tx_hash: TxHash,
}

impl TokenTxRecord {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::versioned(Self::CURRENT_VERSION);
        w.put_str(&self.contract_address);
        w.put_str(&self.sender_address);
        w.put_str(&self.receiver_address);
        w.put_raw(&self.value.0);
        w.put_tx_hash(&self.block_hash);
        w.put_i64(self.block_number);
        w.put_tx_hash(&self.tx_hash);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Versioned<Self>, DecodeError> {
        let mut r = Reader::new(data);
        let (version, future_version) = r.version(Self::CURRENT_VERSION)?;
        let value = Self {
            contract_address: r.string("token tx contract address")?,
            sender_address: r.string("token tx sender")?,
            receiver_address: r.string("token tx receiver")?,
            value: TokenAmount(r.array::<32>("token tx value")?),
            block_hash: r.tx_hash("token tx block hash")?,
            block_number: r.i64("token tx block number")?,
            tx_hash: r.tx_hash("token tx hash")?,
        };
        Ok(Versioned {
            value,
            version,
            future_version,
        })
    }
}
