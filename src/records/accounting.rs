//! Ledger-style accounting records: named accounts and their append-only
//! credit/debit entries.

use super::codec::{DecodeError, Reader, Versioned, Writer};
use super::ids::PubKey;

/// One credit or debit against an account. Entries are keyed by
/// (account, sequence number) and never overwritten, only appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountingEntry {
    /// Positive = credit, negative = debit, in base ledger units.
    pub credit_debit: i64,
    pub time: i64,
    pub other_account: String,
    pub comment: String,
}

impl AccountingEntry {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::versioned(Self::CURRENT_VERSION);
        w.put_i64(self.credit_debit);
        w.put_i64(self.time);
        w.put_str(&self.other_account);
        w.put_str(&self.comment);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Versioned<Self>, DecodeError> {
        let mut r = Reader::new(data);
        let (version, future_version) = r.version(Self::CURRENT_VERSION)?;
        let value = Self {
            credit_debit: r.i64("accounting amount")?,
            time: r.i64("accounting time")?,
            other_account: r.string("accounting other account")?,
            comment: r.string("accounting comment")?,
        };
        Ok(Versioned {
            value,
            version,
            future_version,
        })
    }
}

/// A named account's receiving key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub pubkey: PubKey,
}

impl Account {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::versioned(Self::CURRENT_VERSION);
        w.put_pubkey(&self.pubkey);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Versioned<Self>, DecodeError> {
        let mut r = Reader::new(data);
        let (version, future_version) = r.version(Self::CURRENT_VERSION)?;
        let value = Self {
            pubkey: r.pubkey("account pubkey")?,
        };
        Ok(Versioned {
            value,
            version,
            future_version,
        })
    }
}
