//! Address-book and script records: labels, purposes, redeem scripts,
//! watch-only scripts, and the generic destination/contract metadata
//! tuples.
//!
//! Destination data and contract data share a (owner, key) -> value tuple
//! shape but live in independent namespaces; a label under one never
//! shadows the other.

use super::codec::{DecodeError, Reader, Versioned, Writer};

const STRING_VALUE_VERSION: u32 = 1;

/// Payload codec for record kinds whose value is a single string
/// (`name`, `purpose`, `destdata`, `contractdata`).
pub fn encode_string_value(v: &str) -> Vec<u8> {
    let mut w = Writer::versioned(STRING_VALUE_VERSION);
    w.put_str(v);
    w.finish()
}

pub fn decode_string_value(data: &[u8]) -> Result<Versioned<String>, DecodeError> {
    let mut r = Reader::new(data);
    let (version, future_version) = r.version(STRING_VALUE_VERSION)?;
    let value = r.string("string value")?;
    Ok(Versioned {
        value,
        version,
        future_version,
    })
}

const SCRIPT_VALUE_VERSION: u32 = 1;

/// Payload codec for `cscript`: the serialized redeem script bytes.
pub fn encode_script_value(script: &[u8]) -> Vec<u8> {
    let mut w = Writer::versioned(SCRIPT_VALUE_VERSION);
    w.put_bytes(script);
    w.finish()
}

pub fn decode_script_value(data: &[u8]) -> Result<Versioned<Vec<u8>>, DecodeError> {
    let mut r = Reader::new(data);
    let (version, future_version) = r.version(SCRIPT_VALUE_VERSION)?;
    let value = r.bytes("redeem script")?;
    Ok(Versioned {
        value,
        version,
        future_version,
    })
}
