//! Field-level codec primitives shared by every record kind.
//!
//! Values are little-endian integers and length-prefixed byte strings, in
//! the same shape the engine's log framing uses. Every payload starts with
//! a u32 schema version; `Reader::version` implements the version-gating
//! rule: fields introduced at version N are read only when the stored
//! version is >= N, and a stored version above the codec's current one is
//! tolerated and flagged rather than rejected.

use thiserror::Error;

/// Decode failure for a single record payload or key.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("truncated record while reading {0}")]
    Truncated(&'static str),

    #[error("invalid length {len} for {what}")]
    BadLength { what: &'static str, len: usize },

    #[error("{0} is not valid utf-8")]
    BadUtf8(&'static str),

    #[error("{what} has invalid value {value}")]
    BadValue { what: &'static str, value: u64 },
}

/// A decoded payload together with its stored schema version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub value: T,
    /// The version found on disk (may exceed the codec's current version).
    pub version: u32,
    /// True when the stored version is newer than this codec understands.
    /// Known fields were decoded; unread trailing data was left alone.
    pub future_version: bool,
}

impl<T> Versioned<T> {
    pub fn current(value: T, version: u32) -> Self {
        Self {
            value,
            version,
            future_version: false,
        }
    }
}

/// Append-only payload builder.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a payload with its schema version.
    pub fn versioned(version: u32) -> Self {
        let mut w = Self::new();
        w.put_u32(version);
        w
    }

    pub fn put_u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn put_bool(&mut self, v: bool) -> &mut Self {
        self.put_u8(u8::from(v))
    }

    pub fn put_u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn put_u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn put_i32(&mut self, v: i32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn put_i64(&mut self, v: i64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn put_bytes(&mut self, v: &[u8]) -> &mut Self {
        self.put_u32(v.len() as u32);
        self.buf.extend_from_slice(v);
        self
    }

    pub fn put_str(&mut self, v: &str) -> &mut Self {
        self.put_bytes(v.as_bytes())
    }

    /// Append raw bytes with no length prefix. Only valid as the final
    /// field of a payload, where the value boundary delimits it.
    pub fn put_raw(&mut self, v: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(v);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Sequential payload reader.
#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Read the leading schema version and classify it against the codec's
    /// current version. Returns (stored_version, future_version).
    pub fn version(&mut self, current: u32) -> Result<(u32, bool), DecodeError> {
        let stored = self.u32("schema version")?;
        Ok((stored, stored > current))
    }

    pub fn u8(&mut self, what: &'static str) -> Result<u8, DecodeError> {
        let bytes = self.take(1, what)?;
        Ok(bytes[0])
    }

    pub fn bool(&mut self, what: &'static str) -> Result<bool, DecodeError> {
        match self.u8(what)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DecodeError::BadValue {
                what,
                value: u64::from(other),
            }),
        }
    }

    pub fn u32(&mut self, what: &'static str) -> Result<u32, DecodeError> {
        let bytes = self.take(4, what)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn u64(&mut self, what: &'static str) -> Result<u64, DecodeError> {
        let bytes = self.take(8, what)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(buf))
    }

    pub fn i32(&mut self, what: &'static str) -> Result<i32, DecodeError> {
        let bytes = self.take(4, what)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn i64(&mut self, what: &'static str) -> Result<i64, DecodeError> {
        let bytes = self.take(8, what)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(i64::from_le_bytes(buf))
    }

    pub fn bytes(&mut self, what: &'static str) -> Result<Vec<u8>, DecodeError> {
        let len = self.u32(what)? as usize;
        if len > self.remaining() {
            return Err(DecodeError::BadLength { what, len });
        }
        Ok(self.take(len, what)?.to_vec())
    }

    pub fn string(&mut self, what: &'static str) -> Result<String, DecodeError> {
        let bytes = self.bytes(what)?;
        String::from_utf8(bytes).map_err(|_| DecodeError::BadUtf8(what))
    }

    /// Read exactly `n` raw bytes.
    pub fn array<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N], DecodeError> {
        let bytes = self.take(N, what)?;
        let mut buf = [0u8; N];
        buf.copy_from_slice(bytes);
        Ok(buf)
    }

    /// Consume all remaining bytes.
    pub fn rest(&mut self) -> Vec<u8> {
        let out = self.data[self.pos..].to_vec();
        self.pos = self.data.len();
        out
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::Truncated(what));
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }
}
