//! On-disk log record framing for the key-value engine.
//!
//! The wallet file is an append-only sequence of log records behind an
//! 8-byte header. Each log record frames one atomic batch of operations:
//!
//! ```text
//! +------------------+
//! | Record Length    | (u32 LE, includes this field and the checksum)
//! +------------------+
//! | Op Count         | (u32 LE)
//! +------------------+
//! | Ops              | op = tag (u8: 0 put / 1 erase)
//! |                  |      key   (length-prefixed bytes)
//! |                  |      value (length-prefixed bytes, put only)
//! +------------------+
//! | Checksum         | (u32 LE, CRC32 over length + ops)
//! +------------------+
//! ```
//!
//! The checksum makes the batch the unit of atomicity: a torn write at the
//! file tail fails verification and none of its operations are applied.

use std::io::{self, Read};

/// File header: 4-byte magic plus a u32 LE format version.
pub const FILE_MAGIC: [u8; 4] = *b"WDB\x01";
/// Current on-disk format version of the log framing (not the record schema).
pub const FILE_FORMAT_VERSION: u32 = 1;
/// Total header length in bytes.
pub const HEADER_LEN: usize = 8;

/// Smallest possible record: length + count + one erase op with empty key + crc.
pub const MIN_RECORD_LEN: usize = 4 + 4 + 1 + 4 + 4;

const OP_PUT: u8 = 0;
const OP_ERASE: u8 = 1;

/// A single engine operation inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Put { key: Vec<u8>, value: Vec<u8> },
    Erase { key: Vec<u8> },
}

/// One framed batch of operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub ops: Vec<Op>,
}

impl LogRecord {
    pub fn new(ops: Vec<Op>) -> Self {
        Self { ops }
    }

    fn serialize_ops(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(self.ops.len() as u32).to_le_bytes());
        for op in &self.ops {
            match op {
                Op::Put { key, value } => {
                    buf.push(OP_PUT);
                    buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
                    buf.extend_from_slice(key);
                    buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
                    buf.extend_from_slice(value);
                }
                Op::Erase { key } => {
                    buf.push(OP_ERASE);
                    buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
                    buf.extend_from_slice(key);
                }
            }
        }
        buf
    }

    /// Serialize the complete record, checksum included.
    pub fn serialize(&self) -> Vec<u8> {
        let body = self.serialize_ops();
        let record_len = (4 + body.len() + 4) as u32;

        let mut checksum_data = Vec::with_capacity(4 + body.len());
        checksum_data.extend_from_slice(&record_len.to_le_bytes());
        checksum_data.extend_from_slice(&body);
        let checksum = crc32fast::hash(&checksum_data);

        let mut record = Vec::with_capacity(record_len as usize);
        record.extend_from_slice(&record_len.to_le_bytes());
        record.extend_from_slice(&body);
        record.extend_from_slice(&checksum.to_le_bytes());
        record
    }

    /// Deserialize one record from the front of `data`, verifying the
    /// checksum. Returns the record and the number of bytes consumed.
    pub fn deserialize(data: &[u8]) -> io::Result<(Self, usize)> {
        if data.len() < MIN_RECORD_LEN {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "log record too short",
            ));
        }

        let record_len = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if record_len < MIN_RECORD_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid log record length {}", record_len),
            ));
        }
        if data.len() < record_len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "log record truncated: need {} bytes, have {}",
                    record_len,
                    data.len()
                ),
            ));
        }

        let checksum_offset = record_len - 4;
        let stored_checksum = u32::from_le_bytes([
            data[checksum_offset],
            data[checksum_offset + 1],
            data[checksum_offset + 2],
            data[checksum_offset + 3],
        ]);
        let computed = crc32fast::hash(&data[0..checksum_offset]);
        if computed != stored_checksum {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "log record checksum mismatch: computed {:08x}, stored {:08x}",
                    computed, stored_checksum
                ),
            ));
        }

        let mut cursor = io::Cursor::new(&data[4..checksum_offset]);

        fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
            let mut buf = [0u8; 4];
            reader.read_exact(&mut buf)?;
            Ok(u32::from_le_bytes(buf))
        }

        fn read_bytes<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
            let len = read_u32(reader)? as usize;
            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf)?;
            Ok(buf)
        }

        let op_count = read_u32(&mut cursor)?;
        let mut ops = Vec::with_capacity(op_count as usize);
        for _ in 0..op_count {
            let mut tag = [0u8; 1];
            cursor.read_exact(&mut tag)?;
            match tag[0] {
                OP_PUT => {
                    let key = read_bytes(&mut cursor)?;
                    let value = read_bytes(&mut cursor)?;
                    ops.push(Op::Put { key, value });
                }
                OP_ERASE => {
                    let key = read_bytes(&mut cursor)?;
                    ops.push(Op::Erase { key });
                }
                other => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("unknown op tag {}", other),
                    ));
                }
            }
        }

        if (cursor.position() as usize) < checksum_offset - 4 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "trailing bytes after final op",
            ));
        }

        Ok((Self { ops }, record_len))
    }
}

/// Build the file header bytes.
pub fn file_header() -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    header[0..4].copy_from_slice(&FILE_MAGIC);
    header[4..8].copy_from_slice(&FILE_FORMAT_VERSION.to_le_bytes());
    header
}

/// Check whether `data` begins with a valid file header.
pub fn has_valid_header(data: &[u8]) -> bool {
    data.len() >= HEADER_LEN && data[0..4] == FILE_MAGIC
}
