//! Engine-level salvage: best-effort extraction of readable pairs from a
//! damaged wallet file.
//!
//! Salvage works below the record schema. It walks the raw bytes, accepts
//! any region that parses as a checksum-valid log record, and on failure
//! re-synchronizes by advancing a single byte and trying again. Unreadable
//! regions are skipped, never repaired; a pair whose value bytes survived
//! with a valid checksum but whose schema is damaged is someone else's
//! problem (the recovery controller re-validates against the catalog).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::entry::{self, LogRecord, Op, HEADER_LEN, MIN_RECORD_LEN};
use super::errors::{KvError, KvResult};

/// Outcome of a salvage pass.
#[derive(Debug)]
pub struct SalvageOutcome {
    /// Every readable live pair, in key order, latest write wins.
    pub pairs: Vec<(Vec<u8>, Vec<u8>)>,
    /// Log records that parsed and verified.
    pub records_recovered: u64,
    /// Bytes skipped while re-synchronizing.
    pub bytes_skipped: u64,
}

/// Extract every readable (key, value) pair from the file at `path`.
///
/// The source file is only read. Callers wanting exclusive access must hold
/// the file lock themselves; salvage does not take it so that it can run on
/// files too damaged for a normal open.
pub fn salvage(path: &Path) -> KvResult<SalvageOutcome> {
    let data = fs::read(path).map_err(|e| KvError::io(path, e))?;

    // A damaged header is no reason to give up; start the scan wherever
    // plausible record bytes begin.
    let mut offset = if entry::has_valid_header(&data) {
        HEADER_LEN
    } else {
        0
    };

    let mut live: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();
    let mut records_recovered = 0u64;
    let mut bytes_skipped = 0u64;

    while offset + MIN_RECORD_LEN <= data.len() {
        match LogRecord::deserialize(&data[offset..]) {
            Ok((record, consumed)) => {
                apply(&mut live, record);
                records_recovered += 1;
                offset += consumed;
            }
            Err(_) => {
                offset += 1;
                bytes_skipped += 1;
            }
        }
    }
    bytes_skipped += (data.len() - offset.min(data.len())) as u64;

    Ok(SalvageOutcome {
        pairs: live.into_iter().collect(),
        records_recovered,
        bytes_skipped,
    })
}

fn apply(live: &mut BTreeMap<Vec<u8>, Vec<u8>>, record: LogRecord) {
    for op in record.ops {
        match op {
            Op::Put { key, value } => {
                live.insert(key, value);
            }
            Op::Erase { key } => {
                live.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::FileKv;
    use tempfile::TempDir;

    #[test]
    fn test_salvage_clean_file_yields_all_pairs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wallet.dat");
        {
            let mut kv = FileKv::open(&path).unwrap();
            kv.put(b"a".to_vec(), b"1".to_vec()).unwrap();
            kv.put(b"b".to_vec(), b"2".to_vec()).unwrap();
            kv.erase(b"a".to_vec()).unwrap();
        }

        let outcome = salvage(&path).unwrap();
        assert_eq!(outcome.pairs, vec![(b"b".to_vec(), b"2".to_vec())]);
        assert_eq!(outcome.bytes_skipped, 0);
        assert_eq!(outcome.records_recovered, 3);
    }

    #[test]
    fn test_salvage_resynchronizes_past_corruption() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wallet.dat");
        let (first_end, second_end);
        {
            let mut kv = FileKv::open(&path).unwrap();
            kv.put(b"early".to_vec(), b"1".to_vec()).unwrap();
            first_end = fs::metadata(&path).unwrap().len();
            kv.put(b"middle".to_vec(), b"2".to_vec()).unwrap();
            second_end = fs::metadata(&path).unwrap().len();
            kv.put(b"late".to_vec(), b"3".to_vec()).unwrap();
        }

        // Smash the middle record.
        let mut data = fs::read(&path).unwrap();
        for b in &mut data[first_end as usize..second_end as usize] {
            *b ^= 0xA5;
        }
        fs::write(&path, &data).unwrap();

        let outcome = salvage(&path).unwrap();
        let keys: Vec<&[u8]> = outcome.pairs.iter().map(|(k, _)| k.as_slice()).collect();
        assert!(keys.contains(&&b"early"[..]));
        assert!(keys.contains(&&b"late"[..]));
        assert!(!keys.contains(&&b"middle"[..]));
        assert!(outcome.bytes_skipped > 0);
    }

    #[test]
    fn test_salvage_survives_damaged_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wallet.dat");
        {
            let mut kv = FileKv::open(&path).unwrap();
            kv.put(b"survivor".to_vec(), b"v".to_vec()).unwrap();
        }

        let mut data = fs::read(&path).unwrap();
        data[0] = 0x00;
        fs::write(&path, &data).unwrap();

        let outcome = salvage(&path).unwrap();
        assert_eq!(outcome.pairs, vec![(b"survivor".to_vec(), b"v".to_vec())]);
    }

    #[test]
    fn test_salvage_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.dat");
        fs::write(&path, b"").unwrap();

        let outcome = salvage(&path).unwrap();
        assert!(outcome.pairs.is_empty());
        assert_eq!(outcome.records_recovered, 0);
    }
}
