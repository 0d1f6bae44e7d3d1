//! File-backed ordered key-value store with atomic batch commit.
//!
//! The store keeps the full live view in an ordered in-memory map and
//! persists every mutation as an append-only, checksummed log record
//! (see `entry`). fsync runs after every committed batch; a crash can
//! only ever lose the batch being written, never tear one in half.
//!
//! Wallets are small, so holding the live view in memory is deliberate:
//! it gives the ordered-cursor and snapshot-read semantics the load scan
//! requires without page management.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use super::entry::{self, LogRecord, Op, HEADER_LEN, MIN_RECORD_LEN};
use super::errors::{KvError, KvResult};
use crate::logging;

/// Compaction is considered once this many operations have been applied.
const REWRITE_MIN_OPS: u64 = 64;

/// Exclusive-access sentinel for a wallet file. Creating the sentinel with
/// `create_new` is the whole protocol: whoever creates it owns the file.
#[derive(Debug)]
pub struct FileLock {
    lock_path: PathBuf,
}

impl FileLock {
    /// Acquire the lock for `path`, failing if another handle holds it.
    pub fn acquire(path: &Path) -> KvResult<Self> {
        let lock_path = lock_path_for(path);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(_) => Ok(Self { lock_path }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(KvError::Locked(path.to_path_buf()))
            }
            Err(e) => Err(KvError::io(&lock_path, e)),
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// Whether any complete, checksum-valid record starts at or after `offset`.
fn has_record_beyond(data: &[u8], mut offset: usize) -> bool {
    while offset + MIN_RECORD_LEN <= data.len() {
        if LogRecord::deserialize(&data[offset..]).is_ok() {
            return true;
        }
        offset += 1;
    }
    false
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    path.with_file_name(name)
}

/// A batch of operations applied atomically on commit.
#[derive(Debug, Default)]
pub struct Batch {
    ops: Vec<Op>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> &mut Self {
        self.ops.push(Op::Put { key, value });
        self
    }

    pub fn erase(&mut self, key: Vec<u8>) -> &mut Self {
        self.ops.push(Op::Erase { key });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

/// File-backed ordered key-value store.
pub struct FileKv {
    path: PathBuf,
    file: File,
    live: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Operations applied since the file was last compacted.
    applied_ops: u64,
    _lock: FileLock,
}

impl FileKv {
    /// Open (or create) the wallet file at `path`, taking the exclusive
    /// lock and replaying the log into the live view.
    ///
    /// Replay stops at the first record that fails framing or checksum
    /// verification. A record failing at the tail is the torn-write crash
    /// case; the file is truncated back to the last valid boundary so the
    /// next append starts clean.
    pub fn open(path: &Path) -> KvResult<Self> {
        let lock = FileLock::acquire(path)?;

        let exists = path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .map_err(|e| KvError::io(path, e))?;

        let mut live = BTreeMap::new();
        let mut applied_ops = 0u64;

        if !exists || file.metadata().map_err(|e| KvError::io(path, e))?.len() == 0 {
            file.write_all(&entry::file_header())
                .and_then(|_| file.sync_all())
                .map_err(|e| KvError::io(path, e))?;
        } else {
            let mut data = Vec::new();
            {
                let mut reader = File::open(path).map_err(|e| KvError::io(path, e))?;
                reader
                    .read_to_end(&mut data)
                    .map_err(|e| KvError::io(path, e))?;
            }
            if !entry::has_valid_header(&data) {
                return Err(KvError::BadMagic(path.to_path_buf()));
            }

            let mut offset = HEADER_LEN;
            while offset < data.len() {
                match LogRecord::deserialize(&data[offset..]) {
                    Ok((record, consumed)) => {
                        applied_ops += record.ops.len() as u64;
                        apply_record(&mut live, record);
                        offset += consumed;
                    }
                    Err(e) => {
                        // A failed record is only a torn tail if nothing
                        // valid lies beyond it. Truncating past mid-file
                        // damage would destroy records salvage could still
                        // read, so such files are refused intact.
                        if has_record_beyond(&data, offset + 1) {
                            return Err(KvError::corrupt(offset as u64, e.to_string()));
                        }
                        logging::warn(
                            "wallet_log_tail_dropped",
                            &[
                                ("offset", &offset.to_string()),
                                ("reason", &e.to_string()),
                            ],
                        );
                        file.set_len(offset as u64).map_err(|e| KvError::io(path, e))?;
                        break;
                    }
                }
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            file,
            live,
            applied_ops,
            _lock: lock,
        })
    }

    /// Path of the underlying wallet file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up a value by exact key.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.live.get(key).map(|v| v.as_slice())
    }

    /// Whether the store currently holds `key`.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.live.contains_key(key)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Ordered cursor over every live (key, value) pair.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.live.iter().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    /// Ordered cursor restricted to keys starting with `prefix`.
    pub fn iter_prefix<'a>(
        &'a self,
        prefix: &'a [u8],
    ) -> impl Iterator<Item = (&'a [u8], &'a [u8])> + 'a {
        self.live
            .range(prefix.to_vec()..)
            .take_while(move |(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    /// Insert or overwrite one key. Commits immediately.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> KvResult<()> {
        let mut batch = Batch::new();
        batch.put(key, value);
        self.commit(batch)
    }

    /// Remove one key. Commits immediately; returns whether it was present.
    pub fn erase(&mut self, key: Vec<u8>) -> KvResult<bool> {
        let present = self.live.contains_key(&key);
        let mut batch = Batch::new();
        batch.erase(key);
        self.commit(batch)?;
        Ok(present)
    }

    /// Durably apply a batch. Either every operation in the batch becomes
    /// visible or, on a crash mid-append, none of them do.
    pub fn commit(&mut self, batch: Batch) -> KvResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let record = LogRecord::new(batch.ops);
        let bytes = record.serialize();

        self.file
            .write_all(&bytes)
            .and_then(|_| self.file.sync_all())
            .map_err(|e| KvError::io(&self.path, e))?;

        self.applied_ops += record.ops.len() as u64;
        apply_record(&mut self.live, record);
        Ok(())
    }

    /// fsync the underlying file.
    pub fn flush(&mut self) -> KvResult<()> {
        self.file.sync_all().map_err(|e| KvError::io(&self.path, e))
    }

    /// Whether enough of the log is dead weight that a rewrite is worth it.
    pub fn needs_rewrite(&self) -> bool {
        self.applied_ops >= REWRITE_MIN_OPS && self.applied_ops > 2 * self.live.len() as u64
    }

    /// Rewrite the file from the live view, dropping superseded records.
    /// The rewrite goes through a temp file and an atomic rename.
    pub fn compact(&mut self) -> KvResult<()> {
        let tmp_path = self.path.with_extension("rewrite");

        {
            let mut tmp = File::create(&tmp_path).map_err(|e| KvError::io(&tmp_path, e))?;
            tmp.write_all(&entry::file_header())
                .map_err(|e| KvError::io(&tmp_path, e))?;

            let ops: Vec<Op> = self
                .live
                .iter()
                .map(|(k, v)| Op::Put {
                    key: k.clone(),
                    value: v.clone(),
                })
                .collect();
            if !ops.is_empty() {
                tmp.write_all(&LogRecord::new(ops).serialize())
                    .map_err(|e| KvError::io(&tmp_path, e))?;
            }
            tmp.sync_all().map_err(|e| KvError::io(&tmp_path, e))?;
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| KvError::io(&self.path, e))?;

        self.file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| KvError::io(&self.path, e))?;
        self.applied_ops = self.live.len() as u64;
        Ok(())
    }
}

fn apply_record(live: &mut BTreeMap<Vec<u8>, Vec<u8>>, record: LogRecord) {
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
    use tempfile::TempDir;

    fn wallet_path(dir: &TempDir) -> PathBuf {
        dir.path().join("wallet.dat")
    }

    #[test]
    fn test_put_get_erase() {
        let dir = TempDir::new().unwrap();
        let mut kv = FileKv::open(&wallet_path(&dir)).unwrap();

        kv.put(b"alpha".to_vec(), b"1".to_vec()).unwrap();
        kv.put(b"beta".to_vec(), b"2".to_vec()).unwrap();
        assert_eq!(kv.get(b"alpha"), Some(&b"1"[..]));
        assert_eq!(kv.len(), 2);

        assert!(kv.erase(b"alpha".to_vec()).unwrap());
        assert!(!kv.erase(b"alpha".to_vec()).unwrap());
        assert_eq!(kv.get(b"alpha"), None);
    }

    #[test]
    fn test_reopen_replays_log() {
        let dir = TempDir::new().unwrap();
        let path = wallet_path(&dir);

        {
            let mut kv = FileKv::open(&path).unwrap();
            kv.put(b"k1".to_vec(), b"first".to_vec()).unwrap();
            kv.put(b"k1".to_vec(), b"second".to_vec()).unwrap();
            kv.put(b"k2".to_vec(), b"other".to_vec()).unwrap();
            kv.erase(b"k2".to_vec()).unwrap();
        }

        let kv = FileKv::open(&path).unwrap();
        assert_eq!(kv.get(b"k1"), Some(&b"second"[..]));
        assert_eq!(kv.get(b"k2"), None);
        assert_eq!(kv.len(), 1);
    }

    #[test]
    fn test_cursor_is_ordered() {
        let dir = TempDir::new().unwrap();
        let mut kv = FileKv::open(&wallet_path(&dir)).unwrap();

        kv.put(b"c".to_vec(), b"3".to_vec()).unwrap();
        kv.put(b"a".to_vec(), b"1".to_vec()).unwrap();
        kv.put(b"b".to_vec(), b"2".to_vec()).unwrap();

        let keys: Vec<&[u8]> = kv.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![&b"a"[..], &b"b"[..], &b"c"[..]]);
    }

    #[test]
    fn test_prefix_cursor() {
        let dir = TempDir::new().unwrap();
        let mut kv = FileKv::open(&wallet_path(&dir)).unwrap();

        kv.put(b"tx/1".to_vec(), b"".to_vec()).unwrap();
        kv.put(b"tx/2".to_vec(), b"".to_vec()).unwrap();
        kv.put(b"ty/1".to_vec(), b"".to_vec()).unwrap();

        let hits: Vec<&[u8]> = kv.iter_prefix(b"tx/").map(|(k, _)| k).collect();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0], b"tx/1");
    }

    #[test]
    fn test_batch_commit_is_all_or_nothing_on_torn_tail() {
        let dir = TempDir::new().unwrap();
        let path = wallet_path(&dir);

        {
            let mut kv = FileKv::open(&path).unwrap();
            kv.put(b"keep".to_vec(), b"v".to_vec()).unwrap();
            let mut batch = Batch::new();
            batch.put(b"pair-a".to_vec(), b"1".to_vec());
            batch.put(b"pair-b".to_vec(), b"2".to_vec());
            kv.commit(batch).unwrap();
        }

        // Tear the final record: drop its last byte as a crash would.
        let mut data = fs::read(&path).unwrap();
        data.truncate(data.len() - 1);
        fs::write(&path, &data).unwrap();

        let kv = FileKv::open(&path).unwrap();
        assert_eq!(kv.get(b"keep"), Some(&b"v"[..]));
        // Neither half of the torn batch survives.
        assert_eq!(kv.get(b"pair-a"), None);
        assert_eq!(kv.get(b"pair-b"), None);
    }

    #[test]
    fn test_mid_file_damage_refuses_open_and_preserves_file() {
        let dir = TempDir::new().unwrap();
        let path = wallet_path(&dir);

        let (first_end, second_end);
        {
            let mut kv = FileKv::open(&path).unwrap();
            kv.put(b"early".to_vec(), b"1".to_vec()).unwrap();
            first_end = fs::metadata(&path).unwrap().len();
            kv.put(b"doomed".to_vec(), b"2".to_vec()).unwrap();
            second_end = fs::metadata(&path).unwrap().len();
            kv.put(b"late".to_vec(), b"3".to_vec()).unwrap();
        }
        let full_len = fs::metadata(&path).unwrap().len();

        // Bit rot in the middle record, with a valid record after it.
        let mut data = fs::read(&path).unwrap();
        for b in &mut data[first_end as usize..second_end as usize] {
            *b ^= 0xa5;
        }
        fs::write(&path, &data).unwrap();

        match FileKv::open(&path) {
            Err(KvError::Corrupt { offset, .. }) => assert_eq!(offset, first_end),
            other => panic!("expected Corrupt, got {:?}", other.map(|_| ())),
        }

        // The file must not shrink; the trailing record stays salvageable.
        assert_eq!(fs::metadata(&path).unwrap().len(), full_len);
        let outcome = crate::kv::salvage(&path).unwrap();
        let keys: Vec<&[u8]> = outcome.pairs.iter().map(|(k, _)| k.as_slice()).collect();
        assert!(keys.contains(&&b"early"[..]));
        assert!(keys.contains(&&b"late"[..]));
    }

    #[test]
    fn test_exclusive_open() {
        let dir = TempDir::new().unwrap();
        let path = wallet_path(&dir);

        let first = FileKv::open(&path).unwrap();
        match FileKv::open(&path) {
            Err(KvError::Locked(p)) => assert_eq!(p, path),
            other => panic!("expected Locked, got {:?}", other.map(|_| ())),
        }
        drop(first);

        // Lock released on drop.
        FileKv::open(&path).unwrap();
    }

    #[test]
    fn test_bad_magic_rejected() {
        let dir = TempDir::new().unwrap();
        let path = wallet_path(&dir);
        fs::write(&path, b"not a wallet file at all").unwrap();

        match FileKv::open(&path) {
            Err(KvError::BadMagic(_)) => {}
            other => panic!("expected BadMagic, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_compact_preserves_live_view() {
        let dir = TempDir::new().unwrap();
        let path = wallet_path(&dir);

        {
            let mut kv = FileKv::open(&path).unwrap();
            for i in 0..100u32 {
                kv.put(b"churn".to_vec(), i.to_le_bytes().to_vec()).unwrap();
            }
            kv.put(b"stable".to_vec(), b"x".to_vec()).unwrap();
            assert!(kv.needs_rewrite());

            let before = fs::metadata(&path).unwrap().len();
            kv.compact().unwrap();
            assert!(!kv.needs_rewrite());
            assert!(fs::metadata(&path).unwrap().len() < before);
        }

        let kv = FileKv::open(&path).unwrap();
        assert_eq!(kv.get(b"churn"), Some(&99u32.to_le_bytes()[..]));
        assert_eq!(kv.get(b"stable"), Some(&b"x"[..]));
    }
}
