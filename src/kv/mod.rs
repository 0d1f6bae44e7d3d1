//! Embedded ordered key-value engine for the wallet file.
//!
//! The wallet persistence layer treats this engine as a collaborator with
//! a narrow contract: ordered byte keys, atomic multi-op batches, fsync on
//! commit, exclusive file open, and a salvage primitive for damaged files.
//! Record schema, versioning, and corruption classification all live a
//! layer up (`records`, `load`, `recovery`).

mod entry;
mod errors;
mod file;
mod salvage;

pub use entry::{Op, FILE_FORMAT_VERSION, FILE_MAGIC};
pub use errors::{KvError, KvResult};
pub use file::{Batch, FileKv, FileLock};
pub use salvage::{salvage, SalvageOutcome};
