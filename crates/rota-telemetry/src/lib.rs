//! File plumbing for the rota engine: usage records, JSONL logs and atomic snapshots

mod io;
mod paths;
mod types;

pub use io::{append_jsonl, atomic_write, read_json, read_jsonl, write_json_atomic, FileLock};
pub use paths::{Paths, HOME_ENV};
pub use types::{UsageRecord, UsageStats};
