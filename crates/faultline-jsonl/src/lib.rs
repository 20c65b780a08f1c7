//! Async JSON Lines I/O for faultline.
//!
//! Node snapshots are rewritten atomically, while the failure ledger only ever
//! grows, so this crate offers both styles of write alongside a resilient
//! reader that turns malformed lines into [`Warning`]s instead of errors.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod atomic;
pub mod error;
pub mod reader;
pub mod warning;
pub mod writer;

pub use atomic::{append_jsonl, write_jsonl_atomic_iter};
pub use error::{Error, Result};
pub use reader::{read_jsonl_resilient, JsonlReader, Line};
pub use warning::{SkipReason, Warning};
pub use writer::JsonlWriter;
