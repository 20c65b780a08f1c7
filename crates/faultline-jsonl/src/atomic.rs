//! File-level JSONL writes.
//!
//! Two styles are supported:
//!
//! - [`write_jsonl_atomic_iter`] replaces a file by writing a sibling `.tmp` file
//!   and renaming it over the target. A crash leaves the old file intact.
//! - [`append_jsonl`] appends records to the end of a file, creating it if
//!   needed. Existing lines are never rewritten.

use crate::{JsonlWriter, Result};
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};

/// Atomically replaces `path` with the records produced by an iterator.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be written or the rename
/// fails. On failure the previous contents are left unchanged.
pub async fn write_jsonl_atomic_iter<T, I, P>(path: P, values: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let temp_path = make_temp_path(path);

    if let Err(e) = write_to_file(File::create(&temp_path).await?, values).await {
        // Best effort: the target is untouched either way.
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    tokio::fs::rename(&temp_path, path).await?;
    tracing::trace!(path = %path.display(), "rewrote JSONL file");
    Ok(())
}

/// Appends records to the end of `path`, creating the file if missing.
///
/// Returns the number of records written.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or a record fails to
/// serialize. Records written before the failure stay in the file.
pub async fn append_jsonl<T, I, P>(path: P, values: I) -> Result<usize>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;

    let written = write_to_file(file, values).await?;
    tracing::trace!(path = %path.display(), records = written, "appended to JSONL file");
    Ok(written)
}

fn make_temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

async fn write_to_file<T, I>(file: File, values: I) -> Result<usize>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut writer = JsonlWriter::new(file);
    writer.write_all(values).await?;
    writer.flush().await?;
    Ok(writer.lines_written())
}
