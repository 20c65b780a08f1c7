//! JSONL reading operations.
//!
//! [`JsonlReader`] turns an async byte source into a stream of [`Line`]s:
//! each non-blank line is either a parsed record or a [`Warning`] saying why
//! it was skipped. Only I/O failures end the stream early.

use crate::{Result, SkipReason, Warning};
use futures::stream::{self, Stream, TryStreamExt};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::pin::pin;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// One non-blank line of input.
#[derive(Debug, Clone, PartialEq)]
pub enum Line<T> {
    /// The line parsed as a record.
    Record(T),

    /// The line was dropped.
    Skipped(Warning),
}

/// Async reader for JSONL (JSON Lines) data.
///
/// # Examples
///
/// ```no_run
/// use faultline_jsonl::{JsonlReader, Line};
/// use futures::TryStreamExt;
/// use tokio::fs::File;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let file = File::open("events.jsonl").await?;
/// let mut lines = std::pin::pin!(JsonlReader::new(file).into_stream::<serde_json::Value>());
/// while let Some(line) = lines.try_next().await? {
///     match line {
///         Line::Record(value) => println!("{value}"),
///         Line::Skipped(warning) => eprintln!("{warning}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct JsonlReader<R> {
    reader: BufReader<R>,
    /// 1-based number of the last line read, 0 before any read.
    line_number: usize,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> JsonlReader<R> {
    /// Creates a new `JsonlReader` wrapping the given async reader.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            buf: Vec::new(),
        }
    }

    /// Returns the 1-based number of the last line read.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Reads up to the next non-blank line. `Ok(None)` at end of input.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] when the underlying reader fails.
    pub async fn next_line<T: DeserializeOwned>(&mut self) -> Result<Option<Line<T>>> {
        loop {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf).await? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let Ok(text) = std::str::from_utf8(&self.buf) else {
                return Ok(Some(Line::Skipped(Warning::new(
                    self.line_number,
                    SkipReason::NotUtf8,
                ))));
            };
            let text = text.trim();
            if text.is_empty() {
                continue;
            }

            return Ok(Some(match serde_json::from_str(text) {
                Ok(value) => Line::Record(value),
                Err(e) => {
                    tracing::debug!(line = self.line_number, error = %e, "skipping malformed JSONL line");
                    Line::Skipped(Warning::new(
                        self.line_number,
                        SkipReason::MalformedJson(e.to_string()),
                    ))
                }
            }));
        }
    }

    /// Converts the reader into a stream of lines.
    ///
    /// The stream ends at end of input, or after yielding an I/O error.
    pub fn into_stream<T: DeserializeOwned>(self) -> impl Stream<Item = Result<Line<T>>> {
        stream::unfold(Some(self), |state| async move {
            let mut reader = state?;
            match reader.next_line::<T>().await {
                Ok(Some(line)) => Some((Ok(line), Some(reader))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}

/// Reads a whole JSONL file, collecting skipped lines as warnings.
///
/// # Errors
///
/// Returns [`crate::Error::Io`] if the file cannot be opened or read.
pub async fn read_jsonl_resilient<T, P>(path: P) -> Result<(Vec<T>, Vec<Warning>)>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref()).await?;
    let mut lines = pin!(JsonlReader::new(file).into_stream::<T>());
    let mut values = Vec::new();
    let mut warnings = Vec::new();

    while let Some(line) = lines.try_next().await? {
        match line {
            Line::Record(value) => values.push(value),
            Line::Skipped(warning) => warnings.push(warning),
        }
    }

    Ok((values, warnings))
}
