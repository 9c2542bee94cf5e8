//! Line-oriented corpus input.
//!
//! Corpora are read one line at a time as raw bytes, each line tagged with
//! its zero-based index. Lines are never decoded lossily here: callers decide
//! whether a malformed line is passed through untouched, skipped, or
//! replaced, and record the event in an [`EncodingWarnings`] counter.

use crate::error::{PrepError, Result};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// How many malformed lines are reported individually before going quiet.
const WARN_LIMIT: u64 = 10;

/// One input line without its terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    /// Zero-based line number in the source
    pub index: u64,
    /// Line content
    pub bytes: Vec<u8>,
}

impl RawLine {
    /// The line as UTF-8, if it is valid.
    pub fn text(&self) -> std::result::Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.bytes)
    }

    /// The line with invalid sequences replaced by U+FFFD.
    pub fn text_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

/// Iterator over the lines of a reader.
pub struct LineReader<R> {
    reader: R,
    path: PathBuf,
    next_index: u64,
}

impl<R: BufRead> LineReader<R> {
    /// Wrap a reader; `path` is only used in error messages.
    pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: path.into(),
            next_index: 0,
        }
    }

    /// Group lines into consecutive chunks of at most `size` lines.
    pub fn chunks(self, size: usize) -> LineChunks<R> {
        LineChunks {
            lines: self,
            size: size.max(1),
        }
    }
}

impl LineReader<BufReader<File>> {
    /// Open a file for line reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| PrepError::io(path, e))?;
        Ok(Self::new(BufReader::new(file), path))
    }
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = Result<RawLine>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut bytes = Vec::new();
        match self.reader.read_until(b'\n', &mut bytes) {
            Ok(0) => None,
            Ok(_) => {
                if bytes.last() == Some(&b'\n') {
                    bytes.pop();
                    if bytes.last() == Some(&b'\r') {
                        bytes.pop();
                    }
                }
                let index = self.next_index;
                self.next_index += 1;
                Some(Ok(RawLine { index, bytes }))
            }
            Err(err) => Some(Err(PrepError::io(&self.path, err))),
        }
    }
}

/// Consecutive, explicitly indexed shards of lines.
pub struct LineChunks<R> {
    lines: LineReader<R>,
    size: usize,
}

impl<R: BufRead> Iterator for LineChunks<R> {
    type Item = Result<Vec<RawLine>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut chunk = Vec::with_capacity(self.size);
        while chunk.len() < self.size {
            match self.lines.next() {
                Some(Ok(line)) => chunk.push(line),
                Some(Err(err)) => return Some(Err(err)),
                None => break,
            }
        }
        if chunk.is_empty() {
            None
        } else {
            Some(Ok(chunk))
        }
    }
}

/// Thread-safe counter of malformed input lines.
#[derive(Debug, Default)]
pub struct EncodingWarnings {
    count: AtomicU64,
}

impl EncodingWarnings {
    /// Create a zeroed counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a malformed line; the first few are logged individually.
    pub fn record(&self, line: u64, context: &str) {
        let seen = self.count.fetch_add(1, Ordering::Relaxed);
        if seen < WARN_LIMIT {
            warn!(line = line + 1, "{}: {}", context, PrepError::Encoding { line: line + 1 });
        }
    }

    /// Number of malformed lines recorded so far.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Log the end-of-run summary if anything was recorded.
    pub fn report(&self, context: &str) {
        let count = self.count();
        if count > 0 {
            warn!("{}: {} malformed line(s) passed through", context, count);
        }
    }
}
