//! Batch index files.
//!
//! An index is a JSON-lines file with one [`Batch`] object per line, in the
//! order the batches should be consumed. It is written one batch at a time
//! to a temporary file and moved into place on commit.

use crate::batch::Batch;
use crate::builder::BatchSink;
use nmtprep_core::{AtomicFile, LineReader, PrepError, Result};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Incremental index writer. Nothing appears at the destination unless
/// [`IndexWriter::commit`] is called.
pub struct IndexWriter {
    file: AtomicFile,
    batches: u64,
}

impl IndexWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            file: AtomicFile::create(path)?,
            batches: 0,
        })
    }

    /// Append one batch.
    pub fn write_batch(&mut self, batch: &Batch) -> Result<()> {
        serde_json::to_writer(&mut self.file, batch)?;
        self.file
            .write_all(b"\n")
            .map_err(|e| PrepError::io(self.file.path(), e))?;
        self.batches += 1;
        Ok(())
    }

    /// Batches written so far.
    pub fn batches(&self) -> u64 {
        self.batches
    }

    /// Move the index into place; returns the number of batches.
    pub fn commit(self) -> Result<u64> {
        let path = self.file.path().to_path_buf();
        self.file.commit()?;
        info!("wrote {} batches to {}", self.batches, path.display());
        Ok(self.batches)
    }
}

impl BatchSink for IndexWriter {
    fn push_batch(&mut self, batch: Batch) -> Result<()> {
        self.write_batch(&batch)
    }
}

/// Write batches to `path` as JSON lines.
pub fn write_index(path: impl AsRef<Path>, batches: &[Batch]) -> Result<()> {
    let mut writer = IndexWriter::create(path)?;
    for batch in batches {
        writer.write_batch(batch)?;
    }
    writer.commit()?;
    Ok(())
}

/// Streams batches back from an index file.
pub struct IndexReader {
    lines: LineReader<BufReader<File>>,
    path: PathBuf,
}

impl IndexReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Ok(Self {
            lines: LineReader::open(path)?,
            path: path.to_path_buf(),
        })
    }
}

impl Iterator for IndexReader {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => return Some(Err(err)),
            };
            if line.bytes.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Some(serde_json::from_slice(&line.bytes).map_err(|e| {
                PrepError::Load(format!(
                    "{} line {}: {}",
                    self.path.display(),
                    line.index + 1,
                    e
                ))
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::Example;

    #[test]
    fn test_index_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("train.index");
        let a = Example {
            index: 3,
            src: vec![2, 9, 3],
            tgt: vec![2, 3],
        };
        let b = Example {
            index: 0,
            src: vec![2, 3],
            tgt: vec![2, 8, 8, 3],
        };
        let batches = vec![
            Batch::from_examples(&[&a, &b], 0, 0),
            Batch::from_examples(&[&b], 0, 0),
        ];
        write_index(&path, &batches).unwrap();

        let read: Vec<Batch> = IndexReader::open(&path)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(read, batches);
    }

    #[test]
    fn test_writer_appends_and_commits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.index");
        let example = Example {
            index: 0,
            src: vec![2, 3],
            tgt: vec![2, 3],
        };
        let batch = Batch::from_examples(&[&example], 0, 0);

        let mut writer = IndexWriter::create(&path).unwrap();
        for _ in 0..3 {
            writer.write_batch(&batch).unwrap();
        }
        assert_eq!(writer.batches(), 3);
        assert!(!path.exists());
        assert_eq!(writer.commit().unwrap(), 3);

        let read = IndexReader::open(&path).unwrap().count();
        assert_eq!(read, 3);
    }

    #[test]
    fn test_dropped_writer_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.index");
        let mut writer = IndexWriter::create(&path).unwrap();
        writer
            .push_batch(Batch::from_examples(&[], 0, 0))
            .unwrap();
        drop(writer);
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_corrupt_line_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.index");
        std::fs::write(&path, "{\"indices\":[0]\n").unwrap();
        let first = IndexReader::open(&path).unwrap().next().unwrap();
        match first {
            Err(PrepError::Load(msg)) => assert!(msg.contains("line 1")),
            other => panic!("expected load error, got {:?}", other),
        }
    }
}
