//! Atomic artifact writes.
//!
//! Artifacts are written to a sibling temporary file and renamed over the
//! destination only after a successful flush, so an interrupted run never
//! leaves a truncated model, vocabulary or index file behind.

use crate::error::{PrepError, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// A file that only appears at its destination once committed.
pub struct AtomicFile {
    dest: PathBuf,
    tmp: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl AtomicFile {
    /// Start writing `dest`; parent directories are created as needed.
    pub fn create(dest: impl AsRef<Path>) -> Result<Self> {
        let dest = dest.as_ref().to_path_buf();
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| PrepError::io(parent, e))?;
        }

        let mut name = dest
            .file_name()
            .ok_or_else(|| PrepError::Save(format!("{} is not a file path", dest.display())))?
            .to_os_string();
        name.push(format!(".tmp.{}", std::process::id()));
        let tmp = dest.with_file_name(name);

        let file = File::create(&tmp).map_err(|e| PrepError::io(&tmp, e))?;
        Ok(Self {
            dest,
            tmp,
            writer: Some(BufWriter::new(file)),
        })
    }

    /// Destination path.
    pub fn path(&self) -> &Path {
        &self.dest
    }

    /// Flush, sync and move the file into place.
    pub fn commit(mut self) -> Result<()> {
        let result = self.finish();
        if result.is_err() {
            let _ = fs::remove_file(&self.tmp);
        }
        result
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            let file = writer
                .into_inner()
                .map_err(|e| PrepError::io(&self.tmp, e.into_error()))?;
            file.sync_all().map_err(|e| PrepError::io(&self.tmp, e))?;
        }
        fs::rename(&self.tmp, &self.dest).map_err(|e| PrepError::io(&self.dest, e))
    }

    fn writer(&mut self) -> std::io::Result<&mut BufWriter<File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| std::io::Error::other("atomic file already committed"))
    }
}

impl Write for AtomicFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer()?.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer()?.flush()
    }
}

impl Drop for AtomicFile {
    fn drop(&mut self) {
        // Uncommitted: discard the partial file.
        if self.writer.take().is_some() {
            let _ = fs::remove_file(&self.tmp);
        }
    }
}
