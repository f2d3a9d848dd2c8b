//! Log File
//!
//! Append-only data file with positioned reads.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::config::SyncStrategy;
use crate::error::{CaskError, Result};

use super::{Entry, LogIterator};

/// The single append-only data file
///
/// ## Concurrency:
/// - `append` needs `&mut self`; the store serializes writers
/// - `read_at` takes `&self` and uses positioned reads, so any number of
///   readers can share one handle without touching a file cursor
pub struct LogFile {
    path: PathBuf,
    /// Opened for read + append
    file: File,
    /// End of the last complete record == file length
    write_offset: u64,
    sync_strategy: SyncStrategy,
}

impl LogFile {
    /// Open the log at `path`, creating an empty one if absent
    ///
    /// Appends resume after the last byte already in the file.
    pub fn open_or_create(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let write_offset = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            write_offset,
            sync_strategy,
        })
    }

    /// Create an empty log at `path`, discarding anything already there
    pub fn create(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Self::open_or_create(path, sync_strategy)
    }

    /// Append a record and return the offset it starts at
    pub fn append(&mut self, entry: &Entry) -> Result<u64> {
        let bytes = entry.encode()?;
        let offset = self.write_offset;

        if let Err(e) = self.file.write_all(&bytes) {
            self.rollback(offset);
            return Err(e.into());
        }

        if self.sync_strategy == SyncStrategy::EveryWrite {
            if let Err(e) = self.file.sync_data() {
                self.rollback(offset);
                return Err(e.into());
            }
        }

        self.write_offset += bytes.len() as u64;
        tracing::trace!("Appended {} byte record at offset {}", bytes.len(), offset);

        Ok(offset)
    }

    /// Cut the log back to `offset`, dropping every byte after it
    ///
    /// `offset` must be a record boundary at or before the write offset.
    pub fn truncate(&mut self, offset: u64) -> Result<()> {
        if offset > self.write_offset {
            return Err(CaskError::InvalidState(format!(
                "cannot truncate to {} past the end of the log at {}",
                offset, self.write_offset
            )));
        }

        self.file.set_len(offset)?;
        self.write_offset = offset;
        Ok(())
    }

    /// Undo a failed append that started at `offset`
    ///
    /// Afterwards `write_offset` equals the file length, even if the
    /// truncate itself fails and the record stays in the log.
    fn rollback(&mut self, offset: u64) {
        let Err(e) = self.truncate(offset) else {
            return;
        };

        tracing::warn!(
            "Failed to roll back record at offset {} in {}: {}",
            offset,
            self.path.display(),
            e
        );
        if let Ok(meta) = self.file.metadata() {
            self.write_offset = meta.len();
        }
    }

    /// Read the record starting at `offset`
    ///
    /// Returns:
    /// - `Ok(Some(entry))` — a complete record
    /// - `Ok(None)` — `offset` is at or past the end of the log
    /// - `Err(Corruption)` — the bytes there do not form a complete record
    pub fn read_at(&self, offset: u64) -> Result<Option<Entry>> {
        if offset >= self.write_offset {
            return Ok(None);
        }

        let mut reader = PositionedReader {
            file: &self.file,
            pos: offset,
        };
        Entry::read_from(&mut reader, offset, self.write_offset - offset)
    }

    /// Scan every record from offset 0 up to the current end of the log
    pub fn iter(&self) -> Result<LogIterator> {
        let file = File::open(&self.path)?;
        Ok(LogIterator::new(file, self.write_offset))
    }

    /// Force appended records to disk
    pub fn sync(&self) -> Result<()> {
        self.file.sync_data()?;
        Ok(())
    }

    /// Sync and release the file handle
    pub fn close(self) -> Result<()> {
        self.file.sync_all()?;
        tracing::debug!("Closed log file {}", self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Offset the next record will be written at
    pub fn write_offset(&self) -> u64 {
        self.write_offset
    }

    pub fn is_empty(&self) -> bool {
        self.write_offset == 0
    }
}

/// `Read` over a shared file handle without moving its cursor
struct PositionedReader<'a> {
    file: &'a File,
    pos: u64,
}

impl Read for PositionedReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = read_at(self.file, buf, self.pos)?;
        self.pos += n as u64;
        Ok(n)
    }
}

#[cfg(unix)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

#[cfg(windows)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}
