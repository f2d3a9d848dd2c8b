//! Engine Module
//!
//! The storage engine that ties the data file and the index together.
//!
//! ## Responsibilities
//! - Open the data directory and rebuild the index by replay
//! - Append PUT/DEL records and keep the index pointing at the latest one
//! - Serve reads through the index with positioned reads
//! - Merge: rewrite only live records into a fresh file and swap it in

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::config::{Config, SyncStrategy};
use crate::error::{CaskError, Result};
use crate::index::Index;
use crate::log::{Entry, LogFile};

/// Name of the data file inside the store directory
pub const DATA_FILE_NAME: &str = "minicask.data";

/// Name of the temporary file a merge writes before renaming it into place
pub const MERGE_FILE_NAME: &str = "minicask.data.merge";

/// Counters describing one merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Records read from the old log
    pub entries_scanned: u64,

    /// Records copied into the new log
    pub live_entries: u64,

    /// Log size before the merge
    pub bytes_before: u64,

    /// Log size after the merge
    pub bytes_after: u64,
}

impl MergeStats {
    /// Bytes reclaimed by the merge
    pub fn bytes_reclaimed(&self) -> u64 {
        self.bytes_before - self.bytes_after
    }
}

/// State guarded as one unit so offsets and file contents never disagree
struct StoreState {
    index: Index,
    /// `None` once the store has been closed (or a failed merge could not
    /// reopen the data file)
    log: Option<LogFile>,
}

impl StoreState {
    fn log(&self) -> Result<&LogFile> {
        self.log.as_ref().ok_or_else(closed)
    }
}

fn closed() -> CaskError {
    CaskError::InvalidState("store is closed".to_string())
}

/// A Bitcask-style store over one append-only data file
///
/// ## Concurrency Model: one RwLock around (index, log)
///
/// - **Writes** (put/delete/merge/close): exclusive lock
///   - merge holds it for the whole scan → rewrite → swap, so no write
///     can land in the old file after its liveness was decided
/// - **Reads** (get): shared lock
///   - each read is an independent positioned read on the shared handle
///
/// `Store` is `Send + Sync`; share it between threads with `Arc`.
pub struct Store {
    /// Store configuration
    config: Config,

    /// Canonical directory holding the data file
    data_dir: PathBuf,

    state: RwLock<StoreState>,
}

impl Store {
    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Create the data directory if missing
    /// 2. Remove a merge file left behind by an interrupted merge
    /// 3. Open/create the data file
    /// 4. Rebuild the index by replaying the whole file
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let invalid_dir = |source: io::Error| CaskError::InvalidDirectory {
            path: config.data_dir.clone(),
            source,
        };

        fs::create_dir_all(&config.data_dir).map_err(invalid_dir)?;
        let data_dir = fs::canonicalize(&config.data_dir).map_err(invalid_dir)?;

        // The data file is the source of truth until a rename succeeds
        let merge_path = data_dir.join(MERGE_FILE_NAME);
        if merge_path.exists() {
            tracing::warn!(
                "Removing leftover merge file {} from an interrupted merge",
                merge_path.display()
            );
            fs::remove_file(&merge_path)?;
        }

        let log = LogFile::open_or_create(&data_dir.join(DATA_FILE_NAME), config.sync_strategy)?;
        let (index, stats) = Index::rebuild_with_stats(&log)?;

        tracing::info!(
            "Opened store at {}: {} records replayed ({} puts, {} deletes), {} live keys, {} bytes",
            data_dir.display(),
            stats.entries_replayed,
            stats.puts,
            stats.deletes,
            stats.live_keys,
            stats.bytes_scanned
        );

        Ok(Self {
            config,
            data_dir,
            state: RwLock::new(StoreState {
                index,
                log: Some(log),
            }),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let config = Config::builder().data_dir(path.as_ref()).build();
        Self::open(config)
    }

    /// Store `value` under `key`
    ///
    /// The record is on disk before the index points at it.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(CaskError::EmptyKey);
        }

        let mut state = self.state.write();
        let StoreState { index, log } = &mut *state;
        let log = log.as_mut().ok_or_else(closed)?;

        let offset = log.append(&Entry::put(key, value))?;
        index.set(key.to_vec(), offset);

        Ok(())
    }

    /// Get a value by key
    ///
    /// Returns:
    /// - `Ok(Some(value))` — key found
    /// - `Ok(None)` — key not found (never written, or deleted)
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if key.is_empty() {
            return Err(CaskError::EmptyKey);
        }

        let state = self.state.read();
        let log = state.log()?;

        let offset = match state.index.get(key) {
            Some(offset) => offset,
            None => return Ok(None),
        };

        match log.read_at(offset)? {
            Some(entry) if entry.key != key => Err(CaskError::corruption(
                offset,
                "indexed record belongs to a different key",
            )),
            Some(entry) if entry.is_tombstone() => Err(CaskError::corruption(
                offset,
                "index points at a tombstone",
            )),
            Some(entry) => Ok(Some(entry.value)),
            None => Err(CaskError::corruption(
                offset,
                "index points past the end of the log",
            )),
        }
    }

    /// Like [`Store::get`], but a missing key is `Err(KeyNotFound)`
    pub fn get_required(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.get(key)?.ok_or(CaskError::KeyNotFound)
    }

    /// Delete a key
    ///
    /// Appends a tombstone, then drops the key from the index. Deleting a
    /// key that is not present (including the empty key) does nothing.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        let mut state = self.state.write();
        let StoreState { index, log } = &mut *state;
        let log = log.as_mut().ok_or_else(closed)?;

        if !index.contains(key) {
            return Ok(());
        }

        log.append(&Entry::delete(key))?;
        index.remove(key);

        Ok(())
    }

    /// Compact the data file down to the latest record of every live key
    ///
    /// Steps (all under the exclusive lock):
    /// 1. Skip if the log is empty
    /// 2. Scan the log; a record is live iff the index points at its offset
    /// 3. Append live records, in scan order, to a temporary file
    /// 4. Sync it, close both files, rename the temporary file over the
    ///    data file
    /// 5. Reopen the data file and repoint the index at the new offsets
    ///
    /// Until the rename succeeds the old file and index stay authoritative;
    /// on failure the temporary file is removed best-effort.
    pub fn merge(&self) -> Result<MergeStats> {
        let mut state = self.state.write();
        let log = state.log()?;

        if log.is_empty() {
            return Ok(MergeStats::default());
        }

        let mut stats = MergeStats {
            bytes_before: log.write_offset(),
            ..MergeStats::default()
        };

        let data_path = log.path().to_path_buf();
        let merge_path = self.data_dir.join(MERGE_FILE_NAME);

        let guard = MergeFileGuard::new(merge_path.clone());
        let mut merged = LogFile::create(&merge_path, SyncStrategy::OnClose)?;

        // (key, new offset) for every record copied
        let mut relocated: Vec<(Vec<u8>, u64)> = Vec::with_capacity(state.index.len());

        for item in log.iter()? {
            let (offset, entry) = item?;
            stats.entries_scanned += 1;

            if !state.index.is_live(&entry.key, offset) {
                continue;
            }

            let new_offset = merged.append(&entry)?;
            relocated.push((entry.key, new_offset));
        }

        stats.live_entries = relocated.len() as u64;
        stats.bytes_after = merged.write_offset();
        merged.close()?;

        // Old handle must be released before the rename on some platforms
        state.log()?.sync()?;
        state.log = None;

        if let Err(e) = fs::rename(&merge_path, &data_path) {
            match LogFile::open_or_create(&data_path, self.config.sync_strategy) {
                Ok(log) => state.log = Some(log),
                Err(reopen) => tracing::error!(
                    "Failed to reopen {} after aborted merge: {}",
                    data_path.display(),
                    reopen
                ),
            }
            return Err(e.into());
        }
        guard.disarm();

        for (key, offset) in relocated {
            state.index.set(key, offset);
        }
        if state.index.len() as u64 != stats.live_entries {
            tracing::warn!(
                "Index holds {} keys but merge copied {} live records",
                state.index.len(),
                stats.live_entries
            );
        }

        state.log = Some(LogFile::open_or_create(&data_path, self.config.sync_strategy)?);

        tracing::info!(
            "Merged {}: {} of {} records live, {} -> {} bytes",
            data_path.display(),
            stats.live_entries,
            stats.entries_scanned,
            stats.bytes_before,
            stats.bytes_after
        );

        Ok(stats)
    }

    /// Force appended records to disk
    pub fn sync(&self) -> Result<()> {
        self.state.read().log()?.sync()
    }

    /// Close the store
    ///
    /// Syncs and releases the data file. Every later call, including a
    /// second `close`, fails with `InvalidState`.
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.write();
        let log = state
            .log
            .take()
            .ok_or_else(|| CaskError::InvalidState("store is already closed".to_string()))?;

        state.index.clear();
        log.close()?;

        tracing::debug!("Closed store at {}", self.data_dir.display());
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get the path of the data file
    pub fn data_file_path(&self) -> PathBuf {
        self.data_dir.join(DATA_FILE_NAME)
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.state.read().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().index.is_empty()
    }

    /// Size of the data file in bytes
    pub fn log_size(&self) -> Result<u64> {
        Ok(self.state.read().log()?.write_offset())
    }

    /// All live keys, sorted
    pub fn keys(&self) -> Result<Vec<Vec<u8>>> {
        let state = self.state.read();
        state.log()?;

        let mut keys: Vec<Vec<u8>> = state.index.keys().map(|k| k.to_vec()).collect();
        keys.sort();
        Ok(keys)
    }

    pub fn is_closed(&self) -> bool {
        self.state.read().log.is_none()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Removes the temporary merge file on drop unless disarmed
struct MergeFileGuard {
    path: PathBuf,
    armed: bool,
}

impl MergeFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for MergeFileGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "Failed to remove merge file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
