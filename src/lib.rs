//! # minicask
//!
//! A single-file, log-structured key-value store following the Bitcask design:
//! - Every write is appended to one data file
//! - An in-memory index maps each key to the offset of its latest record
//! - Deletes are tombstone records, never in-place edits
//! - The index is rebuilt by replaying the file on open
//! - Merge rewrites only live records into a fresh file and swaps it in
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Store                               │
//! │        put / get / delete / merge / close                   │
//! │          (one RwLock around index + log)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │    Index    │          │   LogFile   │
//!   │ key→offset  │◄─replay──│  (Append)   │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │    Entry    │
//!                           │   (Codec)   │
//!                           └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use minicask::Store;
//!
//! # fn main() -> minicask::Result<()> {
//! let store = Store::open_path("/tmp/minicask")?;
//! store.put(b"key", b"value")?;
//! assert_eq!(store.get(b"key")?, Some(b"value".to_vec()));
//! store.delete(b"key")?;
//! store.merge()?;
//! store.close()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod log;
pub mod index;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CaskError, Result};
pub use config::{Config, SyncStrategy};
pub use engine::{MergeStats, Store};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of minicask
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
