//! Log Module
//!
//! The single append-only data file and the record format it holds.
//!
//! ## Responsibilities
//! - Encode/decode individual records
//! - Append records at the end of the file and report their offsets
//! - Positioned reads of one record at a known offset
//! - Sequential scans for replay and merge
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Entry 1                                                  │
//! │ ┌──────────────┬────────────────┬──────────┬─────┬─────┐ │
//! │ │ KeySize (4)  │ ValueSize (4)  │ Mark (1) │ Key │ Val │ │
//! │ └──────────────┴────────────────┴──────────┴─────┴─────┘ │
//! ├──────────────────────────────────────────────────────────┤
//! │ Entry 2                                                  │
//! │   ... packed back-to-back, no gaps, no footer ...        │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Integers are big-endian. Mark is 0 for PUT and 1 for DEL (tombstone).

mod entry;
mod file;
mod iterator;

pub use entry::{Entry, EntryHeader, Mark, HEADER_SIZE};
pub use file::LogFile;
pub use iterator::LogIterator;
