//! Log Iterator
//!
//! Sequential scan over every record in the data file.

use std::fs::File;
use std::io::BufReader;

use crate::error::Result;

use super::Entry;

/// Iterator over `(offset, entry)` pairs in write order
///
/// Stops at the end offset captured when it was created. The first error
/// ends the iteration.
pub struct LogIterator {
    reader: BufReader<File>,
    /// Offset of the next record
    offset: u64,
    /// Stop reading when we reach this offset
    end_offset: u64,
    done: bool,
}

impl LogIterator {
    pub(super) fn new(file: File, end_offset: u64) -> Self {
        Self {
            reader: BufReader::new(file),
            offset: 0,
            end_offset,
            done: false,
        }
    }
}

impl Iterator for LogIterator {
    type Item = Result<(u64, Entry)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.end_offset {
            return None;
        }

        let available = self.end_offset - self.offset;
        match Entry::read_from(&mut self.reader, self.offset, available) {
            Ok(Some(entry)) => {
                let offset = self.offset;
                self.offset += entry.encoded_size();
                Some(Ok((offset, entry)))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
