//! Log entry definitions
//!
//! Defines a single record of the data file and its binary codec.

use std::io::{self, Read};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{CaskError, Result};

/// Header size: KeySize (4) + ValueSize (4) + Mark (1) = 9 bytes
pub const HEADER_SIZE: usize = 9;

/// Whether a record stores a value or deletes one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Mark {
    Put = 0,
    Del = 1,
}

impl TryFrom<u8> for Mark {
    type Error = u8;

    fn try_from(byte: u8) -> std::result::Result<Self, Self::Error> {
        match byte {
            0 => Ok(Mark::Put),
            1 => Ok(Mark::Del),
            other => Err(other),
        }
    }
}

/// A single record in the data file
///
/// Records are never edited once written. Updates and deletes are new
/// records appended after the old one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub mark: Mark,
}

impl Entry {
    /// A record storing `value` under `key`
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            mark: Mark::Put,
        }
    }

    /// A tombstone for `key` (empty value)
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: Vec::new(),
            mark: Mark::Del,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        self.mark == Mark::Del
    }

    /// Bytes this record occupies on disk
    pub fn encoded_size(&self) -> u64 {
        (HEADER_SIZE + self.key.len() + self.value.len()) as u64
    }

    /// Encode to the on-disk layout
    ///
    /// Fails only if the key or value does not fit a u32 length field.
    pub fn encode(&self) -> Result<Bytes> {
        let header = EntryHeader::new(self.key.len(), self.value.len(), self.mark)?;

        let mut buf = BytesMut::with_capacity(self.encoded_size() as usize);
        buf.put_u32(header.key_size);
        buf.put_u32(header.value_size);
        buf.put_u8(header.mark as u8);
        buf.put_slice(&self.key);
        buf.put_slice(&self.value);

        Ok(buf.freeze())
    }

    /// Decode the record at the front of `bytes`
    ///
    /// `offset` is only used to label errors. Returns:
    /// - `Ok(Some((entry, size)))` — a complete record of `size` bytes
    /// - `Ok(None)` — `bytes` is empty (clean end of log)
    /// - `Err(Corruption)` — a partial header or payload
    pub fn decode(bytes: &[u8], offset: u64) -> Result<Option<(Entry, u64)>> {
        let mut reader = bytes;
        let entry = Self::read_from(&mut reader, offset, bytes.len() as u64)?;
        Ok(entry.map(|e| {
            let size = e.encoded_size();
            (e, size)
        }))
    }

    /// Read one record from `reader`, which holds `available` more bytes
    /// belonging to the log
    pub(crate) fn read_from<R: Read>(
        reader: &mut R,
        offset: u64,
        available: u64,
    ) -> Result<Option<Entry>> {
        if available == 0 {
            return Ok(None);
        }

        if available < HEADER_SIZE as u64 {
            return Err(CaskError::corruption(
                offset,
                format!(
                    "truncated header: expected {} bytes, got {}",
                    HEADER_SIZE, available
                ),
            ));
        }

        let mut raw = [0u8; HEADER_SIZE];
        read_exact_or_corrupt(reader, &mut raw, offset)?;
        let header = EntryHeader::decode(&raw, offset)?;

        if available < header.encoded_size() {
            return Err(CaskError::corruption(
                offset,
                format!(
                    "truncated payload: record needs {} bytes, {} available",
                    header.encoded_size(),
                    available
                ),
            ));
        }

        let mut payload = vec![0u8; header.payload_len()];
        read_exact_or_corrupt(reader, &mut payload, offset)?;

        Ok(Some(header.into_entry(payload)))
    }
}

/// The fixed-size prefix of every record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryHeader {
    pub key_size: u32,
    pub value_size: u32,
    pub mark: Mark,
}

impl EntryHeader {
    /// Header for a record with the given key and value lengths
    ///
    /// Fails if either length does not fit a u32 field.
    pub fn new(key_len: usize, value_len: usize, mark: Mark) -> Result<Self> {
        Ok(Self {
            key_size: length_field("key", key_len)?,
            value_size: length_field("value", value_len)?,
            mark,
        })
    }

    /// Parse a header, rejecting unknown mark bytes
    pub fn decode(raw: &[u8; HEADER_SIZE], offset: u64) -> Result<Self> {
        let mut buf = &raw[..];
        let key_size = buf.get_u32();
        let value_size = buf.get_u32();
        let mark = Mark::try_from(buf.get_u8()).map_err(|byte| {
            CaskError::corruption(offset, format!("unknown mark byte 0x{:02x}", byte))
        })?;

        Ok(Self {
            key_size,
            value_size,
            mark,
        })
    }

    /// Key + value bytes following the header
    pub fn payload_len(&self) -> usize {
        self.key_size as usize + self.value_size as usize
    }

    pub fn encoded_size(&self) -> u64 {
        HEADER_SIZE as u64 + self.key_size as u64 + self.value_size as u64
    }

    fn into_entry(self, mut payload: Vec<u8>) -> Entry {
        let value = payload.split_off(self.key_size as usize);
        Entry {
            key: payload,
            value,
            mark: self.mark,
        }
    }
}

fn length_field(field: &'static str, len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| CaskError::RecordTooLarge { field, len })
}

fn read_exact_or_corrupt<R: Read>(reader: &mut R, buf: &mut [u8], offset: u64) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => {
            CaskError::corruption(offset, "unexpected end of file inside record")
        }
        _ => CaskError::Io(e),
    })
}

