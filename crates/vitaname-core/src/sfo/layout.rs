//! Raw little-endian layout of an SFO record.
//!
//! This module implements the fixed binary layout needed to walk a record:
//! the 20-byte header and the 16-byte index table entries that immediately
//! follow it.
//!
//! ## Record layout
//!
//! | Offset      | Size | Field                         |
//! |-------------|------|-------------------------------|
//! | 0           | 4    | magic (`"\0PSF"`)             |
//! | 4           | 4    | format version                |
//! | 8           | 4    | key table offset              |
//! | 12          | 4    | data table offset             |
//! | 16          | 4    | entry count                   |
//! | 20 + 16·i   | 2    | key offset (entry i)          |
//! | 22 + 16·i   | 2    | value-format tag              |
//! | 24 + 16·i   | 4    | declared value length         |
//! | 28 + 16·i   | 4    | declared max value length     |
//! | 32 + 16·i   | 4    | value offset in the data table|
//!
//! All fields are little-endian. Offsets are relative to the start of the
//! same raw buffer that holds the header.

use crate::error::{Error, Result};

/// Record signature: bytes `"\0PSF"` read as a little-endian `u32`
pub const MAGIC: u32 = 0x4653_5000;

/// Size of the fixed record header in bytes
pub const HEADER_SIZE: usize = 20;

/// Size of one index table entry in bytes
pub const INDEX_ENTRY_SIZE: usize = 16;

/// Read a little-endian `u16` at `at`, or `None` past the buffer end.
fn read_u16(buf: &[u8], at: usize) -> Option<u16> {
    let bytes = buf.get(at..at + 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

/// Read a little-endian `u32` at `at`, or `None` past the buffer end.
fn read_u32(buf: &[u8], at: usize) -> Option<u32> {
    let bytes = buf.get(at..at + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// The fixed 20-byte prefix of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Record signature; anything other than [`MAGIC`] marks the record
    /// as empty/invalid rather than erroneous
    pub magic: u32,
    /// Format version (not interpreted by the decoder)
    pub version: u32,
    /// Absolute byte offset of the key table
    pub key_table_offset: u32,
    /// Absolute byte offset of the data table
    pub data_table_offset: u32,
    /// Number of index table entries
    pub entries: u32,
}

impl RecordHeader {
    /// Parse the header from the start of `buf`.
    ///
    /// Fails with a recoverable error when fewer than [`HEADER_SIZE`] bytes
    /// are available; the magic is NOT checked here.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::truncated_header(HEADER_SIZE, buf.len()));
        }

        // The length check above guarantees these reads succeed.
        Ok(Self {
            magic: read_u32(buf, 0).unwrap_or(0),
            version: read_u32(buf, 4).unwrap_or(0),
            key_table_offset: read_u32(buf, 8).unwrap_or(0),
            data_table_offset: read_u32(buf, 12).unwrap_or(0),
            entries: read_u32(buf, 16).unwrap_or(0),
        })
    }

    /// Returns true when the signature matches [`MAGIC`].
    pub fn has_magic(&self) -> bool {
        self.magic == MAGIC
    }

    /// Validate the table offsets against the buffer length.
    ///
    /// The invariant is `key_table_offset <= data_table_offset <= len`;
    /// nothing in the file is trusted before this holds.
    pub fn validate(&self, len: usize) -> Result<()> {
        let key_table = self.key_table_offset as usize;
        let data_table = self.data_table_offset as usize;

        if key_table > data_table || data_table > len {
            return Err(Error::table_out_of_range(key_table, data_table, len));
        }

        Ok(())
    }
}

/// One fixed 16-byte index table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Offset of this key within the key table
    pub key_offset: u16,
    /// Value-format tag (raw bytes / string / integer); informational only,
    /// the decoder does not branch on it for extraction
    pub param_format: u16,
    /// Declared value length in bytes
    pub param_length: u32,
    /// Declared maximum value length (reserved capacity, unused)
    pub param_max_length: u32,
    /// Offset of this value within the data table
    pub data_offset: u32,
}

impl IndexEntry {
    /// Parse the `index`-th entry of the table starting right after the
    /// header.
    ///
    /// Fails with a recoverable error when the entry does not fit inside
    /// `buf` (a truncated index table).
    pub fn parse(buf: &[u8], index: usize) -> Result<Self> {
        let at = HEADER_SIZE + index * INDEX_ENTRY_SIZE;
        let end = at + INDEX_ENTRY_SIZE;
        if end > buf.len() {
            return Err(Error::truncated_index(index, end, buf.len()));
        }

        Ok(Self {
            key_offset: read_u16(buf, at).unwrap_or(0),
            param_format: read_u16(buf, at + 2).unwrap_or(0),
            param_length: read_u32(buf, at + 4).unwrap_or(0),
            param_max_length: read_u32(buf, at + 8).unwrap_or(0),
            data_offset: read_u32(buf, at + 12).unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(magic: u32, key: u32, data: u32, entries: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&magic.to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&key.to_le_bytes());
        buf.extend_from_slice(&data.to_le_bytes());
        buf.extend_from_slice(&entries.to_le_bytes());
        buf
    }

    #[test]
    fn test_magic_is_null_psf() {
        assert_eq!(&MAGIC.to_le_bytes(), b"\0PSF");
        // The constant the original decoder compared against
        assert_eq!(MAGIC, 1_179_865_088);
    }

    #[test]
    fn test_parse_header() {
        let buf = header_bytes(MAGIC, 20, 36, 1);
        let header = RecordHeader::parse(&buf).unwrap();
        assert!(header.has_magic());
        assert_eq!(header.version, 1);
        assert_eq!(header.key_table_offset, 20);
        assert_eq!(header.data_table_offset, 36);
        assert_eq!(header.entries, 1);
    }

    #[test]
    fn test_parse_header_too_short() {
        let err = RecordHeader::parse(&[0u8; 19]).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_validate_rejects_inverted_tables() {
        let buf = header_bytes(MAGIC, 40, 36, 0);
        let header = RecordHeader::parse(&buf).unwrap();
        assert!(header.validate(64).is_err());
    }

    #[test]
    fn test_validate_rejects_data_table_past_end() {
        let buf = header_bytes(MAGIC, 20, 500, 0);
        let header = RecordHeader::parse(&buf).unwrap();
        assert!(header.validate(64).is_err());
    }

    #[test]
    fn test_parse_index_entry() {
        let mut buf = header_bytes(MAGIC, 36, 40, 1);
        buf.extend_from_slice(&3u16.to_le_bytes()); // key offset
        buf.extend_from_slice(&0x0204u16.to_le_bytes()); // utf-8 tag
        buf.extend_from_slice(&5u32.to_le_bytes()); // length
        buf.extend_from_slice(&8u32.to_le_bytes()); // max length
        buf.extend_from_slice(&7u32.to_le_bytes()); // data offset

        let entry = IndexEntry::parse(&buf, 0).unwrap();
        assert_eq!(entry.key_offset, 3);
        assert_eq!(entry.param_format, 0x0204);
        assert_eq!(entry.param_length, 5);
        assert_eq!(entry.param_max_length, 8);
        assert_eq!(entry.data_offset, 7);
    }

    #[test]
    fn test_parse_index_entry_truncated() {
        let buf = header_bytes(MAGIC, 20, 20, 2);
        let err = IndexEntry::parse(&buf, 0).unwrap_err();
        assert!(matches!(err, Error::TruncatedIndex { entry: 0, .. }));
    }
}
