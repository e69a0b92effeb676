//! Error types for the vitaname-core library.
//!
//! This module provides error handling using the `thiserror` crate, with
//! detailed variants for the different ways an embedded metadata record can
//! be structurally broken. Malformed records are recoverable by design: the
//! decoder's callers treat them exactly like "no metadata present".

use thiserror::Error;

/// Result type alias for vitaname operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for record decoding and aggregation
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Buffer too small to hold the fixed 20-byte record header
    #[error("truncated record header: need {need} bytes, have {have}")]
    TruncatedHeader {
        /// Bytes required for the header
        need: usize,
        /// Bytes actually available
        have: usize,
    },

    /// Header offsets violate `key_table <= data_table <= buffer length`
    #[error(
        "table offsets out of range: key table at {key_table}, data table at {data_table}, \
         buffer is {len} bytes"
    )]
    TableOutOfRange {
        /// Declared key table offset
        key_table: usize,
        /// Declared data table offset
        data_table: usize,
        /// Length of the raw buffer
        len: usize,
    },

    /// Index table extends past the end of the buffer
    #[error("truncated index table: entry {entry} ends at {end}, buffer is {len} bytes")]
    TruncatedIndex {
        /// Zero-based index of the first entry that does not fit
        entry: usize,
        /// Byte offset one past the end of that entry
        end: usize,
        /// Length of the raw buffer
        len: usize,
    },
}

impl Error {
    /// Creates a new truncated-header error
    pub fn truncated_header(need: usize, have: usize) -> Self {
        Self::TruncatedHeader { need, have }
    }

    /// Creates a new table-offset error
    pub fn table_out_of_range(key_table: usize, data_table: usize, len: usize) -> Self {
        Self::TableOutOfRange {
            key_table,
            data_table,
            len,
        }
    }

    /// Creates a new truncated-index error
    pub fn truncated_index(entry: usize, end: usize, len: usize) -> Self {
        Self::TruncatedIndex { entry, end, len }
    }

    /// Returns true if this error is a malformed-record condition that the
    /// caller should recover from by treating the archive entry as carrying
    /// no metadata.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TruncatedHeader { .. }
                | Self::TableOutOfRange { .. }
                | Self::TruncatedIndex { .. }
        )
    }
}
