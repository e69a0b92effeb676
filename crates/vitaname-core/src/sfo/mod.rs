//! SFO record decoding.
//!
//! This module turns one raw metadata record (the bytes of a `param.sfo`
//! archive entry) into a [`DecodedRecord`] key/value mapping.
//!
//! ## Algorithm Overview
//!
//! 1. Read the fixed 20-byte header at offset 0
//! 2. If the magic does not match, return a default record (not an error)
//! 3. Validate the key/data table offsets against the buffer length
//! 4. Split the key table on NUL into the entry keys
//! 5. Walk the index table and slice each value out of the data table
//! 6. Sanitize each value and insert it, rederiving the region tag whenever
//!    `TITLE_ID` is present
//!
//! ## Tolerance
//!
//! The format carries no redundancy, so the decoder is deliberately lenient
//! with disagreements inside one record: when the key table and the declared
//! entry count disagree, the smaller count wins; a value range that runs past
//! the buffer end is clamped rather than failing the whole record. Only
//! structural breakage (truncated header, out-of-range tables, truncated
//! index table) surfaces as a recoverable [`Error`](crate::Error).

mod layout;

use crate::error::Result;
use crate::region;
use crate::sanitize::sanitize;
use std::collections::HashMap;
use tracing::{debug, trace};

pub use layout::{IndexEntry, RecordHeader, HEADER_SIZE, INDEX_ENTRY_SIZE, MAGIC};

/// Key whose value identifies the product (e.g. `PCSE00001`)
pub const KEY_TITLE_ID: &str = "TITLE_ID";

/// Synthesized key holding the derived region tag
pub const KEY_REGION: &str = "REGION";

/// Decoded key/value mapping of one metadata record.
///
/// Always contains the synthesized [`KEY_REGION`] entry, defaulting to
/// [`region::UNKNOWN`] and rederived from the first four characters of the
/// `TITLE_ID` value on every insertion that leaves `TITLE_ID` present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRecord {
    values: HashMap<String, String>,
}

impl Default for DecodedRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodedRecord {
    /// Creates an empty record carrying only the default region.
    pub fn new() -> Self {
        let mut values = HashMap::new();
        values.insert(KEY_REGION.to_string(), region::UNKNOWN.to_string());
        Self { values }
    }

    /// Insert a key/value pair, overwriting any earlier value for the key.
    ///
    /// After the insertion the region is rederived from `TITLE_ID` if the
    /// record has one, so the region is stable regardless of the position of
    /// `TITLE_ID` in the entry order.
    pub fn insert(&mut self, key: String, value: String) {
        self.values.insert(key, value);

        if let Some(tag) = self
            .values
            .get(KEY_TITLE_ID)
            .and_then(|tid| tid.get(..4))
            .and_then(region::lookup)
        {
            self.values.insert(KEY_REGION.to_string(), tag.to_string());
        }
    }

    /// Look up a decoded value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// The derived region tag ([`region::UNKNOWN`] when underivable).
    pub fn region(&self) -> &str {
        self.get(KEY_REGION).unwrap_or(region::UNKNOWN)
    }

    /// Number of entries including the synthesized region.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the record holds nothing beyond the synthesized region.
    pub fn is_empty(&self) -> bool {
        self.values.len() <= 1
    }

    /// Iterate over all key/value pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Decode one raw metadata record into a [`DecodedRecord`].
///
/// A buffer whose magic does not match [`MAGIC`] decodes to a record
/// containing only the default region entry; that is a valid, silent
/// outcome, not an error. Structurally broken buffers (shorter than the
/// header, inverted or out-of-range table offsets, an index table running
/// past the end) fail with a recoverable error that callers treat the same
/// as "no metadata".
pub fn decode(buf: &[u8]) -> Result<DecodedRecord> {
    let mut record = DecodedRecord::new();

    let header = RecordHeader::parse(buf)?;
    if !header.has_magic() {
        debug!("no record magic in {} byte buffer", buf.len());
        return Ok(record);
    }
    header.validate(buf.len())?;

    let key_table_offset = header.key_table_offset as usize;
    let data_table_offset = header.data_table_offset as usize;

    // Keys are NUL-terminated and NUL-padded at the end of the table.
    let key_table = &buf[key_table_offset..data_table_offset];
    let key_table = trim_trailing_nuls(key_table);
    let keys: Vec<&[u8]> = if key_table.is_empty() {
        Vec::new()
    } else {
        key_table.split(|&b| b == 0).collect()
    };

    // The format has no redundancy check; when the key table and the
    // declared count disagree, the smaller count wins.
    let count = keys.len().min(header.entries as usize);
    if count != header.entries as usize {
        debug!(
            declared = header.entries,
            split = keys.len(),
            "entry count disagrees with key table, using the smaller"
        );
    }

    for (i, key) in keys.iter().take(count).enumerate() {
        let entry = IndexEntry::parse(buf, i)?;

        // Value range, clamped to the buffer end: a single truncated value
        // must not discard the rest of the record.
        let start = data_table_offset
            .saturating_add(entry.data_offset as usize)
            .min(buf.len());
        let end = start
            .saturating_add(entry.param_length as usize)
            .min(buf.len());
        if end - start < entry.param_length as usize {
            trace!(
                entry = i,
                declared = entry.param_length,
                available = end - start,
                "value range clamped to buffer end"
            );
        }

        let key = String::from_utf8_lossy(key).into_owned();
        let value = sanitize(&String::from_utf8_lossy(&buf[start..end]));
        trace!(entry = i, %key, %value, start, end, "decoded entry");
        record.insert(key, value);
    }

    Ok(record)
}

/// Strip the NUL padding from the end of the key table.
fn trim_trailing_nuls(data: &[u8]) -> &[u8] {
    let end = data
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |pos| pos + 1);
    &data[..end]
}
