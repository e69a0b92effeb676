//! Filesystem-safe value sanitization.
//!
//! Decoded values end up in candidate filenames, so every value is stripped
//! of the characters that are unsafe in a path component on at least one
//! supported platform before it enters a record.

/// Characters removed from every decoded value
const UNSAFE: &[char] = &[
    '\0', '\r', '\n', '\\', '"', '/', ':', '*', '?', '<', '>', '|',
];

/// Remove every occurrence of a filesystem-unsafe character.
///
/// Pure function; returns a new string with the offending characters
/// dropped (not replaced).
pub fn sanitize(value: &str) -> String {
    value.chars().filter(|c| !UNSAFE.contains(c)).collect()
}
