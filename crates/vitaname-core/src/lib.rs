//! # vitaname-core
//!
//! A library for decoding the binary SFO ("System File Object") key-value
//! metadata records embedded inside game archives, and for folding the
//! records found in one archive into a single canonical naming decision.
//!
//! This crate provides the core functionality for:
//! - Parsing one raw SFO record (header, index table, key table, data table)
//!   into a key/value mapping
//! - Stripping filesystem-unsafe characters from decoded values
//! - Aggregating several records from one archive into a naming descriptor
//! - Deriving a coarse region tag from the product-code prefix
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`sfo`]: Binary record decoding
//! - [`naming`]: Record aggregation and candidate-name construction
//! - [`region`]: Static product-code-prefix region lookup
//! - [`sanitize`]: Filesystem-safe value sanitization
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use vitaname_core::{decode, NamingDescriptor};
//! use std::fs;
//!
//! // Raw bytes of a `param.sfo` entry pulled out of an archive
//! let data = fs::read("./param.sfo")?;
//!
//! let mut descriptor = NamingDescriptor::new();
//! descriptor.absorb(&decode(&data)?);
//!
//! if let Some(name) = descriptor.file_name("zip") {
//!     println!("{name}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Failure model
//!
//! Malformed or absent metadata is a valid, silent outcome: a record with
//! the wrong magic decodes to a default record, and structurally broken
//! records yield a recoverable [`Error`] that callers treat as "no
//! metadata". Nothing in this crate aborts a batch for one bad input.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod error;
pub mod naming;
pub mod region;
pub mod sanitize;
pub mod sfo;

// Re-export primary types for convenience
pub use error::{Error, Result};
pub use naming::NamingDescriptor;
pub use sfo::{decode, DecodedRecord};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum number of bytes captured from one embedded metadata entry.
///
/// Content beyond this cap is never read; a record that straddles the
/// boundary is decoded from the truncated prefix (see [`sfo::decode`]).
pub const MAX_CAPTURE_SIZE: u64 = 10_000_000;
