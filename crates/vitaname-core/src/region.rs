//! Static product-code-prefix region lookup.
//!
//! The first four characters of a `TITLE_ID` value (e.g. `PCSB` in
//! `PCSB00000`) identify the publishing region of the title. The table is a
//! process-wide constant: it is never mutated after compilation and needs no
//! synchronization, so concurrent per-archive workers can share it freely.

/// Region tag used when no prefix mapping applies
pub const UNKNOWN: &str = "UNK";

/// Map a four-character product-code prefix to its region tag.
///
/// Returns `None` for unmapped prefixes; callers keep whatever region they
/// already have (the default being [`UNKNOWN`]).
pub fn lookup(prefix: &str) -> Option<&'static str> {
    match prefix {
        "PCSB" | "VCES" | "VLES" | "PCSF" => Some("EUR"),
        "PCSE" | "PCSA" | "PCSD" | "VCUS" | "VLUS" => Some("USA"),
        "PCSG" | "PCSC" | "VCJS" | "VLJM" | "VLJS" => Some("JAP"),
        "PCSH" | "VCAS" | "VLAS" => Some("ASIA"),
        _ => None,
    }
}
