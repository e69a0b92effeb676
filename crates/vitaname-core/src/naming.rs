//! Record aggregation and candidate-name construction.
//!
//! One archive can embed several metadata records (base title, update,
//! add-on content, per-disc auxiliaries). [`NamingDescriptor`] folds them,
//! in discovery order, into the single naming decision for that archive.
//!
//! ## Aggregation policy
//!
//! - A record contributes to the identity fields only when it carries an
//!   `APP_VER` key; records without it are auxiliary and only feed the
//!   add-on counter.
//! - Version fields are compared as plain strings, not numerically. This is
//!   a deliberate simplification of the format's free-form version strings
//!   and is reproduced exactly, including its known weakness: `"10.0"`
//!   sorts below `"2.0"`.
//! - Title, title id, and region come from the *last* qualifying record in
//!   discovery order, independent of the version comparison.
//! - Every record whose `CATEGORY` equals [`CATEGORY_ADDON`] increments the
//!   add-on counter, qualifying or not.

use crate::sfo::DecodedRecord;
use tracing::trace;

/// `CATEGORY` value marking supplementary (add-on) content
pub const CATEGORY_ADDON: &str = "ac";

/// Seed value for both version fields; any real version string sorts above it
pub const DEFAULT_VERSION: &str = "0.00";

/// Aggregated naming decision for one archive.
///
/// Created empty, folded over every decoded record via [`absorb`], consumed
/// once through [`file_name`], then discarded.
///
/// [`absorb`]: NamingDescriptor::absorb
/// [`file_name`]: NamingDescriptor::file_name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingDescriptor {
    title: String,
    title_id: String,
    region: String,
    app_ver: String,
    version: String,
    addon_count: usize,
    qualified: bool,
}

impl Default for NamingDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

impl NamingDescriptor {
    /// Creates an empty descriptor.
    pub fn new() -> Self {
        Self {
            title: String::new(),
            title_id: String::new(),
            region: String::new(),
            app_ver: DEFAULT_VERSION.to_string(),
            version: DEFAULT_VERSION.to_string(),
            addon_count: 0,
            qualified: false,
        }
    }

    /// Fold one decoded record into the descriptor.
    ///
    /// Records must be absorbed in discovery order; the fold is
    /// order-dependent because the last qualifying record supplies the
    /// identity fields.
    pub fn absorb(&mut self, record: &DecodedRecord) {
        if record.get("CATEGORY") == Some(CATEGORY_ADDON) {
            self.addon_count += 1;
        }

        let Some(app_ver) = record.get("APP_VER") else {
            trace!("record without APP_VER ignored for naming");
            return;
        };

        self.qualified = true;

        // Lexicographic, not numeric: a candidate wins only when it is
        // strictly greater as a string.
        if app_ver > self.app_ver.as_str() {
            self.app_ver = app_ver.to_string();
        }
        let version = record.get("VERSION").unwrap_or_default();
        if version > self.version.as_str() {
            self.version = version.to_string();
        }

        // Last qualifying record wins the identity fields, even when an
        // earlier record held the higher version.
        self.title = record.get("TITLE").unwrap_or_default().to_string();
        self.title_id = record.get("TITLE_ID").unwrap_or_default().to_string();
        self.region = record.region().to_string();

        trace!(
            title = %self.title,
            app_ver = %self.app_ver,
            version = %self.version,
            "absorbed qualifying record"
        );
    }

    /// True until at least one absorbed record carried `APP_VER`.
    ///
    /// An empty descriptor must not produce a rename.
    pub fn is_empty(&self) -> bool {
        !self.qualified
    }

    /// Number of absorbed records marked as add-on content.
    pub fn addon_count(&self) -> usize {
        self.addon_count
    }

    /// Title taken from the last qualifying record.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Highest `APP_VER` string seen (lexicographically).
    pub fn app_ver(&self) -> &str {
        &self.app_ver
    }

    /// Build the candidate filename for this archive, or `None` when no
    /// qualifying record was absorbed.
    ///
    /// The shape is
    /// `"{title} ({app_ver}-{version}-{addon_count}) [{title_id}] ({region}).{ext}"`.
    pub fn file_name(&self, ext: &str) -> Option<String> {
        if self.is_empty() {
            return None;
        }

        Some(format!(
            "{} ({}-{}-{}) [{}] ({}).{}",
            self.title,
            self.app_ver,
            self.version,
            self.addon_count,
            self.title_id,
            self.region,
            ext,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sfo::DecodedRecord;

    fn record(entries: &[(&str, &str)]) -> DecodedRecord {
        let mut record = DecodedRecord::new();
        for (key, value) in entries {
            record.insert(key.to_string(), value.to_string());
        }
        record
    }

    #[test]
    fn test_empty_descriptor_produces_no_name() {
        let descriptor = NamingDescriptor::new();
        assert!(descriptor.is_empty());
        assert_eq!(descriptor.file_name("zip"), None);
    }

    #[test]
    fn test_record_without_app_ver_never_qualifies() {
        let mut descriptor = NamingDescriptor::new();
        descriptor.absorb(&record(&[
            ("TITLE", "Game"),
            ("VERSION", "9.99"),
            ("CATEGORY", "gd"),
        ]));

        assert!(descriptor.is_empty());
        assert_eq!(descriptor.file_name("zip"), None);
    }

    #[test]
    fn test_unqualified_record_still_counts_addons() {
        let mut descriptor = NamingDescriptor::new();
        descriptor.absorb(&record(&[("CATEGORY", "ac")]));

        assert!(descriptor.is_empty());
        assert_eq!(descriptor.addon_count(), 1);
    }

    #[test]
    fn test_zero_padded_versions_compare_as_expected() {
        let mut descriptor = NamingDescriptor::new();
        descriptor.absorb(&record(&[("APP_VER", "02.00")]));
        descriptor.absorb(&record(&[("APP_VER", "10.00")]));

        assert_eq!(descriptor.app_ver(), "10.00");
    }

    #[test]
    fn test_version_comparison_is_lexicographic_not_numeric() {
        let mut descriptor = NamingDescriptor::new();
        descriptor.absorb(&record(&[("APP_VER", "2.00")]));
        descriptor.absorb(&record(&[("APP_VER", "10.00")]));

        // "2.00" > "10.00" as strings; the numeric winner loses.
        assert_eq!(descriptor.app_ver(), "2.00");
    }

    #[test]
    fn test_last_qualifying_record_wins_identity_fields() {
        let mut descriptor = NamingDescriptor::new();
        descriptor.absorb(&record(&[
            ("TITLE", "Game v2"),
            ("APP_VER", "02.00"),
            ("TITLE_ID", "PCSB00000"),
        ]));
        descriptor.absorb(&record(&[
            ("TITLE", "Game v1"),
            ("APP_VER", "01.00"),
            ("TITLE_ID", "PCSE00001"),
        ]));

        // Highest version is kept, identity comes from the later record.
        assert_eq!(descriptor.app_ver(), "02.00");
        assert_eq!(descriptor.title(), "Game v1");
        assert_eq!(
            descriptor.file_name("zip"),
            Some("Game v1 (02.00-0.00-0) [PCSE00001] (USA).zip".to_string())
        );
    }

    #[test]
    fn test_absorbing_same_record_twice_doubles_addon_count_only() {
        let qualifying = record(&[
            ("TITLE", "Game"),
            ("APP_VER", "01.00"),
            ("VERSION", "1.00"),
            ("TITLE_ID", "PCSE00001"),
            ("CATEGORY", "ac"),
        ]);

        let mut descriptor = NamingDescriptor::new();
        descriptor.absorb(&qualifying);
        let once = descriptor.clone();
        descriptor.absorb(&qualifying);

        assert_eq!(once.addon_count(), 1);
        assert_eq!(descriptor.addon_count(), 2);
        // A record does not exceed itself lexicographically.
        assert_eq!(descriptor.app_ver(), once.app_ver());
        assert_eq!(descriptor.title(), once.title());
    }

    #[test]
    fn test_two_record_archive_end_to_end() {
        let mut descriptor = NamingDescriptor::new();
        descriptor.absorb(&record(&[
            ("TITLE", "Game"),
            ("APP_VER", "01.00"),
            ("VERSION", "1.00"),
            ("TITLE_ID", "PCSE00001"),
            ("CATEGORY", "gd"),
        ]));
        descriptor.absorb(&record(&[
            ("TITLE", "Game Patched"),
            ("APP_VER", "01.01"),
            ("VERSION", "1.00"),
            ("TITLE_ID", "PCSE00001"),
            ("CATEGORY", "ac"),
        ]));

        assert_eq!(descriptor.title(), "Game Patched");
        assert_eq!(descriptor.app_ver(), "01.01");
        assert_eq!(descriptor.addon_count(), 1);
        assert_eq!(
            descriptor.file_name("zip"),
            Some("Game Patched (01.01-1.00-1) [PCSE00001] (USA).zip".to_string())
        );
    }

    #[test]
    fn test_missing_optional_fields_fall_back_to_empty() {
        let mut descriptor = NamingDescriptor::new();
        descriptor.absorb(&record(&[("APP_VER", "01.00")]));

        assert_eq!(
            descriptor.file_name("zip"),
            Some(" (01.00-0.00-0) [] (UNK).zip".to_string())
        );
    }
}
