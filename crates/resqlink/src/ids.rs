//! Human-readable sequential identifiers.
//!
//! IDs look like `CON001` or `COLL0007`: a fixed prefix and a zero-padded
//! counter. Counters live in the store (see
//! [`crate::storage::document::next_sequence`]) and are bumped inside the
//! transaction that creates the record.

use rusqlite::Connection;

use crate::error::Result;
use crate::storage::document::next_sequence;

/// The kinds of record that get a sequential ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    /// `CON001`
    Contributor,
    /// `COLL0001`
    Collection,
    /// `INV0001`
    Inventory,
    /// `DIST0001`
    Distribution,
    /// `CP001`
    CollectionPoint,
    /// `SUP001`
    Supplier,
    /// `ADM001`
    Admin,
    /// `NTF0001`
    Notification,
}

impl IdKind {
    /// The ID prefix.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Contributor => "CON",
            Self::Collection => "COLL",
            Self::Inventory => "INV",
            Self::Distribution => "DIST",
            Self::CollectionPoint => "CP",
            Self::Supplier => "SUP",
            Self::Admin => "ADM",
            Self::Notification => "NTF",
        }
    }

    /// Minimum number of digits after the prefix.
    #[must_use]
    pub fn width(self) -> usize {
        match self {
            Self::Contributor | Self::CollectionPoint | Self::Supplier | Self::Admin => 3,
            Self::Collection | Self::Inventory | Self::Distribution | Self::Notification => 4,
        }
    }

    fn sequence_name(self) -> &'static str {
        self.prefix()
    }
}

/// Format `prefix` + `n` padded to `width` digits. Wider numbers print in full.
#[must_use]
pub fn format_id(prefix: &str, n: u64, width: usize) -> String {
    format!("{prefix}{n:0width$}")
}

/// Allocate the next ID of `kind`.
///
/// # Errors
///
/// Returns an error if the counter cannot be updated.
pub fn next_id(conn: &Connection, kind: IdKind) -> Result<String> {
    let n = next_sequence(conn, kind.sequence_name())?;
    Ok(format_id(kind.prefix(), n, kind.width()))
}

/// Victim ID prefix: first three letters of the district, uppercased.
///
/// Non-letters are skipped and short names are padded with `X`, so
/// `"Matara"` gives `MAT` and `""` gives `XXX`.
#[must_use]
pub fn victim_prefix(district: &str) -> String {
    let mut prefix: String = district
        .chars()
        .filter(char::is_ascii_alphabetic)
        .take(3)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    while prefix.len() < 3 {
        prefix.push('X');
    }
    prefix
}

/// Allocate the next victim ID for `district` (`MAT001`, `MAT002`, ...).
///
/// # Errors
///
/// Returns an error if the counter cannot be updated.
pub fn next_victim_id(conn: &Connection, district: &str) -> Result<String> {
    let prefix = victim_prefix(district);
    let n = next_sequence(conn, &format!("victim:{prefix}"))?;
    Ok(format_id(&prefix, n, 3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;

    #[test]
    fn test_format_id_pads() {
        assert_eq!(format_id("CON", 1, 3), "CON001");
        assert_eq!(format_id("COLL", 7, 4), "COLL0007");
    }

    #[test]
    fn test_format_id_overflows_width() {
        assert_eq!(format_id("CON", 1234, 3), "CON1234");
    }

    #[test]
    fn test_prefixes_and_widths() {
        assert_eq!(IdKind::Contributor.prefix(), "CON");
        assert_eq!(IdKind::Contributor.width(), 3);
        assert_eq!(IdKind::Collection.prefix(), "COLL");
        assert_eq!(IdKind::Distribution.width(), 4);
        assert_eq!(IdKind::CollectionPoint.prefix(), "CP");
    }

    #[test]
    fn test_victim_prefix() {
        assert_eq!(victim_prefix("Matara"), "MAT");
        assert_eq!(victim_prefix("nuwara eliya"), "NUW");
        assert_eq!(victim_prefix("K1"), "KXX");
        assert_eq!(victim_prefix(""), "XXX");
    }

    #[test]
    fn test_next_id_sequences_per_kind() {
        let storage = Storage::open_in_memory().unwrap();
        let ids = storage
            .write(|tx| {
                Ok(vec![
                    next_id(tx, IdKind::Contributor)?,
                    next_id(tx, IdKind::Contributor)?,
                    next_id(tx, IdKind::Collection)?,
                ])
            })
            .unwrap();
        assert_eq!(ids, vec!["CON001", "CON002", "COLL0001"]);
    }

    #[test]
    fn test_next_victim_id_per_district() {
        let storage = Storage::open_in_memory().unwrap();
        let ids = storage
            .write(|tx| {
                Ok(vec![
                    next_victim_id(tx, "Matara")?,
                    next_victim_id(tx, "Galle")?,
                    next_victim_id(tx, "Matara")?,
                ])
            })
            .unwrap();
        assert_eq!(ids, vec!["MAT001", "GAL001", "MAT002"]);
    }
}
