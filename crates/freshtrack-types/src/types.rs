//! Record kinds accepted by the store.
//!
//! One input struct per kind, with explicit optional fields. The store
//! substitutes the configured default owner and stamps `created_at` with
//! the current UTC time when the caller leaves them unset.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use time::OffsetDateTime;

/// Inferred freshness of a scanned item.
///
/// Classifiers are external and may emit labels beyond the two known
/// values, so unknown labels are carried through rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub enum Freshness {
    /// The item was classified as fresh.
    Fresh,
    /// The item was classified as spoiled.
    Spoiled,
    /// Any other classifier output, preserved verbatim.
    Other(String),
}

impl Freshness {
    /// Parse a classifier label. Never fails; unknown labels become
    /// [`Freshness::Other`].
    pub fn parse(label: &str) -> Self {
        match label {
            "Fresh" => Freshness::Fresh,
            "Spoiled" => Freshness::Spoiled,
            other => Freshness::Other(other.to_string()),
        }
    }

    /// The label as stored and rendered.
    pub fn as_str(&self) -> &str {
        match self {
            Freshness::Fresh => "Fresh",
            Freshness::Spoiled => "Spoiled",
            Freshness::Other(label) => label,
        }
    }
}

impl From<String> for Freshness {
    fn from(label: String) -> Self {
        Freshness::parse(&label)
    }
}

impl From<Freshness> for String {
    fn from(status: Freshness) -> Self {
        status.as_str().to_string()
    }
}

/// Kind of a ledger entry: a cost or a credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EntryKind {
    /// A cost; accumulated into the month's total cost.
    Entry,
    /// A credit, stored as a signed value; accumulated into the bonus total.
    Bonus,
}

impl EntryKind {
    /// The label as stored in the `kind` column.
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Entry => "entry",
            EntryKind::Bonus => "bonus",
        }
    }
}

/// Input for one gas-sensor reading.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NewSensorReading {
    /// Owner; the store's default owner is substituted when absent.
    pub owner: Option<String>,
    /// Identifier of the reporting device.
    pub device_id: Option<String>,
    /// Gas concentration (NH3, ppm).
    pub nh3: f64,
    /// RGB triple from the colour sensor.
    pub rgb: [u32; 3],
    /// Auxiliary counter reported alongside the reading.
    pub counter: i64,
    /// Inferred food label, when classification ran.
    pub food: Option<String>,
    /// Inferred freshness, when classification ran.
    pub status: Option<Freshness>,
    /// Source tag; defaults to `"live"`.
    pub source: Option<String>,
    /// Explicit timestamp for backfill; defaults to now.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339::option"))]
    pub created_at: Option<OffsetDateTime>,
}

/// Input for one image-classification result.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NewImageResult {
    /// Owner; the store's default owner is substituted when absent.
    pub owner: Option<String>,
    /// Inferred food label.
    pub food: String,
    /// Inferred freshness.
    pub status: Freshness,
    /// Stored file name of the uploaded image.
    pub file_name: String,
    /// Source tag; defaults to `"upload"`.
    pub source: Option<String>,
    /// Explicit timestamp for backfill; defaults to now.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339::option"))]
    pub created_at: Option<OffsetDateTime>,
}

/// Input for a calendar event.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NewCalendarEvent {
    /// Owner; the store's default owner is substituted when absent.
    pub owner: Option<String>,
    /// Event title.
    pub title: String,
    /// Start marker, in whatever format the caller uses. Range queries
    /// compare these strings as supplied.
    pub start: String,
    /// Optional end marker.
    pub end: Option<String>,
    /// Optional free-text notes.
    pub notes: Option<String>,
}

/// Input for a blog post.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NewBlogPost {
    /// Owner; the store's default owner is substituted when absent.
    pub owner: Option<String>,
    /// Post title.
    pub title: String,
    /// Post body.
    pub content: String,
    /// Category; defaults to `"General"`.
    pub category: Option<String>,
    /// Author; defaults to `"Unknown"`.
    pub author: Option<String>,
    /// Estimated read time; defaults to a placeholder.
    pub read_time: Option<String>,
    /// Tags; defaults to an empty list.
    pub tags: Option<Vec<String>>,
    /// Optional image reference.
    pub image: Option<String>,
    /// Explicit timestamp for backfill; defaults to now.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339::option"))]
    pub created_at: Option<OffsetDateTime>,
}

/// Input for a ledger entry.
///
/// `kind` and `effective_date` arrive as raw caller strings and are
/// normalized by the writer: unknown kinds coerce to `entry`, unparsable
/// dates fall back to the current time.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NewLedgerEntry {
    /// Owner; the store's default owner is substituted when absent.
    pub owner: Option<String>,
    /// Food or item label.
    pub food: String,
    /// Monetary value. Bonuses are stored signed.
    pub value: f64,
    /// Raw entry kind (`"entry"` or `"bonus"`).
    pub kind: String,
    /// Raw effective date, RFC 3339-like.
    pub effective_date: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freshness_parse_known_labels() {
        assert_eq!(Freshness::parse("Fresh"), Freshness::Fresh);
        assert_eq!(Freshness::parse("Spoiled"), Freshness::Spoiled);
    }

    #[test]
    fn test_freshness_preserves_unknown_labels() {
        let status = Freshness::parse("Borderline");
        assert_eq!(status, Freshness::Other("Borderline".to_string()));
        assert_eq!(status.as_str(), "Borderline");
    }

    #[test]
    fn test_entry_kind_labels() {
        assert_eq!(EntryKind::Entry.as_str(), "entry");
        assert_eq!(EntryKind::Bonus.as_str(), "bonus");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_freshness_serializes_as_plain_string() {
        assert_eq!(serde_json::to_string(&Freshness::Fresh).unwrap(), "\"Fresh\"");
        let back: Freshness = serde_json::from_str("\"Spoiled\"").unwrap();
        assert_eq!(back, Freshness::Spoiled);
        let other: Freshness = serde_json::from_str("\"Stale\"").unwrap();
        assert_eq!(other, Freshness::Other("Stale".to_string()));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_entry_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&EntryKind::Bonus).unwrap(), "\"bonus\"");
    }
}
