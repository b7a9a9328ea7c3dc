//! Data models for stored records.
//!
//! One struct per record kind, shaped exactly as persisted. Timestamps
//! serialize as RFC 3339 so identifiers and instants cross the HTTP
//! boundary as opaque strings.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use freshtrack_types::{EntryKind, Freshness, RecordId};

/// A gas-sensor reading. Immutable; expires after the retention window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorReading {
    /// Record identifier.
    pub id: RecordId,
    /// Owner the reading is scoped to.
    pub owner: String,
    /// Reporting device, when known.
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
    /// Source tag (`live`, `check`, ...).
    pub source: String,
    /// Creation instant, UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// An image-classification result. Immutable; expires after the
/// retention window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResult {
    /// Record identifier.
    pub id: RecordId,
    /// Owner the result is scoped to.
    pub owner: String,
    /// Inferred food label.
    pub food: String,
    /// Inferred freshness.
    pub status: Freshness,
    /// Stored file name of the uploaded image.
    pub file_name: String,
    /// Source tag (`upload`, ...).
    pub source: String,
    /// Creation instant, UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A notification message. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Record identifier.
    pub id: RecordId,
    /// Owner the notification is scoped to.
    pub owner: String,
    /// Free-text message.
    pub message: String,
    /// Creation instant, UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A calendar event. Deletable by owner and identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Record identifier.
    pub id: RecordId,
    /// Owner the event is scoped to.
    pub owner: String,
    /// Event title.
    pub title: String,
    /// Caller-supplied start marker, stored verbatim.
    pub start: String,
    /// Optional end marker.
    pub end: Option<String>,
    /// Optional notes.
    pub notes: Option<String>,
    /// Creation instant, UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A blog post. Owner may be absent on legacy records, which are then
/// readable by any caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogPost {
    /// Record identifier.
    pub id: RecordId,
    /// Owner, absent on legacy posts.
    pub owner: Option<String>,
    /// Post title.
    pub title: String,
    /// Post body.
    pub content: String,
    /// Category, `"General"` unless the author set one.
    pub category: String,
    /// Author, `"Unknown"` unless set.
    pub author: String,
    /// Estimated read time.
    pub read_time: String,
    /// Tags, possibly empty.
    pub tags: Vec<String>,
    /// Image reference, empty when none.
    pub image: String,
    /// Creation instant, UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A ledger entry. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Record identifier.
    pub id: RecordId,
    /// Owner the entry is scoped to.
    pub owner: String,
    /// Food or item label.
    pub food: String,
    /// Monetary value; bonuses are stored signed.
    pub value: f64,
    /// Entry kind.
    pub kind: EntryKind,
    /// Caller-supplied effective date (month-window key).
    #[serde(with = "time::serde::rfc3339")]
    pub effective_date: OffsetDateTime,
    /// Creation instant, UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A free-text thought. Append-only, bounded to 60 words at write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thought {
    /// Record identifier.
    pub id: RecordId,
    /// Owner the thought is scoped to.
    pub owner: String,
    /// The note text as stored.
    pub text: String,
    /// Creation instant, UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Latest gas reading for the live dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nh3Sample {
    /// Gas concentration (NH3, ppm).
    pub nh3: f64,
    /// When the reading was captured.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
