//! Shared record types for the freshtrack persistence layer.
//!
//! This crate provides the types exchanged between the HTTP services and
//! the store: one input struct per record kind, the opaque time-ordered
//! record identifier, and the named fallback outcomes used when caller
//! input has to be normalized (unknown ledger kinds, unparsable dates,
//! over-long notes).
//!
//! # Example
//!
//! ```
//! use freshtrack_types::{RecordId, Freshness};
//!
//! let id = RecordId::new();
//! let parsed: RecordId = id.to_string().parse().unwrap();
//! assert_eq!(id, parsed);
//!
//! assert_eq!(Freshness::parse("Fresh"), Freshness::Fresh);
//! ```

pub mod coerce;
pub mod error;
pub mod id;
pub mod types;

pub use coerce::{ClipOutcome, DateOutcome, KindOutcome, MAX_THOUGHT_WORDS};
pub use error::{ParseError, ParseResult};
pub use id::RecordId;
pub use types::{
    EntryKind, Freshness, NewBlogPost, NewCalendarEvent, NewImageResult, NewLedgerEntry,
    NewSensorReading,
};
