//! Persistence and aggregation layer for freshtrack.
//!
//! This crate sits behind the freshtrack HTTP services and owns every
//! durable record they produce: sensor readings, image classification
//! results, notifications, calendar events, blog posts, ledger entries
//! and free-text thoughts.
//!
//! # Features
//!
//! - Connection lifecycle with bounded retry and degraded-mode operation
//! - Idempotent schema and index provisioning (expiry and full-text
//!   indexes included)
//! - Typed, best-effort writers per record kind
//! - Cross-table merge-and-resort for the unified history view
//! - Month-to-date ledger summaries with calendar-boundary arithmetic
//!
//! # Example
//!
//! ```no_run
//! use freshtrack_store::{Db, StoreConfig};
//!
//! // Never fails: on connection exhaustion the handle runs degraded and
//! // every operation returns its neutral shape.
//! let db = Db::connect(StoreConfig::default());
//! let history = db.history("chamika", 30);
//! # let _ = history;
//! ```

mod config;
mod db;
mod error;
mod history;
mod models;
mod queries;
mod schema;
mod store;
mod summary;

pub use config::{ConfigError, StoreConfig, ValidationError, default_config_path};
pub use db::Db;
pub use error::{Error, Result};
pub use history::{HistoryItem, HistoryKind, ScanStats};
pub use models::{
    BlogPost, CalendarEvent, ImageResult, LedgerEntry, Nh3Sample, Notification, SensorReading,
    Thought,
};
pub use queries::RecordQuery;
pub use store::Store;
pub use summary::LedgerSummary;

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/freshtrack/data.db`
/// - macOS: `~/Library/Application Support/freshtrack/data.db`
/// - Windows: `C:\Users\<user>\AppData\Local\freshtrack\data.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("freshtrack")
        .join("data.db")
}
