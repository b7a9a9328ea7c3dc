//! Degraded-tolerant front door to the store.
//!
//! [`Db`] wraps an optional [`Store`]: construction never fails, and
//! every operation collapses both "no store" and "operation failed" to
//! a neutral value. Callers render empty dashboards instead of crashing
//! when the database is unreachable.

use tracing::{error, warn};

use freshtrack_types::{
    NewBlogPost, NewCalendarEvent, NewImageResult, NewLedgerEntry, NewSensorReading, RecordId,
};

use crate::config::StoreConfig;
use crate::error::Result;
use crate::history::{HistoryItem, HistoryKind, ScanStats};
use crate::models::{
    BlogPost, CalendarEvent, ImageResult, LedgerEntry, Nh3Sample, Notification, SensorReading,
    Thought,
};
use crate::queries::RecordQuery;
use crate::store::Store;
use crate::summary::LedgerSummary;

/// Persistence handle that tolerates an unreachable database.
///
/// Writes report success as `Some(id)` and failure or degraded mode as
/// `None`; reads return empty collections or `None`; deletes return
/// `false`. No operation panics or propagates an error.
pub struct Db {
    store: Option<Store>,
}

impl Db {
    /// Connect with the configured retry budget. On exhaustion the
    /// handle comes up degraded rather than failing.
    pub fn connect(cfg: StoreConfig) -> Self {
        match Store::try_connect(cfg) {
            Ok(store) => Self { store: Some(store) },
            Err(e) => {
                error!("Store unavailable, continuing degraded: {e}");
                Self { store: None }
            }
        }
    }

    /// Wrap an already-open store.
    pub fn from_store(store: Store) -> Self {
        Self { store: Some(store) }
    }

    /// A handle with no backing store.
    pub fn degraded() -> Self {
        Self { store: None }
    }

    /// An in-memory handle (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_store(Store::open_in_memory()?))
    }

    /// Whether the handle is running without a backing store.
    pub fn is_degraded(&self) -> bool {
        self.store.is_none()
    }

    fn write(&self, op: &str, f: impl FnOnce(&Store) -> Result<RecordId>) -> Option<RecordId> {
        let Some(store) = &self.store else {
            warn!("{op} skipped: store unavailable");
            return None;
        };
        match f(store) {
            Ok(id) => Some(id),
            Err(e) => {
                error!("{op} failed: {e}");
                None
            }
        }
    }

    fn read<T>(&self, op: &str, neutral: T, f: impl FnOnce(&Store) -> Result<T>) -> T {
        let Some(store) = &self.store else {
            return neutral;
        };
        match f(store) {
            Ok(value) => value,
            Err(e) => {
                warn!("{op} failed: {e}");
                neutral
            }
        }
    }
}

// Writers.
impl Db {
    pub fn insert_sensor_reading(&self, new: &NewSensorReading) -> Option<RecordId> {
        self.write("insert_sensor_reading", |s| s.insert_sensor_reading(new))
    }

    pub fn insert_image_result(&self, new: &NewImageResult) -> Option<RecordId> {
        self.write("insert_image_result", |s| s.insert_image_result(new))
    }

    pub fn insert_notification(&self, owner: Option<&str>, message: &str) -> Option<RecordId> {
        self.write("insert_notification", |s| {
            s.insert_notification(owner, message)
        })
    }

    pub fn insert_calendar_event(&self, new: &NewCalendarEvent) -> Option<RecordId> {
        self.write("insert_calendar_event", |s| s.insert_calendar_event(new))
    }

    pub fn insert_blog_post(&self, new: &NewBlogPost) -> Option<RecordId> {
        self.write("insert_blog_post", |s| s.insert_blog_post(new))
    }

    pub fn insert_ledger_entry(&self, new: &NewLedgerEntry) -> Option<RecordId> {
        self.write("insert_ledger_entry", |s| s.insert_ledger_entry(new))
    }

    pub fn insert_thought(&self, owner: Option<&str>, text: &str) -> Option<RecordId> {
        self.write("insert_thought", |s| s.insert_thought(owner, text))
    }
}

// Point lookups and deletes.
impl Db {
    pub fn get_sensor_reading(&self, id: &str) -> Option<SensorReading> {
        self.read("get_sensor_reading", None, |s| s.get_sensor_reading(id))
    }

    pub fn get_image_result(&self, id: &str) -> Option<ImageResult> {
        self.read("get_image_result", None, |s| s.get_image_result(id))
    }

    pub fn get_notification(&self, id: &str) -> Option<Notification> {
        self.read("get_notification", None, |s| s.get_notification(id))
    }

    pub fn get_calendar_event(&self, id: &str) -> Option<CalendarEvent> {
        self.read("get_calendar_event", None, |s| s.get_calendar_event(id))
    }

    pub fn get_blog_post(&self, id: &str) -> Option<BlogPost> {
        self.read("get_blog_post", None, |s| s.get_blog_post(id))
    }

    pub fn get_ledger_entry(&self, id: &str) -> Option<LedgerEntry> {
        self.read("get_ledger_entry", None, |s| s.get_ledger_entry(id))
    }

    pub fn get_thought(&self, id: &str) -> Option<Thought> {
        self.read("get_thought", None, |s| s.get_thought(id))
    }

    pub fn delete_calendar_event(&self, owner: &str, id: &str) -> bool {
        self.read("delete_calendar_event", false, |s| {
            s.delete_calendar_event(owner, id)
        })
    }

    pub fn delete_blog_post(&self, id: &str) -> bool {
        self.read("delete_blog_post", false, |s| s.delete_blog_post(id))
    }
}

// Listings, merged history and aggregates.
impl Db {
    pub fn list_sensor_readings(&self, query: &RecordQuery) -> Vec<SensorReading> {
        self.read("list_sensor_readings", Vec::new(), |s| {
            s.list_sensor_readings(query)
        })
    }

    pub fn list_image_results(&self, query: &RecordQuery) -> Vec<ImageResult> {
        self.read("list_image_results", Vec::new(), |s| {
            s.list_image_results(query)
        })
    }

    pub fn list_notifications(&self, query: &RecordQuery) -> Vec<Notification> {
        self.read("list_notifications", Vec::new(), |s| {
            s.list_notifications(query)
        })
    }

    pub fn list_thoughts(&self, query: &RecordQuery) -> Vec<Thought> {
        self.read("list_thoughts", Vec::new(), |s| s.list_thoughts(query))
    }

    pub fn list_ledger_entries(&self, query: &RecordQuery) -> Vec<LedgerEntry> {
        self.read("list_ledger_entries", Vec::new(), |s| {
            s.list_ledger_entries(query)
        })
    }

    pub fn list_calendar_events(
        &self,
        owner: &str,
        start_from: Option<&str>,
        end_to: Option<&str>,
        limit: u32,
    ) -> Vec<CalendarEvent> {
        self.read("list_calendar_events", Vec::new(), |s| {
            s.list_calendar_events(owner, start_from, end_to, limit)
        })
    }

    pub fn list_blog_posts(&self, owner: &str, limit: u32) -> Vec<BlogPost> {
        self.read("list_blog_posts", Vec::new(), |s| {
            s.list_blog_posts(owner, limit)
        })
    }

    pub fn latest_sensor_reading(&self, owner: &str) -> Option<SensorReading> {
        self.read("latest_sensor_reading", None, |s| {
            s.latest_sensor_reading(owner)
        })
    }

    pub fn latest_image_result(&self, owner: &str) -> Option<ImageResult> {
        self.read("latest_image_result", None, |s| s.latest_image_result(owner))
    }

    pub fn latest_nh3(&self, owner: &str) -> Option<Nh3Sample> {
        self.read("latest_nh3", None, |s| s.latest_nh3(owner))
    }

    pub fn search_thoughts(&self, owner: &str, needle: &str, limit: u32) -> Vec<Thought> {
        self.read("search_thoughts", Vec::new(), |s| {
            s.search_thoughts(owner, needle, limit)
        })
    }

    pub fn history(&self, owner: &str, limit: u32) -> Vec<HistoryItem> {
        self.read("history", Vec::new(), |s| s.history(owner, limit))
    }

    pub fn history_of_kind(&self, owner: &str, kind: HistoryKind, limit: u32) -> Vec<HistoryItem> {
        self.read("history_of_kind", Vec::new(), |s| {
            s.history_of_kind(owner, kind, limit)
        })
    }

    pub fn status_counts(&self, owner: &str) -> ScanStats {
        self.read("status_counts", ScanStats::default(), |s| {
            s.status_counts(owner)
        })
    }

    pub fn summary(&self, owner: &str) -> LedgerSummary {
        self.read("summary", LedgerSummary::empty(), |s| s.summary(owner))
    }
}
