//! Main store implementation.
//!
//! [`Store`] owns a live SQLite connection. Construction goes through
//! [`Store::try_connect`], which applies the bounded retry policy; the
//! degraded-mode behavior on exhaustion lives in [`crate::Db`].

use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{Connection, OptionalExtension, Row, params};
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use freshtrack_types::coerce::{
    ClipOutcome, DateOutcome, KindOutcome, MAX_THOUGHT_WORDS, clip_words, coerce_kind,
    parse_effective_date,
};
use freshtrack_types::{
    Freshness, NewBlogPost, NewCalendarEvent, NewImageResult, NewLedgerEntry, NewSensorReading,
    RecordId,
};

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::models::{
    BlogPost, CalendarEvent, ImageResult, LedgerEntry, Nh3Sample, Notification, SensorReading,
    Thought,
};
use crate::queries::RecordQuery;
use crate::schema;

/// SQLite-backed store for freshtrack records.
///
/// The connection is established once and only read thereafter; a mutex
/// serializes statement execution so the store can be shared across
/// request-handling threads.
pub struct Store {
    conn: Mutex<Connection>,
    pub(crate) cfg: StoreConfig,
}

impl Store {
    /// Connect with the configured retry budget.
    ///
    /// Each attempt opens the database (creating parent directories),
    /// applies the WAL and busy-timeout pragmas, runs a liveness probe
    /// and provisions the schema. Failed attempts are logged and retried
    /// after `retry_delay`; exhaustion yields
    /// [`Error::ConnectionFailed`]. There is no background reconnection
    /// afterwards.
    pub fn try_connect(cfg: StoreConfig) -> Result<Self> {
        let attempts = cfg.max_retries.max(1);
        for attempt in 1..=attempts {
            match Self::open_checked(&cfg) {
                Ok(store) => {
                    info!(
                        "Connected to {} on attempt {attempt}",
                        cfg.path.display()
                    );
                    return Ok(store);
                }
                Err(e) => {
                    warn!(
                        "Connection attempt {attempt}/{attempts} to {} failed: {e}",
                        cfg.path.display()
                    );
                    if attempt < attempts {
                        std::thread::sleep(cfg.retry_delay());
                    }
                }
            }
        }

        error!("Connection failed after {attempts} attempts");
        Err(Error::ConnectionFailed { attempts })
    }

    /// Like [`Store::try_connect`], collapsing exhaustion to `None`.
    pub fn connect(cfg: StoreConfig) -> Option<Self> {
        Self::try_connect(cfg).ok()
    }

    /// Open an in-memory database with default configuration (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::open_in_memory_with(StoreConfig::default())
    }

    /// Open an in-memory database with explicit configuration (for testing).
    pub fn open_in_memory_with(cfg: StoreConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::ensure_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            cfg,
        })
    }

    fn open_checked(cfg: &StoreConfig) -> Result<Self> {
        if let Some(parent) = cfg.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        debug!("Opening database at {}", cfg.path.display());
        let conn = Connection::open(&cfg.path)?;

        conn.execute_batch(&format!(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = {};",
            cfg.busy_timeout_ms
        ))?;

        // Liveness probe before any real work.
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;

        schema::ensure_schema(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            cfg: cfg.clone(),
        };
        store.purge_expired()?;
        Ok(store)
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn owner_or_default(&self, owner: Option<&str>) -> String {
        owner
            .map(str::to_string)
            .unwrap_or_else(|| self.cfg.default_owner.clone())
    }

    fn expiry_cutoff(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc() - self.cfg.retention()
    }

    /// Delete telemetry records older than the retention window.
    ///
    /// Only `sensor_readings` and `image_results` expire; user-authored
    /// content is never touched. Runs at connect time and lazily on
    /// every telemetry write.
    pub fn purge_expired(&self) -> Result<usize> {
        let cutoff = self.expiry_cutoff();
        let conn = self.conn();
        purge_expired_locked(&conn, cutoff)
    }
}

fn purge_expired_locked(conn: &Connection, cutoff: OffsetDateTime) -> Result<usize> {
    let cutoff = cutoff.unix_timestamp();
    let sensors = conn.execute(
        "DELETE FROM sensor_readings WHERE created_at < ?",
        [cutoff],
    )?;
    let images = conn.execute("DELETE FROM image_results WHERE created_at < ?", [cutoff])?;

    let purged = sensors + images;
    if purged > 0 {
        debug!("Purged {purged} expired telemetry records");
    }
    Ok(purged)
}

fn timestamp(secs: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(secs).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

fn record_id(raw: String) -> RecordId {
    raw.parse().unwrap_or_else(|_| RecordId::from_bytes([0; 12]))
}

// Row mappers, one per table, matching the SELECT column order below.

const SENSOR_COLUMNS: &str =
    "id, owner, device_id, nh3, rgb_r, rgb_g, rgb_b, counter, food, status, source, created_at";

fn map_sensor_reading(row: &Row<'_>) -> rusqlite::Result<SensorReading> {
    Ok(SensorReading {
        id: record_id(row.get(0)?),
        owner: row.get(1)?,
        device_id: row.get(2)?,
        nh3: row.get(3)?,
        rgb: [row.get(4)?, row.get(5)?, row.get(6)?],
        counter: row.get(7)?,
        food: row.get(8)?,
        status: row
            .get::<_, Option<String>>(9)?
            .map(|s| Freshness::parse(&s)),
        source: row.get(10)?,
        created_at: timestamp(row.get(11)?),
    })
}

const IMAGE_COLUMNS: &str = "id, owner, food, status, file_name, source, created_at";

fn map_image_result(row: &Row<'_>) -> rusqlite::Result<ImageResult> {
    Ok(ImageResult {
        id: record_id(row.get(0)?),
        owner: row.get(1)?,
        food: row.get(2)?,
        status: Freshness::parse(&row.get::<_, String>(3)?),
        file_name: row.get(4)?,
        source: row.get(5)?,
        created_at: timestamp(row.get(6)?),
    })
}

fn map_notification(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: record_id(row.get(0)?),
        owner: row.get(1)?,
        message: row.get(2)?,
        created_at: timestamp(row.get(3)?),
    })
}

fn map_calendar_event(row: &Row<'_>) -> rusqlite::Result<CalendarEvent> {
    Ok(CalendarEvent {
        id: record_id(row.get(0)?),
        owner: row.get(1)?,
        title: row.get(2)?,
        start: row.get(3)?,
        end: row.get(4)?,
        notes: row.get(5)?,
        created_at: timestamp(row.get(6)?),
    })
}

const BLOG_COLUMNS: &str =
    "id, owner, title, content, category, author, read_time, tags, image, created_at";

fn map_blog_post(row: &Row<'_>) -> rusqlite::Result<BlogPost> {
    let tags: String = row.get(7)?;
    Ok(BlogPost {
        id: record_id(row.get(0)?),
        owner: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        category: row.get(4)?,
        author: row.get(5)?,
        read_time: row.get(6)?,
        tags: serde_json::from_str(&tags).unwrap_or_default(),
        image: row.get(8)?,
        created_at: timestamp(row.get(9)?),
    })
}

const LEDGER_COLUMNS: &str = "id, owner, food, value, kind, effective_date, created_at";

fn map_ledger_entry(row: &Row<'_>) -> rusqlite::Result<LedgerEntry> {
    Ok(LedgerEntry {
        id: record_id(row.get(0)?),
        owner: row.get(1)?,
        food: row.get(2)?,
        value: row.get(3)?,
        kind: coerce_kind(&row.get::<_, String>(4)?).kind(),
        effective_date: timestamp(row.get(5)?),
        created_at: timestamp(row.get(6)?),
    })
}

fn map_thought(row: &Row<'_>) -> rusqlite::Result<Thought> {
    Ok(Thought {
        id: record_id(row.get(0)?),
        owner: row.get(1)?,
        text: row.get(2)?,
        created_at: timestamp(row.get(3)?),
    })
}

// Record writers. Each substitutes the default owner, stamps created_at
// unless the caller backfills one, and normalizes optionals to explicit
// NULL columns.
impl Store {
    /// Insert a gas-sensor reading.
    pub fn insert_sensor_reading(&self, new: &NewSensorReading) -> Result<RecordId> {
        let owner = self.owner_or_default(new.owner.as_deref());
        let created_at = new.created_at.unwrap_or_else(OffsetDateTime::now_utc);
        let id = RecordId::from_timestamp(created_at);
        let source = new.source.as_deref().unwrap_or("live");

        let conn = self.conn();
        purge_expired_locked(&conn, self.expiry_cutoff())?;
        conn.execute(
            "INSERT INTO sensor_readings (id, owner, device_id, nh3, rgb_r, rgb_g, rgb_b,
             counter, food, status, source, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                id.to_string(),
                owner,
                new.device_id,
                new.nh3,
                new.rgb[0],
                new.rgb[1],
                new.rgb[2],
                new.counter,
                new.food,
                new.status.as_ref().map(Freshness::as_str),
                source,
                created_at.unix_timestamp(),
            ],
        )?;

        debug!("Inserted sensor reading {id} for {owner}");
        Ok(id)
    }

    /// Insert an image-classification result.
    pub fn insert_image_result(&self, new: &NewImageResult) -> Result<RecordId> {
        let owner = self.owner_or_default(new.owner.as_deref());
        let created_at = new.created_at.unwrap_or_else(OffsetDateTime::now_utc);
        let id = RecordId::from_timestamp(created_at);
        let source = new.source.as_deref().unwrap_or("upload");

        let conn = self.conn();
        purge_expired_locked(&conn, self.expiry_cutoff())?;
        conn.execute(
            "INSERT INTO image_results (id, owner, food, status, file_name, source, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id.to_string(),
                owner,
                new.food,
                new.status.as_str(),
                new.file_name,
                source,
                created_at.unix_timestamp(),
            ],
        )?;

        debug!("Inserted image result {id} for {owner}");
        Ok(id)
    }

    /// Insert a notification message.
    pub fn insert_notification(&self, owner: Option<&str>, message: &str) -> Result<RecordId> {
        let owner = self.owner_or_default(owner);
        let created_at = OffsetDateTime::now_utc();
        let id = RecordId::from_timestamp(created_at);

        self.conn().execute(
            "INSERT INTO notifications (id, owner, message, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![id.to_string(), owner, message, created_at.unix_timestamp()],
        )?;

        Ok(id)
    }

    /// Insert a calendar event.
    pub fn insert_calendar_event(&self, new: &NewCalendarEvent) -> Result<RecordId> {
        let owner = self.owner_or_default(new.owner.as_deref());
        let created_at = OffsetDateTime::now_utc();
        let id = RecordId::from_timestamp(created_at);

        self.conn().execute(
            "INSERT INTO calendar_events (id, owner, title, start, end_marker, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id.to_string(),
                owner,
                new.title,
                new.start,
                new.end,
                new.notes,
                created_at.unix_timestamp(),
            ],
        )?;

        Ok(id)
    }

    /// Insert a blog post, filling the documented defaults.
    pub fn insert_blog_post(&self, new: &NewBlogPost) -> Result<RecordId> {
        let owner = self.owner_or_default(new.owner.as_deref());
        let created_at = new.created_at.unwrap_or_else(OffsetDateTime::now_utc);
        let id = RecordId::from_timestamp(created_at);
        let tags = serde_json::to_string(new.tags.as_deref().unwrap_or(&[]))?;

        self.conn().execute(
            "INSERT INTO blog_posts (id, owner, title, content, category, author,
             read_time, tags, image, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id.to_string(),
                owner,
                new.title,
                new.content,
                new.category.as_deref().unwrap_or("General"),
                new.author.as_deref().unwrap_or("Unknown"),
                new.read_time.as_deref().unwrap_or("—"),
                tags,
                new.image.as_deref().unwrap_or(""),
                created_at.unix_timestamp(),
            ],
        )?;

        Ok(id)
    }

    /// Insert a ledger entry.
    ///
    /// Unknown kinds coerce to `entry`; an unparsable effective date
    /// falls back to the current time. Both fallbacks are silent at this
    /// boundary.
    pub fn insert_ledger_entry(&self, new: &NewLedgerEntry) -> Result<RecordId> {
        let owner = self.owner_or_default(new.owner.as_deref());
        let now = OffsetDateTime::now_utc();
        let id = RecordId::from_timestamp(now);

        let kind = coerce_kind(&new.kind);
        if kind == KindOutcome::CoercedToEntry {
            debug!("Unknown ledger kind {:?}, storing as entry", new.kind);
        }
        let effective = parse_effective_date(&new.effective_date, now);
        if matches!(effective, DateOutcome::DefaultedToNow(_)) {
            debug!(
                "Unparsable effective date {:?}, storing as now",
                new.effective_date
            );
        }

        self.conn().execute(
            "INSERT INTO ledger_entries (id, owner, food, value, kind, effective_date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id.to_string(),
                owner,
                new.food,
                new.value,
                kind.kind().as_str(),
                effective.instant().unix_timestamp(),
                now.unix_timestamp(),
            ],
        )?;

        Ok(id)
    }

    /// Insert a free-text thought, clipped to the 60-word bound.
    pub fn insert_thought(&self, owner: Option<&str>, text: &str) -> Result<RecordId> {
        let owner = self.owner_or_default(owner);
        let created_at = OffsetDateTime::now_utc();
        let id = RecordId::from_timestamp(created_at);

        let clipped = clip_words(text, MAX_THOUGHT_WORDS);
        if matches!(clipped, ClipOutcome::Truncated(_)) {
            debug!("Thought truncated to {MAX_THOUGHT_WORDS} words");
        }

        self.conn().execute(
            "INSERT INTO thoughts (id, owner, text, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                id.to_string(),
                owner,
                clipped.into_text(),
                created_at.unix_timestamp(),
            ],
        )?;

        Ok(id)
    }
}

// Point lookups. A malformed identifier is "not found", never an error.
impl Store {
    fn lookup<T>(
        &self,
        id: &str,
        sql: &str,
        map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Option<T>> {
        let Ok(rid) = id.parse::<RecordId>() else {
            debug!("Point lookup with malformed id {id:?}");
            return Ok(None);
        };
        let conn = self.conn();
        let mut stmt = conn.prepare(sql)?;
        Ok(stmt.query_row([rid.to_string()], map).optional()?)
    }

    /// Fetch a sensor reading by identifier.
    pub fn get_sensor_reading(&self, id: &str) -> Result<Option<SensorReading>> {
        let sql = format!("SELECT {SENSOR_COLUMNS} FROM sensor_readings WHERE id = ?");
        self.lookup(id, &sql, map_sensor_reading)
    }

    /// Fetch an image result by identifier.
    pub fn get_image_result(&self, id: &str) -> Result<Option<ImageResult>> {
        let sql = format!("SELECT {IMAGE_COLUMNS} FROM image_results WHERE id = ?");
        self.lookup(id, &sql, map_image_result)
    }

    /// Fetch a notification by identifier.
    pub fn get_notification(&self, id: &str) -> Result<Option<Notification>> {
        self.lookup(
            id,
            "SELECT id, owner, message, created_at FROM notifications WHERE id = ?",
            map_notification,
        )
    }

    /// Fetch a calendar event by identifier.
    pub fn get_calendar_event(&self, id: &str) -> Result<Option<CalendarEvent>> {
        self.lookup(
            id,
            "SELECT id, owner, title, start, end_marker, notes, created_at
             FROM calendar_events WHERE id = ?",
            map_calendar_event,
        )
    }

    /// Fetch a blog post by identifier.
    pub fn get_blog_post(&self, id: &str) -> Result<Option<BlogPost>> {
        let sql = format!("SELECT {BLOG_COLUMNS} FROM blog_posts WHERE id = ?");
        self.lookup(id, &sql, map_blog_post)
    }

    /// Fetch a ledger entry by identifier.
    pub fn get_ledger_entry(&self, id: &str) -> Result<Option<LedgerEntry>> {
        let sql = format!("SELECT {LEDGER_COLUMNS} FROM ledger_entries WHERE id = ?");
        self.lookup(id, &sql, map_ledger_entry)
    }

    /// Fetch a thought by identifier.
    pub fn get_thought(&self, id: &str) -> Result<Option<Thought>> {
        self.lookup(
            id,
            "SELECT id, owner, text, created_at FROM thoughts WHERE id = ?",
            map_thought,
        )
    }
}

// List queries and latest-record shortcuts.
impl Store {
    fn list<T>(
        &self,
        query: &RecordQuery,
        columns: &str,
        table: &str,
        time_column: &str,
        map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        let (where_clause, params) = query.build_where(time_column);
        let mut sql = format!("SELECT {columns} FROM {table} {where_clause}");
        query.push_order_and_limit(&mut sql, time_column);

        debug!("Executing query: {sql}");
        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_ref.as_slice(), map)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// List sensor readings, newest first unless the query says otherwise.
    pub fn list_sensor_readings(&self, query: &RecordQuery) -> Result<Vec<SensorReading>> {
        self.list(
            query,
            SENSOR_COLUMNS,
            "sensor_readings",
            "created_at",
            map_sensor_reading,
        )
    }

    /// List image results.
    pub fn list_image_results(&self, query: &RecordQuery) -> Result<Vec<ImageResult>> {
        self.list(
            query,
            IMAGE_COLUMNS,
            "image_results",
            "created_at",
            map_image_result,
        )
    }

    /// List notifications.
    pub fn list_notifications(&self, query: &RecordQuery) -> Result<Vec<Notification>> {
        self.list(
            query,
            "id, owner, message, created_at",
            "notifications",
            "created_at",
            map_notification,
        )
    }

    /// List thoughts.
    pub fn list_thoughts(&self, query: &RecordQuery) -> Result<Vec<Thought>> {
        self.list(
            query,
            "id, owner, text, created_at",
            "thoughts",
            "created_at",
            map_thought,
        )
    }

    /// List ledger entries; the date range applies to the effective date.
    pub fn list_ledger_entries(&self, query: &RecordQuery) -> Result<Vec<LedgerEntry>> {
        self.list(
            query,
            LEDGER_COLUMNS,
            "ledger_entries",
            "effective_date",
            map_ledger_entry,
        )
    }

    /// List calendar events, ranging over the caller-supplied `start`
    /// marker (compared as strings, newest first).
    pub fn list_calendar_events(
        &self,
        owner: &str,
        start_from: Option<&str>,
        end_to: Option<&str>,
        limit: u32,
    ) -> Result<Vec<CalendarEvent>> {
        let mut conditions = vec!["owner = ?".to_string()];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(owner.to_string())];

        if let Some(from) = start_from {
            conditions.push("start >= ?".to_string());
            params.push(Box::new(from.to_string()));
        }
        if let Some(to) = end_to {
            conditions.push("start <= ?".to_string());
            params.push(Box::new(to.to_string()));
        }

        let sql = format!(
            "SELECT id, owner, title, start, end_marker, notes, created_at
             FROM calendar_events WHERE {} ORDER BY start DESC LIMIT {limit}",
            conditions.join(" AND ")
        );
        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_ref.as_slice(), map_calendar_event)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// List blog posts visible to `owner`: their own plus legacy posts
    /// that predate ownership.
    pub fn list_blog_posts(&self, owner: &str, limit: u32) -> Result<Vec<BlogPost>> {
        let sql = format!(
            "SELECT {BLOG_COLUMNS} FROM blog_posts
             WHERE owner = ?1 OR owner IS NULL
             ORDER BY created_at DESC, id DESC LIMIT {limit}"
        );
        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([owner], map_blog_post)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// The newest sensor reading for an owner.
    pub fn latest_sensor_reading(&self, owner: &str) -> Result<Option<SensorReading>> {
        let query = RecordQuery::new().owner(owner).limit(1);
        Ok(self.list_sensor_readings(&query)?.pop())
    }

    /// The newest image result for an owner.
    pub fn latest_image_result(&self, owner: &str) -> Result<Option<ImageResult>> {
        let query = RecordQuery::new().owner(owner).limit(1);
        Ok(self.list_image_results(&query)?.pop())
    }

    /// The newest gas reading, projected for the live dashboard.
    pub fn latest_nh3(&self, owner: &str) -> Result<Option<Nh3Sample>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT nh3, created_at FROM sensor_readings
             WHERE owner = ? ORDER BY created_at DESC, id DESC LIMIT 1",
        )?;
        let sample = stmt
            .query_row([owner], |row| {
                Ok(Nh3Sample {
                    nh3: row.get(0)?,
                    created_at: timestamp(row.get(1)?),
                })
            })
            .optional()?;
        Ok(sample)
    }

    /// Full-text search over an owner's thoughts.
    pub fn search_thoughts(&self, owner: &str, needle: &str, limit: u32) -> Result<Vec<Thought>> {
        let sql = format!(
            "SELECT t.id, t.owner, t.text, t.created_at
             FROM thoughts_fts JOIN thoughts t ON t.rowid = thoughts_fts.rowid
             WHERE thoughts_fts MATCH ?1 AND t.owner = ?2
             ORDER BY t.created_at DESC LIMIT {limit}"
        );
        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![needle, owner], map_thought)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

// Deletes.
impl Store {
    /// Delete a calendar event. Scoped to the owner: another owner's
    /// identifier deletes nothing.
    pub fn delete_calendar_event(&self, owner: &str, id: &str) -> Result<bool> {
        let Ok(rid) = id.parse::<RecordId>() else {
            return Ok(false);
        };
        let deleted = self.conn().execute(
            "DELETE FROM calendar_events WHERE id = ?1 AND owner = ?2",
            params![rid.to_string(), owner],
        )?;
        Ok(deleted > 0)
    }

    /// Delete a blog post by identifier.
    ///
    /// Deliberately not owner-scoped: posts are treated as shared,
    /// curated content, matching the read path's owner-or-absent filter.
    pub fn delete_blog_post(&self, id: &str) -> Result<bool> {
        let Ok(rid) = id.parse::<RecordId>() else {
            return Ok(false);
        };
        let deleted = self
            .conn()
            .execute("DELETE FROM blog_posts WHERE id = ?", [rid.to_string()])?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn test_store() -> Store {
        let cfg = StoreConfig {
            default_owner: "chamika".to_string(),
            ..StoreConfig::default()
        };
        Store::open_in_memory_with(cfg).unwrap()
    }

    // Base instant for backfilled telemetry. Fixtures must sit inside
    // the retention window or the lazy purge on the next write removes
    // them. Truncated to whole seconds to match storage precision.
    fn recent_base() -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        OffsetDateTime::from_unix_timestamp(now.unix_timestamp()).unwrap()
    }

    fn sensor_input(owner: Option<&str>, at: Option<OffsetDateTime>) -> NewSensorReading {
        NewSensorReading {
            owner: owner.map(str::to_string),
            device_id: Some("esp32-1".to_string()),
            nh3: 0.42,
            rgb: [120, 200, 80],
            counter: 7,
            food: Some("Tomato".to_string()),
            status: Some(Freshness::Fresh),
            source: None,
            created_at: at,
        }
    }

    #[test]
    fn test_insert_sensor_reading_resolves_by_id() {
        let store = test_store();
        let at = recent_base() - time::Duration::hours(2);

        let id = store
            .insert_sensor_reading(&sensor_input(Some("alice"), Some(at)))
            .unwrap();
        let reading = store.get_sensor_reading(&id.to_string()).unwrap().unwrap();

        assert_eq!(reading.id, id);
        assert_eq!(reading.owner, "alice");
        assert_eq!(reading.created_at, at);
        assert_eq!(reading.rgb, [120, 200, 80]);
        assert_eq!(reading.status, Some(Freshness::Fresh));
        assert_eq!(reading.source, "live");
    }

    #[test]
    fn test_insert_substitutes_default_owner_and_now() {
        let store = test_store();
        let before = OffsetDateTime::now_utc();

        let id = store.insert_sensor_reading(&sensor_input(None, None)).unwrap();
        let reading = store.get_sensor_reading(&id.to_string()).unwrap().unwrap();

        assert_eq!(reading.owner, "chamika");
        assert!(reading.created_at >= before - time::Duration::seconds(1));
        assert!(reading.created_at <= OffsetDateTime::now_utc());
    }

    #[test]
    fn test_insert_image_result_resolves_by_id() {
        let store = test_store();
        let at = recent_base() - time::Duration::hours(1);

        let id = store
            .insert_image_result(&NewImageResult {
                owner: Some("alice".to_string()),
                food: "Banana".to_string(),
                status: Freshness::Spoiled,
                file_name: "scan-01.jpg".to_string(),
                source: None,
                created_at: Some(at),
            })
            .unwrap();

        let result = store.get_image_result(&id.to_string()).unwrap().unwrap();
        assert_eq!(result.owner, "alice");
        assert_eq!(result.status, Freshness::Spoiled);
        assert_eq!(result.source, "upload");
        assert_eq!(result.created_at, at);
    }

    #[test]
    fn test_insert_notification_and_thought() {
        let store = test_store();

        let nid = store.insert_notification(None, "Milk is spoiling").unwrap();
        let notification = store.get_notification(&nid.to_string()).unwrap().unwrap();
        assert_eq!(notification.owner, "chamika");
        assert_eq!(notification.message, "Milk is spoiling");

        let tid = store.insert_thought(Some("bob"), "buy bread tomorrow").unwrap();
        let thought = store.get_thought(&tid.to_string()).unwrap().unwrap();
        assert_eq!(thought.owner, "bob");
        assert_eq!(thought.text, "buy bread tomorrow");
    }

    #[test]
    fn test_thought_over_sixty_words_is_clipped() {
        let store = test_store();
        let long: Vec<String> = (0..75).map(|i| format!("w{i}")).collect();

        let id = store.insert_thought(None, &long.join(" ")).unwrap();
        let thought = store.get_thought(&id.to_string()).unwrap().unwrap();

        assert_eq!(thought.text.split_whitespace().count(), 60);
        assert!(thought.text.ends_with("w59"));
    }

    #[test]
    fn test_blog_post_defaults() {
        let store = test_store();

        let id = store
            .insert_blog_post(&NewBlogPost {
                owner: None,
                title: "Keeping herbs fresh".to_string(),
                content: "Wrap them in a damp towel.".to_string(),
                category: None,
                author: None,
                read_time: None,
                tags: None,
                image: None,
                created_at: None,
            })
            .unwrap();

        let post = store.get_blog_post(&id.to_string()).unwrap().unwrap();
        assert_eq!(post.category, "General");
        assert_eq!(post.author, "Unknown");
        assert!(post.tags.is_empty());
        assert_eq!(post.image, "");
        assert_eq!(post.owner, Some("chamika".to_string()));
    }

    #[test]
    fn test_blog_post_tags_roundtrip() {
        let store = test_store();

        let id = store
            .insert_blog_post(&NewBlogPost {
                owner: Some("alice".to_string()),
                title: "t".to_string(),
                content: "c".to_string(),
                category: Some("Storage".to_string()),
                author: Some("Alice".to_string()),
                read_time: Some("3 min".to_string()),
                tags: Some(vec!["herbs".to_string(), "fridge".to_string()]),
                image: Some("herbs.png".to_string()),
                created_at: None,
            })
            .unwrap();

        let post = store.get_blog_post(&id.to_string()).unwrap().unwrap();
        assert_eq!(post.tags, vec!["herbs".to_string(), "fridge".to_string()]);
        assert_eq!(post.category, "Storage");
    }

    #[test]
    fn test_ledger_entry_kind_coercion_and_date_fallback() {
        let store = test_store();

        let id = store
            .insert_ledger_entry(&NewLedgerEntry {
                owner: Some("alice".to_string()),
                food: "Cheese".to_string(),
                value: 12.5,
                kind: "refund".to_string(),
                effective_date: "whenever".to_string(),
            })
            .unwrap();

        let entry = store.get_ledger_entry(&id.to_string()).unwrap().unwrap();
        assert_eq!(entry.kind, freshtrack_types::EntryKind::Entry);
        // Unparsable date fell back to "now", which equals created_at to
        // second precision.
        assert_eq!(entry.effective_date, entry.created_at);
    }

    #[test]
    fn test_ledger_entry_parses_effective_date() {
        let store = test_store();

        let id = store
            .insert_ledger_entry(&NewLedgerEntry {
                owner: Some("alice".to_string()),
                food: "Rice".to_string(),
                value: 4.2,
                kind: "bonus".to_string(),
                effective_date: "2024-01-20T00:00:00Z".to_string(),
            })
            .unwrap();

        let entry = store.get_ledger_entry(&id.to_string()).unwrap().unwrap();
        assert_eq!(entry.kind, freshtrack_types::EntryKind::Bonus);
        assert_eq!(entry.effective_date, datetime!(2024-01-20 00:00:00 UTC));
    }

    #[test]
    fn test_malformed_id_is_not_found() {
        let store = test_store();
        assert!(store.get_sensor_reading("garbage").unwrap().is_none());
        assert!(store.get_blog_post("").unwrap().is_none());
        assert!(store.get_thought("1234").unwrap().is_none());
        assert!(!store.delete_blog_post("garbage").unwrap());
        assert!(!store.delete_calendar_event("alice", "garbage").unwrap());
    }

    #[test]
    fn test_calendar_delete_is_owner_scoped() {
        let store = test_store();

        let id = store
            .insert_calendar_event(&NewCalendarEvent {
                owner: Some("alice".to_string()),
                title: "Market run".to_string(),
                start: "2024-06-01T09:00".to_string(),
                end: None,
                notes: Some("buy basil".to_string()),
            })
            .unwrap();

        assert!(!store.delete_calendar_event("mallory", &id.to_string()).unwrap());
        assert!(store.get_calendar_event(&id.to_string()).unwrap().is_some());

        assert!(store.delete_calendar_event("alice", &id.to_string()).unwrap());
        assert!(store.get_calendar_event(&id.to_string()).unwrap().is_none());
    }

    #[test]
    fn test_blog_delete_has_no_owner_check() {
        let store = test_store();

        let id = store
            .insert_blog_post(&NewBlogPost {
                owner: Some("alice".to_string()),
                title: "t".to_string(),
                content: "c".to_string(),
                category: None,
                author: None,
                read_time: None,
                tags: None,
                image: None,
                created_at: None,
            })
            .unwrap();

        // Any caller may delete: posts are shared content.
        assert!(store.delete_blog_post(&id.to_string()).unwrap());
        assert!(store.get_blog_post(&id.to_string()).unwrap().is_none());
    }

    #[test]
    fn test_blog_list_includes_legacy_ownerless_posts() {
        let store = test_store();

        store
            .insert_blog_post(&NewBlogPost {
                owner: Some("alice".to_string()),
                title: "mine".to_string(),
                content: "c".to_string(),
                category: None,
                author: None,
                read_time: None,
                tags: None,
                image: None,
                created_at: None,
            })
            .unwrap();

        // Simulate a legacy row written before ownership existed.
        store
            .conn()
            .execute(
                "INSERT INTO blog_posts (id, owner, title, content, category, author,
                 read_time, tags, image, created_at)
                 VALUES (?1, NULL, 'legacy', 'c', 'General', 'Unknown', '—', '[]', '', ?2)",
                params![RecordId::new().to_string(), 1_600_000_000_i64],
            )
            .unwrap();

        let visible = store.list_blog_posts("alice", 10).unwrap();
        assert_eq!(visible.len(), 2);

        let for_other = store.list_blog_posts("bob", 10).unwrap();
        assert_eq!(for_other.len(), 1);
        assert_eq!(for_other[0].title, "legacy");
        assert!(for_other[0].owner.is_none());
    }

    #[test]
    fn test_list_range_is_inclusive() {
        let store = test_store();
        let base = recent_base();
        for h in [30, 20, 10] {
            let at = base - time::Duration::hours(h);
            store
                .insert_sensor_reading(&sensor_input(Some("alice"), Some(at)))
                .unwrap();
        }

        // Both bounds land exactly on stored rows.
        let query = RecordQuery::new()
            .owner("alice")
            .since(base - time::Duration::hours(20))
            .until(base - time::Duration::hours(10));
        let readings = store.list_sensor_readings(&query).unwrap();

        assert_eq!(readings.len(), 2);
        // Newest first.
        assert!(readings[0].created_at > readings[1].created_at);
    }

    #[test]
    fn test_calendar_range_compares_start_strings() {
        let store = test_store();
        for (title, start) in [
            ("early", "2024-06-01T09:00"),
            ("mid", "2024-06-10T09:00"),
            ("late", "2024-06-20T09:00"),
        ] {
            store
                .insert_calendar_event(&NewCalendarEvent {
                    owner: Some("alice".to_string()),
                    title: title.to_string(),
                    start: start.to_string(),
                    end: None,
                    notes: None,
                })
                .unwrap();
        }

        let events = store
            .list_calendar_events(
                "alice",
                Some("2024-06-05"),
                Some("2024-06-15"),
                100,
            )
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "mid");
    }

    #[test]
    fn test_latest_shortcuts() {
        let store = test_store();
        let base = recent_base();
        let mut older = sensor_input(Some("alice"), Some(base - time::Duration::hours(2)));
        older.nh3 = 0.1;
        let mut newer = sensor_input(Some("alice"), Some(base - time::Duration::hours(1)));
        newer.nh3 = 0.9;

        store.insert_sensor_reading(&older).unwrap();
        store.insert_sensor_reading(&newer).unwrap();

        let latest = store.latest_sensor_reading("alice").unwrap().unwrap();
        assert_eq!(latest.nh3, 0.9);

        let sample = store.latest_nh3("alice").unwrap().unwrap();
        assert_eq!(sample.nh3, 0.9);
        assert_eq!(sample.created_at, base - time::Duration::hours(1));

        assert!(store.latest_image_result("alice").unwrap().is_none());
    }

    #[test]
    fn test_purge_expired_spares_user_content() {
        let cfg = StoreConfig {
            retention_secs: 3600,
            ..StoreConfig::default()
        };
        let store = Store::open_in_memory_with(cfg).unwrap();

        let stale = OffsetDateTime::now_utc() - time::Duration::hours(2);
        store
            .insert_sensor_reading(&sensor_input(Some("alice"), Some(stale)))
            .unwrap();
        let note_id = store.insert_notification(Some("alice"), "keep me").unwrap();

        let purged = store.purge_expired().unwrap();
        assert_eq!(purged, 1);

        let query = RecordQuery::new().owner("alice");
        assert!(store.list_sensor_readings(&query).unwrap().is_empty());
        assert!(store.get_notification(&note_id.to_string()).unwrap().is_some());
    }

    #[test]
    fn test_telemetry_writes_purge_lazily() {
        let cfg = StoreConfig {
            retention_secs: 3600,
            ..StoreConfig::default()
        };
        let store = Store::open_in_memory_with(cfg).unwrap();

        let stale = OffsetDateTime::now_utc() - time::Duration::hours(2);
        store
            .insert_sensor_reading(&sensor_input(Some("alice"), Some(stale)))
            .unwrap();
        // A fresh write sweeps the stale row out.
        store
            .insert_sensor_reading(&sensor_input(Some("alice"), None))
            .unwrap();

        let readings = store
            .list_sensor_readings(&RecordQuery::new().owner("alice"))
            .unwrap();
        assert_eq!(readings.len(), 1);
    }

    #[test]
    fn test_search_thoughts() {
        let store = test_store();
        store.insert_thought(Some("alice"), "buy fresh basil").unwrap();
        store.insert_thought(Some("alice"), "water the garden").unwrap();
        store.insert_thought(Some("bob"), "basil pesto tonight").unwrap();

        let hits = store.search_thoughts("alice", "basil", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "buy fresh basil");
    }

    #[test]
    fn test_try_connect_gives_up_after_retries() {
        let file = tempfile::NamedTempFile::new().unwrap();
        // A path underneath a regular file can never be created.
        let cfg = StoreConfig {
            path: file.path().join("nested").join("data.db"),
            max_retries: 2,
            retry_delay_secs: 0,
            ..StoreConfig::default()
        };

        let result = Store::try_connect(cfg);
        assert!(matches!(
            result,
            Err(Error::ConnectionFailed { attempts: 2 })
        ));
    }

    #[test]
    fn test_connect_on_disk_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = StoreConfig {
            path: dir.path().join("data.db"),
            max_retries: 1,
            ..StoreConfig::default()
        };

        let store = Store::try_connect(cfg).unwrap();
        let id = store.insert_notification(Some("alice"), "hello").unwrap();
        assert!(store.get_notification(&id.to_string()).unwrap().is_some());
    }
}
