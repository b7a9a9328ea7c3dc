//! Schema and index provisioning.
//!
//! Provisioning is idempotent and race-tolerant: every statement uses
//! `IF NOT EXISTS`, and each index is created in its own fault-isolated
//! step. Queries must stay correct without any secondary index, so a
//! failed index creation is logged and skipped, never fatal. Running
//! provisioning concurrently from several processes is safe.

use rusqlite::Connection;
use tracing::{debug, warn};

use crate::error::Result;

/// The seven record tables, created if absent.
const TABLES: &[(&str, &str)] = &[
    (
        "sensor_readings",
        "CREATE TABLE IF NOT EXISTS sensor_readings (
            id TEXT PRIMARY KEY,
            owner TEXT NOT NULL,
            device_id TEXT,
            nh3 REAL NOT NULL,
            rgb_r INTEGER NOT NULL,
            rgb_g INTEGER NOT NULL,
            rgb_b INTEGER NOT NULL,
            counter INTEGER NOT NULL,
            food TEXT,
            status TEXT,
            source TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )",
    ),
    (
        "image_results",
        "CREATE TABLE IF NOT EXISTS image_results (
            id TEXT PRIMARY KEY,
            owner TEXT NOT NULL,
            food TEXT NOT NULL,
            status TEXT NOT NULL,
            file_name TEXT NOT NULL,
            source TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )",
    ),
    (
        "notifications",
        "CREATE TABLE IF NOT EXISTS notifications (
            id TEXT PRIMARY KEY,
            owner TEXT NOT NULL,
            message TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )",
    ),
    (
        "calendar_events",
        "CREATE TABLE IF NOT EXISTS calendar_events (
            id TEXT PRIMARY KEY,
            owner TEXT NOT NULL,
            title TEXT NOT NULL,
            start TEXT NOT NULL,
            end_marker TEXT,
            notes TEXT,
            created_at INTEGER NOT NULL
        )",
    ),
    (
        // owner is nullable: legacy posts predate ownership and stay
        // readable by every caller.
        "blog_posts",
        "CREATE TABLE IF NOT EXISTS blog_posts (
            id TEXT PRIMARY KEY,
            owner TEXT,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            category TEXT NOT NULL,
            author TEXT NOT NULL,
            read_time TEXT NOT NULL,
            tags TEXT NOT NULL,
            image TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )",
    ),
    (
        "ledger_entries",
        "CREATE TABLE IF NOT EXISTS ledger_entries (
            id TEXT PRIMARY KEY,
            owner TEXT NOT NULL,
            food TEXT NOT NULL,
            value REAL NOT NULL,
            kind TEXT NOT NULL,
            effective_date INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        )",
    ),
    (
        "thoughts",
        "CREATE TABLE IF NOT EXISTS thoughts (
            id TEXT PRIMARY KEY,
            owner TEXT NOT NULL,
            text TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )",
    ),
];

/// Secondary indexes matching the query engine's access patterns.
///
/// The two `*_expiry` indexes order the telemetry tables by bare
/// `created_at` so the retention purge scans cheaply.
const INDEXES: &[(&str, &str)] = &[
    (
        "idx_sensor_owner_time",
        "CREATE INDEX IF NOT EXISTS idx_sensor_owner_time
            ON sensor_readings(owner, created_at DESC)",
    ),
    (
        "idx_image_owner_time",
        "CREATE INDEX IF NOT EXISTS idx_image_owner_time
            ON image_results(owner, created_at DESC)",
    ),
    (
        "idx_notification_owner_time",
        "CREATE INDEX IF NOT EXISTS idx_notification_owner_time
            ON notifications(owner, created_at DESC)",
    ),
    (
        "idx_calendar_owner_start",
        "CREATE INDEX IF NOT EXISTS idx_calendar_owner_start
            ON calendar_events(owner, start DESC)",
    ),
    (
        "idx_blog_owner_time",
        "CREATE INDEX IF NOT EXISTS idx_blog_owner_time
            ON blog_posts(owner, created_at DESC)",
    ),
    (
        "idx_ledger_owner_date",
        "CREATE INDEX IF NOT EXISTS idx_ledger_owner_date
            ON ledger_entries(owner, effective_date DESC)",
    ),
    (
        "idx_thought_owner_time",
        "CREATE INDEX IF NOT EXISTS idx_thought_owner_time
            ON thoughts(owner, created_at DESC)",
    ),
    (
        "idx_sensor_status",
        "CREATE INDEX IF NOT EXISTS idx_sensor_status ON sensor_readings(status)",
    ),
    (
        "idx_image_status",
        "CREATE INDEX IF NOT EXISTS idx_image_status ON image_results(status)",
    ),
    (
        "idx_blog_title",
        "CREATE INDEX IF NOT EXISTS idx_blog_title ON blog_posts(title)",
    ),
    (
        "idx_blog_category",
        "CREATE INDEX IF NOT EXISTS idx_blog_category ON blog_posts(category)",
    ),
    (
        "idx_blog_tags",
        "CREATE INDEX IF NOT EXISTS idx_blog_tags ON blog_posts(tags)",
    ),
    (
        "idx_ledger_kind",
        "CREATE INDEX IF NOT EXISTS idx_ledger_kind ON ledger_entries(kind)",
    ),
    (
        "idx_sensor_expiry",
        "CREATE INDEX IF NOT EXISTS idx_sensor_expiry ON sensor_readings(created_at)",
    ),
    (
        "idx_image_expiry",
        "CREATE INDEX IF NOT EXISTS idx_image_expiry ON image_results(created_at)",
    ),
];

/// Ensure all tables, indexes and the thought full-text index exist.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    for (name, ddl) in TABLES {
        match conn.execute(ddl, []) {
            Ok(_) => debug!("Ensured table {name}"),
            Err(e) => warn!("Could not ensure table {name}: {e}"),
        }
    }

    for (name, ddl) in INDEXES {
        if let Err(e) = conn.execute(ddl, []) {
            warn!("Could not create index {name}: {e}");
        }
    }

    ensure_thought_search(conn);

    Ok(())
}

/// Full-text index over `thoughts.text` (FTS5, maintained by trigger).
///
/// Thoughts are append-only, so a single insert trigger keeps the index
/// current. Wrapped separately because FTS5 may be unavailable in some
/// SQLite builds; search then degrades to an empty result.
fn ensure_thought_search(conn: &Connection) {
    let result = conn.execute_batch(
        "CREATE VIRTUAL TABLE IF NOT EXISTS thoughts_fts
            USING fts5(text, content='thoughts', content_rowid='rowid');
         CREATE TRIGGER IF NOT EXISTS thoughts_fts_insert
            AFTER INSERT ON thoughts BEGIN
                INSERT INTO thoughts_fts(rowid, text) VALUES (new.rowid, new.text);
            END;",
    );
    if let Err(e) = result {
        warn!("Could not create thought full-text index: {e}");
    }
}
