//! Unified scan history across the two telemetry tables.
//!
//! Sensor readings and image results live in separate tables but share a
//! timeline. The merged view projects both into [`HistoryItem`] so the
//! dashboard renders one chronological feed.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use freshtrack_types::{Freshness, RecordId};

use crate::error::Result;
use crate::models::{ImageResult, SensorReading};
use crate::queries::RecordQuery;
use crate::store::Store;

/// Which telemetry table a history item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Sensor,
    Image,
}

/// One entry in the merged scan history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: RecordId,
    #[serde(rename = "type")]
    pub kind: HistoryKind,
    pub food: Option<String>,
    pub status: Option<Freshness>,
    /// Present for sensor items only.
    pub nh3: Option<f64>,
    /// Present for sensor items only.
    pub rgb: Option<[u32; 3]>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl HistoryItem {
    fn from_sensor(reading: SensorReading) -> Self {
        Self {
            id: reading.id,
            kind: HistoryKind::Sensor,
            food: reading.food,
            status: reading.status,
            nh3: Some(reading.nh3),
            rgb: Some(reading.rgb),
            created_at: reading.created_at,
        }
    }

    fn from_image(result: ImageResult) -> Self {
        Self {
            id: result.id,
            kind: HistoryKind::Image,
            food: Some(result.food),
            status: Some(result.status),
            nh3: None,
            rgb: None,
            created_at: result.created_at,
        }
    }
}

/// Freshness tallies over an owner's labelled scans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// `fresh + spoiled`; unlabelled rows are not counted.
    pub total: u64,
    pub fresh: u64,
    pub spoiled: u64,
}

impl Store {
    /// The merged scan history for an owner, newest first, capped at
    /// `limit` items across both sources.
    pub fn history(&self, owner: &str, limit: u32) -> Result<Vec<HistoryItem>> {
        let query = RecordQuery::new().owner(owner).limit(limit);
        let sensors = self.list_sensor_readings(&query)?;
        let images = self.list_image_results(&query)?;

        let mut items: Vec<HistoryItem> = sensors
            .into_iter()
            .map(HistoryItem::from_sensor)
            .chain(images.into_iter().map(HistoryItem::from_image))
            .collect();

        // Each source is sorted on its own, but concatenation interleaves
        // arbitrarily across sources; the merged list must be re-sorted
        // before the cap is applied.
        items.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        items.truncate(limit as usize);
        Ok(items)
    }

    /// The merged history filtered to one source.
    ///
    /// The filter applies after the global cap, so the result shows that
    /// source's share of the most recent `limit` scans.
    pub fn history_of_kind(
        &self,
        owner: &str,
        kind: HistoryKind,
        limit: u32,
    ) -> Result<Vec<HistoryItem>> {
        let items = self.history(owner, limit)?;
        Ok(items.into_iter().filter(|item| item.kind == kind).collect())
    }

    /// Count an owner's labelled scans across both telemetry tables.
    ///
    /// Only rows carrying a freshness label count; `total` is the sum of
    /// the fresh and spoiled tallies, so unlabelled sensor rows do not
    /// inflate it.
    pub fn status_counts(&self, owner: &str) -> Result<ScanStats> {
        let conn = self.conn();

        let status_of = |table: &str, status: &str| -> Result<u64> {
            let sql = format!("SELECT COUNT(*) FROM {table} WHERE owner = ?1 AND status = ?2");
            Ok(conn.query_row(&sql, rusqlite::params![owner, status], |row| {
                row.get::<_, i64>(0)
            })? as u64)
        };

        let mut stats = ScanStats::default();
        for table in ["sensor_readings", "image_results"] {
            stats.fresh += status_of(table, Freshness::Fresh.as_str())?;
            stats.spoiled += status_of(table, Freshness::Spoiled.as_str())?;
        }
        stats.total = stats.fresh + stats.spoiled;
        Ok(stats)
    }
}
