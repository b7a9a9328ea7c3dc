//! Month-to-date ledger aggregation.

use serde::{Deserialize, Serialize};
use time::{Date, Month, OffsetDateTime};

use freshtrack_types::EntryKind;

use crate::error::{Error, Result};
use crate::store::Store;

/// Aggregated view of the current calendar month's ledger.
///
/// Monetary fields are rounded to two decimals here, at the output
/// boundary; stored values keep full precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSummary {
    /// Food name of the most recent entry in the window.
    pub latest_item: Option<String>,
    /// Sum of `entry` values.
    pub total_cost: f64,
    /// Sum of `bonus` values (typically negative).
    pub total_bonus: f64,
    /// `total_cost + total_bonus`.
    pub net_amount: f64,
    /// Effective date of the most recent entry in the window.
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_updated: Option<OffsetDateTime>,
    /// First instant of the month.
    #[serde(with = "time::serde::rfc3339::option")]
    pub period_start: Option<OffsetDateTime>,
    /// Whole days left until the month rolls over.
    pub remaining_days: Option<i64>,
}

impl LedgerSummary {
    /// The all-zero shape returned when no store is reachable.
    pub fn empty() -> Self {
        Self {
            latest_item: None,
            total_cost: 0.0,
            total_bonus: 0.0,
            net_amount: 0.0,
            last_updated: None,
            period_start: None,
            remaining_days: None,
        }
    }
}

/// The half-open window `[first of this month, first of next month)`.
pub(crate) fn month_window(now: OffsetDateTime) -> Result<(OffsetDateTime, OffsetDateTime)> {
    let first_of = |year: i32, month: Month| -> Result<OffsetDateTime> {
        Date::from_calendar_date(year, month, 1)
            .map(|d| d.midnight().assume_utc())
            .map_err(|e| Error::InvalidTimestamp(e.to_string()))
    };

    let start = first_of(now.year(), now.month())?;
    let end = match now.month() {
        Month::December => first_of(now.year() + 1, Month::January)?,
        month => first_of(now.year(), month.next())?,
    };
    Ok((start, end))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl Store {
    /// The ledger summary for the month containing the current instant.
    pub fn summary(&self, owner: &str) -> Result<LedgerSummary> {
        self.summary_at(owner, OffsetDateTime::now_utc())
    }

    /// The ledger summary for the month containing `now`.
    ///
    /// Aggregation is a pure read: calling it repeatedly over the same
    /// rows yields the same summary.
    pub fn summary_at(&self, owner: &str, now: OffsetDateTime) -> Result<LedgerSummary> {
        let (period_start, period_end) = month_window(now)?;

        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT food, value, kind, effective_date FROM ledger_entries
             WHERE owner = ?1 AND effective_date >= ?2 AND effective_date < ?3
             ORDER BY effective_date DESC, id DESC",
        )?;
        let rows = stmt.query_map(
            rusqlite::params![
                owner,
                period_start.unix_timestamp(),
                period_end.unix_timestamp(),
            ],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            },
        )?;

        let mut total_cost = 0.0;
        let mut total_bonus = 0.0;
        let mut latest_item = None;
        let mut last_updated = None;

        for (i, row) in rows.enumerate() {
            let (food, value, kind, effective) = row?;
            if kind == EntryKind::Bonus.as_str() {
                total_bonus += value;
            } else {
                total_cost += value;
            }
            if i == 0 {
                latest_item = Some(food);
                last_updated = OffsetDateTime::from_unix_timestamp(effective).ok();
            }
        }

        let remaining_days = (period_end.date() - now.date()).whole_days();

        Ok(LedgerSummary {
            latest_item,
            total_cost: round2(total_cost),
            total_bonus: round2(total_bonus),
            net_amount: round2(total_cost + total_bonus),
            last_updated,
            period_start: Some(period_start),
            remaining_days: Some(remaining_days),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freshtrack_types::NewLedgerEntry;
    use time::macros::datetime;

    fn entry(owner: &str, food: &str, value: f64, kind: &str, date: &str) -> NewLedgerEntry {
        NewLedgerEntry {
            owner: Some(owner.to_string()),
            food: food.to_string(),
            value,
            kind: kind.to_string(),
            effective_date: date.to_string(),
        }
    }

    #[test]
    fn test_month_window_mid_year() {
        let (start, end) = month_window(datetime!(2024-05-17 08:30:00 UTC)).unwrap();
        assert_eq!(start, datetime!(2024-05-01 00:00:00 UTC));
        assert_eq!(end, datetime!(2024-06-01 00:00:00 UTC));
    }

    #[test]
    fn test_month_window_december_rolls_into_next_year() {
        let (start, end) = month_window(datetime!(2024-12-20 15:00:00 UTC)).unwrap();
        assert_eq!(start, datetime!(2024-12-01 00:00:00 UTC));
        assert_eq!(end, datetime!(2025-01-01 00:00:00 UTC));
    }

    #[test]
    fn test_summary_month_to_date() {
        let store = Store::open_in_memory().unwrap();
        store
            .insert_ledger_entry(&entry("alice", "Milk", 20.0, "entry", "2024-01-15"))
            .unwrap();
        store
            .insert_ledger_entry(&entry("alice", "Coupon", -5.0, "bonus", "2024-01-20"))
            .unwrap();
        // Next month, outside the window.
        store
            .insert_ledger_entry(&entry("alice", "Cheese", 99.0, "entry", "2024-02-01"))
            .unwrap();

        let summary = store
            .summary_at("alice", datetime!(2024-01-25 12:00:00 UTC))
            .unwrap();

        assert_eq!(summary.total_cost, 20.0);
        assert_eq!(summary.total_bonus, -5.0);
        assert_eq!(summary.net_amount, 15.0);
        assert_eq!(summary.latest_item, Some("Coupon".to_string()));
        assert_eq!(
            summary.last_updated,
            Some(datetime!(2024-01-20 00:00:00 UTC))
        );
        assert_eq!(
            summary.period_start,
            Some(datetime!(2024-01-01 00:00:00 UTC))
        );
        // Jan 25 to Feb 1.
        assert_eq!(summary.remaining_days, Some(7));
    }

    #[test]
    fn test_summary_december_remaining_days() {
        let store = Store::open_in_memory().unwrap();
        store
            .insert_ledger_entry(&entry("alice", "Ham", 30.0, "entry", "2024-12-05"))
            .unwrap();

        let summary = store
            .summary_at("alice", datetime!(2024-12-20 09:00:00 UTC))
            .unwrap();

        assert_eq!(summary.total_cost, 30.0);
        // Dec 20 to Jan 1.
        assert_eq!(summary.remaining_days, Some(12));
    }

    #[test]
    fn test_summary_rounds_at_the_boundary() {
        let store = Store::open_in_memory().unwrap();
        store
            .insert_ledger_entry(&entry("alice", "Eggs", 0.1, "entry", "2024-03-02"))
            .unwrap();
        store
            .insert_ledger_entry(&entry("alice", "Oats", 0.2, "entry", "2024-03-03"))
            .unwrap();

        let summary = store
            .summary_at("alice", datetime!(2024-03-10 00:00:00 UTC))
            .unwrap();
        assert_eq!(summary.total_cost, 0.3);
        assert_eq!(summary.net_amount, 0.3);
    }

    #[test]
    fn test_summary_for_empty_window() {
        let store = Store::open_in_memory().unwrap();

        let summary = store
            .summary_at("alice", datetime!(2024-07-04 00:00:00 UTC))
            .unwrap();

        assert_eq!(summary.total_cost, 0.0);
        assert_eq!(summary.net_amount, 0.0);
        assert!(summary.latest_item.is_none());
        assert!(summary.last_updated.is_none());
        // Window metadata is still populated for an empty month.
        assert_eq!(
            summary.period_start,
            Some(datetime!(2024-07-01 00:00:00 UTC))
        );
        assert_eq!(summary.remaining_days, Some(28));
    }

    #[test]
    fn test_summary_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        store
            .insert_ledger_entry(&entry("alice", "Milk", 20.0, "entry", "2024-01-15"))
            .unwrap();

        let at = datetime!(2024-01-25 12:00:00 UTC);
        let first = store.summary_at("alice", at).unwrap();
        let second = store.summary_at("alice", at).unwrap();
        assert_eq!(first, second);
    }
}
