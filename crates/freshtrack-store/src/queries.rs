//! Query builder for time-ordered record listings.
//!
//! Every list operation accepts the same filters: an owner, an optional
//! inclusive date range and a result cap. [`RecordQuery`] follows the
//! builder pattern; results come back newest first by default.
//!
//! # Example
//!
//! ```
//! use freshtrack_store::{RecordQuery, Store};
//! use time::{Duration, OffsetDateTime};
//!
//! let store = Store::open_in_memory()?;
//! let yesterday = OffsetDateTime::now_utc() - Duration::hours(24);
//!
//! let query = RecordQuery::new()
//!     .owner("chamika")
//!     .since(yesterday)
//!     .limit(50);
//! let notifications = store.list_notifications(&query)?;
//! # let _ = notifications;
//! # Ok::<(), freshtrack_store::Error>(())
//! ```

use time::OffsetDateTime;

/// Fluent query builder for owner-scoped, time-ordered listings.
#[derive(Debug, Default, Clone)]
pub struct RecordQuery {
    /// Filter by owner.
    pub owner: Option<String>,
    /// Include only records at or after this time (inclusive).
    pub since: Option<OffsetDateTime>,
    /// Include only records at or before this time (inclusive).
    pub until: Option<OffsetDateTime>,
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Order by the time column descending (newest first). Default: true.
    pub newest_first: bool,
}

impl RecordQuery {
    /// Create a new query: no filters, no cap, newest first.
    pub fn new() -> Self {
        Self {
            newest_first: true,
            ..Default::default()
        }
    }

    /// Filter by owner.
    pub fn owner(mut self, owner: &str) -> Self {
        self.owner = Some(owner.to_string());
        self
    }

    /// Filter to records at or after this time.
    pub fn since(mut self, time: OffsetDateTime) -> Self {
        self.since = Some(time);
        self
    }

    /// Filter to records at or before this time.
    pub fn until(mut self, time: OffsetDateTime) -> Self {
        self.until = Some(time);
        self
    }

    /// Limit the maximum number of results returned.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Order results oldest first (ascending by the time column).
    pub fn oldest_first(mut self) -> Self {
        self.newest_first = false;
        self
    }

    /// Build the SQL WHERE clause and parameters against `time_column`.
    pub(crate) fn build_where(
        &self,
        time_column: &str,
    ) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref owner) = self.owner {
            conditions.push("owner = ?".to_string());
            params.push(Box::new(owner.clone()));
        }

        if let Some(since) = self.since {
            conditions.push(format!("{time_column} >= ?"));
            params.push(Box::new(since.unix_timestamp()));
        }

        if let Some(until) = self.until {
            conditions.push(format!("{time_column} <= ?"));
            params.push(Box::new(until.unix_timestamp()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    /// Append ORDER BY and LIMIT clauses for `time_column`.
    ///
    /// Identifiers embed their creation second, so `id` breaks ties
    /// between rows stamped within the same second.
    pub(crate) fn push_order_and_limit(&self, sql: &mut String, time_column: &str) {
        let order = if self.newest_first { "DESC" } else { "ASC" };
        sql.push_str(&format!(" ORDER BY {time_column} {order}, id {order}"));
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_new_defaults() {
        let query = RecordQuery::new();
        assert!(query.owner.is_none());
        assert!(query.since.is_none());
        assert!(query.until.is_none());
        assert!(query.limit.is_none());
        assert!(query.newest_first);
    }

    #[test]
    fn test_chaining() {
        let since = datetime!(2024-01-01 00:00:00 UTC);
        let until = datetime!(2024-12-31 23:59:59 UTC);

        let query = RecordQuery::new()
            .owner("chamika")
            .since(since)
            .until(until)
            .limit(10)
            .oldest_first();

        assert_eq!(query.owner, Some("chamika".to_string()));
        assert_eq!(query.since, Some(since));
        assert_eq!(query.until, Some(until));
        assert_eq!(query.limit, Some(10));
        assert!(!query.newest_first);
    }

    #[test]
    fn test_build_where_empty() {
        let (where_clause, params) = RecordQuery::new().build_where("created_at");
        assert_eq!(where_clause, "");
        assert!(params.is_empty());
    }

    #[test]
    fn test_build_where_owner_only() {
        let (where_clause, params) = RecordQuery::new().owner("a").build_where("created_at");
        assert_eq!(where_clause, "WHERE owner = ?");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_build_where_inclusive_range() {
        let query = RecordQuery::new()
            .since(datetime!(2024-01-01 00:00:00 UTC))
            .until(datetime!(2024-01-31 23:59:59 UTC));
        let (where_clause, params) = query.build_where("effective_date");

        assert_eq!(
            where_clause,
            "WHERE effective_date >= ? AND effective_date <= ?"
        );
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_order_and_limit() {
        let mut sql = String::from("SELECT id FROM notifications");
        RecordQuery::new().limit(5).push_order_and_limit(&mut sql, "created_at");
        assert!(sql.ends_with("ORDER BY created_at DESC, id DESC LIMIT 5"));

        let mut sql = String::from("SELECT id FROM notifications");
        RecordQuery::new()
            .oldest_first()
            .push_order_and_limit(&mut sql, "created_at");
        assert!(sql.ends_with("ORDER BY created_at ASC, id ASC"));
    }
}
