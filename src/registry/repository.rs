//! Feed source registry repository for feedwatch.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use super::types::{FeedSource, ReconcileOutcome};
use crate::db::DbPool;
use crate::{FeedwatchError, Result};

/// Row type for a feed source from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedSourceRow {
    id: i64,
    url: String,
    created_at: String,
    last_seen_at: String,
    deactivated_at: Option<String>,
    last_checked_at: String,
}

impl From<FeedSourceRow> for FeedSource {
    fn from(row: FeedSourceRow) -> Self {
        FeedSource {
            id: row.id,
            url: row.url,
            created_at: parse_datetime(&row.created_at).unwrap_or_else(Utc::now),
            last_seen_at: parse_datetime(&row.last_seen_at).unwrap_or_else(Utc::now),
            deactivated_at: row.deactivated_at.and_then(|s| parse_datetime(&s)),
            last_checked_at: parse_datetime(&row.last_checked_at).unwrap_or_else(Utc::now),
        }
    }
}

const SELECT_COLUMNS: &str =
    "id, url, created_at, last_seen_at, deactivated_at, last_checked_at";

/// Repository for feed source operations.
pub struct FeedSourceRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FeedSourceRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Align the registry's active set with `desired` in one transaction.
    ///
    /// Every distinct URL in `desired` is upserted: unknown URLs are inserted
    /// with all timestamps set to `run_time`, known URLs get
    /// `last_seen_at = run_time` and are reactivated if dormant. Active rows
    /// absent from `desired` are deactivated. Rows are never deleted.
    ///
    /// The returned diff is assembled from the pre-transaction snapshot and
    /// the upsert results, so it stays correct even when `run_time` collides
    /// with timestamps already in the table. Duplicate input URLs are
    /// collapsed; an empty `desired` deactivates every active source.
    pub async fn reconcile(
        &self,
        desired: &[String],
        run_time: DateTime<Utc>,
    ) -> Result<ReconcileOutcome> {
        let run_time_s = run_time.to_rfc3339();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| FeedwatchError::Database(e.to_string()))?;

        let query = format!("SELECT {SELECT_COLUMNS} FROM feed_sources");
        let rows: Vec<FeedSourceRow> = sqlx::query_as(&query)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| FeedwatchError::Database(e.to_string()))?;

        let known: HashMap<String, FeedSource> = rows
            .into_iter()
            .map(FeedSource::from)
            .map(|source| (source.url.clone(), source))
            .collect();

        let mut seen: HashSet<&str> = HashSet::new();
        let mut added = Vec::new();
        let mut reactivated = Vec::new();

        for url in desired {
            if !seen.insert(url.as_str()) {
                continue;
            }

            let id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO feed_sources (url, created_at, last_seen_at, deactivated_at, last_checked_at)
                VALUES ($1, $2, $3, NULL, $4)
                ON CONFLICT (url) DO UPDATE SET
                    last_seen_at = excluded.last_seen_at,
                    deactivated_at = NULL
                RETURNING id
                "#,
            )
            .bind(url)
            .bind(&run_time_s)
            .bind(&run_time_s)
            .bind(&run_time_s)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| FeedwatchError::Database(e.to_string()))?;

            match known.get(url) {
                None => added.push(FeedSource {
                    id,
                    url: url.clone(),
                    created_at: run_time,
                    last_seen_at: run_time,
                    deactivated_at: None,
                    last_checked_at: run_time,
                }),
                Some(prev) if !prev.is_active() => reactivated.push(FeedSource {
                    id: prev.id,
                    url: prev.url.clone(),
                    created_at: prev.created_at,
                    last_seen_at: run_time,
                    deactivated_at: None,
                    last_checked_at: prev.last_checked_at,
                }),
                Some(_) => {}
            }
        }

        let mut deactivated: Vec<FeedSource> = known
            .values()
            .filter(|source| source.is_active() && !seen.contains(source.url.as_str()))
            .cloned()
            .collect();
        deactivated.sort_by_key(|source| source.id);

        for source in &mut deactivated {
            sqlx::query("UPDATE feed_sources SET deactivated_at = $1 WHERE url = $2")
                .bind(&run_time_s)
                .bind(&source.url)
                .execute(&mut *tx)
                .await
                .map_err(|e| FeedwatchError::Database(e.to_string()))?;
            source.deactivated_at = Some(run_time);
        }

        tx.commit()
            .await
            .map_err(|e| FeedwatchError::Database(e.to_string()))?;

        Ok(ReconcileOutcome {
            added,
            reactivated,
            deactivated,
        })
    }

    /// Get a source by URL regardless of its active state.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<FeedSource>> {
        let query = format!("SELECT {SELECT_COLUMNS} FROM feed_sources WHERE url = $1");
        let row = sqlx::query_as::<_, FeedSourceRow>(&query)
            .bind(url)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| FeedwatchError::Database(e.to_string()))?;

        Ok(row.map(FeedSource::from))
    }

    /// Get an active source by URL.
    pub async fn get_active_by_url(&self, url: &str) -> Result<Option<FeedSource>> {
        let query = format!(
            "SELECT {SELECT_COLUMNS} FROM feed_sources WHERE url = $1 AND deactivated_at IS NULL"
        );
        let row = sqlx::query_as::<_, FeedSourceRow>(&query)
            .bind(url)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| FeedwatchError::Database(e.to_string()))?;

        Ok(row.map(FeedSource::from))
    }

    /// List all active sources (in registration order).
    pub async fn list_active(&self) -> Result<Vec<FeedSource>> {
        let query = format!(
            "SELECT {SELECT_COLUMNS} FROM feed_sources WHERE deactivated_at IS NULL ORDER BY id ASC"
        );
        let rows = sqlx::query_as::<_, FeedSourceRow>(&query)
            .fetch_all(self.pool)
            .await
            .map_err(|e| FeedwatchError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(FeedSource::from).collect())
    }

    /// Advance a source's freshness checkpoint.
    pub async fn set_last_checked(&self, url: &str, checked_at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query("UPDATE feed_sources SET last_checked_at = $1 WHERE url = $2")
            .bind(checked_at.to_rfc3339())
            .bind(url)
            .execute(self.pool)
            .await
            .map_err(|e| FeedwatchError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Count all sources, active or not.
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM feed_sources")
            .fetch_one(self.pool)
            .await
            .map_err(|e| FeedwatchError::Database(e.to_string()))?;

        Ok(count.0)
    }
}

/// Parse a datetime string to DateTime<Utc>.
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
    }
    None
}
