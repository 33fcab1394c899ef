/// Append-only access log storage
///
/// Written by the public read API after a successful call, read back only for
/// usage reporting in the management API.

use crate::project::{
    database::timestamp_now,
    types::{AccessLogEntry, UsageEntry},
};
use anyhow::Result;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sqlx::sqlite::SqlitePool;

#[derive(Debug, Clone)]
pub struct AccessLogStorage {
    pool: SqlitePool,
}

impl AccessLogStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append one entry stamped with the current time
    pub async fn insert(&self, entry: &AccessLogEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO api_access_logs (project_id, endpoint, ip_address, user_agent, accessed_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.project_id)
        .bind(&entry.endpoint)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(timestamp_now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Calls recorded for a project within the last `days` days, newest first
    ///
    /// A window reaching past the earliest representable date covers everything.
    pub async fn usage(&self, project_id: &str, days: u32) -> Result<Vec<UsageEntry>> {
        let since = Utc::now()
            .checked_sub_signed(Duration::days(i64::from(days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
            .to_rfc3339_opts(SecondsFormat::Micros, true);

        let entries = sqlx::query_as::<_, UsageEntry>(
            r#"
            SELECT endpoint, accessed_at FROM api_access_logs
            WHERE project_id = ? AND accessed_at >= ?
            ORDER BY accessed_at DESC, id DESC
            "#,
        )
        .bind(project_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Total number of entries recorded for a project
    pub async fn count(&self, project_id: &str) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM api_access_logs WHERE project_id = ?")
            .bind(project_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
