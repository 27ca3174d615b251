//! # Trial Marker Repository
//!
//! Persistent per-user trial start markers. This is the durable
//! counterpart of [`mercado_core::access::TrialStore`]: one row per user,
//! written once on first visit via `INSERT OR IGNORE` and never updated,
//! so elapsed trial time is always computed from the original start.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use mercado_core::access::{self, TrialStatus};

/// Repository for trial marker operations.
#[derive(Debug, Clone)]
pub struct TrialMarkerRepository {
    pool: SqlitePool,
}

impl TrialMarkerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TrialMarkerRepository { pool }
    }

    /// Returns the stored trial start for a user, if any.
    pub async fn get(&self, user_id: &str) -> DbResult<Option<DateTime<Utc>>> {
        let started_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            "SELECT started_at FROM trial_markers WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(started_at)
    }

    /// Whether a trial start exists for the user.
    pub async fn has(&self, user_id: &str) -> DbResult<bool> {
        Ok(self.get(user_id).await?.is_some())
    }

    /// Records `started_at` for the user unless a marker already exists.
    /// The first write wins; later calls are no-ops.
    pub async fn init(&self, user_id: &str, started_at: DateTime<Utc>) -> DbResult<()> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO trial_markers (user_id, started_at) VALUES (?1, ?2)",
        )
        .bind(user_id)
        .bind(started_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            debug!(user_id = %user_id, %started_at, "Trial marker initialized");
        }

        Ok(())
    }

    /// Returns the trial start, initializing it to `now` on first call.
    pub async fn get_or_init(&self, user_id: &str, now: DateTime<Utc>) -> DbResult<DateTime<Utc>> {
        self.init(user_id, now).await?;
        self.get(user_id)
            .await?
            .ok_or_else(|| DbError::Internal("trial marker missing after init".to_string()))
    }

    /// Trial countdown for the user, initializing the marker on first
    /// visit.
    pub async fn evaluate(&self, user_id: &str, now: DateTime<Utc>) -> DbResult<TrialStatus> {
        let started_at = self.get_or_init(user_id, now).await?;
        Ok(access::trial_status(started_at, now))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
