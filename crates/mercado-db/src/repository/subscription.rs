//! # Subscription Repository
//!
//! Subscription rows are written by the external payment collaborator and
//! read here for gating. The upsert is keyed by `user_id` and overwrites
//! unconditionally: renewing always restarts the window from "now" rather
//! than stacking onto a still-active subscription.

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::DbResult;
use mercado_core::access::{self, SubscriptionState};
use mercado_core::{PlanType, Subscription, SubscriptionStatus};

const SUBSCRIPTION_COLUMNS: &str =
    "id, user_id, plan_type, status, starts_at, expires_at, created_at, updated_at";

/// Repository for subscription database operations.
#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    pool: SqlitePool,
}

impl SubscriptionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SubscriptionRepository { pool }
    }

    /// All subscription rows for a user, most recently expiring first.
    ///
    /// The schema keeps one row per user; the derivation in core still
    /// tolerates multiple rows from older data.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Subscription>> {
        let rows = sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM user_subscriptions
             WHERE user_id = ?1
             ORDER BY expires_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Activates (or renews) the user's subscription, as the payment
    /// collaborator does after a confirmed payment.
    ///
    /// Single-row-per-user upsert: `starts_at` resets to `now` and
    /// `expires_at` to `now + plan length`, overwriting any prior row.
    /// Renewing early therefore forfeits remaining paid time.
    pub async fn upsert(
        &self,
        user_id: &str,
        plan_type: PlanType,
        now: DateTime<Utc>,
    ) -> DbResult<Subscription> {
        let subscription = Subscription {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            plan_type,
            status: SubscriptionStatus::Active,
            starts_at: now,
            expires_at: now + Duration::days(plan_type.days()),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO user_subscriptions (
                id, user_id, plan_type, status, starts_at, expires_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (user_id) DO UPDATE SET
                plan_type = excluded.plan_type,
                status = excluded.status,
                starts_at = excluded.starts_at,
                expires_at = excluded.expires_at,
                updated_at = excluded.updated_at",
        )
        .bind(&subscription.id)
        .bind(&subscription.user_id)
        .bind(subscription.plan_type)
        .bind(subscription.status)
        .bind(subscription.starts_at)
        .bind(subscription.expires_at)
        .bind(subscription.created_at)
        .bind(subscription.updated_at)
        .execute(&self.pool)
        .await?;

        info!(
            user_id = %user_id,
            plan = subscription.plan_type.label(),
            expires_at = %subscription.expires_at,
            "Subscription upserted"
        );

        // Re-read: on conflict the original row id and created_at survive.
        let stored = self.list_for_user(user_id).await?;
        Ok(stored.into_iter().next().unwrap_or(subscription))
    }

    /// Derived gating state for a user (see
    /// [`mercado_core::access::derive_subscription`]).
    pub async fn current_state(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<SubscriptionState> {
        let rows = self.list_for_user(user_id).await?;
        Ok(access::derive_subscription(&rows, now))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use mercado_core::access::GatingStatus;
    use mercado_core::DEFAULT_USER_ID;

    #[tokio::test]
    async fn test_upsert_grants_active_state() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.subscriptions();
        let now = Utc::now();

        repo.upsert(DEFAULT_USER_ID, PlanType::Monthly, now).await.unwrap();

        let state = repo.current_state(DEFAULT_USER_ID, now).await.unwrap();
        assert_eq!(state.gating, GatingStatus::Active);
        assert_eq!(state.plan_type, Some(PlanType::Monthly));
        assert_eq!(state.days_remaining, Some(30));
    }

    #[tokio::test]
    async fn test_upsert_overwrites_extend_from_now() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.subscriptions();
        let now = Utc::now();

        repo.upsert(DEFAULT_USER_ID, PlanType::Yearly, now).await.unwrap();
        // Early renewal with a shorter plan: the yearly window is gone.
        let renewed = repo
            .upsert(DEFAULT_USER_ID, PlanType::Monthly, now + Duration::days(3))
            .await
            .unwrap();

        assert_eq!(renewed.plan_type, PlanType::Monthly);
        assert_eq!(
            renewed.expires_at,
            now + Duration::days(3) + Duration::days(30)
        );

        let rows = repo.list_for_user(DEFAULT_USER_ID).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_no_rows_means_gating_none() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = db
            .subscriptions()
            .current_state(DEFAULT_USER_ID, Utc::now())
            .await
            .unwrap();
        assert_eq!(state.gating, GatingStatus::None);
    }

    #[tokio::test]
    async fn test_lapsed_subscription_reads_expired() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.subscriptions();
        let now = Utc::now();

        repo.upsert(DEFAULT_USER_ID, PlanType::Monthly, now - Duration::days(45))
            .await
            .unwrap();

        let state = repo.current_state(DEFAULT_USER_ID, now).await.unwrap();
        assert_eq!(state.gating, GatingStatus::Expired);
        assert_eq!(state.days_remaining, Some(0));
        // Display fields survive for the plans page.
        assert_eq!(state.plan_type, Some(PlanType::Monthly));
    }
}
