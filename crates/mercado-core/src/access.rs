//! # Access Control Engine
//!
//! Subscription and trial gating, evaluated on every route entry.
//!
//! ## Decision Flow
//! ```text
//! route entry
//!      │
//!      ▼
//! subscription fetch in flight? ──► Loading (blocking, no redirect)
//!      │
//!      ▼
//! no session? ──► RedirectToLogin
//!      │
//!      ▼
//! plans page itself? ──► Allow (prevents redirect loop)
//!      │
//!      ▼
//! derive gating status from subscription rows
//!      ├── Active  ──► Allow (+ renewal notice when <= 7 days left)
//!      ├── Expired ──► RedirectToPlans (lapsed outranks trial)
//!      └── None ──► trial live? ──► Allow (+ one-time trial notice)
//!                   trial over? ──► RedirectToPlans
//! ```
//!
//! Everything here is pure: the clock and the fetched rows are inputs, and
//! the only state is the per-session one-time trial notice flag on
//! [`AccessGate`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use ts_rs::TS;

use crate::types::{PlanType, Subscription, SubscriptionStatus};

// =============================================================================
// Constants
// =============================================================================

/// Trial window granted on first visit.
pub const TRIAL_DURATION_MS: i64 = 14 * 24 * 60 * 60 * 1000;

/// Route that is always reachable, even when gated out.
pub const PLANS_PATH: &str = "/planos";

/// Renewal banner threshold: shown while an active subscription has this
/// many days or fewer remaining.
pub const RENEWAL_WARNING_DAYS: i64 = 7;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;
const MS_PER_SEC: i64 = 1000;

// =============================================================================
// Subscription Derivation
// =============================================================================

/// Three-valued gating decision driving route redirects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum GatingStatus {
    /// A paid subscription is active and unexpired.
    Active,
    /// Subscription rows exist but none is active and unexpired.
    Expired,
    /// No subscription row at all; trial state decides.
    None,
}

/// Derived subscription state: the gating decision plus display fields
/// (plan name, days remaining) from the winning row.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct SubscriptionState {
    pub gating: GatingStatus,
    pub plan_type: Option<PlanType>,
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
    pub days_remaining: Option<i64>,
}

impl SubscriptionState {
    fn none() -> Self {
        SubscriptionState {
            gating: GatingStatus::None,
            plan_type: None,
            expires_at: None,
            days_remaining: None,
        }
    }
}

/// Days until `expires_at`, using ceiling division and floored at zero.
///
/// A subscription expiring in one hour still reports 1 day; an expired one
/// reports 0, never a negative number.
pub fn days_remaining(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let diff_ms = (expires_at - now).num_milliseconds();
    if diff_ms <= 0 {
        0
    } else {
        (diff_ms + MS_PER_DAY - 1) / MS_PER_DAY
    }
}

/// Derives the gating status and display fields from all subscription rows
/// of a user.
///
/// Among rows with `status == active` and an unexpired `expires_at`, the
/// latest-expiring row wins and gating is [`GatingStatus::Active`]. With no
/// qualifying row, the most-recently-expiring row (even if expired) is kept
/// for display only and gating is [`GatingStatus::Expired`]. Zero rows give
/// [`GatingStatus::None`].
pub fn derive_subscription(rows: &[Subscription], now: DateTime<Utc>) -> SubscriptionState {
    let winner = rows
        .iter()
        .filter(|r| r.status == SubscriptionStatus::Active && r.expires_at > now)
        .max_by_key(|r| r.expires_at);

    if let Some(row) = winner {
        return SubscriptionState {
            gating: GatingStatus::Active,
            plan_type: Some(row.plan_type),
            expires_at: Some(row.expires_at),
            days_remaining: Some(days_remaining(row.expires_at, now)),
        };
    }

    match rows.iter().max_by_key(|r| r.expires_at) {
        Some(row) => SubscriptionState {
            gating: GatingStatus::Expired,
            plan_type: Some(row.plan_type),
            expires_at: Some(row.expires_at),
            days_remaining: Some(days_remaining(row.expires_at, now)),
        },
        None => SubscriptionState::none(),
    }
}

// =============================================================================
// Trial
// =============================================================================

/// Storage abstraction for the per-user trial start marker.
///
/// Injected instead of reading ambient global state; the persistent
/// implementation lives in the database layer, [`MemoryTrialStore`] serves
/// in-process use and tests.
pub trait TrialStore {
    /// Returns the stored trial start for a user, if any.
    fn get(&self, user_id: &str) -> Option<DateTime<Utc>>;

    /// Stores the trial start for a user. Implementations must keep the
    /// first value: a second `set` for the same user is a no-op.
    fn set(&mut self, user_id: &str, started_at: DateTime<Utc>);

    /// Whether a trial start exists for the user.
    fn has(&self, user_id: &str) -> bool {
        self.get(user_id).is_some()
    }
}

/// In-memory [`TrialStore`].
#[derive(Debug, Default)]
pub struct MemoryTrialStore {
    markers: HashMap<String, DateTime<Utc>>,
}

impl MemoryTrialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrialStore for MemoryTrialStore {
    fn get(&self, user_id: &str) -> Option<DateTime<Utc>> {
        self.markers.get(user_id).copied()
    }

    fn set(&mut self, user_id: &str, started_at: DateTime<Utc>) {
        self.markers.entry(user_id.to_string()).or_insert(started_at);
    }
}

/// Trial countdown snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct TrialStatus {
    #[ts(as = "String")]
    pub started_at: DateTime<Utc>,
    /// Whole seconds left, ceiling-rounded, clamped at zero.
    pub remaining_secs: i64,
    pub is_expired: bool,
}

/// Computes the trial countdown from a known start.
pub fn trial_status(started_at: DateTime<Utc>, now: DateTime<Utc>) -> TrialStatus {
    let elapsed_ms = (now - started_at).num_milliseconds();
    let remaining_ms = TRIAL_DURATION_MS - elapsed_ms;
    let remaining_secs = if remaining_ms <= 0 {
        0
    } else {
        (remaining_ms + MS_PER_SEC - 1) / MS_PER_SEC
    };

    TrialStatus {
        started_at,
        remaining_secs,
        is_expired: remaining_secs <= 0,
    }
}

/// Looks up (or initializes, exactly once) the trial start for a user and
/// returns the countdown.
///
/// The first call persists `now` as the start; every later call computes
/// from the original value, so the countdown is non-increasing over real
/// time and clamps at zero.
pub fn evaluate_trial<S: TrialStore>(
    store: &mut S,
    user_id: &str,
    now: DateTime<Utc>,
) -> TrialStatus {
    let started_at = match store.get(user_id) {
        Some(start) => start,
        None => {
            store.set(user_id, now);
            now
        }
    };
    trial_status(started_at, now)
}

// =============================================================================
// Route Gating
// =============================================================================

/// Subscription fetch state as seen by the gate.
#[derive(Debug, Clone)]
pub enum SubscriptionFetch {
    /// Fetch still in flight: block, decide nothing.
    Loading,
    /// All subscription rows for the user.
    Loaded(Vec<Subscription>),
}

/// Route-level access decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum RouteDecision {
    /// Render a blocking loading state.
    Loading,
    /// No authenticated session.
    RedirectToLogin,
    /// Gated out: lapsed subscription or exhausted trial.
    RedirectToPlans,
    /// Route is accessible.
    Allow {
        /// Days remaining on an active subscription, present only when at
        /// or under [`RENEWAL_WARNING_DAYS`]. A prompt, not a block.
        renewal_notice: Option<i64>,
        /// Trial seconds remaining, emitted once per gate instance for the
        /// trial toast.
        trial_notice: Option<i64>,
    },
}

/// Per-session gate. Holds the one-time trial notice flag; everything else
/// is recomputed per call.
#[derive(Debug, Default)]
pub struct AccessGate {
    trial_notice_shown: bool,
}

impl AccessGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates the gate for one route entry.
    ///
    /// `trial` is the countdown for the current user (see
    /// [`evaluate_trial`]); it only matters when no subscription row
    /// exists.
    pub fn decide(
        &mut self,
        authenticated: bool,
        route: &str,
        fetch: &SubscriptionFetch,
        trial: &TrialStatus,
        now: DateTime<Utc>,
    ) -> RouteDecision {
        let rows = match fetch {
            SubscriptionFetch::Loading => return RouteDecision::Loading,
            SubscriptionFetch::Loaded(rows) => rows,
        };

        if !authenticated {
            return RouteDecision::RedirectToLogin;
        }

        if route == PLANS_PATH {
            return RouteDecision::Allow {
                renewal_notice: None,
                trial_notice: None,
            };
        }

        let state = derive_subscription(rows, now);
        match state.gating {
            GatingStatus::Active => RouteDecision::Allow {
                renewal_notice: state
                    .days_remaining
                    .filter(|days| *days <= RENEWAL_WARNING_DAYS),
                trial_notice: None,
            },
            GatingStatus::Expired => RouteDecision::RedirectToPlans,
            GatingStatus::None => {
                if trial.is_expired {
                    return RouteDecision::RedirectToPlans;
                }
                let trial_notice = if self.trial_notice_shown {
                    None
                } else {
                    self.trial_notice_shown = true;
                    Some(trial.remaining_secs)
                };
                RouteDecision::Allow {
                    renewal_notice: None,
                    trial_notice,
                }
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use crate::types::DEFAULT_USER_ID;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn subscription(
        status: SubscriptionStatus,
        expires_at: DateTime<Utc>,
        plan: PlanType,
    ) -> Subscription {
        Subscription {
            id: "sub-1".to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            plan_type: plan,
            status,
            starts_at: expires_at - Duration::days(30),
            expires_at,
            created_at: expires_at - Duration::days(30),
            updated_at: expires_at - Duration::days(30),
        }
    }

    fn live_trial() -> TrialStatus {
        trial_status(now() - Duration::days(1), now())
    }

    fn dead_trial() -> TrialStatus {
        trial_status(now() - Duration::days(15), now())
    }

    #[test]
    fn test_days_remaining_ceiling() {
        // One hour left still reads as one day.
        assert_eq!(days_remaining(now() + Duration::hours(1), now()), 1);
        assert_eq!(days_remaining(now() + Duration::days(2), now()), 2);
        // 2 days + 1 second rounds up to 3.
        assert_eq!(
            days_remaining(now() + Duration::days(2) + Duration::seconds(1), now()),
            3
        );
        // Never negative.
        assert_eq!(days_remaining(now() - Duration::days(3), now()), 0);
    }

    #[test]
    fn test_derive_picks_latest_active_row() {
        let rows = vec![
            subscription(SubscriptionStatus::Active, now() + Duration::days(2), PlanType::Monthly),
            subscription(SubscriptionStatus::Active, now() + Duration::days(40), PlanType::Yearly),
            subscription(SubscriptionStatus::Expired, now() - Duration::days(1), PlanType::Monthly),
        ];
        let state = derive_subscription(&rows, now());
        assert_eq!(state.gating, GatingStatus::Active);
        assert_eq!(state.plan_type, Some(PlanType::Yearly));
        assert_eq!(state.days_remaining, Some(40));
    }

    #[test]
    fn test_derive_expired_keeps_display_row() {
        // Status says active but the date lapsed: gating is Expired.
        let rows = vec![subscription(
            SubscriptionStatus::Active,
            now() - Duration::days(3),
            PlanType::Quarterly,
        )];
        let state = derive_subscription(&rows, now());
        assert_eq!(state.gating, GatingStatus::Expired);
        assert_eq!(state.plan_type, Some(PlanType::Quarterly));
        assert_eq!(state.days_remaining, Some(0));
    }

    #[test]
    fn test_derive_none_with_zero_rows() {
        let state = derive_subscription(&[], now());
        assert_eq!(state.gating, GatingStatus::None);
        assert_eq!(state.plan_type, None);
    }

    #[test]
    fn test_trial_init_once_and_monotonic() {
        let mut store = MemoryTrialStore::new();
        let t0 = now();

        let first = evaluate_trial(&mut store, "user-1", t0);
        assert_eq!(first.started_at, t0);
        assert!(!first.is_expired);

        // A later evaluation must keep the original start.
        let later = evaluate_trial(&mut store, "user-1", t0 + Duration::days(5));
        assert_eq!(later.started_at, t0);
        assert!(later.remaining_secs < first.remaining_secs);

        // Direct set never overwrites either.
        store.set("user-1", t0 + Duration::days(10));
        assert_eq!(store.get("user-1"), Some(t0));

        // Clamp at zero once the window has passed.
        let done = evaluate_trial(&mut store, "user-1", t0 + Duration::days(20));
        assert_eq!(done.remaining_secs, 0);
        assert!(done.is_expired);
    }

    #[test]
    fn test_gate_loading_blocks() {
        let mut gate = AccessGate::new();
        let decision = gate.decide(true, "/", &SubscriptionFetch::Loading, &live_trial(), now());
        assert_eq!(decision, RouteDecision::Loading);
    }

    #[test]
    fn test_gate_redirects_unauthenticated() {
        let mut gate = AccessGate::new();
        let fetch = SubscriptionFetch::Loaded(vec![]);
        let decision = gate.decide(false, "/", &fetch, &live_trial(), now());
        assert_eq!(decision, RouteDecision::RedirectToLogin);
    }

    #[test]
    fn test_gate_plans_page_always_allowed() {
        let mut gate = AccessGate::new();
        let fetch = SubscriptionFetch::Loaded(vec![]);
        let decision = gate.decide(true, PLANS_PATH, &fetch, &dead_trial(), now());
        assert!(matches!(decision, RouteDecision::Allow { .. }));
    }

    #[test]
    fn test_gate_active_with_renewal_banner() {
        let mut gate = AccessGate::new();
        let fetch = SubscriptionFetch::Loaded(vec![subscription(
            SubscriptionStatus::Active,
            now() + Duration::days(2),
            PlanType::Monthly,
        )]);
        let decision = gate.decide(true, "/", &fetch, &live_trial(), now());
        assert_eq!(
            decision,
            RouteDecision::Allow {
                renewal_notice: Some(2),
                trial_notice: None,
            }
        );

        // Far-out expiry: no banner.
        let fetch = SubscriptionFetch::Loaded(vec![subscription(
            SubscriptionStatus::Active,
            now() + Duration::days(60),
            PlanType::Yearly,
        )]);
        let decision = gate.decide(true, "/", &fetch, &live_trial(), now());
        assert_eq!(
            decision,
            RouteDecision::Allow {
                renewal_notice: None,
                trial_notice: None,
            }
        );
    }

    #[test]
    fn test_gate_expired_outranks_live_trial() {
        let mut gate = AccessGate::new();
        let fetch = SubscriptionFetch::Loaded(vec![subscription(
            SubscriptionStatus::Expired,
            now() - Duration::days(1),
            PlanType::Monthly,
        )]);
        let decision = gate.decide(true, "/", &fetch, &live_trial(), now());
        assert_eq!(decision, RouteDecision::RedirectToPlans);
    }

    #[test]
    fn test_gate_trial_notice_emitted_once() {
        let mut gate = AccessGate::new();
        let fetch = SubscriptionFetch::Loaded(vec![]);
        let trial = live_trial();

        let first = gate.decide(true, "/", &fetch, &trial, now());
        assert_eq!(
            first,
            RouteDecision::Allow {
                renewal_notice: None,
                trial_notice: Some(trial.remaining_secs),
            }
        );

        let second = gate.decide(true, "/vendas", &fetch, &trial, now());
        assert_eq!(
            second,
            RouteDecision::Allow {
                renewal_notice: None,
                trial_notice: None,
            }
        );
    }

    #[test]
    fn test_gate_no_subscription_and_dead_trial_redirects() {
        let mut gate = AccessGate::new();
        let fetch = SubscriptionFetch::Loaded(vec![]);
        let decision = gate.decide(true, "/", &fetch, &dead_trial(), now());
        assert_eq!(decision, RouteDecision::RedirectToPlans);
    }
}
