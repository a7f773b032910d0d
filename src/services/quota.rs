use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::error;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{UsageCounter, UserQuota},
    store::Store,
};

/// Free-tier search quota gate.
///
/// Each user is either UNLIMITED (premium active) or LIMITED by a daily
/// counter. The quota window is the UTC calendar day: `window_start` is
/// midnight UTC, and the first attempt after a day boundary resets the
/// count. State lives behind the `Store` seam, so counts and premium
/// entitlements survive a restart. Read-modify-write runs under one
/// mutex so two concurrent requests can never both take the last slot.
/// Callers must not hold the gate across external calls: acquire, do
/// the work, then release on failure.
pub struct QuotaGate {
    daily_limit: u32,
    store: Arc<dyn Store>,
    lock: Mutex<()>,
}

/// Proof that a search attempt passed the gate. `counted` is false for
/// premium users; a counted lease can be released to roll the increment
/// back when the search fails before persistence.
#[derive(Debug, Clone, Copy)]
pub struct QuotaLease {
    pub user_id: Uuid,
    counted: bool,
    window_start: DateTime<Utc>,
}

impl QuotaGate {
    pub fn new(daily_limit: u32, store: Arc<dyn Store>) -> Self {
        Self {
            daily_limit,
            store,
            lock: Mutex::new(()),
        }
    }

    /// Takes one search slot for the user, or fails with QuotaExceeded
    /// carrying the seconds until the window resets.
    pub async fn acquire(&self, user_id: Uuid) -> AppResult<QuotaLease> {
        self.acquire_at(user_id, Utc::now()).await
    }

    pub async fn acquire_at(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<QuotaLease> {
        let window_start = window_start(now);
        let _guard = self.lock.lock().await;

        let mut quota = self
            .store
            .get_quota(user_id)
            .await?
            .unwrap_or_else(|| UserQuota::new(user_id, window_start));

        // Premium bypasses the counter entirely
        if quota.is_premium(now) {
            return Ok(QuotaLease {
                user_id,
                counted: false,
                window_start,
            });
        }

        // Crossed into a new UTC day: fresh window
        if quota.counter.window_start < window_start {
            quota.counter = UsageCounter {
                count: 0,
                window_start,
            };
        }

        if quota.counter.count < self.daily_limit {
            quota.counter.count += 1;
            self.store.put_quota(&quota).await?;
            Ok(QuotaLease {
                user_id,
                counted: true,
                window_start,
            })
        } else {
            let reset_at = quota.counter.window_start + Duration::days(1);
            Err(AppError::QuotaExceeded {
                reset_in_secs: (reset_at - now).num_seconds().max(0),
            })
        }
    }

    /// Rolls back a counted slot after a failed search. A no-op for
    /// premium leases and for leases from an already-expired window. A
    /// failed rollback only over-counts one search, so it is logged and
    /// dropped rather than surfaced on top of the original failure.
    pub async fn release(&self, lease: QuotaLease) {
        if !lease.counted {
            return;
        }
        let _guard = self.lock.lock().await;

        let result = async {
            if let Some(mut quota) = self.store.get_quota(lease.user_id).await? {
                if quota.counter.window_start == lease.window_start && quota.counter.count > 0 {
                    quota.counter.count -= 1;
                    self.store.put_quota(&quota).await?;
                }
            }
            AppResult::Ok(())
        }
        .await;

        if let Err(e) = result {
            error!(error = %e, user_id = %lease.user_id, "Failed to roll back quota slot");
        }
    }

    /// Records premium state supplied by the external billing boundary.
    /// `expires_at` of None means no expiry.
    pub async fn set_premium(
        &self,
        user_id: Uuid,
        expires_at: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        let mut quota = self
            .store
            .get_quota(user_id)
            .await?
            .unwrap_or_else(|| UserQuota::new(user_id, window_start(Utc::now())));
        quota.premium = true;
        quota.premium_expires_at = expires_at;
        self.store.put_quota(&quota).await
    }

    pub async fn clear_premium(&self, user_id: Uuid) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        let mut quota = self
            .store
            .get_quota(user_id)
            .await?
            .unwrap_or_else(|| UserQuota::new(user_id, window_start(Utc::now())));
        quota.premium = false;
        quota.premium_expires_at = None;
        self.store.put_quota(&quota).await
    }

    /// Current counter for a user, if any quota state was recorded
    pub async fn usage(&self, user_id: Uuid) -> AppResult<Option<UsageCounter>> {
        Ok(self.store.get_quota(user_id).await?.map(|q| q.counter))
    }
}

/// Midnight UTC of the day containing `now`
fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc()
}
