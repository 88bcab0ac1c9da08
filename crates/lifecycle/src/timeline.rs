//! Pending status advances, ordered by due time.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use domain::{OrderId, OrderStatus};
use tokio::sync::Mutex;

/// An advance of one order to `target`, due at `due_at`.
///
/// Ordering is by due time first, then by target, so overdue advances of the
/// same order come out in status order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScheduledAdvance {
    pub due_at: DateTime<Utc>,
    pub target: OrderStatus,
    pub order_id: OrderId,
}

/// The set of pending advances.
///
/// Scheduling the same advance twice keeps one entry.
#[derive(Debug, Default)]
pub struct Timeline {
    pending: Mutex<BTreeSet<ScheduledAdvance>>,
}

impl Timeline {
    /// Creates an empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules the advances still ahead of `current`.
    ///
    /// The k-th status of the progression is due at `base + k * interval`.
    /// Returns the number of advances scheduled.
    pub async fn schedule_progression(
        &self,
        order_id: OrderId,
        base: DateTime<Utc>,
        interval: Duration,
        current: OrderStatus,
    ) -> usize {
        let Ok(step) = chrono::Duration::from_std(interval) else {
            tracing::warn!(
                %order_id,
                ?interval,
                "advance interval out of range, nothing scheduled"
            );
            return 0;
        };
        let mut pending = self.pending.lock().await;

        let mut scheduled = 0;
        for (k, target) in (1..).zip(OrderStatus::PROGRESSION) {
            if !current.can_advance_to(target) {
                continue;
            }
            let Some(due_at) = step
                .checked_mul(k)
                .and_then(|offset| base.checked_add_signed(offset))
            else {
                tracing::warn!(%order_id, %target, "advance due time out of range, skipped");
                continue;
            };
            pending.insert(ScheduledAdvance {
                due_at,
                target,
                order_id,
            });
            scheduled += 1;
        }
        scheduled
    }

    /// Removes and returns every advance due at or before `now`, earliest
    /// first.
    pub async fn take_due(&self, now: DateTime<Utc>) -> Vec<ScheduledAdvance> {
        let mut pending = self.pending.lock().await;
        let mut due = Vec::new();
        while pending.first().is_some_and(|next| next.due_at <= now) {
            if let Some(next) = pending.pop_first() {
                due.push(next);
            }
        }
        due
    }

    /// Returns the advances pending for one order.
    pub async fn pending_for(&self, order_id: OrderId) -> Vec<ScheduledAdvance> {
        self.pending
            .lock()
            .await
            .iter()
            .filter(|a| a.order_id == order_id)
            .copied()
            .collect()
    }

    /// Returns the number of pending advances.
    pub async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Returns true if nothing is pending.
    pub async fn is_empty(&self) -> bool {
        self.pending.lock().await.is_empty()
    }
}
