//! Lifecycle engine driving orders from placement to delivery.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::UserId;
use domain::{
    Aggregate, CommandHandler, DomainError, Order, OrderError, OrderId, OrderRegistrar,
    OrderStatus, Timeouts,
};
use futures_util::StreamExt;
use journal::{Journal, StreamKind};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::LifecycleConfig;
use crate::events::{StatusChange, StatusStream};
use crate::services::{Notification, NotificationSink};
use crate::timeline::Timeline;

const STATUS_CHANNEL_CAPACITY: usize = 256;

/// Moves placed orders along their fulfillment path and handles
/// cancellations.
///
/// Every status write is a compare-and-set on the order's stream version,
/// re-read and re-evaluated on conflict up to `max_cas_attempts` times. An
/// advance that no longer applies when it fires (the order was cancelled or
/// is already further along) writes nothing.
pub struct LifecycleEngine<J, N>
where
    J: Journal,
    N: NotificationSink,
{
    handler: CommandHandler<J, Order>,
    notifier: N,
    timeline: Timeline,
    config: LifecycleConfig,
    changes: broadcast::Sender<StatusChange>,
}

impl<J, N> LifecycleEngine<J, N>
where
    J: Journal,
    N: NotificationSink,
{
    /// Creates a new engine with an empty timeline.
    pub fn new(journal: J, notifier: N, config: LifecycleConfig, timeouts: Timeouts) -> Self {
        let (changes, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        Self {
            handler: CommandHandler::new(journal, timeouts.journal),
            notifier,
            timeline: Timeline::new(),
            config,
            changes,
        }
    }

    /// Returns the engine settings.
    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Returns the pending advances.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Schedules the progression of a newly placed order and announces the
    /// placement.
    #[tracing::instrument(skip(self, order), fields(order_id = ?order.id()))]
    pub async fn register(&self, order: &Order) {
        let (Some(order_id), Some(owner)) = (order.id(), order.owner()) else {
            tracing::warn!("ignoring registration of an unplaced order");
            return;
        };

        let base = order.created_at().unwrap_or_else(Utc::now);
        let scheduled = self
            .timeline
            .schedule_progression(order_id, base, self.config.advance_interval, order.status())
            .await;
        tracing::debug!(scheduled, "order progression scheduled");

        if order.status() == OrderStatus::Processing {
            self.publish(StatusChange {
                order_id,
                owner,
                from: None,
                to: OrderStatus::Processing,
                at: base,
            })
            .await;
        }
    }

    /// Moves an order forward to `target`.
    ///
    /// Returns the change that was written, or None if the order is terminal
    /// or already at or past `target`.
    #[tracing::instrument(skip(self))]
    pub async fn advance(
        &self,
        order_id: OrderId,
        target: OrderStatus,
    ) -> Result<Option<StatusChange>, DomainError> {
        let result = self
            .handler
            .execute_with_retry(
                order_id.stream_id(),
                None,
                self.config.max_cas_attempts,
                |order| order.advance_to(target, Utc::now()),
            )
            .await
            .map_err(|e| order_not_found(order_id, e))?;

        let Some(owner) = result.aggregate.owner() else {
            return Ok(None);
        };
        let change = result
            .events
            .first()
            .map(|event| StatusChange::from_event(order_id, owner, event));

        if let Some(change) = &change {
            self.publish(change.clone()).await;
        }
        Ok(change)
    }

    /// Cancels an order on behalf of its owner.
    ///
    /// Fails with `NotFound` if the order does not exist or belongs to
    /// someone else, and with `InvalidTransition` if it is already
    /// `Delivered` or `Cancelled`.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, order_id: OrderId, owner: UserId) -> Result<Order, DomainError> {
        let result = self
            .handler
            .execute_with_retry(
                order_id.stream_id(),
                Some(owner),
                self.config.max_cas_attempts,
                |order| order.cancel(owner, Utc::now()),
            )
            .await
            .map_err(|e| order_not_found(order_id, e))?;

        for event in &result.events {
            self.publish(StatusChange::from_event(order_id, owner, event))
                .await;
        }
        tracing::info!(%order_id, %owner, "order cancelled");

        Ok(result.aggregate)
    }

    /// Fires every advance due at or before `now`, earliest first.
    ///
    /// Failed advances are logged and abandoned. Returns the number of
    /// status changes written.
    pub async fn run_due(&self, now: DateTime<Utc>) -> usize {
        let due = self.timeline.take_due(now).await;
        let mut applied = 0;

        for scheduled in due {
            match self.advance(scheduled.order_id, scheduled.target).await {
                Ok(Some(_)) => applied += 1,
                Ok(None) => {
                    metrics::counter!("lifecycle_advance_skipped_total").increment(1);
                    tracing::debug!(
                        order_id = %scheduled.order_id,
                        target = %scheduled.target,
                        "advance no longer applies"
                    );
                }
                Err(e) => {
                    metrics::counter!("lifecycle_advance_failed_total").increment(1);
                    tracing::warn!(
                        order_id = %scheduled.order_id,
                        target = %scheduled.target,
                        error = %e,
                        "advance abandoned"
                    );
                }
            }
        }

        applied
    }

    /// Rebuilds the timeline from every non-terminal order in the journal.
    ///
    /// Advances that fell due while the process was down fire on the next
    /// poll. Returns the number of orders scheduled.
    #[tracing::instrument(skip(self))]
    pub async fn recover(&self) -> Result<usize, DomainError> {
        let mut records = self
            .handler
            .bounded(
                "journal scan",
                self.handler.journal().stream_kind(StreamKind::Order),
            )
            .await?;

        let mut seen = HashSet::new();
        let mut stream_ids = Vec::new();
        while let Some(record) = records.next().await {
            let record = record?;
            if seen.insert(record.stream_id) {
                stream_ids.push(record.stream_id);
            }
        }

        let mut recovered = 0;
        for stream_id in stream_ids {
            let Some(order) = self.handler.load_existing(stream_id).await? else {
                continue;
            };
            if order.is_terminal() {
                continue;
            }

            let base = order.created_at().unwrap_or_else(Utc::now);
            self.timeline
                .schedule_progression(
                    OrderId::from(stream_id),
                    base,
                    self.config.advance_interval,
                    order.status(),
                )
                .await;
            recovered += 1;
        }

        tracing::info!(
            orders = recovered,
            pending = self.timeline.len().await,
            "lifecycle timeline recovered"
        );
        Ok(recovered)
    }

    /// Returns a stream of every status change from now on.
    ///
    /// A subscriber that falls behind skips the changes it missed.
    pub fn subscribe(&self) -> StatusStream {
        let receiver = self.changes.subscribe();
        Box::pin(futures_util::stream::unfold(
            receiver,
            |mut receiver| async move {
                loop {
                    match receiver.recv().await {
                        Ok(change) => return Some((change, receiver)),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "status subscriber lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            },
        ))
    }

    /// Starts the background worker that fires due advances.
    ///
    /// The worker stops once `shutdown` turns true or its sender is dropped.
    pub fn spawn_worker(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()>
    where
        J: 'static,
        N: 'static,
    {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(poll_interval = ?self.config.poll_interval, "lifecycle worker started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.run_due(Utc::now()).await;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::info!("lifecycle worker stopped");
        })
    }

    async fn publish(&self, change: StatusChange) {
        let from = change.from.map_or("None", |s| s.as_str());
        metrics::counter!(
            "order_status_transitions_total",
            "from" => from,
            "to" => change.to.as_str()
        )
        .increment(1);
        tracing::info!(order_id = %change.order_id, from, to = %change.to, "order status changed");

        // Fails only when nobody is subscribed.
        let _ = self.changes.send(change.clone());

        let delivery = self.notifier.send(Notification::for_change(&change));
        match tokio::time::timeout(self.config.notify_timeout, delivery).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(
                    order_id = %change.order_id,
                    error = %e,
                    "status notification failed"
                );
            }
            Err(_) => {
                metrics::counter!("lifecycle_notifications_timed_out_total").increment(1);
                tracing::warn!(
                    order_id = %change.order_id,
                    timeout_ms = self.config.notify_timeout.as_millis() as u64,
                    "status notification timed out"
                );
            }
        }
    }
}

#[async_trait]
impl<J, N> OrderRegistrar for LifecycleEngine<J, N>
where
    J: Journal,
    N: NotificationSink,
{
    async fn register(&self, order: &Order) {
        LifecycleEngine::register(self, order).await
    }
}

fn order_not_found(order_id: OrderId, error: DomainError) -> DomainError {
    match error {
        DomainError::Order(OrderError::NotFound) => DomainError::not_found("Order", order_id),
        other => other,
    }
}
