//! Notification sink trait and implementations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::UserId;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::events::StatusChange;

/// A message for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: UserId,
    pub subject: String,
    pub body: String,
}

impl Notification {
    /// Builds the message announcing a status change to the order's owner.
    pub fn for_change(change: &StatusChange) -> Self {
        let subject = format!("Order {} is now {}", change.order_id, change.to);
        let body = match change.from {
            None => format!(
                "We received your order {} and it is being processed.",
                change.order_id
            ),
            Some(from) => format!(
                "Your order {} moved from {} to {} at {}.",
                change.order_id,
                from,
                change.to,
                change.at.to_rfc3339()
            ),
        };
        Self {
            recipient: change.owner,
            subject,
            body,
        }
    }
}

/// Errors reported by a notification sink.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The message could not be delivered.
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Delivers notifications to users.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Sends one notification.
    async fn send(&self, notification: Notification) -> Result<(), NotifyError>;
}

#[async_trait]
impl<T: NotificationSink + ?Sized> NotificationSink for Arc<T> {
    async fn send(&self, notification: Notification) -> Result<(), NotifyError> {
        (**self).send(notification).await
    }
}

/// Sink that writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotificationSink;

#[async_trait]
impl NotificationSink for TracingNotificationSink {
    async fn send(&self, notification: Notification) -> Result<(), NotifyError> {
        tracing::info!(
            recipient = %notification.recipient,
            subject = %notification.subject,
            "notification sent"
        );
        Ok(())
    }
}

/// In-memory sink for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationSink {
    sent: Arc<Mutex<Vec<Notification>>>,
    fail: Arc<AtomicBool>,
}

impl InMemoryNotificationSink {
    /// Creates a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following send fail, or succeed again.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Returns the notifications delivered so far.
    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }

    /// Returns the notifications delivered to one user.
    pub async fn sent_to(&self, recipient: UserId) -> Vec<Notification> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|n| n.recipient == recipient)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl NotificationSink for InMemoryNotificationSink {
    async fn send(&self, notification: Notification) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Delivery("mailbox unavailable".to_string()));
        }
        self.sent.lock().await.push(notification);
        Ok(())
    }
}
