//! Outbound services the engine talks to.

pub mod notifier;

pub use notifier::{
    InMemoryNotificationSink, Notification, NotificationSink, NotifyError,
    TracingNotificationSink,
};
