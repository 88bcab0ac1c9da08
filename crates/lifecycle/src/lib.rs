//! Order lifecycle engine.
//!
//! Placed orders move through `Packing`, `Delivering` and `Delivered` on a
//! fixed cadence until the customer cancels them. The pending advances form a
//! timeline that is derived from the journal, so it can be rebuilt after a
//! restart:
//!
//! 1. `register` schedules the advances of a newly placed order
//! 2. a background worker fires due advances as compare-and-set writes
//! 3. `recover` rebuilds the timeline from every non-terminal order
//!
//! Every status change is published to subscribers and forwarded to a
//! notification sink.

pub mod config;
pub mod engine;
pub mod events;
pub mod services;
pub mod timeline;

pub use config::{LifecycleConfig, MAX_ADVANCE_INTERVAL};
pub use engine::LifecycleEngine;
pub use events::{StatusChange, StatusStream};
pub use services::{
    InMemoryNotificationSink, Notification, NotificationSink, NotifyError,
    TracingNotificationSink,
};
pub use timeline::{ScheduledAdvance, Timeline};
