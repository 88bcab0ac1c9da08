//! Core aggregate and domain event traits.

use common::UserId;
use journal::{StreamKind, Version};
use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events are facts that have already happened, named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name stored as the journal record type.
    fn event_type(&self) -> &'static str;
}

/// Trait for aggregates persisted as journal streams.
///
/// Aggregates are rebuilt by replaying their events, turn commands into new
/// events, and apply events without side effects.
pub trait Aggregate: Default + Send + Sync + Sized {
    /// The type of events this aggregate produces and consumes.
    type Event: DomainEvent;

    /// The type of errors this aggregate's commands can produce.
    type Error: std::error::Error + Send + Sync;

    /// Returns the kind of journal stream holding this aggregate.
    fn stream_kind() -> StreamKind;

    /// Returns the user owning the aggregate, if the aggregate records it.
    fn owner(&self) -> Option<UserId> {
        None
    }

    /// Returns the current version of the aggregate.
    ///
    /// Version starts at 0 for a new aggregate and increments with each event.
    fn version(&self) -> Version;

    /// Sets the aggregate version.
    ///
    /// Called by the command handler after loading events.
    fn set_version(&mut self, version: Version);

    /// Applies an event to the aggregate, updating its state.
    ///
    /// Must be deterministic and must not fail.
    fn apply(&mut self, event: Self::Event);

    /// Applies multiple events in sequence.
    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }

    /// Returns true once at least one event has been applied.
    fn exists(&self) -> bool {
        self.version() != Version::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    enum TestEvent {
        Opened { owner: UserId },
        Counted { value: i32 },
    }

    impl DomainEvent for TestEvent {
        fn event_type(&self) -> &'static str {
            match self {
                TestEvent::Opened { .. } => "TestOpened",
                TestEvent::Counted { .. } => "TestCounted",
            }
        }
    }

    #[derive(Debug, Default)]
    struct Counter {
        owner: Option<UserId>,
        value: i32,
        version: Version,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("test error")]
    struct TestError;

    impl Aggregate for Counter {
        type Event = TestEvent;
        type Error = TestError;

        fn stream_kind() -> StreamKind {
            StreamKind::Cart
        }

        fn owner(&self) -> Option<UserId> {
            self.owner
        }

        fn version(&self) -> Version {
            self.version
        }

        fn set_version(&mut self, version: Version) {
            self.version = version;
        }

        fn apply(&mut self, event: Self::Event) {
            match event {
                TestEvent::Opened { owner } => self.owner = Some(owner),
                TestEvent::Counted { value } => self.value = value,
            }
        }
    }

    #[test]
    fn test_aggregate_apply_events() {
        let owner = UserId::new();
        let mut counter = Counter::default();

        counter.apply_events(vec![
            TestEvent::Opened { owner },
            TestEvent::Counted { value: 42 },
        ]);

        assert_eq!(counter.owner(), Some(owner));
        assert_eq!(counter.value, 42);
    }

    #[test]
    fn test_domain_event_type() {
        assert_eq!(
            TestEvent::Opened {
                owner: UserId::new()
            }
            .event_type(),
            "TestOpened"
        );
        assert_eq!(TestEvent::Counted { value: 1 }.event_type(), "TestCounted");
    }

    #[test]
    fn test_exists_follows_version() {
        let mut counter = Counter::default();
        assert!(!counter.exists());

        counter.set_version(Version::first());
        assert!(counter.exists());
    }
}
