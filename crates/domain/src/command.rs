//! Command handling infrastructure.

use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use common::{StreamId, UserId};
use journal::{AppendOptions, Journal, JournalError, Record, Version};

use crate::aggregate::{Aggregate, DomainEvent};
use crate::error::DomainError;

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate after applying the new events.
    pub aggregate: A,

    /// The events that were generated and persisted.
    pub events: Vec<A::Event>,

    /// The new version of the aggregate after the command.
    pub new_version: Version,
}

/// Handler for executing commands against aggregates.
///
/// The handler:
/// 1. Loads the aggregate by replaying its stream
/// 2. Runs the command to produce events
/// 3. Appends the events expecting the version it loaded
///
/// Every journal call is bounded by the configured timeout.
pub struct CommandHandler<J, A>
where
    J: Journal,
    A: Aggregate,
{
    journal: J,
    timeout: Duration,
    _phantom: PhantomData<A>,
}

impl<J, A> CommandHandler<J, A>
where
    J: Journal,
    A: Aggregate,
{
    /// Creates a new command handler over the given journal.
    pub fn new(journal: J, timeout: Duration) -> Self {
        Self {
            journal,
            timeout,
            _phantom: PhantomData,
        }
    }

    /// Returns a reference to the underlying journal.
    pub fn journal(&self) -> &J {
        &self.journal
    }

    /// Runs a journal call, failing with `Timeout` if it takes too long.
    pub async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, DomainError>
    where
        F: Future<Output = journal::Result<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                tracing::warn!(operation, timeout = ?self.timeout, "journal call timed out");
                Err(DomainError::Timeout {
                    operation,
                    after: self.timeout,
                })
            }
        }
    }

    /// Loads an aggregate from its stream.
    ///
    /// Returns a default instance if the stream does not exist or holds a
    /// different kind of aggregate.
    pub async fn load(&self, stream_id: StreamId) -> Result<A, DomainError> {
        let records = self
            .bounded("journal read", self.journal.read_stream(stream_id))
            .await?;

        let mut aggregate = A::default();
        if records.iter().any(|r| r.stream_kind != A::stream_kind()) {
            tracing::debug!(%stream_id, "stream holds a different aggregate kind");
            return Ok(aggregate);
        }

        for record in records {
            let event: A::Event = serde_json::from_value(record.payload)?;
            aggregate.apply(event);
            aggregate.set_version(record.version);
        }

        Ok(aggregate)
    }

    /// Loads an aggregate, returning None if it doesn't exist.
    pub async fn load_existing(&self, stream_id: StreamId) -> Result<Option<A>, DomainError> {
        let aggregate = self.load(stream_id).await?;
        if aggregate.exists() {
            Ok(Some(aggregate))
        } else {
            Ok(None)
        }
    }

    /// Executes a command and persists the resulting events.
    ///
    /// The command function receives the current aggregate state and returns
    /// either a list of events to apply, or an error. New records are owned by
    /// the aggregate's recorded owner, falling back to `owner` for streams the
    /// aggregate does not track ownership for.
    pub async fn execute<F>(
        &self,
        stream_id: StreamId,
        owner: Option<UserId>,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let mut aggregate = self.load(stream_id).await?;
        let current_version = aggregate.version();

        let events = command_fn(&aggregate)?;

        if events.is_empty() {
            return Ok(CommandResult {
                aggregate,
                events: vec![],
                new_version: current_version,
            });
        }

        // Apply first so that a placement event can supply the owner.
        aggregate.apply_events(events.iter().cloned());

        let record_owner = aggregate
            .owner()
            .or(owner)
            .ok_or_else(|| DomainError::not_found(A::stream_kind().as_str(), stream_id))?;
        let records = self.build_records(stream_id, record_owner, current_version, &events)?;

        let options = if current_version == Version::initial() {
            AppendOptions::expect_new()
        } else {
            AppendOptions::expect_version(current_version)
        };

        let new_version = self
            .bounded("journal append", self.journal.append(records, options))
            .await?;
        aggregate.set_version(new_version);

        Ok(CommandResult {
            aggregate,
            events,
            new_version,
        })
    }

    /// Executes a command, re-reading and re-running it when another writer
    /// moved the stream first.
    ///
    /// Gives up with the conflict after `max_attempts` tries.
    pub async fn execute_with_retry<F>(
        &self,
        stream_id: StreamId,
        owner: Option<UserId>,
        max_attempts: u32,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: Fn(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let mut attempt = 1;
        loop {
            match self.execute(stream_id, owner, &command_fn).await {
                Err(DomainError::Journal(JournalError::ConcurrencyConflict { .. }))
                    if attempt < max_attempts =>
                {
                    tracing::debug!(%stream_id, attempt, "version conflict, re-reading stream");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    fn build_records(
        &self,
        stream_id: StreamId,
        owner: UserId,
        current_version: Version,
        events: &[A::Event],
    ) -> Result<Vec<Record>, DomainError> {
        let mut records = Vec::with_capacity(events.len());
        let mut version = current_version;

        for event in events {
            version = version.next();
            let record = Record::builder()
                .stream_id(stream_id)
                .stream_kind(A::stream_kind())
                .owner(owner)
                .record_type(event.event_type())
                .version(version)
                .payload(event)?
                .build()?;
            records.push(record);
        }

        Ok(records)
    }
}
