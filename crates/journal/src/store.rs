use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{JournalError, Record, Result, StreamId, StreamKind, UserId, Version};

/// Options for appending records to a stream.
#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// Version the stream must be at for the append to go through.
    /// If None, no version check is performed.
    pub expected_version: Option<Version>,
}

impl AppendOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the stream to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting the stream to have no records yet.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }
}

/// A stream of journal records.
pub type RecordStream = Pin<Box<dyn Stream<Item = Result<Record>> + Send>>;

/// Storage for cart and order streams.
///
/// All implementations must be thread-safe and apply a batch atomically.
#[async_trait]
pub trait Journal: Send + Sync {
    /// Appends records to a single stream.
    ///
    /// If `options.expected_version` is set and the stream is elsewhere, the
    /// call fails with `ConcurrencyConflict` and nothing is written.
    ///
    /// Returns the stream version after the append.
    async fn append(&self, records: Vec<Record>, options: AppendOptions) -> Result<Version>;

    /// Returns every record of a stream in version order.
    async fn read_stream(&self, stream_id: StreamId) -> Result<Vec<Record>>;

    /// Returns the ids of the streams of `kind` owned by `owner`, oldest first.
    async fn streams_for_owner(&self, kind: StreamKind, owner: UserId) -> Result<Vec<StreamId>>;

    /// Streams every record of `kind` in write order.
    async fn stream_kind(&self, kind: StreamKind) -> Result<RecordStream>;

    /// Returns the current version of a stream, or None if it has no records.
    async fn stream_version(&self, stream_id: StreamId) -> Result<Option<Version>>;
}

/// Convenience methods available on every journal.
#[async_trait]
pub trait JournalExt: Journal {
    /// Appends a single record.
    async fn append_record(&self, record: Record, options: AppendOptions) -> Result<Version> {
        self.append(vec![record], options).await
    }

    /// Checks whether a stream has any records.
    async fn stream_exists(&self, stream_id: StreamId) -> Result<bool> {
        Ok(self.stream_version(stream_id).await?.is_some())
    }
}

impl<T: Journal + ?Sized> JournalExt for T {}

/// Checks that a batch targets one stream with consecutive versions.
pub fn validate_records_for_append(records: &[Record]) -> Result<()> {
    let Some(first) = records.first() else {
        return Err(JournalError::InvalidAppend(
            "Cannot append empty record list".to_string(),
        ));
    };

    let mut expected_version = first.version;
    for record in records.iter().skip(1) {
        if record.stream_id != first.stream_id {
            return Err(JournalError::InvalidAppend(
                "All records must be for the same stream".to_string(),
            ));
        }
        if record.stream_kind != first.stream_kind || record.owner != first.owner {
            return Err(JournalError::InvalidAppend(
                "All records must share stream kind and owner".to_string(),
            ));
        }
        expected_version = expected_version.next();
        if record.version != expected_version {
            return Err(JournalError::InvalidAppend(format!(
                "Record versions must be sequential. Expected {}, got {}",
                expected_version, record.version
            )));
        }
    }

    Ok(())
}
