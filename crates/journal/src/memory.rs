use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    JournalError, Record, Result, StreamId, StreamKind, UserId, Version,
    store::{AppendOptions, Journal, RecordStream, validate_records_for_append},
};

/// In-memory journal.
///
/// Used by the tests and by the api binary when no database is configured.
/// Records are kept in write order; nothing survives a restart.
#[derive(Clone, Default)]
pub struct InMemoryJournal {
    records: Arc<RwLock<Vec<Record>>>,
}

impl InMemoryJournal {
    /// Creates a new empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of records stored.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Clears all records.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

fn current_version(records: &[Record], stream_id: StreamId) -> Version {
    records
        .iter()
        .filter(|r| r.stream_id == stream_id)
        .map(|r| r.version)
        .max()
        .unwrap_or(Version::initial())
}

#[async_trait]
impl Journal for InMemoryJournal {
    async fn append(&self, records: Vec<Record>, options: AppendOptions) -> Result<Version> {
        validate_records_for_append(&records)?;

        let (stream_id, first_version) = match records.first() {
            Some(first) => (first.stream_id, first.version),
            None => return Err(JournalError::InvalidAppend("empty batch".to_string())),
        };

        // The write lock is held across check and insert, which makes the
        // version check a compare-and-set.
        let mut store = self.records.write().await;
        let current = current_version(&store, stream_id);

        if let Some(expected) = options.expected_version
            && current != expected
        {
            return Err(JournalError::ConcurrencyConflict {
                stream_id,
                expected,
                actual: current,
            });
        }

        // Unique (stream_id, version) simulation
        if first_version <= current {
            return Err(JournalError::ConcurrencyConflict {
                stream_id,
                expected: options.expected_version.unwrap_or(current),
                actual: current,
            });
        }

        let last_version = records
            .last()
            .map(|r| r.version)
            .unwrap_or(Version::initial());
        store.extend(records);

        Ok(last_version)
    }

    async fn read_stream(&self, stream_id: StreamId) -> Result<Vec<Record>> {
        let store = self.records.read().await;
        let mut records: Vec<_> = store
            .iter()
            .filter(|r| r.stream_id == stream_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.version);
        Ok(records)
    }

    async fn streams_for_owner(&self, kind: StreamKind, owner: UserId) -> Result<Vec<StreamId>> {
        let store = self.records.read().await;
        let mut ids = Vec::new();
        for record in store
            .iter()
            .filter(|r| r.stream_kind == kind && r.owner == owner)
        {
            if !ids.contains(&record.stream_id) {
                ids.push(record.stream_id);
            }
        }
        Ok(ids)
    }

    async fn stream_kind(&self, kind: StreamKind) -> Result<RecordStream> {
        use futures_util::stream;

        let store = self.records.read().await;
        let records: Vec<_> = store
            .iter()
            .filter(|r| r.stream_kind == kind)
            .cloned()
            .collect();

        Ok(Box::pin(stream::iter(records.into_iter().map(Ok))))
    }

    async fn stream_version(&self, stream_id: StreamId) -> Result<Option<Version>> {
        let store = self.records.read().await;
        let version = store
            .iter()
            .filter(|r| r.stream_id == stream_id)
            .map(|r| r.version)
            .max();
        Ok(version)
    }
}
