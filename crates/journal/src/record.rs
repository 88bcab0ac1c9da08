use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{JournalError, StreamId, UserId};

/// Unique identifier for a journal record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Creates a new random record ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a record ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Version number of a stream, used for compare-and-set appends.
///
/// A stream with no records is at version 0; the first record is version 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the version of a stream that has no records yet.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the version of the first record.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of aggregate a stream holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamKind {
    /// A user's shopping cart. The stream id equals the owner's id.
    Cart,
    /// A placed order.
    Order,
}

impl StreamKind {
    /// Returns the kind as stored in the journal.
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Cart => "cart",
            StreamKind::Order => "order",
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StreamKind {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cart" => Ok(StreamKind::Cart),
            "order" => Ok(StreamKind::Order),
            other => Err(JournalError::UnknownStreamKind(other.to_string())),
        }
    }
}

/// One entry of a stream: a domain event plus the metadata needed to store,
/// version and route it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier for this record.
    pub record_id: RecordId,

    /// The stream this record belongs to.
    pub stream_id: StreamId,

    /// What the stream holds.
    pub stream_kind: StreamKind,

    /// The user owning the stream.
    pub owner: UserId,

    /// The domain event name (e.g. "ItemAdded", "OrderCancelled").
    pub record_type: String,

    /// The stream version after this record.
    pub version: Version,

    /// When the record was written.
    pub recorded_at: DateTime<Utc>,

    /// The event payload as JSON.
    pub payload: serde_json::Value,
}

impl Record {
    /// Creates a new record builder.
    pub fn builder() -> RecordBuilder {
        RecordBuilder::default()
    }
}

/// Builder for journal records.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    record_id: Option<RecordId>,
    stream_id: Option<StreamId>,
    stream_kind: Option<StreamKind>,
    owner: Option<UserId>,
    record_type: Option<String>,
    version: Option<Version>,
    recorded_at: Option<DateTime<Utc>>,
    payload: Option<serde_json::Value>,
}

impl RecordBuilder {
    /// Sets the record ID. If not set, a new ID will be generated.
    pub fn record_id(mut self, id: RecordId) -> Self {
        self.record_id = Some(id);
        self
    }

    /// Sets the stream ID.
    pub fn stream_id(mut self, id: StreamId) -> Self {
        self.stream_id = Some(id);
        self
    }

    /// Sets the stream kind.
    pub fn stream_kind(mut self, kind: StreamKind) -> Self {
        self.stream_kind = Some(kind);
        self
    }

    /// Sets the owning user.
    pub fn owner(mut self, owner: UserId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Sets the record type.
    pub fn record_type(mut self, record_type: impl Into<String>) -> Self {
        self.record_type = Some(record_type.into());
        self
    }

    /// Sets the version.
    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Sets the timestamp. If not set, the current time will be used.
    pub fn recorded_at(mut self, recorded_at: DateTime<Utc>) -> Self {
        self.recorded_at = Some(recorded_at);
        self
    }

    /// Sets the payload from a serializable value.
    pub fn payload<T: Serialize>(mut self, payload: &T) -> Result<Self, serde_json::Error> {
        self.payload = Some(serde_json::to_value(payload)?);
        Ok(self)
    }

    /// Sets the payload from a raw JSON value.
    pub fn payload_raw(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Builds the record, returning an error naming the first missing field.
    pub fn build(self) -> crate::Result<Record> {
        fn missing(field: &str) -> JournalError {
            JournalError::InvalidAppend(format!("record is missing {field}"))
        }

        Ok(Record {
            record_id: self.record_id.unwrap_or_default(),
            stream_id: self.stream_id.ok_or_else(|| missing("stream_id"))?,
            stream_kind: self.stream_kind.ok_or_else(|| missing("stream_kind"))?,
            owner: self.owner.ok_or_else(|| missing("owner"))?,
            record_type: self.record_type.ok_or_else(|| missing("record_type"))?,
            version: self.version.ok_or_else(|| missing("version"))?,
            recorded_at: self.recorded_at.unwrap_or_else(Utc::now),
            payload: self.payload.ok_or_else(|| missing("payload"))?,
        })
    }
}
