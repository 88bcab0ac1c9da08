use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    JournalError, Record, RecordId, Result, StreamId, StreamKind, UserId, Version,
    store::{AppendOptions, Journal, RecordStream, validate_records_for_append},
};

const SELECT_RECORDS: &str = r#"
    SELECT id, stream_id, stream_kind, owner_id, record_type, version, recorded_at, payload
    FROM records
"#;

/// PostgreSQL-backed journal.
#[derive(Clone)]
pub struct PostgresJournal {
    pool: PgPool,
}

impl PostgresJournal {
    /// Creates a new PostgreSQL journal.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_record(row: PgRow) -> Result<Record> {
        let kind: String = row.try_get("stream_kind")?;

        Ok(Record {
            record_id: RecordId::from_uuid(row.try_get::<Uuid, _>("id")?),
            stream_id: StreamId::from_uuid(row.try_get::<Uuid, _>("stream_id")?),
            stream_kind: kind.parse()?,
            owner: UserId::from_uuid(row.try_get::<Uuid, _>("owner_id")?),
            record_type: row.try_get("record_type")?,
            version: Version::new(row.try_get("version")?),
            recorded_at: row.try_get("recorded_at")?,
            payload: row.try_get("payload")?,
        })
    }
}

#[async_trait]
impl Journal for PostgresJournal {
    #[tracing::instrument(skip(self, records), fields(count = records.len()))]
    async fn append(&self, records: Vec<Record>, options: AppendOptions) -> Result<Version> {
        validate_records_for_append(&records)?;

        let stream_id = match records.first() {
            Some(first) => first.stream_id,
            None => return Err(JournalError::InvalidAppend("empty batch".to_string())),
        };

        let mut tx = self.pool.begin().await?;

        if let Some(expected) = options.expected_version {
            let current: Option<i64> =
                sqlx::query_scalar("SELECT MAX(version) FROM records WHERE stream_id = $1")
                    .bind(stream_id.as_uuid())
                    .fetch_one(&mut *tx)
                    .await?;

            let actual = Version::new(current.unwrap_or(0));
            if actual != expected {
                return Err(JournalError::ConcurrencyConflict {
                    stream_id,
                    expected,
                    actual,
                });
            }
        }

        let mut last_version = Version::initial();
        for record in &records {
            sqlx::query(
                r#"
                INSERT INTO records (id, stream_id, stream_kind, owner_id, record_type, version, recorded_at, payload)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(record.record_id.as_uuid())
            .bind(record.stream_id.as_uuid())
            .bind(record.stream_kind.as_str())
            .bind(record.owner.as_uuid())
            .bind(&record.record_type)
            .bind(record.version.as_i64())
            .bind(record.recorded_at)
            .bind(&record.payload)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                // A concurrent writer got the same version in first.
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some("unique_stream_version")
                {
                    return JournalError::ConcurrencyConflict {
                        stream_id,
                        expected: options.expected_version.unwrap_or(Version::initial()),
                        actual: record.version,
                    };
                }
                JournalError::Database(e)
            })?;

            last_version = record.version;
        }

        tx.commit().await?;
        Ok(last_version)
    }

    async fn read_stream(&self, stream_id: StreamId) -> Result<Vec<Record>> {
        let sql = format!("{SELECT_RECORDS} WHERE stream_id = $1 ORDER BY version ASC");
        let rows = sqlx::query(&sql)
            .bind(stream_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }

    async fn streams_for_owner(&self, kind: StreamKind, owner: UserId) -> Result<Vec<StreamId>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT stream_id
            FROM records
            WHERE stream_kind = $1 AND owner_id = $2 AND version = 1
            ORDER BY recorded_at ASC, id ASC
            "#,
        )
        .bind(kind.as_str())
        .bind(owner.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(StreamId::from_uuid).collect())
    }

    async fn stream_kind(&self, kind: StreamKind) -> Result<RecordStream> {
        use futures_util::stream;

        let sql = format!(
            "{SELECT_RECORDS} WHERE stream_kind = $1 ORDER BY recorded_at ASC, version ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await?;

        let records: Vec<Result<Record>> = rows.into_iter().map(Self::row_to_record).collect();
        Ok(Box::pin(stream::iter(records)))
    }

    async fn stream_version(&self, stream_id: StreamId) -> Result<Option<Version>> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT MAX(version) FROM records WHERE stream_id = $1")
                .bind(stream_id.as_uuid())
                .fetch_one(&self.pool)
                .await?;

        Ok(version.map(Version::new))
    }
}
