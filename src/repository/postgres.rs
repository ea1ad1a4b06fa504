//! PostgreSQL implementation of the record repository.
//!
//! Records live as JSONB documents in the `records` collection (table).
//! Lookups filter on the document's own `id` field, backed by a unique
//! expression index; the table's `seq` column only preserves storage order.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::{RecordRepository, StoreError};
use crate::domain::{Record, RecordId};

/// Embedded schema migrations for the `records` collection.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Connection settings for [`PostgresRecordRepository::connect`].
#[derive(Debug, Clone)]
pub struct PostgresOptions<'a> {
    /// PostgreSQL connection string.
    pub url: &'a str,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
    /// Minimum idle connections kept open.
    pub min_connections: u32,
    /// Timeout for acquiring a connection.
    pub acquire_timeout: Duration,
}

/// Errors raised while opening the records collection at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// The database could not be reached.
    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    /// The collection schema could not be migrated.
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Document-collection record store backed by `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresRecordRepository {
    pool: PgPool,
}

impl PostgresRecordRepository {
    /// Wraps an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool and applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError::Database`] if the database is unreachable, or
    /// [`ConnectError::Migrate`] if the schema cannot be brought up to date.
    pub async fn connect(options: &PostgresOptions<'_>) -> Result<Self, ConnectError> {
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .min_connections(options.min_connections)
            .acquire_timeout(options.acquire_timeout)
            .connect(options.url)
            .await?;

        MIGRATOR.run(&pool).await?;
        tracing::info!("records collection migrated");

        Ok(Self::new(pool))
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Converts a stored JSONB document into a [`Record`].
fn decode_document(document: serde_json::Value) -> Result<Record, StoreError> {
    Ok(serde_json::from_value(document)?)
}

#[async_trait]
impl RecordRepository for PostgresRecordRepository {
    async fn get(&self, id: &RecordId) -> Result<Record, StoreError> {
        let document = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT document FROM records WHERE document->>'id' = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        decode_document(document)
    }

    async fn get_all(&self) -> Result<Vec<Record>, StoreError> {
        let documents = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT document FROM records ORDER BY seq ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        documents.into_iter().map(decode_document).collect()
    }

    async fn update(
        &self,
        id: &RecordId,
        created_at: DateTime<Utc>,
        value: f32,
    ) -> Result<RecordId, StoreError> {
        let document = serde_json::to_value(Record::new(id.clone(), created_at, value))?;

        // `||` overlays the new fields onto whatever the stored document holds.
        sqlx::query(
            "INSERT INTO records (document) VALUES ($1) \
             ON CONFLICT ((document->>'id')) \
             DO UPDATE SET document = records.document || EXCLUDED.document",
        )
        .bind(&document)
        .execute(&self.pool)
        .await?;

        Ok(id.clone())
    }

    async fn remove(&self, id: &RecordId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM records WHERE document->>'id' = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
