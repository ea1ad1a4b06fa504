//! Persistence layer: the record repository contract and its backends.
//!
//! [`RecordRepository`] is the sole mutator of the record collection.
//! Two interchangeable implementations exist:
//!
//! - [`MemoryRecordRepository`]: process-lifetime store behind a
//!   `tokio::sync::RwLock`, optionally seeded with fixture records.
//! - [`PostgresRecordRepository`]: durable JSONB document collection
//!   accessed through `sqlx::PgPool`.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Record, RecordId};

pub use memory::{MemoryRecordRepository, fixture_records};
pub use postgres::{ConnectError, PostgresRecordRepository};

/// Errors raised by a [`RecordRepository`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record with the given id exists.
    #[error("no matching record found: {0}")]
    NotFound(RecordId),

    /// The database rejected or failed the operation.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored document could not be converted to or from a record.
    #[error("malformed record document: {0}")]
    Document(#[from] serde_json::Error),
}

/// Persistence contract for [`Record`]s.
///
/// Every operation addresses a single record by its application-level
/// id; there are no transactions spanning several records.
#[async_trait]
pub trait RecordRepository: std::fmt::Debug + Send + Sync + 'static {
    /// Returns the record stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no such record exists, or a
    /// backend error.
    async fn get(&self, id: &RecordId) -> Result<Record, StoreError>;

    /// Returns every stored record in storage order.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the collection cannot be read.
    async fn get_all(&self) -> Result<Vec<Record>, StoreError>;

    /// Upserts a record: replaces `created_at` and `value` of the record
    /// stored under `id`, or inserts a new record with that id.
    ///
    /// Returns the effective id.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the write fails.
    async fn update(
        &self,
        id: &RecordId,
        created_at: DateTime<Utc>,
        value: f32,
    ) -> Result<RecordId, StoreError>;

    /// Removes the record stored under `id`, returning how many records
    /// were removed (`0` when the id was absent).
    ///
    /// # Errors
    ///
    /// Returns a backend error if the delete fails.
    async fn remove(&self, id: &RecordId) -> Result<u64, StoreError>;
}
