//! Record service: stamps new records and forwards to the repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{Record, RecordId};
use crate::repository::{RecordRepository, StoreError};

/// Orchestration layer between HTTP handlers and the repository.
///
/// Owns a shared handle to whichever [`RecordRepository`] backend the
/// process was started with. The service decides record identity and
/// timestamps; the repository only stores what it is given.
#[derive(Debug, Clone)]
pub struct RecordService {
    repository: Arc<dyn RecordRepository>,
}

impl RecordService {
    /// Creates a new `RecordService` over `repository`.
    #[must_use]
    pub fn new(repository: Arc<dyn RecordRepository>) -> Self {
        Self { repository }
    }

    /// Returns every stored record.
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub async fn list(&self) -> Result<Vec<Record>, StoreError> {
        self.repository.get_all().await
    }

    /// Returns a single record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `id` is unknown.
    pub async fn get(&self, id: &RecordId) -> Result<Record, StoreError> {
        self.repository.get(id).await
    }

    /// Creates a record under a freshly generated id.
    ///
    /// `created_at` defaults to the current server time.
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub async fn create(
        &self,
        value: f32,
        created_at: Option<DateTime<Utc>>,
    ) -> Result<Record, StoreError> {
        let record = Record::new(
            RecordId::generate(),
            created_at.unwrap_or_else(Utc::now),
            value,
        );
        self.persist(record).await
    }

    /// Creates a record from a bare value, stamped with a fresh id and the
    /// current server time.
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub async fn create_by_value(&self, value: f32) -> Result<Record, StoreError> {
        self.persist(Record::stamped(value)).await
    }

    /// Stores `record`, replacing any record with the same id.
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub async fn replace(&self, record: Record) -> Result<Record, StoreError> {
        self.persist(record).await
    }

    /// Deletes `record` and returns it back.
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub async fn delete(&self, record: Record) -> Result<Record, StoreError> {
        let removed = self.repository.remove(&record.id).await?;
        tracing::info!(record_id = %record.id, removed, "record deleted");
        Ok(record)
    }

    async fn persist(&self, record: Record) -> Result<Record, StoreError> {
        let id = self
            .repository
            .update(&record.id, record.created_at, record.value)
            .await?;
        tracing::info!(record_id = %id, value = record.value, "record stored");
        Ok(Record { id, ..record })
    }
}
