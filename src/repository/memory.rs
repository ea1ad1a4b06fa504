//! In-memory record store.
//!
//! [`MemoryRecordRepository`] keeps records in insertion order inside a
//! `Vec` guarded by a [`tokio::sync::RwLock`]. Reads run concurrently;
//! writes are serialized so concurrent creates never lose records.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use super::{RecordRepository, StoreError};
use crate::domain::{Record, RecordId};

/// Process-lifetime record repository.
#[derive(Debug, Default)]
pub struct MemoryRecordRepository {
    records: RwLock<Vec<Record>>,
}

impl MemoryRecordRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository holding the given records, in order.
    #[must_use]
    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Creates a repository seeded with six sample measurements spread
    /// over the last three days, ids `"0"` through `"5"`.
    #[must_use]
    pub fn with_fixtures() -> Self {
        Self::with_records(fixture_records(Utc::now()))
    }

    /// Returns the number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns `true` if the repository holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

/// Builds the fixture measurements relative to `now`.
#[must_use]
pub fn fixture_records(now: DateTime<Utc>) -> Vec<Record> {
    [(72, 490.0), (48, 505.0), (44, 480.0), (24, 525.0), (20, 495.0), (0, 520.0)]
        .into_iter()
        .enumerate()
        .map(|(i, (hours_ago, value))| {
            Record::new(
                RecordId::from(i.to_string()),
                now - Duration::hours(hours_ago),
                value,
            )
        })
        .collect()
}

#[async_trait]
impl RecordRepository for MemoryRecordRepository {
    async fn get(&self, id: &RecordId) -> Result<Record, StoreError> {
        let records = self.records.read().await;
        records
            .iter()
            .find(|r| &r.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn get_all(&self) -> Result<Vec<Record>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn update(
        &self,
        id: &RecordId,
        created_at: DateTime<Utc>,
        value: f32,
    ) -> Result<RecordId, StoreError> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| &r.id == id) {
            Some(existing) => {
                existing.created_at = created_at;
                existing.value = value;
            }
            None => records.push(Record::new(id.clone(), created_at, value)),
        }
        Ok(id.clone())
    }

    async fn remove(&self, id: &RecordId) -> Result<u64, StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| &r.id != id);
        Ok((before - records.len()) as u64)
    }
}
