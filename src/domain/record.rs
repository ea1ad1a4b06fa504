//! The peak flow measurement entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RecordId;

/// A single peak flow measurement.
///
/// The serialized form doubles as the wire representation and the stored
/// document shape:
///
/// ```json
/// { "id": "1", "created_at": "2024-03-01T08:15:00Z", "value": 505.0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique record identifier.
    pub id: RecordId,
    /// When the measurement was taken.
    pub created_at: DateTime<Utc>,
    /// Measured peak flow (L/min).
    pub value: f32,
}

impl Record {
    /// Creates a record from its parts.
    #[must_use]
    pub fn new(id: RecordId, created_at: DateTime<Utc>, value: f32) -> Self {
        Self {
            id,
            created_at,
            value,
        }
    }

    /// Creates a record with a fresh id, stamped with the current time.
    #[must_use]
    pub fn stamped(value: f32) -> Self {
        Self::new(RecordId::generate(), Utc::now(), value)
    }
}
