//! Record request payloads for create and update.
//!
//! Responses serialize [`crate::domain::Record`] directly. Requests use
//! dedicated payloads so that a client-supplied `id` never reaches the
//! store: the field is not declared and is dropped during decoding.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::Record;
use crate::error::ApiError;

/// Request body for `POST /records`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateRecordRequest {
    /// Measurement time. Defaults to the server time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Measured value.
    #[serde(default)]
    pub value: Option<f32>,
}

impl CreateRecordRequest {
    /// Checks required fields and returns `(value, created_at)`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] if `value` is absent or not
    /// finite.
    pub fn validate(self) -> Result<(f32, Option<DateTime<Utc>>), ApiError> {
        let value = self.value.ok_or_else(|| {
            ApiError::InvalidRequest("missing required record fields".to_string())
        })?;
        Ok((ensure_finite(value)?, self.created_at))
    }
}

/// Request body for `PUT /records/{id}`.
///
/// Absent fields keep the stored record's current values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRecordRequest {
    /// New measurement time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// New measured value.
    #[serde(default)]
    pub value: Option<f32>,
}

impl UpdateRecordRequest {
    /// Overlays the supplied fields onto `current`, keeping its id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] if `value` is not finite.
    pub fn apply_to(self, current: Record) -> Result<Record, ApiError> {
        let value = match self.value {
            Some(v) => ensure_finite(v)?,
            None => current.value,
        };
        Ok(Record {
            created_at: self.created_at.unwrap_or(current.created_at),
            value,
            ..current
        })
    }
}

/// Rejects NaN and infinite measurements.
///
/// # Errors
///
/// Returns [`ApiError::InvalidRequest`] for non-finite input.
pub fn ensure_finite(value: f32) -> Result<f32, ApiError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ApiError::InvalidRequest(format!(
            "value must be a finite number, got {value}"
        )))
    }
}
