//! Request extractors that run ahead of the record handlers.
//!
//! Each extractor resolves one precondition and rejects with an
//! [`ApiError`] before the handler body executes:
//!
//! - [`LoadedRecord`] loads the record addressed by `{id}` (404 otherwise).
//! - [`NewRecordValue`] parses the `{value}` path segment (400 otherwise).
//! - [`AuthorizedCaller`] checks the caller address against the configured
//!   allow rule (403 otherwise).
//! - [`JsonBody`] decodes a JSON body, rendering failures as 400.

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::api::dto::ensure_finite;
use crate::app_state::AppState;
use crate::domain::{Record, RecordId};
use crate::error::ApiError;
use crate::repository::StoreError;

/// Path parameter naming the record id.
pub const RECORD_ID_PARAM: &str = "id";

/// Path parameter carrying a bare measurement value.
pub const NEW_VALUE_PARAM: &str = "value";

async fn path_param(parts: &mut Parts, state: &AppState, name: &str) -> Option<String> {
    let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
        .await
        .ok()?;
    params.get(name).filter(|v| !v.is_empty()).cloned()
}

/// The record addressed by the `{id}` path segment, already loaded from
/// the repository.
#[derive(Debug, Clone)]
pub struct LoadedRecord(pub Record);

impl FromRequestParts<AppState> for LoadedRecord {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(id) = path_param(parts, state, RECORD_ID_PARAM).await else {
            return Err(ApiError::NotFound);
        };
        let id = RecordId::from(id);

        match state.record_service.get(&id).await {
            Ok(record) => Ok(Self(record)),
            Err(StoreError::NotFound(_)) => Err(ApiError::NotFound),
            Err(err) => {
                tracing::warn!(record_id = %id, error = %err, "failed to load record");
                Err(ApiError::NotFound)
            }
        }
    }
}

/// A measurement value parsed from the `{value}` path segment.
#[derive(Debug, Clone, Copy)]
pub struct NewRecordValue(pub f32);

impl FromRequestParts<AppState> for NewRecordValue {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(raw) = path_param(parts, state, NEW_VALUE_PARAM).await else {
            return Err(ApiError::InvalidRequest(
                "missing record value".to_string(),
            ));
        };
        let value = raw.parse::<f32>().map_err(|e| {
            ApiError::InvalidRequest(format!("invalid record value {raw:?}: {e}"))
        })?;
        Ok(Self(ensure_finite(value)?))
    }
}

/// Proof that the caller may perform changes.
///
/// With no `authorized_ip` configured every caller passes. Otherwise the
/// remote `ip:port` must contain the configured string.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizedCaller;

/// Returns `true` if `remote` satisfies the allow rule `authorized`.
#[must_use]
pub fn is_authorized(authorized: Option<&str>, remote: Option<&SocketAddr>) -> bool {
    match (authorized, remote) {
        (None, _) => true,
        (Some(allowed), Some(addr)) => addr.to_string().contains(allowed),
        (Some(_), None) => false,
    }
}

impl FromRequestParts<AppState> for AuthorizedCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let remote = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        if is_authorized(state.authorized_ip.as_deref(), remote.as_ref()) {
            return Ok(Self);
        }

        let remote = remote.map_or_else(|| "unknown".to_string(), |a| a.to_string());
        tracing::warn!(%remote, method = %parts.method, uri = %parts.uri, "unauthorized change attempt");
        Err(ApiError::Forbidden(format!(
            "caller {remote} may not perform changes"
        )))
    }
}

/// JSON request body.
///
/// Same as [`axum::Json`], except that decoding failures produce the
/// service's own error body and a missing `Content-Type` is tolerated.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
        let parsed = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        Ok(Self(parsed))
    }
}
