//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::RecordService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Record service for all business logic.
    pub record_service: Arc<RecordService>,
    /// Caller address substring allowed to perform changes.
    pub authorized_ip: Option<Arc<str>>,
}

impl AppState {
    /// Creates state around `record_service` with the given access rule.
    #[must_use]
    pub fn new(record_service: RecordService, authorized_ip: Option<String>) -> Self {
        Self {
            record_service: Arc::new(record_service),
            authorized_ip: authorized_ip.map(Arc::from),
        }
    }
}
