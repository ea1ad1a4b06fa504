//! Service layer: record business operations.

pub mod record_service;

pub use record_service::RecordService;
