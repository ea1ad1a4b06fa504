//! # peak-flowmeter
//!
//! REST service for recording and browsing peak flow measurements.
//!
//! Each measurement is a [`domain::Record`] (id, timestamp, value). The
//! HTTP layer maps CRUD verbs on `/records` onto a
//! [`repository::RecordRepository`], backed either by a PostgreSQL JSONB
//! document collection or by an in-memory store.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── Middleware (request id, trace, CORS, panic recovery)
//!     ├── Extractors (record loader, value loader, access guard)
//!     ├── REST Handlers (api/)
//!     │
//!     ├── RecordService (service/)
//!     │
//!     └── RecordRepository (repository/)
//!             ├── MemoryRecordRepository
//!             └── PostgresRecordRepository
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod repository;
pub mod service;
