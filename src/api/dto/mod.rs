//! Data Transfer Objects for REST request serialization.

pub mod record_dto;

pub use record_dto::*;
