//! Domain layer: the record entity and its identifier.

pub mod record;
pub mod record_id;

pub use record::Record;
pub use record_id::RecordId;
