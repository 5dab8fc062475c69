pub mod record;
pub mod record_id;
pub mod statistics;

pub use record::{DiffSnapshots, EditType, ManualEdit, PrRecord, PrState, RecordMetadata};
pub use record_id::RecordId;
pub use statistics::{RepairEntry, RepairStatistics};
