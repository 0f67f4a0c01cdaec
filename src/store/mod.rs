// Record persistence
pub mod record_store;

pub use record_store::{
    DedupReport, DuplicateGroup, FinishRow, KeepPolicy, LapRow, RecordStore, SaveSummary,
    StoreError, Upload,
};
