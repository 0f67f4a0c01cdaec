// Core module containing the dr.cfg data model
pub mod constants;
pub mod layout;
pub mod records;

// Re-export commonly used types
pub use constants::*;
pub use layout::{CfgLayout, FieldKind, FieldSpec, RecordLayout, Region, RegionKind};
pub use records::{Difficulty, FinishRecord, LapRecord, LapTime, RecordError};
