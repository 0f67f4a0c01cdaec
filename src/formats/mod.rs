// File format handlers
pub mod cfg;
pub mod json;
pub mod range;

pub use cfg::{
    load_cfg, load_cfg_with_layout, parse, parse_with_layout, CfgError, FormatError, ParsedRecords,
};
pub use json::{export_json, import_json, JsonError};
pub use range::{RangeError, RecordRange};
