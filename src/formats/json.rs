//! JSON export/import for parsed dr.cfg records

use super::cfg::ParsedRecords;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, JsonError>;

/// Render records as `{"lap_records": [...], "finish_records": [...]}`
pub fn to_json_string(records: &ParsedRecords) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

pub fn from_json_str(json: &str) -> Result<ParsedRecords> {
    Ok(serde_json::from_str(json)?)
}

/// Export records to a JSON file
pub fn export_json(filename: impl AsRef<Path>, records: &ParsedRecords) -> Result<()> {
    let mut writer = BufWriter::new(File::create(filename)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Import records previously written by [`export_json`]
pub fn import_json(filename: impl AsRef<Path>) -> Result<ParsedRecords> {
    let reader = BufReader::new(File::open(filename)?);
    Ok(serde_json::from_reader(reader)?)
}
