// dr.cfg binary record parser
//
// The file carries two contiguous arrays of fixed-size records. Both regions
// are validated before any record is decoded, so a malformed file fails as a
// whole and never yields a partial result.

use crate::bitwise::{parse_padded_text, read_u32_le, read_u8};
use crate::core::layout::*;
use crate::core::{Difficulty, FinishRecord, LapRecord, LapTime};
use crate::memmap::MemoryMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Layout problems found while parsing a dr.cfg buffer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("buffer too short: {len} bytes, layout needs at least {required}")]
    BufferTooShort { len: usize, required: usize },

    #[error("{region} region ends at {end:#06x} before it starts at {start:#06x}")]
    InvertedRegion {
        region: RegionKind,
        start: usize,
        end: usize,
    },

    #[error(
        "{region} region size not aligned to record size: {len} bytes at {start:#06x} is not a multiple of {record_size}"
    )]
    Misaligned {
        region: RegionKind,
        start: usize,
        len: usize,
        record_size: usize,
    },

    #[error("{region} region {start:#06x}..{end:#06x} reads past end of buffer ({len} bytes)")]
    OutOfBounds {
        region: RegionKind,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("{region} record {rec_no}: cannot decode field `{field}` at offset {offset:#06x}")]
    Field {
        region: RegionKind,
        rec_no: usize,
        field: &'static str,
        offset: usize,
    },
}

/// Errors from loading a dr.cfg file from disk
#[derive(Error, Debug)]
pub enum CfgError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed dr.cfg: {0}")]
    Format(#[from] FormatError),
}

pub type Result<T> = std::result::Result<T, FormatError>;

/// Both record sequences of one dr.cfg file, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRecords {
    pub lap_records: Vec<LapRecord>,
    pub finish_records: Vec<FinishRecord>,
}

impl ParsedRecords {
    pub fn into_parts(self) -> (Vec<LapRecord>, Vec<FinishRecord>) {
        (self.lap_records, self.finish_records)
    }
}

/// Parse a dr.cfg buffer using the stock region layout
pub fn parse(data: &[u8]) -> Result<ParsedRecords> {
    parse_with_layout(data, &CfgLayout::default())
}

/// Parse a dr.cfg buffer with explicit region placement
pub fn parse_with_layout(data: &[u8], layout: &CfgLayout) -> Result<ParsedRecords> {
    let required = layout.header_len();
    if data.len() < required {
        return Err(FormatError::BufferTooShort {
            len: data.len(),
            required,
        });
    }

    let mmap = MemoryMap::new(data);
    let lap_bytes = region_bytes(&mmap, layout.lap, &LAP_LAYOUT)?;
    let finish_bytes = region_bytes(&mmap, layout.finish, &FINISH_LAYOUT)?;

    let lap_records = lap_bytes
        .chunks_exact(LAP_LAYOUT.size)
        .enumerate()
        .map(|(rec_no, bytes)| {
            decode_lap(&RawRecord::new(&LAP_LAYOUT, layout.lap, rec_no, bytes))
        })
        .collect::<Result<Vec<_>>>()?;

    let finish_records = finish_bytes
        .chunks_exact(FINISH_LAYOUT.size)
        .enumerate()
        .map(|(rec_no, bytes)| {
            decode_finish(&RawRecord::new(&FINISH_LAYOUT, layout.finish, rec_no, bytes))
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        "Parsed {} lap and {} finish records from {} bytes",
        lap_records.len(),
        finish_records.len(),
        data.len()
    );

    Ok(ParsedRecords {
        lap_records,
        finish_records,
    })
}

/// Read and parse a dr.cfg file
pub fn load_cfg(filename: impl AsRef<Path>) -> std::result::Result<ParsedRecords, CfgError> {
    load_cfg_with_layout(filename, &CfgLayout::default())
}

/// Read and parse a dr.cfg file with explicit region placement
pub fn load_cfg_with_layout(
    filename: impl AsRef<Path>,
    layout: &CfgLayout,
) -> std::result::Result<ParsedRecords, CfgError> {
    let filename = filename.as_ref();
    let data = std::fs::read(filename)?;
    tracing::debug!("Read {} bytes from {}", data.len(), filename.display());
    Ok(parse_with_layout(&data, layout)?)
}

/// Validate a region against its record size and the buffer, returning its bytes
pub fn region_bytes<'a>(
    mmap: &MemoryMap<'a>,
    region: Region,
    record: &RecordLayout,
) -> Result<&'a [u8]> {
    let len = region.len().ok_or(FormatError::InvertedRegion {
        region: record.kind,
        start: region.start,
        end: region.end,
    })?;

    if len % record.size != 0 {
        return Err(FormatError::Misaligned {
            region: record.kind,
            start: region.start,
            len,
            record_size: record.size,
        });
    }

    mmap.range(region.start, region.end)
        .map_err(|_| FormatError::OutOfBounds {
            region: record.kind,
            start: region.start,
            end: region.end,
            len: mmap.len(),
        })
}

/// One fixed-size record slice together with its position in the file
struct RawRecord<'a> {
    layout: &'static RecordLayout,
    rec_no: usize,
    file_offset: usize,
    bytes: &'a [u8],
}

impl<'a> RawRecord<'a> {
    fn new(layout: &'static RecordLayout, region: Region, rec_no: usize, bytes: &'a [u8]) -> Self {
        Self {
            layout,
            rec_no,
            file_offset: region.start + rec_no * layout.size,
            bytes,
        }
    }

    fn field_error(&self, field: &FieldSpec) -> FormatError {
        FormatError::Field {
            region: self.layout.kind,
            rec_no: self.rec_no,
            field: field.name,
            offset: self.file_offset + field.offset,
        }
    }

    fn text(&self, field: &FieldSpec) -> Result<String> {
        let bytes = match field.kind {
            FieldKind::Text => field.bytes(self.bytes),
            _ => None,
        }
        .ok_or_else(|| self.field_error(field))?;

        parse_padded_text(field.width)(bytes)
            .map(|(_, text)| text)
            .map_err(|_| self.field_error(field))
    }

    fn int(&self, field: &FieldSpec) -> Result<u32> {
        let value = match field.kind {
            FieldKind::U8 => read_u8(self.bytes, field.offset).map(u32::from),
            FieldKind::U32Le => read_u32_le(self.bytes, field.offset),
            FieldKind::Text => return Err(self.field_error(field)),
        };
        value.map_err(|_| self.field_error(field))
    }
}

fn decode_lap(raw: &RawRecord<'_>) -> Result<LapRecord> {
    let driver_name = raw.text(&LAP_DRIVER_NAME)?;
    let seconds = raw.int(&LAP_SECONDS)?;
    let hundredths = raw.int(&LAP_HUNDREDTHS)?;

    Ok(LapRecord::new(
        raw.rec_no,
        LapTime::from_raw(seconds, hundredths),
        driver_name,
    ))
}

fn decode_finish(raw: &RawRecord<'_>) -> Result<FinishRecord> {
    let name = raw.text(&FINISH_NAME)?;
    let races = raw.int(&FINISH_RACES)? as u8;
    let difficulty = Difficulty::from(raw.int(&FINISH_DIFFICULTY)? as u8);

    Ok(FinishRecord {
        rec_no: raw.rec_no,
        name,
        races,
        difficulty,
    })
}
