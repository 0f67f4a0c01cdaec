// Literal layout tables for dr.cfg record regions
//
// Every decoded field is listed here with its byte offset, width and kind.
// The parser slices records with these tables and nothing else.

use super::constants::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a field's bytes are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// NUL-padded ASCII text
    Text,
    U8,
    U32Le,
}

/// One entry of a record decoding table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub offset: usize,
    pub width: usize,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn end(&self) -> usize {
        self.offset + self.width
    }

    /// Bytes of this field within a record slice
    pub fn bytes<'a>(&self, record: &'a [u8]) -> Option<&'a [u8]> {
        record.get(self.offset..self.end())
    }
}

pub const LAP_DRIVER_NAME: FieldSpec = FieldSpec {
    name: "driver_name",
    offset: 0,
    width: NAME_FIELD_SIZE,
    kind: FieldKind::Text,
};

pub const LAP_SECONDS: FieldSpec = FieldSpec {
    name: "seconds",
    offset: 16,
    width: 4,
    kind: FieldKind::U32Le,
};

/// Only the value modulo 100 is meaningful
pub const LAP_HUNDREDTHS: FieldSpec = FieldSpec {
    name: "hundredths",
    offset: 20,
    width: 4,
    kind: FieldKind::U32Le,
};

pub const FINISH_NAME: FieldSpec = FieldSpec {
    name: "name",
    offset: 0,
    width: NAME_FIELD_SIZE,
    kind: FieldKind::Text,
};

pub const FINISH_RACES: FieldSpec = FieldSpec {
    name: "races",
    offset: 12,
    width: 1,
    kind: FieldKind::U8,
};

pub const FINISH_DIFFICULTY: FieldSpec = FieldSpec {
    name: "difficulty",
    offset: 16,
    width: 1,
    kind: FieldKind::U8,
};

pub const LAP_FIELDS: [FieldSpec; 3] = [LAP_DRIVER_NAME, LAP_SECONDS, LAP_HUNDREDTHS];

pub const FINISH_FIELDS: [FieldSpec; 3] = [FINISH_NAME, FINISH_RACES, FINISH_DIFFICULTY];

/// Which record region of the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionKind {
    Lap,
    Finish,
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionKind::Lap => write!(f, "lap"),
            RegionKind::Finish => write!(f, "finish"),
        }
    }
}

/// Fixed record shape for one region kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    pub kind: RegionKind,
    pub size: usize,
    pub fields: &'static [FieldSpec],
}

pub const LAP_LAYOUT: RecordLayout = RecordLayout {
    kind: RegionKind::Lap,
    size: LAP_RECORD_SIZE,
    fields: &LAP_FIELDS,
};

pub const FINISH_LAYOUT: RecordLayout = RecordLayout {
    kind: RegionKind::Finish,
    size: FINISH_RECORD_SIZE,
    fields: &FINISH_FIELDS,
};

impl RecordLayout {
    pub fn for_kind(kind: RegionKind) -> &'static RecordLayout {
        match kind {
            RegionKind::Lap => &LAP_LAYOUT,
            RegionKind::Finish => &FINISH_LAYOUT,
        }
    }
}

/// Byte range `start..end` of a record region within the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub start: usize,
    pub end: usize,
}

impl Region {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length in bytes, or `None` when `end` precedes `start`
    pub fn len(&self) -> Option<usize> {
        self.end.checked_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}..{:#06x}", self.start, self.end)
    }
}

/// Placement of both record regions in a dr.cfg file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CfgLayout {
    pub lap: Region,
    pub finish: Region,
}

impl Default for CfgLayout {
    fn default() -> Self {
        Self {
            lap: Region::new(LAP_REGION_START, LAP_REGION_END),
            finish: Region::new(FINISH_REGION_START, FINISH_REGION_END),
        }
    }
}

impl CfgLayout {
    pub fn region(&self, kind: RegionKind) -> Region {
        match kind {
            RegionKind::Lap => self.lap,
            RegionKind::Finish => self.finish,
        }
    }

    /// Smallest buffer that can hold this layout with zero records
    pub fn header_len(&self) -> usize {
        self.lap.start.min(self.finish.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_table_fits(layout: &RecordLayout) {
        let mut fields = layout.fields.to_vec();
        fields.sort_by_key(|f| f.offset);
        for pair in fields.windows(2) {
            assert!(
                pair[0].end() <= pair[1].offset,
                "{} overlaps {}",
                pair[0].name,
                pair[1].name
            );
        }
        for field in &fields {
            assert!(field.end() <= layout.size, "{} exceeds record", field.name);
            if field.kind == FieldKind::U8 {
                assert_eq!(field.width, 1);
            }
            if field.kind == FieldKind::U32Le {
                assert_eq!(field.width, 4);
            }
        }
    }

    #[test]
    fn test_field_tables_fit_records() {
        assert_table_fits(&LAP_LAYOUT);
        assert_table_fits(&FINISH_LAYOUT);
    }

    #[test]
    fn test_default_layout() {
        let layout = CfgLayout::default();
        assert_eq!(layout.lap.len(), Some(108 * 24));
        assert_eq!(layout.finish.len(), Some(10 * 20));
        assert_eq!(layout.header_len(), 0x56);
        assert_eq!(layout.region(RegionKind::Finish).start, 0xA76);
    }

    #[test]
    fn test_region_len() {
        assert_eq!(Region::new(4, 4).len(), Some(0));
        assert!(Region::new(4, 4).is_empty());
        assert_eq!(Region::new(5, 4).len(), None);
        assert_eq!(Region::new(0x56, 0xA76).to_string(), "0x0056..0x0a76");
    }

    #[test]
    fn test_field_bytes() {
        let record: Vec<u8> = (0..24).collect();
        assert_eq!(LAP_SECONDS.bytes(&record).unwrap(), &[16, 17, 18, 19]);
        assert_eq!(FINISH_RACES.bytes(&record[..20]).unwrap(), &[12]);
        assert!(LAP_HUNDREDTHS.bytes(&record[..22]).is_none());
    }
}
