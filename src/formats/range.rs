// Record number filter used by the command-line tools

use crate::core::{FinishRecord, LapRecord};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::cfg::ParsedRecords;

#[derive(Error, Debug)]
pub enum RangeError {
    #[error("Invalid record range '{0}', expected N or N-M")]
    Syntax(String),

    #[error("Record range {start}-{end} is reversed")]
    Reversed { start: usize, end: usize },

    #[error("Range pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, RangeError>;

/// Inclusive range of record numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordRange {
    pub start: usize,
    pub end: usize,
}

impl RecordRange {
    pub fn single(rec_no: usize) -> Self {
        Self {
            start: rec_no,
            end: rec_no,
        }
    }

    pub fn contains(&self, rec_no: usize) -> bool {
        (self.start..=self.end).contains(&rec_no)
    }

    /// Keep only the records whose `rec_no` falls in the range
    pub fn filter(&self, records: ParsedRecords) -> ParsedRecords {
        let (laps, finishes) = records.into_parts();
        ParsedRecords {
            lap_records: laps
                .into_iter()
                .filter(|r: &LapRecord| self.contains(r.rec_no))
                .collect(),
            finish_records: finishes
                .into_iter()
                .filter(|r: &FinishRecord| self.contains(r.rec_no))
                .collect(),
        }
    }
}

impl FromStr for RecordRange {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self> {
        let re = Regex::new(r"^\s*(\d+)\s*(?:-\s*(\d+))?\s*$")?;
        let caps = re
            .captures(s)
            .ok_or_else(|| RangeError::Syntax(s.to_string()))?;

        let parse = |m: regex::Match<'_>| {
            m.as_str()
                .parse::<usize>()
                .map_err(|_| RangeError::Syntax(s.to_string()))
        };

        let start = caps
            .get(1)
            .map(parse)
            .ok_or_else(|| RangeError::Syntax(s.to_string()))??;
        let end = match caps.get(2) {
            Some(m) => parse(m)?,
            None => start,
        };

        if end < start {
            return Err(RangeError::Reversed { start, end });
        }
        Ok(Self { start, end })
    }
}

impl fmt::Display for RecordRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}
