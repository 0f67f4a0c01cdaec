// Record value types produced by the dr.cfg parser

use super::constants::{
    car_name_from_index, track_name_from_index, DIFFICULTY_NAMES, TRACKS_PER_CAR,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("Invalid lap time: {0}")]
    InvalidTime(f64),

    #[error("Invalid difficulty: {0}")]
    InvalidDifficulty(String),
}

/// Lap time as stored by the game: whole seconds plus hundredths.
///
/// Serialized as fractional seconds (`8.23`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "f64", try_from = "f64")]
pub struct LapTime {
    seconds: u32,
    hundredths: u8,
}

impl LapTime {
    /// Build a lap time from the two raw fields of a lap record.
    /// Only `raw_hundredths % 100` is significant.
    pub fn from_raw(seconds: u32, raw_hundredths: u32) -> Self {
        Self {
            seconds,
            hundredths: (raw_hundredths % 100) as u8,
        }
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    pub fn hundredths(&self) -> u8 {
        self.hundredths
    }

    pub fn as_millis(&self) -> u64 {
        u64::from(self.seconds) * 1000 + u64::from(self.hundredths) * 10
    }

    pub fn as_secs_f64(&self) -> f64 {
        (u64::from(self.seconds) * 100 + u64::from(self.hundredths)) as f64 / 100.0
    }
}

impl From<LapTime> for f64 {
    fn from(time: LapTime) -> Self {
        time.as_secs_f64()
    }
}

impl TryFrom<f64> for LapTime {
    type Error = RecordError;

    fn try_from(secs: f64) -> Result<Self, Self::Error> {
        let total = (secs * 100.0).round();
        if !total.is_finite() || total < 0.0 || total > f64::from(u32::MAX) * 100.0 + 99.0 {
            return Err(RecordError::InvalidTime(secs));
        }
        let total = total as u64;
        Ok(Self {
            seconds: (total / 100) as u32,
            hundredths: (total % 100) as u8,
        })
    }
}

impl fmt::Display for LapTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.seconds, self.hundredths)
    }
}

/// Difficulty level stored in a finish record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Difficulty {
    SpeedMakesMeDizzy,
    ILiveToRide,
    PetrolInMyVeins,
    Unknown(u8),
}

impl Difficulty {
    /// Raw byte as stored in the file
    pub fn code(&self) -> u8 {
        match self {
            Difficulty::SpeedMakesMeDizzy => 0,
            Difficulty::ILiveToRide => 1,
            Difficulty::PetrolInMyVeins => 2,
            Difficulty::Unknown(code) => *code,
        }
    }

    pub fn label(&self) -> String {
        match DIFFICULTY_NAMES.get(self.code() as usize) {
            Some(name) if !matches!(self, Difficulty::Unknown(_)) => name.to_string(),
            _ => format!("unknown(0x{:02X})", self.code()),
        }
    }
}

impl From<u8> for Difficulty {
    fn from(code: u8) -> Self {
        match code {
            0 => Difficulty::SpeedMakesMeDizzy,
            1 => Difficulty::ILiveToRide,
            2 => Difficulty::PetrolInMyVeins,
            other => Difficulty::Unknown(other),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for Difficulty {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(code) = DIFFICULTY_NAMES.iter().position(|name| *name == s) {
            return Ok(Difficulty::from(code as u8));
        }

        s.strip_prefix("unknown(0x")
            .and_then(|rest| rest.strip_suffix(')'))
            .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            .map(Difficulty::Unknown)
            .ok_or_else(|| RecordError::InvalidDifficulty(s.to_string()))
    }
}

impl From<Difficulty> for String {
    fn from(difficulty: Difficulty) -> Self {
        difficulty.label()
    }
}

impl TryFrom<String> for Difficulty {
    type Error = RecordError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Best lap for one car/track slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LapRecord {
    /// Position of the record within the lap region
    pub rec_no: usize,

    pub car_name: String,

    pub track_name: String,

    /// Track slot within the car group, kept as stored
    pub idx: usize,

    pub time: LapTime,

    pub driver_name: String,
}

impl LapRecord {
    /// Build a lap record, deriving the car and track from its table position
    pub fn new(rec_no: usize, time: LapTime, driver_name: impl Into<String>) -> Self {
        let idx = rec_no % TRACKS_PER_CAR;
        Self {
            rec_no,
            car_name: car_name_from_index(rec_no / TRACKS_PER_CAR),
            track_name: track_name_from_index(idx),
            idx,
            time,
            driver_name: driver_name.into(),
        }
    }

    /// Index of the car group this record belongs to
    pub fn car_index(&self) -> usize {
        self.rec_no / TRACKS_PER_CAR
    }
}

/// Championship finish entry for one profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishRecord {
    pub rec_no: usize,

    pub name: String,

    /// Races needed to finish
    pub races: u8,

    pub difficulty: Difficulty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lap_time() {
        let time = LapTime::from_raw(8, 123);
        assert_eq!(time.seconds(), 8);
        assert_eq!(time.hundredths(), 23);
        assert_eq!(time.as_millis(), 8230);
        assert_eq!(time.to_string(), "8.23");
        assert_eq!(LapTime::from_raw(61, 5).to_string(), "61.05");
    }

    #[test]
    fn test_lap_time_ordering() {
        let fast = LapTime::from_raw(8, 99);
        let slow = LapTime::from_raw(9, 0);
        assert!(fast < slow);
        assert!(LapTime::from_raw(9, 1) > slow);
    }

    #[test]
    fn test_lap_time_serde() {
        let time = LapTime::from_raw(42, 7);
        let json = serde_json::to_string(&time).unwrap();
        assert_eq!(json, "42.07");
        let back: LapTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, time);

        assert!(serde_json::from_str::<LapTime>("-1.0").is_err());
    }

    #[test]
    fn test_difficulty_labels() {
        assert_eq!(Difficulty::from(0).to_string(), "Speed makes me dizzy");
        assert_eq!(Difficulty::from(2).to_string(), "Petrol in my veins");
        assert_eq!(Difficulty::from(0x1F).to_string(), "unknown(0x1F)");
        assert_eq!(Difficulty::from(7).code(), 7);
    }

    #[test]
    fn test_difficulty_parse() {
        assert_eq!(
            "I live to ride".parse::<Difficulty>().unwrap(),
            Difficulty::ILiveToRide
        );
        assert_eq!(
            "unknown(0xAB)".parse::<Difficulty>().unwrap(),
            Difficulty::Unknown(0xAB)
        );
        assert!("hard".parse::<Difficulty>().is_err());

        let json = serde_json::to_string(&Difficulty::Unknown(3)).unwrap();
        assert_eq!(json, "\"unknown(0x03)\"");
        let back: Difficulty = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Difficulty::Unknown(3));
    }

    #[test]
    fn test_lap_record_derivation() {
        let rec = LapRecord::new(19, LapTime::from_raw(8, 23), "ACE");
        assert_eq!(rec.car_name, "Dervish");
        assert_eq!(rec.track_name, "Downtown");
        assert_eq!(rec.idx, 1);
        assert_eq!(rec.car_index(), 1);

        let last = LapRecord::new(107, LapTime::from_raw(0, 0), "");
        assert_eq!(last.car_name, "Deliverator");
        assert_eq!(last.track_name, "Greenwood");
        assert_eq!(last.idx, 17);
    }
}
