// Best-lap and best-finish boards plus selector metadata

use crate::core::LapTime;
use crate::store::RecordStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LapLeader {
    pub car_name: String,
    pub track_name: String,
    pub driver_name: String,
    pub time: LapTime,
    pub uploaded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinishLeader {
    pub rec_no: usize,
    pub name: String,
    pub best_races: u8,
    pub uploaded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Leaderboards {
    pub lap_leaders: Vec<LapLeader>,
    pub finish_leaders: Vec<FinishLeader>,
}

/// Distinct values for building query selectors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Meta {
    pub cars: Vec<String>,
    pub tracks: Vec<String>,
    pub drivers: Vec<String>,
}

/// Fastest lap per car/track slot and fewest races per finish slot.
///
/// Ties are kept: every row matching the best value of its group is returned.
pub fn leaderboards(store: &RecordStore) -> Leaderboards {
    let mut best_lap: HashMap<(&str, usize), LapTime> = HashMap::new();
    for row in store.laps() {
        let key = (row.record.car_name.as_str(), row.record.idx);
        best_lap
            .entry(key)
            .and_modify(|best| *best = (*best).min(row.record.time))
            .or_insert(row.record.time);
    }

    let mut lap_leaders: Vec<LapLeader> = store
        .laps()
        .iter()
        .filter(|row| {
            let key = (row.record.car_name.as_str(), row.record.idx);
            best_lap.get(&key) == Some(&row.record.time)
        })
        .map(|row| LapLeader {
            car_name: row.record.car_name.clone(),
            track_name: row.record.track_name.clone(),
            driver_name: row.record.driver_name.clone(),
            time: row.record.time,
            uploaded_at: store.uploaded_at(row.upload_id),
        })
        .collect();
    lap_leaders
        .sort_by(|a, b| (&a.car_name, &a.track_name).cmp(&(&b.car_name, &b.track_name)));

    let mut best_races: HashMap<usize, u8> = HashMap::new();
    for row in store.finishes() {
        best_races
            .entry(row.record.rec_no)
            .and_modify(|best| *best = (*best).min(row.record.races))
            .or_insert(row.record.races);
    }

    let mut finish_leaders: Vec<FinishLeader> = store
        .finishes()
        .iter()
        .filter(|row| best_races.get(&row.record.rec_no) == Some(&row.record.races))
        .map(|row| FinishLeader {
            rec_no: row.record.rec_no,
            name: row.record.name.clone(),
            best_races: row.record.races,
            uploaded_at: store.uploaded_at(row.upload_id),
        })
        .collect();
    finish_leaders.sort_by_key(|leader| leader.rec_no);

    tracing::debug!(
        "Leaderboards: {} lap leaders, {} finish leaders",
        lap_leaders.len(),
        finish_leaders.len()
    );

    Leaderboards {
        lap_leaders,
        finish_leaders,
    }
}

pub fn meta(store: &RecordStore) -> Meta {
    let mut cars = BTreeSet::new();
    let mut tracks = BTreeSet::new();
    let mut drivers = BTreeSet::new();

    for row in store.laps() {
        cars.insert(row.record.car_name.clone());
        tracks.insert(row.record.track_name.clone());
        if !row.record.driver_name.is_empty() {
            drivers.insert(row.record.driver_name.clone());
        }
    }

    Meta {
        cars: cars.into_iter().collect(),
        tracks: tracks.into_iter().collect(),
        drivers: drivers.into_iter().collect(),
    }
}
