// Ranked lap times per car/track group with optional filters
//
// A group is one (car, track slot) pair. Ranks are always computed over the
// whole group so that filtering by driver never renumbers anyone.

use crate::core::constants::{car_index_from_name, track_index_from_name};
use crate::core::LapTime;
use crate::store::{LapRow, RecordStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Default limits applied when a query leaves `limit` unset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryDefaults {
    /// Used when neither cars nor tracks are given
    pub global_limit: usize,
    /// Used when cars or tracks are given
    pub filtered_limit: usize,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            global_limit: 1,
            filtered_limit: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopTimesQuery {
    /// Car names, matched case-insensitively
    pub cars: Vec<String>,
    /// Track names, matched case-insensitively
    pub tracks: Vec<String>,
    /// Exact driver names
    pub drivers: Vec<String>,
    pub limit: Option<usize>,
    /// Return every lap of a driver rather than only their best
    pub allow_dups: bool,
}

impl Default for TopTimesQuery {
    fn default() -> Self {
        Self {
            cars: Vec::new(),
            tracks: Vec::new(),
            drivers: Vec::new(),
            limit: None,
            allow_dups: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopTime {
    pub car_name: String,
    pub track_name: String,
    pub driver_name: String,
    pub time: LapTime,
    /// Position of this lap within its group
    pub rank: usize,
    /// Position of the driver's best lap among drivers of the group
    pub racer_rank: usize,
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// (car index, track slot)
type GroupKey = (usize, usize);

struct RankedLap<'a> {
    row: &'a LapRow,
    rank: usize,
    racer_rank: usize,
    is_driver_best: bool,
}

/// Rank the laps of one group. `laps` must be in insertion order.
fn rank_group<'a>(laps: &[&'a LapRow]) -> Vec<RankedLap<'a>> {
    let mut ordered: Vec<&LapRow> = laps.to_vec();
    ordered.sort_by_key(|row| row.record.time);

    let mut racer_ranks: HashMap<&str, usize> = HashMap::new();
    ordered
        .into_iter()
        .enumerate()
        .map(|(pos, row)| {
            let next = racer_ranks.len() + 1;
            let driver = row.record.driver_name.as_str();
            let is_driver_best = !racer_ranks.contains_key(driver);
            let racer_rank = *racer_ranks.entry(driver).or_insert(next);
            RankedLap {
                row,
                rank: pos + 1,
                racer_rank,
                is_driver_best,
            }
        })
        .collect()
}

fn resolve_names(names: &[String], lookup: fn(&str) -> Option<usize>, what: &str) -> Vec<usize> {
    let mut resolved = Vec::new();
    for name in names {
        match lookup(name) {
            Some(index) if !resolved.contains(&index) => resolved.push(index),
            Some(_) => {}
            None => tracing::warn!("Ignoring unknown {} '{}'", what, name),
        }
    }
    resolved
}

/// Run a top-times query against the store
pub fn top_times(
    store: &RecordStore,
    query: &TopTimesQuery,
    defaults: &QueryDefaults,
) -> Vec<TopTime> {
    let mut groups: BTreeMap<GroupKey, Vec<&LapRow>> = BTreeMap::new();
    for row in store.laps() {
        groups
            .entry((row.record.car_index(), row.record.idx))
            .or_default()
            .push(row);
    }

    let driver_wanted =
        |driver: &str| query.drivers.is_empty() || query.drivers.iter().any(|d| d == driver);

    let global = query.cars.is_empty() && query.tracks.is_empty();
    let limit = query.limit.unwrap_or(if global {
        defaults.global_limit
    } else {
        defaults.filtered_limit
    });

    let selected: Vec<GroupKey> = if global {
        groups.keys().copied().collect()
    } else {
        let cars = resolve_names(&query.cars, car_index_from_name, "car");
        let tracks = resolve_names(&query.tracks, track_index_from_name, "track");

        let has_driver_laps = |key: &GroupKey| {
            groups
                .get(key)
                .is_some_and(|laps| laps.iter().any(|row| driver_wanted(&row.record.driver_name)))
        };

        match (cars.is_empty(), tracks.is_empty()) {
            (false, false) => cars
                .iter()
                .flat_map(|&car| tracks.iter().map(move |&track| (car, track)))
                .collect(),
            (false, true) => cars
                .iter()
                .flat_map(|&car| groups.keys().copied().filter(move |key| key.0 == car))
                .filter(|key| has_driver_laps(key))
                .collect(),
            (true, false) => tracks
                .iter()
                .flat_map(|&track| groups.keys().copied().filter(move |key| key.1 == track))
                .filter(|key| has_driver_laps(key))
                .collect(),
            (true, true) => Vec::new(),
        }
    };

    let mut rows: Vec<(GroupKey, TopTime)> = Vec::new();
    for key in selected {
        let Some(laps) = groups.get(&key) else {
            continue;
        };

        for ranked in rank_group(laps) {
            if !query.allow_dups && !ranked.is_driver_best {
                continue;
            }
            let record = &ranked.row.record;
            let keep = if query.drivers.is_empty() {
                ranked.rank <= limit
            } else {
                driver_wanted(&record.driver_name)
            };
            if !keep {
                continue;
            }

            rows.push((
                key,
                TopTime {
                    car_name: record.car_name.clone(),
                    track_name: record.track_name.clone(),
                    driver_name: record.driver_name.clone(),
                    time: record.time,
                    rank: ranked.rank,
                    racer_rank: ranked.racer_rank,
                    uploaded_at: store.uploaded_at(ranked.row.upload_id),
                },
            ));
        }
    }

    rows.sort_by_key(|(key, row)| (key.0, key.1, row.rank));

    let mut per_group: HashMap<GroupKey, usize> = HashMap::new();
    rows.retain(|(key, _)| {
        let count = per_group.entry(*key).or_insert(0);
        *count += 1;
        *count <= limit
    });

    rows.sort_by(|(a_key, a), (b_key, b)| (a_key.0, &a.track_name).cmp(&(b_key.0, &b.track_name)));

    tracing::debug!("Top times query returned {} rows (limit {})", rows.len(), limit);
    rows.into_iter().map(|(_, row)| row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LapRecord;
    use crate::formats::ParsedRecords;

    fn lap(rec_no: usize, driver: &str, secs: u32) -> LapRecord {
        LapRecord::new(rec_no, LapTime::from_raw(secs, 0), driver)
    }

    fn save(store: &mut RecordStore, laps: Vec<LapRecord>) {
        store
            .save_records(
                "dr.cfg",
                &ParsedRecords {
                    lap_records: laps,
                    finish_records: Vec::new(),
                },
            )
            .unwrap();
    }

    /// Vagabond/Suburbia (rec 0) gets a crowded field, a few other slots get one lap each
    fn store() -> RecordStore {
        let mut store = RecordStore::in_memory();
        save(
            &mut store,
            vec![lap(0, "ACE", 35), lap(1, "ACE", 50), lap(19, "DUKE", 44), lap(36, "ACE", 60)],
        );
        save(&mut store, vec![lap(0, "DUKE", 31), lap(0, "ACE", 33)]);
        save(&mut store, vec![lap(0, "ZED", 32), lap(0, "DUKE", 40), lap(18, "ZED", 45)]);
        store
    }

    fn summary(rows: &[TopTime]) -> Vec<Row> {
        rows.iter()
            .map(|r| {
                (
                    r.car_name.clone(),
                    r.track_name.clone(),
                    r.driver_name.clone(),
                    r.time.seconds(),
                    r.rank,
                    r.racer_rank,
                )
            })
            .collect()
    }

    type Row = (String, String, String, u32, usize, usize);

    fn row(car: &str, track: &str, driver: &str, secs: u32, rank: usize, racer_rank: usize) -> Row {
        (
            car.to_string(),
            track.to_string(),
            driver.to_string(),
            secs,
            rank,
            racer_rank,
        )
    }

    #[test]
    fn test_global_defaults_to_one_per_group() {
        let rows = top_times(&store(), &TopTimesQuery::default(), &QueryDefaults::default());
        assert_eq!(
            summary(&rows),
            vec![
                row("Vagabond", "Downtown", "ACE", 50, 1, 1),
                row("Vagabond", "Suburbia", "DUKE", 31, 1, 1),
                row("Dervish", "Downtown", "DUKE", 44, 1, 1),
                row("Dervish", "Suburbia", "ZED", 45, 1, 1),
                row("Sentinel", "Suburbia", "ACE", 60, 1, 1),
            ]
        );
        assert!(rows.iter().all(|r| r.uploaded_at.is_some()));
    }

    #[test]
    fn test_ranks_within_group() {
        let query = TopTimesQuery {
            cars: vec!["vagabond".to_string()],
            tracks: vec!["SUBURBIA".to_string()],
            ..Default::default()
        };
        let rows = top_times(&store(), &query, &QueryDefaults::default());
        assert_eq!(
            summary(&rows),
            vec![
                row("Vagabond", "Suburbia", "DUKE", 31, 1, 1),
                row("Vagabond", "Suburbia", "ZED", 32, 2, 2),
                row("Vagabond", "Suburbia", "ACE", 33, 3, 3),
                row("Vagabond", "Suburbia", "ACE", 35, 4, 3),
                row("Vagabond", "Suburbia", "DUKE", 40, 5, 1),
            ]
        );
    }

    #[test]
    fn test_no_dups_keeps_global_rank() {
        let query = TopTimesQuery {
            cars: vec!["Vagabond".to_string()],
            tracks: vec!["Suburbia".to_string()],
            allow_dups: false,
            ..Default::default()
        };
        let rows = top_times(&store(), &query, &QueryDefaults::default());
        assert_eq!(
            summary(&rows),
            vec![
                row("Vagabond", "Suburbia", "DUKE", 31, 1, 1),
                row("Vagabond", "Suburbia", "ZED", 32, 2, 2),
                row("Vagabond", "Suburbia", "ACE", 33, 3, 3),
            ]
        );
    }

    #[test]
    fn test_explicit_limit() {
        let query = TopTimesQuery {
            limit: Some(2),
            ..Default::default()
        };
        let rows = top_times(&store(), &query, &QueryDefaults::default());
        let suburbia: Vec<u32> = rows
            .iter()
            .filter(|r| r.car_name == "Vagabond" && r.track_name == "Suburbia")
            .map(|r| r.time.seconds())
            .collect();
        assert_eq!(suburbia, vec![31, 32]);
    }

    #[test]
    fn test_driver_filter_ignores_rank_cut() {
        let query = TopTimesQuery {
            drivers: vec!["ACE".to_string()],
            limit: Some(5),
            ..Default::default()
        };
        let rows = top_times(&store(), &query, &QueryDefaults::default());
        assert_eq!(
            summary(&rows),
            vec![
                row("Vagabond", "Downtown", "ACE", 50, 1, 1),
                row("Vagabond", "Suburbia", "ACE", 33, 3, 3),
                row("Vagabond", "Suburbia", "ACE", 35, 4, 3),
                row("Sentinel", "Suburbia", "ACE", 60, 1, 1),
            ]
        );
    }

    #[test]
    fn test_car_only_uses_tracks_with_laps() {
        let query = TopTimesQuery {
            cars: vec!["Dervish".to_string()],
            ..Default::default()
        };
        let rows = top_times(&store(), &query, &QueryDefaults::default());
        assert_eq!(
            summary(&rows),
            vec![
                row("Dervish", "Downtown", "DUKE", 44, 1, 1),
                row("Dervish", "Suburbia", "ZED", 45, 1, 1),
            ]
        );

        // The driver filter also narrows which tracks are considered
        let query = TopTimesQuery {
            cars: vec!["Dervish".to_string()],
            drivers: vec!["ZED".to_string()],
            ..Default::default()
        };
        let rows = top_times(&store(), &query, &QueryDefaults::default());
        assert_eq!(summary(&rows), vec![row("Dervish", "Suburbia", "ZED", 45, 1, 1)]);
    }

    #[test]
    fn test_track_only() {
        let query = TopTimesQuery {
            tracks: vec!["Suburbia".to_string()],
            limit: Some(1),
            ..Default::default()
        };
        let rows = top_times(&store(), &query, &QueryDefaults::default());
        let cars: Vec<&str> = rows.iter().map(|r| r.car_name.as_str()).collect();
        assert_eq!(cars, vec!["Vagabond", "Dervish", "Sentinel"]);
    }

    #[test]
    fn test_filtered_limit_default() {
        let mut store = RecordStore::in_memory();
        save(&mut store, (0..15).map(|n| lap(0, &format!("D{}", n), 30 + n)).collect());

        let query = TopTimesQuery {
            cars: vec!["Vagabond".to_string()],
            ..Default::default()
        };
        let rows = top_times(&store, &query, &QueryDefaults::default());
        assert_eq!(rows.len(), 10);
        assert_eq!(rows.last().map(|r| r.rank), Some(10));

        let defaults = QueryDefaults {
            global_limit: 1,
            filtered_limit: 3,
        };
        assert_eq!(top_times(&store, &query, &defaults).len(), 3);
    }

    #[test]
    fn test_unknown_names() {
        let query = TopTimesQuery {
            cars: vec!["Batmobile".to_string()],
            ..Default::default()
        };
        assert!(top_times(&store(), &query, &QueryDefaults::default()).is_empty());

        // An unknown car is dropped, the known track still applies
        let query = TopTimesQuery {
            cars: vec!["Batmobile".to_string()],
            tracks: vec!["Downtown".to_string()],
            ..Default::default()
        };
        let rows = top_times(&store(), &query, &QueryDefaults::default());
        let cars: Vec<&str> = rows.iter().map(|r| r.car_name.as_str()).collect();
        assert_eq!(cars, vec!["Vagabond", "Dervish"]);
    }

    #[test]
    fn test_tied_times_rank_by_insertion() {
        let mut store = RecordStore::in_memory();
        save(&mut store, vec![lap(0, "FIRST", 30), lap(0, "SECOND", 30)]);

        let query = TopTimesQuery {
            limit: Some(5),
            ..Default::default()
        };
        let rows = top_times(&store, &query, &QueryDefaults::default());
        assert_eq!(
            summary(&rows),
            vec![
                row("Vagabond", "Suburbia", "FIRST", 30, 1, 1),
                row("Vagabond", "Suburbia", "SECOND", 30, 2, 2),
            ]
        );
    }
}
