// Persistent store of uploaded dr.cfg records
//
// The whole store is one JSON snapshot. Writes go to a sibling temporary
// file which is renamed over the snapshot, so a crash never leaves a
// half-written store behind.

use crate::core::{Difficulty, FinishRecord, LapRecord, LapTime};
use crate::formats::ParsedRecords;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record store not found: {}", .0.display())]
    NotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// One saved dr.cfg file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upload {
    pub id: u64,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LapRow {
    pub id: u64,
    pub upload_id: u64,
    pub record: LapRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishRow {
    pub id: u64,
    pub upload_id: u64,
    pub record: FinishRecord,
}

/// Counts reported after saving one upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaveSummary {
    pub upload_id: u64,
    pub laps_inserted: usize,
    pub laps_skipped: usize,
    pub finishes_inserted: usize,
}

/// Which row survives when duplicate finish rows are removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeepPolicy {
    /// Keep the row inserted first
    #[default]
    First,
    /// Keep the row from the most recent upload
    LatestUpload,
}

impl FromStr for KeepPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" => Ok(KeepPolicy::First),
            "latest-upload" | "latest_upload" => Ok(KeepPolicy::LatestUpload),
            other => Err(format!(
                "unknown keep policy '{}', expected first or latest-upload",
                other
            )),
        }
    }
}

impl fmt::Display for KeepPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeepPolicy::First => write!(f, "first"),
            KeepPolicy::LatestUpload => write!(f, "latest-upload"),
        }
    }
}

/// One set of finish rows sharing `(name, races, difficulty)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub name: String,
    pub races: u8,
    pub difficulty: Difficulty,
    pub keep_id: u64,
    pub delete_ids: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DedupReport {
    pub policy: String,
    pub dry_run: bool,
    pub groups: Vec<DuplicateGroup>,
    pub deleted: usize,
}

impl DedupReport {
    pub fn delete_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.groups.iter().flat_map(|g| g.delete_ids.iter().copied())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    version: String,
    next_upload_id: u64,
    next_lap_id: u64,
    next_finish_id: u64,
    uploads: Vec<Upload>,
    laps: Vec<LapRow>,
    finishes: Vec<FinishRow>,
}

impl Snapshot {
    fn empty() -> Self {
        Self {
            version: crate::VERSION.to_string(),
            next_upload_id: 1,
            next_lap_id: 1,
            next_finish_id: 1,
            ..Default::default()
        }
    }
}

type LapKey = (String, String, String, LapTime);

fn lap_key(record: &LapRecord) -> LapKey {
    (
        record.car_name.clone(),
        record.track_name.clone(),
        record.driver_name.clone(),
        record.time,
    )
}

/// Uploads, lap rows and finish rows, optionally backed by a snapshot file
#[derive(Debug)]
pub struct RecordStore {
    path: Option<PathBuf>,
    data: Snapshot,
}

impl RecordStore {
    /// Open the snapshot at `path`, starting empty when it does not exist yet.
    /// Nothing is written until the first flush.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = if path.exists() {
            let snapshot: Snapshot = serde_json::from_reader(BufReader::new(File::open(path)?))?;
            tracing::debug!(
                "Loaded store {}: {} uploads, {} laps, {} finishes",
                path.display(),
                snapshot.uploads.len(),
                snapshot.laps.len(),
                snapshot.finishes.len()
            );
            snapshot
        } else {
            tracing::debug!("Store {} does not exist, starting empty", path.display());
            Snapshot::empty()
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            data,
        })
    }

    /// Open a snapshot that must already exist
    pub fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        Self::open(path)
    }

    /// A store with no backing file
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: Snapshot::empty(),
        }
    }

    /// Replace any snapshot at `path` with a fresh empty one
    pub fn rebuild(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            fs::remove_file(path)?;
            tracing::info!("Removed existing store {}", path.display());
        } else {
            tracing::info!("No existing store at {}", path.display());
        }

        let mut store = Self::open(path)?;
        store.flush()?;
        tracing::info!("Created empty store {}", path.display());
        Ok(store)
    }

    /// Write the snapshot to disk, creating its directory if needed.
    /// A no-op for in-memory stores.
    pub fn flush(&mut self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut tmp_name = path.as_os_str().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            serde_json::to_writer_pretty(&mut writer, &self.data)?;
            writeln!(writer)?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Save one parsed file as a new upload stamped with the current time
    pub fn save_records(
        &mut self,
        filename: &str,
        records: &ParsedRecords,
    ) -> Result<SaveSummary> {
        self.save_records_at(filename, records, Utc::now())
    }

    /// Save one parsed file as a new upload with an explicit timestamp.
    ///
    /// Laps already present with the same car, track, driver and time are
    /// skipped. Finish rows are always inserted.
    pub fn save_records_at(
        &mut self,
        filename: &str,
        records: &ParsedRecords,
        uploaded_at: DateTime<Utc>,
    ) -> Result<SaveSummary> {
        let before = self.data.clone();

        let upload_id = self.data.next_upload_id;
        self.data.next_upload_id += 1;
        self.data.uploads.push(Upload {
            id: upload_id,
            filename: filename.to_string(),
            uploaded_at,
        });

        let mut seen: HashSet<LapKey> = self
            .data
            .laps
            .iter()
            .map(|row| lap_key(&row.record))
            .collect();
        let mut laps_inserted = 0;
        let mut laps_skipped = 0;

        for record in &records.lap_records {
            if !seen.insert(lap_key(record)) {
                tracing::debug!(
                    "Skipping duplicate lap {} / {} by '{}' in {}",
                    record.car_name,
                    record.track_name,
                    record.driver_name,
                    record.time
                );
                laps_skipped += 1;
                continue;
            }

            let id = self.data.next_lap_id;
            self.data.next_lap_id += 1;
            self.data.laps.push(LapRow {
                id,
                upload_id,
                record: record.clone(),
            });
            laps_inserted += 1;
        }

        for record in &records.finish_records {
            let id = self.data.next_finish_id;
            self.data.next_finish_id += 1;
            self.data.finishes.push(FinishRow {
                id,
                upload_id,
                record: record.clone(),
            });
        }

        if let Err(e) = self.flush() {
            self.data = before;
            return Err(e);
        }

        let summary = SaveSummary {
            upload_id,
            laps_inserted,
            laps_skipped,
            finishes_inserted: records.finish_records.len(),
        };
        tracing::info!(
            "Saved upload {} from '{}': {} laps inserted, {} skipped, {} finishes",
            upload_id,
            filename,
            summary.laps_inserted,
            summary.laps_skipped,
            summary.finishes_inserted
        );
        Ok(summary)
    }

    /// Remove finish rows that repeat `(name, races, difficulty)`, keeping one per group
    pub fn remove_finish_duplicates(
        &mut self,
        policy: KeepPolicy,
        dry_run: bool,
    ) -> Result<DedupReport> {
        let uploaded_at: HashMap<u64, DateTime<Utc>> = self
            .data
            .uploads
            .iter()
            .map(|u| (u.id, u.uploaded_at))
            .collect();

        let mut groups: BTreeMap<(String, u8, Difficulty), Vec<&FinishRow>> = BTreeMap::new();
        for row in &self.data.finishes {
            let key = (row.record.name.clone(), row.record.races, row.record.difficulty);
            groups.entry(key).or_default().push(row);
        }

        let mut report = DedupReport {
            policy: policy.to_string(),
            dry_run,
            groups: Vec::new(),
            deleted: 0,
        };

        for ((name, races, difficulty), rows) in groups {
            if rows.len() < 2 {
                continue;
            }

            let keep = match policy {
                KeepPolicy::First => rows.iter().min_by_key(|row| row.id),
                KeepPolicy::LatestUpload => rows
                    .iter()
                    .max_by_key(|row| (uploaded_at.get(&row.upload_id).copied(), row.id)),
            };
            let Some(keep) = keep else {
                continue;
            };
            let keep_id = keep.id;

            let mut delete_ids: Vec<u64> = rows
                .iter()
                .map(|row| row.id)
                .filter(|id| *id != keep_id)
                .collect();
            delete_ids.sort_unstable();

            report.groups.push(DuplicateGroup {
                name,
                races,
                difficulty,
                keep_id,
                delete_ids,
            });
        }

        let doomed: HashSet<u64> = report.delete_ids().collect();
        if dry_run || doomed.is_empty() {
            tracing::info!(
                "Found {} duplicate finish groups, {} rows to delete (dry run: {})",
                report.groups.len(),
                doomed.len(),
                dry_run
            );
            return Ok(report);
        }

        let before = self.data.finishes.clone();
        self.data.finishes.retain(|row| !doomed.contains(&row.id));
        if let Err(e) = self.flush() {
            self.data.finishes = before;
            return Err(e);
        }

        report.deleted = doomed.len();
        tracing::info!(
            "Deleted {} duplicate finish rows across {} groups",
            report.deleted,
            report.groups.len()
        );
        Ok(report)
    }

    pub fn uploads(&self) -> &[Upload] {
        &self.data.uploads
    }

    pub fn upload(&self, id: u64) -> Option<&Upload> {
        self.data.uploads.iter().find(|u| u.id == id)
    }

    /// Lap rows in insertion order
    pub fn laps(&self) -> &[LapRow] {
        &self.data.laps
    }

    /// Finish rows in insertion order
    pub fn finishes(&self) -> &[FinishRow] {
        &self.data.finishes
    }

    /// Upload time of the upload a row belongs to
    pub fn uploaded_at(&self, upload_id: u64) -> Option<DateTime<Utc>> {
        self.upload(upload_id).map(|u| u.uploaded_at)
    }
}
