//! drcfg - parse Death Rally dr.cfg files and keep a leaderboard store

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use drcfg_rs::formats::{load_cfg_with_layout, RecordRange};
use drcfg_rs::leaderboard::{Leaderboards, TopTime};
use drcfg_rs::store::{DedupReport, KeepPolicy, RecordStore};
use drcfg_rs::{Config, FinishRecord, LapRecord, ParsedRecords, TopTimesQuery};
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "drcfg", version, about = "Death Rally dr.cfg record tool")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Record store path (overrides store_path from the config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the lap and finish records of a dr.cfg file
    Parse {
        file: PathBuf,

        /// Only records with these numbers (N or N-M)
        #[arg(long)]
        range: Option<RecordRange>,

        #[arg(long)]
        json: bool,
    },

    /// Parse a dr.cfg file and save it into the store
    Upload {
        file: PathBuf,

        /// Filename recorded for the upload (default: the file's name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Best lap per car/track and fewest races per finish slot
    Leaderboards {
        #[arg(long)]
        json: bool,
    },

    /// Ranked lap times with optional car, track and driver filters
    TopTimes {
        #[arg(long = "car")]
        cars: Vec<String>,

        #[arg(long = "track")]
        tracks: Vec<String>,

        #[arg(long = "driver")]
        drivers: Vec<String>,

        #[arg(long)]
        limit: Option<usize>,

        /// Only each driver's best lap
        #[arg(long)]
        no_dups: bool,

        #[arg(long)]
        json: bool,
    },

    /// Distinct cars, tracks and drivers in the store
    Meta,

    /// Remove finish rows repeating the same name, races and difficulty
    DedupeFinish {
        /// first or latest-upload
        #[arg(long, default_value = "first")]
        keep: KeepPolicy,

        #[arg(long)]
        dry_run: bool,
    },

    /// Delete the store and start over empty
    RebuildDb,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_or_default(cli.config.as_deref())?;
    drcfg_rs::init_tracing(&config.log_filter);

    let store_path = cli.db.clone().unwrap_or_else(|| config.store_path.clone());
    tracing::debug!("Using store {}", store_path.display());

    match cli.command {
        Command::Parse { file, range, json } => parse(&config, &file, range, json),
        Command::Upload { file, name } => upload(&config, &store_path, &file, name),
        Command::Leaderboards { json } => {
            let store = RecordStore::open(&store_path)?;
            let boards = drcfg_rs::leaderboards(&store);
            if json {
                println!("{}", serde_json::to_string_pretty(&boards)?);
            } else {
                print_leaderboards(&boards);
            }
            Ok(())
        }
        Command::TopTimes {
            cars,
            tracks,
            drivers,
            limit,
            no_dups,
            json,
        } => {
            let store = RecordStore::open(&store_path)?;
            let query = TopTimesQuery {
                cars,
                tracks,
                drivers,
                limit,
                allow_dups: !no_dups,
            };
            let results = drcfg_rs::top_times(&store, &query, &config.queries);
            if json {
                println!("{}", serde_json::to_string_pretty(&json!({ "results": results }))?);
            } else {
                print_top_times(&results);
            }
            Ok(())
        }
        Command::Meta => {
            let store = RecordStore::open(&store_path)?;
            println!("{}", serde_json::to_string_pretty(&drcfg_rs::meta(&store))?);
            Ok(())
        }
        Command::DedupeFinish { keep, dry_run } => {
            let mut store = RecordStore::open_existing(&store_path)
                .with_context(|| format!("Cannot clean up {}", store_path.display()))?;
            let report = store.remove_finish_duplicates(keep, dry_run)?;
            print_dedup_report(&report);
            Ok(())
        }
        Command::RebuildDb => {
            RecordStore::rebuild(&store_path)?;
            println!("Created empty store: {}", store_path.display());
            Ok(())
        }
    }
}

fn parse(config: &Config, file: &Path, range: Option<RecordRange>, json: bool) -> Result<()> {
    let mut records = load_cfg_with_layout(file, &config.layout)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    if let Some(range) = range {
        tracing::debug!("Keeping records {}", range);
        records = range.filter(records);
    }

    if json {
        println!("{}", drcfg_rs::formats::json::to_json_string(&records)?);
    } else {
        print_records(&records.lap_records, &records.finish_records);
    }
    Ok(())
}

fn upload(config: &Config, store_path: &Path, file: &Path, name: Option<String>) -> Result<()> {
    let records: ParsedRecords = load_cfg_with_layout(file, &config.layout)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let filename = name.unwrap_or_else(|| {
        file.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string())
    });

    let mut store = RecordStore::open(store_path)?;
    let summary = store.save_records(&filename, &records)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "summary": summary,
            "lap_records": records.lap_records,
            "finish_records": records.finish_records,
        }))?
    );
    Ok(())
}

fn print_records(laps: &[LapRecord], finishes: &[FinishRecord]) {
    println!("Lap records:");
    for r in laps {
        println!(
            "#{:<3} {:<11} {:<13} idx={:<2} time={}s name=\"{}\"",
            r.rec_no, r.car_name, r.track_name, r.idx, r.time, r.driver_name
        );
    }

    println!("\nFinish records (names + races + difficulty):");
    for r in finishes {
        println!(
            "#{:<2} name=\"{}\" races={} difficulty={}",
            r.rec_no, r.name, r.races, r.difficulty
        );
    }
}

fn print_leaderboards(boards: &Leaderboards) {
    println!("=== Lap leaders ===\n");
    println!("{:<12} {:<14} {:<10} {:>8}  Uploaded", "Car", "Track", "Driver", "Time");
    for l in &boards.lap_leaders {
        println!(
            "{:<12} {:<14} {:<10} {:>8}  {}",
            l.car_name,
            l.track_name,
            l.driver_name,
            l.time.to_string(),
            format_uploaded(l.uploaded_at)
        );
    }

    println!("\n=== Finish leaders ===\n");
    println!("{:<4} {:<10} {:>5}  Uploaded", "Slot", "Name", "Races");
    for f in &boards.finish_leaders {
        println!(
            "{:<4} {:<10} {:>5}  {}",
            f.rec_no,
            f.name,
            f.best_races,
            format_uploaded(f.uploaded_at)
        );
    }
}

fn print_top_times(results: &[TopTime]) {
    if results.is_empty() {
        println!("No matching lap times");
        return;
    }

    println!(
        "{:<12} {:<14} {:>4} {:>5} {:<10} {:>8}  Uploaded",
        "Car", "Track", "Rank", "Racer", "Driver", "Time"
    );
    for t in results {
        println!(
            "{:<12} {:<14} {:>4} {:>5} {:<10} {:>8}  {}",
            t.car_name,
            t.track_name,
            t.rank,
            t.racer_rank,
            t.driver_name,
            t.time.to_string(),
            format_uploaded(t.uploaded_at)
        );
    }
}

fn print_dedup_report(report: &DedupReport) {
    if report.groups.is_empty() {
        println!("No duplicate finish records found");
        return;
    }

    println!(
        "Found {} duplicate groups (keep: {})",
        report.groups.len(),
        report.policy
    );
    for g in &report.groups {
        println!(
            "  name=\"{}\" races={} difficulty={}: keep {} delete {:?}",
            g.name, g.races, g.difficulty, g.keep_id, g.delete_ids
        );
    }

    if report.dry_run {
        println!("Dry run: nothing deleted");
    } else {
        println!("Deleted {} rows", report.deleted);
    }
}

fn format_uploaded(at: Option<chrono::DateTime<chrono::Utc>>) -> String {
    at.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}
