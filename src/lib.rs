// DRCFG-RS: Death Rally dr.cfg record parser and leaderboard store
// Copyright 2024 - Licensed under GPLv3

pub mod bitwise;
pub mod config;
pub mod core;
pub mod formats;
pub mod leaderboard;
pub mod memmap;
pub mod store;

// Re-export commonly used types
pub use crate::config::{Config, ConfigError};
pub use crate::core::{
    constants::*, CfgLayout, Difficulty, FinishRecord, LapRecord, LapTime, Region, RegionKind,
};
pub use formats::{load_cfg, parse, parse_with_layout, CfgError, FormatError, ParsedRecords};
pub use leaderboard::{leaderboards, meta, top_times, QueryDefaults, TopTime, TopTimesQuery};
pub use memmap::MemoryMap;
pub use store::{KeepPolicy, RecordStore, StoreError};

use tracing_subscriber::{fmt::format::FmtSpan, prelude::*, EnvFilter};

/// drcfg-rs version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the global tracing subscriber for the command-line tools.
///
/// `RUST_LOG` wins over `fallback`; an unparsable fallback becomes `info`.
pub fn init_tracing(fallback: &str) {
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let format_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::NONE)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(format_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_parse_then_store() {
        let mut data = vec![0u8; FINISH_REGION_END];
        data[LAP_REGION_START..LAP_REGION_START + 3].copy_from_slice(b"ACE");
        data[LAP_REGION_START + 16] = 30;

        let records = parse(&data).unwrap();
        let mut store = RecordStore::in_memory();
        let summary = store.save_records("dr.cfg", &records).unwrap();
        assert_eq!(summary.laps_inserted, LAP_RECORD_COUNT);
        assert_eq!(summary.finishes_inserted, FINISH_RECORD_COUNT);

        let boards = leaderboards(&store);
        assert_eq!(boards.lap_leaders.len(), LAP_RECORD_COUNT);
        assert!(boards
            .lap_leaders
            .iter()
            .any(|l| l.driver_name == "ACE" && l.time.seconds() == 30));
    }
}
