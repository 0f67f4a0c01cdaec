// Queries over the record store
pub mod boards;
pub mod top_times;

pub use boards::{leaderboards, meta, FinishLeader, LapLeader, Leaderboards, Meta};
pub use top_times::{top_times, QueryDefaults, TopTime, TopTimesQuery};
