// Constants for the Death Rally dr.cfg format - offsets, sizes and name tables

/// Lap records begin right after the opaque header
pub const LAP_REGION_START: usize = 0x56;

/// Finish records directly follow the lap table
pub const FINISH_REGION_START: usize = 0xA76;

/// Size of one lap record in bytes
pub const LAP_RECORD_SIZE: usize = 24;

/// Size of one finish record in bytes
pub const FINISH_RECORD_SIZE: usize = 20;

/// Track slots stored per car in the lap table
pub const TRACKS_PER_CAR: usize = 18;

/// Number of lap records in a stock file (6 cars x 18 tracks)
pub const LAP_RECORD_COUNT: usize = CAR_NAMES.len() * TRACKS_PER_CAR;

/// Number of finish records in a stock file
pub const FINISH_RECORD_COUNT: usize = 10;

pub const LAP_REGION_END: usize = LAP_REGION_START + LAP_RECORD_COUNT * LAP_RECORD_SIZE;
pub const FINISH_REGION_END: usize = FINISH_REGION_START + FINISH_RECORD_COUNT * FINISH_RECORD_SIZE;

/// Width of the driver/profile name slot in both record kinds
pub const NAME_FIELD_SIZE: usize = 10;

/// Cars in lap-table order
pub const CAR_NAMES: [&str; 6] = [
    "Vagabond",
    "Dervish",
    "Sentinel",
    "Shrieker",
    "Wraith",
    "Deliverator",
];

/// Tracks in slot order within each car group
pub const TRACK_NAMES: [&str; TRACKS_PER_CAR] = [
    "Suburbia",
    "Downtown",
    "Utopia",
    "Rock Zone",
    "Snake Alley",
    "Oasis",
    "Velodrome",
    "Holocaust",
    "Bogota",
    "West End",
    "Newark",
    "Complex",
    "Hell Mountain",
    "Desert Run",
    "Palm Side",
    "Eternal Peril",
    "Dry Creek",
    "Greenwood",
];

/// Difficulty labels indexed by the stored byte
pub const DIFFICULTY_NAMES: [&str; 3] = [
    "Speed makes me dizzy",
    "I live to ride",
    "Petrol in my veins",
];

/// Car name for a car index, falling back to a generic label past the table
pub fn car_name_from_index(index: usize) -> String {
    CAR_NAMES
        .get(index)
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("Car {}", index))
}

/// Track name for a track slot, falling back to a generic label past the table
pub fn track_name_from_index(index: usize) -> String {
    TRACK_NAMES
        .get(index)
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("Track {}", index))
}

/// Case-insensitive car lookup
pub fn car_index_from_name(name: &str) -> Option<usize> {
    let name = name.trim();
    CAR_NAMES.iter().position(|c| c.eq_ignore_ascii_case(name))
}

/// Case-insensitive track lookup
pub fn track_index_from_name(name: &str) -> Option<usize> {
    let name = name.trim();
    TRACK_NAMES.iter().position(|t| t.eq_ignore_ascii_case(name))
}
