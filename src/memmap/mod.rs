// Byte image of a loaded configuration file

pub mod memory_map;

pub use memory_map::{MemoryMap, MemoryMapError};
