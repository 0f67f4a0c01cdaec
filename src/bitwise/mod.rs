// Fixed-width field decoding for dr.cfg records

pub mod elements;
pub mod parser;

pub use elements::{read_u32_le, read_u8, ElementError};
pub use parser::{decode_text, parse_padded_text};
