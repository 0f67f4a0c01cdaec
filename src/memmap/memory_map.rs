// Bounds-checked view over the raw bytes of a dr.cfg file

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryMapError {
    #[error("Range {start:#06x}..{end:#06x} is outside the {len} byte image")]
    OutOfBounds { start: usize, end: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, MemoryMapError>;

/// Read-only view of a configuration file image.
///
/// Every access is bounds-checked so offset arithmetic on a truncated file
/// surfaces as an error instead of a panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryMap<'a> {
    data: &'a [u8],
}

impl<'a> MemoryMap<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Size of the image in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the bytes in `start..end`
    pub fn range(&self, start: usize, end: usize) -> Result<&'a [u8]> {
        if start > end || end > self.data.len() {
            return Err(MemoryMapError::OutOfBounds {
                start,
                end,
                len: self.data.len(),
            });
        }
        Ok(&self.data[start..end])
    }

    /// Hexdump of `start..end`, with offsets relative to the start of the file
    pub fn printable(&self, start: usize, end: usize) -> Result<String> {
        let slice = self.range(start, end)?;
        Ok(hexdump(slice, start))
    }
}

impl fmt::Display for MemoryMap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryMap({} bytes)", self.data.len())
    }
}

/// Create a hex dump of bytes (similar to hexdump -C)
fn hexdump(data: &[u8], base: usize) -> String {
    let mut output = String::new();

    for (i, chunk) in data.chunks(16).enumerate() {
        output.push_str(&format!("{:08x}  ", base + i * 16));

        for (j, byte) in chunk.iter().enumerate() {
            if j == 8 {
                output.push(' ');
            }
            output.push_str(&format!("{:02x} ", byte));
        }

        // Padding for incomplete lines
        for j in chunk.len()..16 {
            if j == 8 {
                output.push(' ');
            }
            output.push_str("   ");
        }

        output.push_str(" |");
        for byte in chunk {
            if byte.is_ascii_graphic() || *byte == b' ' {
                output.push(*byte as char);
            } else {
                output.push('.');
            }
        }
        output.push_str("|\n");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_map_creation() {
        let data = [1u8, 2, 3, 4, 5];
        let mmap = MemoryMap::new(&data);
        assert_eq!(mmap.len(), 5);
        assert!(!mmap.is_empty());
        assert!(MemoryMap::new(&[]).is_empty());
        assert_eq!(mmap.to_string(), "MemoryMap(5 bytes)");
    }

    #[test]
    fn test_range() {
        let data = [1u8, 2, 3, 4, 5];
        let mmap = MemoryMap::new(&data);
        assert_eq!(mmap.range(1, 4).unwrap(), &[2, 3, 4]);
        assert_eq!(mmap.range(5, 5).unwrap(), &[] as &[u8]);
        assert_eq!(mmap.range(0, 5).unwrap(), &data);
    }

    #[test]
    fn test_bounds_checking() {
        let data = [1u8, 2, 3];
        let mmap = MemoryMap::new(&data);

        assert_eq!(
            mmap.range(2, 7).unwrap_err(),
            MemoryMapError::OutOfBounds {
                start: 2,
                end: 7,
                len: 3
            }
        );
        assert!(mmap.range(usize::MAX, usize::MAX).is_err());
        assert!(mmap.range(2, 1).is_err());
    }

    #[test]
    fn test_hexdump() {
        let data = vec![
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d,
            0x0e, 0x0f, 0x41, 0x42, 0x43,
        ];
        let mmap = MemoryMap::new(&data);
        let dump = mmap.printable(0, data.len()).unwrap();
        assert!(dump.contains("00 01 02 03"));
        assert!(dump.contains("|ABC|"));
        assert!(dump.starts_with("00000000  "));

        let dump = mmap.printable(16, 19).unwrap();
        assert!(dump.starts_with("00000010  41 42 43"));
    }
}
