// Integer element readers for fixed-offset record fields

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ElementError {
    #[error("Insufficient data at offset {offset}: expected {expected} bytes, got {actual}")]
    InsufficientData {
        offset: usize,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, ElementError>;

/// Borrow exactly `N` bytes starting at `offset`
fn take<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N]> {
    data.get(offset..offset.saturating_add(N))
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(ElementError::InsufficientData {
            offset,
            expected: N,
            actual: data.len().saturating_sub(offset),
        })
}

/// Read a single byte at `offset`
pub fn read_u8(data: &[u8], offset: usize) -> Result<u8> {
    let [byte] = take::<1>(data, offset)?;
    Ok(byte)
}

/// Read a u32 in little-endian format at `offset`
pub fn read_u32_le(data: &[u8], offset: usize) -> Result<u32> {
    take::<4>(data, offset).map(u32::from_le_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u8() {
        let data = [0x01, 0x7F, 0xFF];
        assert_eq!(read_u8(&data, 0).unwrap(), 0x01);
        assert_eq!(read_u8(&data, 2).unwrap(), 0xFF);
    }

    #[test]
    fn test_read_u32_le() {
        let data = [0x00, 0x78, 0x56, 0x34, 0x12];
        assert_eq!(read_u32_le(&data, 1).unwrap(), 0x12345678);

        // 8 seconds as stored in a lap record
        assert_eq!(read_u32_le(&8u32.to_le_bytes(), 0).unwrap(), 8);
    }

    #[test]
    fn test_insufficient_data() {
        let data = [0x12, 0x34];
        assert_eq!(
            read_u32_le(&data, 0).unwrap_err(),
            ElementError::InsufficientData {
                offset: 0,
                expected: 4,
                actual: 2,
            }
        );
        assert!(read_u8(&data, 2).is_err());
        assert!(read_u32_le(&data, usize::MAX).is_err());
    }
}
