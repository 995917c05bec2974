//! CRC32 checksum computation for spill frames
//!
//! Uses CRC32 (IEEE polynomial). Every frame read back from a spill file
//! is verified before it is decoded.

use crc32fast::Hasher;

/// Computes a CRC32 checksum over the provided data.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Computes a CRC32 checksum over two consecutive slices without joining them.
pub fn compute_checksum_parts(head: &[u8], tail: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(head);
    hasher.update(tail);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_detects_corruption() {
        let mut data = vec![0x00, 0x01, 0x02, 0x03, 0x04];
        let original = compute_checksum(&data);
        data[2] ^= 0x01;
        assert_ne!(original, compute_checksum(&data));
    }

    #[test]
    fn test_parts_match_contiguous() {
        let data = b"spill frame payload";
        let (head, tail) = data.split_at(4);
        assert_eq!(compute_checksum(data), compute_checksum_parts(head, tail));
    }
}
