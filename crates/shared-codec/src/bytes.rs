//! Byte array utilities.

use crate::CodecError;

/// Concatenate several slices into one buffer.
pub fn concat(parts: &[&[u8]]) -> Vec<u8> {
    let total = parts.iter().map(|p| p.len()).sum();
    let mut out = Vec::with_capacity(total);
    for part in parts {
        out.extend_from_slice(part);
    }
    out
}

/// Copy `bytes[start..end]`, failing instead of panicking on a bad range.
pub fn copy_range(bytes: &[u8], start: usize, end: usize) -> Result<Vec<u8>, CodecError> {
    bytes
        .get(start..end)
        .map(<[u8]>::to_vec)
        .ok_or(CodecError::InvalidRange {
            start,
            end,
            len: bytes.len(),
        })
}

/// Left-pad with zero bytes up to `min_len`.
///
/// Restores hashes whose leading zeros were suppressed during encoding.
/// Inputs already at least `min_len` long are returned unchanged.
pub fn pad_left(bytes: &[u8], min_len: usize) -> Vec<u8> {
    if bytes.len() >= min_len {
        return bytes.to_vec();
    }
    let mut out = vec![0u8; min_len - bytes.len()];
    out.extend_from_slice(bytes);
    out
}

/// Strip at most `max` leading zero bytes.
pub fn strip_leading_zeros(bytes: &[u8], max: usize) -> &[u8] {
    let zeros = bytes.iter().take(max).take_while(|b| **b == 0).count();
    &bytes[zeros..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat() {
        assert_eq!(concat(&[&[1, 2], &[], &[3]]), vec![1, 2, 3]);
    }

    #[test]
    fn test_copy_range_bounds() {
        assert_eq!(copy_range(&[1, 2, 3, 4], 1, 3).unwrap(), vec![2, 3]);
        assert!(matches!(
            copy_range(&[1, 2], 1, 5),
            Err(CodecError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_pad_left() {
        assert_eq!(pad_left(&[7, 8], 4), vec![0, 0, 7, 8]);
        assert_eq!(pad_left(&[1, 2, 3], 2), vec![1, 2, 3]);
    }

    #[test]
    fn test_strip_is_bounded() {
        assert_eq!(strip_leading_zeros(&[0, 0, 0, 5], 2), &[0, 5]);
        assert_eq!(strip_leading_zeros(&[0, 0, 0, 5], usize::MAX), &[5]);
        assert_eq!(strip_leading_zeros(&[9, 0], 2), &[9, 0]);
    }
}
