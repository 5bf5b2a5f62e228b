//! Adler-32 checksum and SHA-1 signature support for DEX images.
//!
//! A DEX header stores two integrity fields right after the 8-byte magic: a
//! 4-byte Adler-32 checksum covering `[8, fileSize)` and a 20-byte SHA-1 digest
//! covering `[0x20, fileSize)`. The compute/verify functions here are pure reads;
//! the repair functions are the only mutations in the crate and therefore take the
//! buffer by `&mut`, which serializes them against every concurrent reader.
//!
//! Repairing both fields must write the signature first: the checksum coverage
//! includes the signature bytes, so the opposite order would invalidate the
//! checksum it just wrote. [`repair_image`] encodes that ordering.

use sha1::{Digest, Sha1};

use crate::{
    image::io::write_le,
    metadata::header::{CHECKSUM_OFFSET, SIGNATURE_LEN, SIGNATURE_OFFSET},
    Error, Result,
};

/// First byte covered by the checksum: magic (8 bytes) is skipped along with the
/// 4-byte checksum field itself.
const CHECKSUM_COVERAGE_OFFSET: usize = CHECKSUM_OFFSET + 4;

/// First byte covered by the signature: everything before the digest field is skipped.
const SIGNATURE_COVERAGE_OFFSET: usize = SIGNATURE_OFFSET + SIGNATURE_LEN;

const ADLER_MOD: u32 = 65_521;

/// Adler-32 over a byte run, as zlib computes it.
fn adler32(data: &[u8]) -> u32 {
    let mut a = 1u32;
    let mut b = 0u32;

    for &byte in data {
        a = (a + u32::from(byte)) % ADLER_MOD;
        b = (b + a) % ADLER_MOD;
    }

    (b << 16) | a
}

/// Compute the DEX content checksum over `buf[12..file_size)`.
///
/// The magic and the checksum field itself are excluded from coverage, so the
/// result is a pure function of the image body and idempotent across calls.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if `file_size` exceeds the buffer or is
/// smaller than the fixed prefix the checksum skips.
///
/// # Examples
///
/// ```rust
/// use dexscope::compute_checksum;
///
/// let image = vec![0u8; 0x70];
/// let first = compute_checksum(&image, image.len())?;
/// let second = compute_checksum(&image, image.len())?;
/// assert_eq!(first, second);
/// # Ok::<(), dexscope::Error>(())
/// ```
pub fn compute_checksum(buf: &[u8], file_size: usize) -> Result<u32> {
    if file_size < CHECKSUM_COVERAGE_OFFSET || file_size > buf.len() {
        return Err(Error::OutOfBounds);
    }

    Ok(adler32(&buf[CHECKSUM_COVERAGE_OFFSET..file_size]))
}

/// Recompute the content checksum and patch it into the header in place.
///
/// Overwrites the four bytes at offset 8 with the little-endian checksum of
/// `buf[12..file_size)` and returns the value written. Taking the buffer by
/// `&mut` makes the exclusivity requirement part of the signature: no reader
/// can observe the image mid-patch.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if `file_size` exceeds the buffer or is
/// smaller than the fixed prefix the checksum skips.
pub fn repair_checksum(buf: &mut [u8], file_size: usize) -> Result<u32> {
    let checksum = compute_checksum(buf, file_size)?;
    write_le(&mut buf[CHECKSUM_OFFSET..], checksum)?;
    Ok(checksum)
}

/// Compute the SHA-1 signature over `buf[0x20..file_size)`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if `file_size` exceeds the buffer or is
/// smaller than the header prefix the digest skips.
pub fn compute_signature(buf: &[u8], file_size: usize) -> Result<[u8; SIGNATURE_LEN]> {
    if file_size < SIGNATURE_COVERAGE_OFFSET || file_size > buf.len() {
        return Err(Error::OutOfBounds);
    }

    let mut hasher = Sha1::new();
    hasher.update(&buf[SIGNATURE_COVERAGE_OFFSET..file_size]);
    Ok(hasher.finalize().into())
}

/// Check the stored signature field against a fresh digest of the image body.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if `file_size` exceeds the buffer or is
/// smaller than the header prefix the digest skips.
pub fn verify_signature(buf: &[u8], file_size: usize) -> Result<bool> {
    let computed = compute_signature(buf, file_size)?;
    Ok(buf[SIGNATURE_OFFSET..SIGNATURE_COVERAGE_OFFSET] == computed)
}

/// Recompute the SHA-1 signature and patch the 20-byte digest field in place.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if `file_size` exceeds the buffer or is
/// smaller than the header prefix the digest skips.
pub fn repair_signature(buf: &mut [u8], file_size: usize) -> Result<[u8; SIGNATURE_LEN]> {
    let signature = compute_signature(buf, file_size)?;
    buf[SIGNATURE_OFFSET..SIGNATURE_COVERAGE_OFFSET].copy_from_slice(&signature);
    Ok(signature)
}

/// Repair both integrity fields: signature first, then the checksum that covers it.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if `file_size` exceeds the buffer or is
/// smaller than the header prefix the digest skips.
pub fn repair_image(buf: &mut [u8], file_size: usize) -> Result<u32> {
    repair_signature(buf, file_size)?;
    repair_checksum(buf, file_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::io::read_le;

    #[test]
    fn adler32_empty() {
        assert_eq!(adler32(&[]), 1);
    }

    #[test]
    fn adler32_known_value() {
        // "Wikipedia" has a known Adler-32 of 0x11E60398
        assert_eq!(adler32(b"Wikipedia"), 0x11E6_0398);
    }

    #[test]
    fn compute_is_idempotent() {
        let mut buf = vec![0u8; 0x100];
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = (i % 251) as u8;
        }

        let first = compute_checksum(&buf, buf.len()).unwrap();
        let second = compute_checksum(&buf, buf.len()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn repair_writes_matching_checksum() {
        let mut buf = vec![0u8; 0x100];
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = (i % 256) as u8;
        }
        // Corrupt the stored checksum field
        buf[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);

        let len = buf.len();
        let written = repair_checksum(&mut buf, len).unwrap();
        let stored: u32 = read_le(&buf[CHECKSUM_OFFSET..]).unwrap();

        assert_eq!(written, stored);
        assert_eq!(written, compute_checksum(&buf, buf.len()).unwrap());
    }

    #[test]
    fn repair_rejects_undersized_buffer() {
        let mut buf = vec![0u8; 8];
        let len = buf.len();
        assert!(matches!(
            repair_checksum(&mut buf, len),
            Err(Error::OutOfBounds)
        ));
        assert!(matches!(
            compute_checksum(&buf, 11),
            Err(Error::OutOfBounds)
        ));
    }

    #[test]
    fn file_size_bounds_buffer() {
        let buf = vec![0u8; 16];
        assert!(matches!(
            compute_checksum(&buf, 32),
            Err(Error::OutOfBounds)
        ));
    }

    #[test]
    fn signature_roundtrip() {
        let mut buf = vec![0u8; 0x80];
        for (i, byte) in buf.iter_mut().enumerate().skip(0x20) {
            *byte = (i * 7 % 256) as u8;
        }

        assert!(!verify_signature(&buf, buf.len()).unwrap());
        let len = buf.len();
        let written = repair_signature(&mut buf, len).unwrap();
        assert!(verify_signature(&buf, buf.len()).unwrap());
        assert_eq!(&buf[SIGNATURE_OFFSET..SIGNATURE_OFFSET + SIGNATURE_LEN], &written);
    }

    #[test]
    fn repair_image_leaves_consistent_fields() {
        let mut buf = vec![0u8; 0x90];
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = (i % 253) as u8;
        }

        let len = buf.len();
        let checksum = repair_image(&mut buf, len).unwrap();
        assert!(verify_signature(&buf, buf.len()).unwrap());
        assert_eq!(checksum, compute_checksum(&buf, buf.len()).unwrap());
        let stored: u32 = read_le(&buf[CHECKSUM_OFFSET..]).unwrap();
        assert_eq!(stored, checksum);
    }
}
