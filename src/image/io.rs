//! Low-level byte order and safe reading/writing utilities for DEX parsing.
//!
//! Every multi-byte field in a DEX header or id table is little-endian, and every
//! access in this crate goes through the bounds-checked helpers in this module so
//! that a crafted image can never cause a read or write past the end of the buffer.
//!
//! # Key Components
//!
//! - [`DexIO`] - Trait defining endian-aware conversions for the primitive types
//!   the DEX format uses
//! - [`read_le`] / [`read_le_at`] - Bounds-checked little-endian reads, the `_at`
//!   variant advancing a caller-owned offset
//! - [`write_le`] / [`write_le_at`] - The writing counterparts, used only by the
//!   checksum and signature repair paths
//!
//! All functions return [`crate::Error::OutOfBounds`] when the buffer is too short,
//! so parsing malformed input degrades into a recoverable error instead of a panic.

use crate::{Error::OutOfBounds, Result};

/// Trait for type-specific safe binary data reading and writing.
///
/// Provides a unified interface for converting between primitive values and the
/// fixed-size byte arrays that represent them on the wire. Implemented for the
/// integer widths the DEX format actually uses.
pub trait DexIO: Sized {
    /// Byte array type holding the wire representation of this type.
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]>;

    /// Read `Self` from its little-endian wire representation
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
    /// Convert `Self` into its little-endian wire representation
    fn to_le_bytes(self) -> Self::Bytes;
    /// Borrow the wire representation as a byte slice
    fn bytes_as_slice(bytes: &Self::Bytes) -> &[u8];
}

macro_rules! impl_dex_io {
    ($($t:ty),*) => {
        $(
            impl DexIO for $t {
                type Bytes = [u8; std::mem::size_of::<$t>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$t>::from_le_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$t>::to_le_bytes(self)
                }

                fn bytes_as_slice(bytes: &Self::Bytes) -> &[u8] {
                    bytes
                }
            }
        )*
    };
}

impl_dex_io!(u8, u16, u32, u64, i8, i16, i32, i64);

/// Safely reads a value of type `T` in little-endian byte order from the start of a buffer.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_le<T: DexIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Safely reads a value of type `T` in little-endian byte order at a specific offset.
///
/// The offset is advanced by the number of bytes read, enabling sequential parsing
/// of fixed-layout records.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
///
/// # Examples
///
/// ```rust,ignore
/// let data = [0x01, 0x00, 0x02, 0x00];
/// let mut offset = 0;
///
/// let first: u16 = read_le_at(&data, &mut offset)?;
/// assert_eq!(first, 1);
/// assert_eq!(offset, 2);
/// ```
pub fn read_le_at<T: DexIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    if offset.checked_add(type_len).is_none_or(|end| end > data.len()) {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..*offset + type_len].try_into() else {
        return Err(OutOfBounds);
    };

    *offset += type_len;

    Ok(T::from_le_bytes(read))
}

/// Safely writes a value of type `T` in little-endian byte order to the start of a buffer.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the buffer is too short to hold the value.
pub fn write_le<T: DexIO>(data: &mut [u8], value: T) -> Result<()> {
    let mut offset = 0_usize;
    write_le_at(data, &mut offset, value)
}

/// Safely writes a value of type `T` in little-endian byte order at a specific offset.
///
/// The offset is advanced by the number of bytes written. This is the only mutating
/// primitive in the crate; it backs the checksum and signature repair operations.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the buffer is too short to hold the value.
pub fn write_le_at<T: DexIO>(data: &mut [u8], offset: &mut usize, value: T) -> Result<()> {
    let type_len = std::mem::size_of::<T>();
    if offset.checked_add(type_len).is_none_or(|end| end > data.len()) {
        return Err(OutOfBounds);
    }

    let bytes = value.to_le_bytes();
    data[*offset..*offset + type_len].copy_from_slice(T::bytes_as_slice(&bytes));

    *offset += type_len;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn read_le_widths() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        assert_eq!(read_le::<u8>(&data).unwrap(), 0x01);
        assert_eq!(read_le::<u16>(&data).unwrap(), 0x0201);
        assert_eq!(read_le::<u32>(&data).unwrap(), 0x0403_0201);
        assert_eq!(read_le::<u64>(&data).unwrap(), 0x0807_0605_0403_0201);
    }

    #[test]
    fn read_le_at_advances() {
        let data = [0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x00, 0x00];
        let mut offset = 0;

        let first: u16 = read_le_at(&data, &mut offset).unwrap();
        let second: u16 = read_le_at(&data, &mut offset).unwrap();
        let third: u32 = read_le_at(&data, &mut offset).unwrap();

        assert_eq!((first, second, third), (1, 2, 3));
        assert_eq!(offset, 8);
    }

    #[test]
    fn read_le_at_out_of_bounds() {
        let data = [0x01, 0x02];
        let mut offset = 1;
        assert!(matches!(
            read_le_at::<u32>(&data, &mut offset),
            Err(Error::OutOfBounds)
        ));
        // Offset is left untouched on failure
        assert_eq!(offset, 1);
    }

    #[test]
    fn write_then_read_roundtrip() {
        let mut data = [0u8; 8];
        let mut offset = 0;
        write_le_at(&mut data, &mut offset, 0xDEAD_BEEF_u32).unwrap();
        write_le_at(&mut data, &mut offset, 0xCAFE_u16).unwrap();
        assert_eq!(offset, 6);

        assert_eq!(read_le::<u32>(&data).unwrap(), 0xDEAD_BEEF);
        let mut offset = 4;
        assert_eq!(read_le_at::<u16>(&data, &mut offset).unwrap(), 0xCAFE);
    }

    #[test]
    fn write_le_out_of_bounds() {
        let mut data = [0u8; 3];
        assert!(matches!(
            write_le(&mut data, 1u32),
            Err(Error::OutOfBounds)
        ));
        assert_eq!(data, [0, 0, 0]);
    }
}
