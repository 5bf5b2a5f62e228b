//! Cursor-based byte stream parser for DEX structures.
//!
//! This module provides the [`Parser`] type, a bounds-checked cursor over a byte
//! slice, plus the DEX flavor of LEB128 decoding. It is the foundation under the
//! class-data readers and the string resolver: string records, class-data headers
//! and field/method records have no self-describing length, so they can only be
//! consumed sequentially from a cursor.
//!
//! # LEB128 in DEX
//!
//! DEX stores many counts and indices as Little-Endian Base-128 integers of one
//! to five bytes. Each byte contributes its low 7 bits, least-significant first;
//! a set high bit means another byte follows. Two quirks of the reference
//! implementation are preserved deliberately:
//!
//! - Decoding always stops after the fifth byte. Its high four bits (and its
//!   continuation bit) are not validated; garbage there is tolerated.
//! - Signed decoding sign-extends from the bit position where decoding stopped,
//!   using arithmetic right shifts.
//!
//! Unlike the reference implementation, running out of bytes mid-sequence is a
//! recoverable [`crate::Error::Truncated`] carrying the failing offset, never an
//! out-of-bounds read.
//!
//! # Usage Examples
//!
//! ```rust
//! use dexscope::Parser;
//!
//! let data = [0xE5, 0x8E, 0x26];
//! let mut parser = Parser::new(&data);
//! assert_eq!(parser.read_uleb128()?, 624485);
//! assert_eq!(parser.pos(), 3);
//! # Ok::<(), dexscope::Error>(())
//! ```

use crate::{
    image::io::{read_le_at, DexIO},
    Error, Result,
};

/// A bounds-checked cursor over binary DEX data.
///
/// `Parser` maintains a position within a byte slice and exposes strongly typed
/// reads for the encodings the DEX format uses: fixed-width little-endian values,
/// unsigned and signed LEB128, raw byte runs and NUL-terminated string data.
/// All operations validate data availability before reading, so malformed or
/// truncated input surfaces as an error instead of undefined behavior.
///
/// # Examples
///
/// ```rust
/// use dexscope::Parser;
///
/// let data = [0x01, 0x02, 0x03, 0x04];
/// let mut parser = Parser::new(&data);
///
/// let value = parser.read_le::<u16>()?;
/// assert_eq!(value, 0x0201);
/// # Ok::<(), dexscope::Error>(())
/// ```
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`Parser`] from a byte slice.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Move the current position to the specified index.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the position is beyond the data length.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos >= self.data.len() {
            return Err(Error::OutOfBounds);
        }

        self.position = pos;
        Ok(())
    }

    /// Move the position forward by the specified number of bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing would exceed the data length.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        if self
            .position
            .checked_add(step)
            .is_none_or(|end| end > self.data.len())
        {
            return Err(Error::OutOfBounds);
        }

        self.position += step;
        Ok(())
    }

    /// Get the current position of the parser within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Get access to the underlying data buffer.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the number of bytes remaining from the current position.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Peek at the next byte without advancing the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the position is at or beyond the data length.
    pub fn peek_byte(&self) -> Result<u8> {
        if self.position >= self.data.len() {
            return Err(Error::OutOfBounds);
        }
        Ok(self.data[self.position])
    }

    /// Read a type `T` from the current position in little-endian format and advance.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length.
    pub fn read_le<T: DexIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Reads a slice of bytes of the specified length from the current position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading `length` bytes would exceed the data.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self
            .position
            .checked_add(length)
            .ok_or(Error::OutOfBounds)?;
        if end > self.data.len() {
            return Err(Error::OutOfBounds);
        }

        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Next byte of a variable-length encoding, as a `Truncated` failure when exhausted.
    fn next_byte(&mut self) -> Result<u8> {
        if self.position >= self.data.len() {
            return Err(Error::Truncated {
                offset: self.position,
            });
        }
        let byte = self.data[self.position];
        self.position += 1;
        Ok(byte)
    }

    /// Read an unsigned LEB128 value of one to five bytes and advance the cursor.
    ///
    /// Byte N contributes bits `7*N .. 7*N+6`. Decoding stops after a byte with a
    /// clear high bit, or unconditionally after the fifth byte, whose unused high
    /// four bits are tolerated rather than rejected.
    ///
    /// # Errors
    /// Returns [`crate::Error::Truncated`] if the stream ends mid-sequence.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dexscope::Parser;
    ///
    /// let mut parser = Parser::new(&[0x7F]);
    /// assert_eq!(parser.read_uleb128()?, 127);
    ///
    /// let mut parser = Parser::new(&[0x80, 0x01]);
    /// assert_eq!(parser.read_uleb128()?, 128);
    /// # Ok::<(), dexscope::Error>(())
    /// ```
    pub fn read_uleb128(&mut self) -> Result<u32> {
        let mut result = u32::from(self.next_byte()?);

        if result > 0x7f {
            let mut cur = u32::from(self.next_byte()?);
            result = (result & 0x7f) | ((cur & 0x7f) << 7);
            if cur > 0x7f {
                cur = u32::from(self.next_byte()?);
                result |= (cur & 0x7f) << 14;
                if cur > 0x7f {
                    cur = u32::from(self.next_byte()?);
                    result |= (cur & 0x7f) << 21;
                    if cur > 0x7f {
                        // Garbage in the high four bits of the fifth byte is
                        // tolerated; only its low four bits are defined.
                        cur = u32::from(self.next_byte()?);
                        result |= cur << 28;
                    }
                }
            }
        }

        Ok(result)
    }

    /// Read a signed LEB128 value of one to five bytes and advance the cursor.
    ///
    /// Follows the same byte-continuation rule as [`read_uleb128`](Parser::read_uleb128),
    /// then sign-extends from the bit position where decoding stopped (bit 6, 13,
    /// 20, 27, or none for the full five-byte form) with arithmetic right shifts.
    ///
    /// # Errors
    /// Returns [`crate::Error::Truncated`] if the stream ends mid-sequence.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dexscope::Parser;
    ///
    /// let mut parser = Parser::new(&[0x7F]);
    /// assert_eq!(parser.read_sleb128()?, -1);
    /// # Ok::<(), dexscope::Error>(())
    /// ```
    pub fn read_sleb128(&mut self) -> Result<i32> {
        let mut result = i32::from(self.next_byte()?);

        if result <= 0x7f {
            result = (result << 25) >> 25;
        } else {
            let mut cur = i32::from(self.next_byte()?);
            result = (result & 0x7f) | ((cur & 0x7f) << 7);
            if cur <= 0x7f {
                result = (result << 18) >> 18;
            } else {
                cur = i32::from(self.next_byte()?);
                result |= (cur & 0x7f) << 14;
                if cur <= 0x7f {
                    result = (result << 11) >> 11;
                } else {
                    cur = i32::from(self.next_byte()?);
                    result |= (cur & 0x7f) << 21;
                    if cur <= 0x7f {
                        result = (result << 4) >> 4;
                    } else {
                        // Same leniency as the unsigned decoder for the high
                        // four bits of the fifth byte.
                        cur = i32::from(self.next_byte()?);
                        result |= cur << 28;
                    }
                }
            }
        }

        Ok(result)
    }

    /// Read bytes up to (but not including) a NUL terminator and advance past it.
    ///
    /// DEX string data is modified UTF-8, which is not guaranteed to be valid
    /// UTF-8, so the raw bytes are returned. A string running to the end of the
    /// buffer without a terminator is accepted.
    pub fn read_cstr_bytes(&mut self) -> Result<&'a [u8]> {
        let start = self.position;
        let mut end = start;

        while end < self.data.len() && self.data[end] != 0 {
            end += 1;
        }

        let bytes = &self.data[start..end];

        // Consume the terminator when present
        if end < self.data.len() {
            self.position = end + 1;
        } else {
            self.position = end;
        }

        Ok(bytes)
    }
}

/// Encode a `u32` in unsigned LEB128, appending one to five bytes to `out`.
///
/// The canonical counterpart of [`Parser::read_uleb128`], used for building
/// class-data and string records.
pub fn encode_uleb128(mut value: u32, out: &mut Vec<u8>) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Encode an `i32` in signed LEB128, appending one to five bytes to `out`.
///
/// The canonical counterpart of [`Parser::read_sleb128`].
pub fn encode_sleb128(mut value: i32, out: &mut Vec<u8>) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        let sign_clear = byte & 0x40 == 0;
        if (value == 0 && sign_clear) || (value == -1 && !sign_clear) {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_uleb(bytes: &[u8]) -> (u32, usize) {
        let mut parser = Parser::new(bytes);
        let value = parser.read_uleb128().unwrap();
        (value, parser.pos())
    }

    fn decode_sleb(bytes: &[u8]) -> (i32, usize) {
        let mut parser = Parser::new(bytes);
        let value = parser.read_sleb128().unwrap();
        (value, parser.pos())
    }

    #[test]
    fn uleb128_known_encodings() {
        assert_eq!(decode_uleb(&[0x00]), (0, 1));
        assert_eq!(decode_uleb(&[0x01]), (1, 1));
        assert_eq!(decode_uleb(&[0x7F]), (127, 1));
        assert_eq!(decode_uleb(&[0x80, 0x01]), (128, 2));
        assert_eq!(decode_uleb(&[0xE5, 0x8E, 0x26]), (624_485, 3));
        assert_eq!(
            decode_uleb(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]),
            (u32::MAX, 5)
        );
    }

    #[test]
    fn uleb128_tolerates_garbage_high_bits() {
        // Fifth byte 0xFF: high four bits and the continuation bit are garbage,
        // only the low four bits land in the result. Decoding stops regardless.
        let data = [0x80, 0x80, 0x80, 0x80, 0xFF, 0x55];
        let mut parser = Parser::new(&data);
        assert_eq!(parser.read_uleb128().unwrap(), 0xF000_0000);
        assert_eq!(parser.pos(), 5);
    }

    #[test]
    fn uleb128_roundtrip() {
        let values = [
            0u32,
            1,
            0x7F,
            0x80,
            0x3FFF,
            0x4000,
            0x1F_FFFF,
            0x20_0000,
            0xFFF_FFFF,
            0x1000_0000,
            u32::MAX,
        ];
        for value in values {
            let mut encoded = Vec::new();
            encode_uleb128(value, &mut encoded);

            let expected_len = match value {
                0..=0x7F => 1,
                0x80..=0x3FFF => 2,
                0x4000..=0x1F_FFFF => 3,
                0x20_0000..=0xFFF_FFFF => 4,
                _ => 5,
            };
            assert_eq!(encoded.len(), expected_len, "encoding width of {value:#x}");
            assert_eq!(decode_uleb(&encoded), (value, encoded.len()));
        }
    }

    #[test]
    fn uleb128_truncated() {
        let mut parser = Parser::new(&[0x80, 0x80]);
        assert!(matches!(
            parser.read_uleb128(),
            Err(Error::Truncated { offset: 2 })
        ));

        let mut parser = Parser::new(&[]);
        assert!(matches!(
            parser.read_uleb128(),
            Err(Error::Truncated { offset: 0 })
        ));
    }

    #[test]
    fn sleb128_known_encodings() {
        assert_eq!(decode_sleb(&[0x00]), (0, 1));
        assert_eq!(decode_sleb(&[0x01]), (1, 1));
        assert_eq!(decode_sleb(&[0x7F]), (-1, 1));
        assert_eq!(decode_sleb(&[0x3F]), (63, 1));
        assert_eq!(decode_sleb(&[0x40]), (-64, 1));
        assert_eq!(decode_sleb(&[0x80, 0x7F]), (-128, 2));
        assert_eq!(
            decode_sleb(&[0x80, 0x80, 0x80, 0x80, 0x78]),
            (i32::MIN, 5)
        );
        assert_eq!(
            decode_sleb(&[0xFF, 0xFF, 0xFF, 0xFF, 0x07]),
            (i32::MAX, 5)
        );
    }

    #[test]
    fn sleb128_roundtrip() {
        let values = [
            0i32,
            1,
            -1,
            63,
            -64,
            64,
            -65,
            8191,
            -8192,
            0xFFFF,
            -0x10000,
            i32::MAX,
            i32::MIN,
        ];
        for value in values {
            let mut encoded = Vec::new();
            encode_sleb128(value, &mut encoded);
            assert!(encoded.len() <= 5);
            assert_eq!(decode_sleb(&encoded), (value, encoded.len()));
        }
    }

    #[test]
    fn sleb128_truncated() {
        let mut parser = Parser::new(&[0xFF]);
        assert!(matches!(
            parser.read_sleb128(),
            Err(Error::Truncated { offset: 1 })
        ));
    }

    #[test]
    fn cstr_bytes() {
        let mut parser = Parser::new(b"hello\0world\0");
        assert_eq!(parser.read_cstr_bytes().unwrap(), b"hello");
        assert_eq!(parser.read_cstr_bytes().unwrap(), b"world");
        assert!(!parser.has_more_data());

        // Missing terminator is tolerated
        let mut parser = Parser::new(b"tail");
        assert_eq!(parser.read_cstr_bytes().unwrap(), b"tail");
        assert_eq!(parser.pos(), 4);
    }

    #[test]
    fn navigation() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut parser = Parser::new(&data);

        parser.seek(2).unwrap();
        assert_eq!(parser.peek_byte().unwrap(), 0x03);
        assert_eq!(parser.remaining(), 2);

        parser.advance_by(2).unwrap();
        assert!(!parser.has_more_data());
        assert!(matches!(parser.advance_by(1), Err(Error::OutOfBounds)));
        assert!(matches!(parser.seek(4), Err(Error::OutOfBounds)));
    }

    #[test]
    fn read_bytes_bounds() {
        let data = [0x01, 0x02, 0x03];
        let mut parser = Parser::new(&data);
        assert_eq!(parser.read_bytes(2).unwrap(), &[0x01, 0x02]);
        assert!(matches!(parser.read_bytes(2), Err(Error::OutOfBounds)));
    }
}
