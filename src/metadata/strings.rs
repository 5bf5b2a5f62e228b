//! String-data and type-descriptor resolution.
//!
//! A string id entry points at a string-data record: a ULEB128 UTF-16 length
//! followed by modified-UTF-8 content terminated by a NUL byte. The stored
//! length is diagnostic (it counts UTF-16 code units, not bytes) and is never
//! used to locate the terminator. Because modified UTF-8 is not always valid
//! UTF-8, content is returned as raw bytes and any text rendering is left to
//! the caller.
//!
//! # The no-index sentinel
//!
//! Index fields that may be "not present" store [`NO_INDEX`], the maximum
//! 16-bit value. The sentinel-aware lookups return `Ok(None)` for it without
//! touching any table. The comparison must be an equality test: checking
//! `idx < NO_INDEX` instead would invert the convention and short-circuit
//! every real index.

use crate::{metadata::tables::Dex, Result};

/// Sentinel index meaning "no reference present".
pub const NO_INDEX: u32 = u16::MAX as u32;

impl<'a> Dex<'a> {
    /// Resolve a string id to its content bytes and stored UTF-16 length.
    ///
    /// Follows `string_data_off`, decodes the length prefix, and returns the
    /// modified-UTF-8 bytes up to (not including) the NUL terminator.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] when the data offset falls outside
    /// the image and [`crate::Error::Truncated`] when the length prefix is cut
    /// short.
    pub fn string_data_and_utf16_length(
        &self,
        string_id: &crate::metadata::tables::StringId,
    ) -> Result<(&'a [u8], u32)> {
        let mut parser = self.slice_from(string_id.string_data_off as usize)?;
        let utf16_length = parser.read_uleb128()?;
        let bytes = parser.read_cstr_bytes()?;
        Ok((bytes, utf16_length))
    }

    /// Resolve a string table index to content bytes and UTF-16 length, honoring
    /// the sentinel.
    ///
    /// [`NO_INDEX`] yields `Ok(None)` without a table lookup: the sentinel means
    /// "field not present", not "index zero".
    ///
    /// # Errors
    /// Propagates lookup failures for any non-sentinel index.
    pub fn string_with_utf16_length_by_index(
        &self,
        idx: u32,
    ) -> Result<Option<(&'a [u8], u32)>> {
        if idx == NO_INDEX {
            return Ok(None);
        }
        let string_id = self.string_id(idx)?;
        self.string_data_and_utf16_length(&string_id).map(Some)
    }

    /// Resolve a string table index to its content bytes, honoring the sentinel.
    ///
    /// # Errors
    /// Propagates lookup failures for any non-sentinel index.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use dexscope::{Dex, NO_INDEX};
    ///
    /// # let buffer: Vec<u8> = Vec::new();
    /// let dex = Dex::parse(&buffer)?;
    /// assert!(dex.string_by_index(NO_INDEX)?.is_none());
    /// # Ok::<(), dexscope::Error>(())
    /// ```
    pub fn string_by_index(&self, idx: u32) -> Result<Option<&'a [u8]>> {
        Ok(self
            .string_with_utf16_length_by_index(idx)?
            .map(|(bytes, _)| bytes))
    }

    /// Resolve a type table index to its descriptor string, honoring the sentinel.
    ///
    /// Looks up the type id, then its descriptor through the string table.
    ///
    /// # Errors
    /// Propagates lookup failures for any non-sentinel index.
    pub fn type_descriptor(&self, type_idx: u32) -> Result<Option<&'a [u8]>> {
        if type_idx == NO_INDEX {
            return Ok(None);
        }
        let type_id = self.type_id(type_idx)?;
        self.string_by_index(type_id.descriptor_idx)
    }
}
