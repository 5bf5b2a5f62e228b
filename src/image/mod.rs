//! Byte-level access to memory-resident DEX images.
//!
//! Everything in this module works on plain `&[u8]` buffers and knows nothing
//! about DEX metadata beyond the two header integrity fields:
//!
//! - [`crate::image::io`] - Little-endian primitive reads and writes
//! - [`crate::image::parser`] - Cursor-based decoding, including ULEB128/SLEB128
//! - [`crate::image::checksum`] - Adler-32 checksum and SHA-1 signature support
//!
//! The split mirrors the layering above it: the metadata accessors in
//! [`crate::metadata`] translate indices and offsets into byte ranges, then
//! come here to read them.

pub(crate) mod checksum;
pub(crate) mod io;
pub(crate) mod parser;
