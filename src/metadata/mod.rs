//! DEX metadata structures and bounds-checked accessors.
//!
//! This module contains the format-aware half of the crate: the decoded
//! header, the six indexed id tables, and the sequential class-data readers.
//!
//! # Key Components
//!
//! - [`crate::metadata::header`] - Header decoding, magic/version validation,
//!   format constants
//! - [`crate::metadata::tables`] - The [`crate::Dex`] accessor and the fixed-size
//!   id table records
//! - [`crate::metadata::class_data`] - ULEB128 class-data records and access flags
//! - [`crate::metadata::strings`] - String data and type descriptor resolution,
//!   sentinel handling
//! - [`crate::metadata::signatures`] - Diagnostic signature rendering
//!
//! All lookups are validated against the header's declared table sizes and the
//! image bounds; a malformed image produces an [`crate::Error`], never a panic.

pub(crate) mod class_data;
pub(crate) mod header;
pub(crate) mod signatures;
pub(crate) mod strings;
pub(crate) mod tables;
