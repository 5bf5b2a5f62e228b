#![doc(html_no_source)]
#![deny(missing_docs)]

//! # dexscope
//!
//! A memory-safe accessor layer for Android DEX bytecode containers.
//!
//! `dexscope` parses and validates memory-resident DEX images and exposes
//! bounds-checked access to everything the format indexes: the fixed header,
//! the six id tables (strings, types, prototypes, fields, methods, class
//! definitions), ULEB128/SLEB128-encoded class-data records and the two header
//! integrity fields. DEX images are treated as adversarial input throughout;
//! a crafted or truncated file yields an [`Error`], never a panic, abort or
//! out-of-bounds access.
//!
//! ## Features
//!
//! - **Header validation** - Magic/version checking across format generations
//!   035 through 039, with per-field diagnostics
//! - **Integrity fields** - Adler-32 checksum and SHA-1 signature computation,
//!   verification and in-place repair
//! - **Bounds-checked tables** - Every indexed lookup is validated against the
//!   declared table size and the image bounds before any byte is read
//! - **Variable-length decoding** - ULEB128/SLEB128 readers matching the
//!   format's 5-byte tolerance and sign-extension behavior
//! - **Zero-copy strings** - String data and type descriptors are borrowed
//!   straight from the image buffer
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dexscope::Dex;
//!
//! let buffer = std::fs::read("classes.dex")?;
//! let dex = Dex::parse(&buffer)?;
//!
//! let header = dex.header();
//! println!("{} strings, {} classes", header.string_ids_size, header.class_defs_size);
//!
//! for idx in 0..header.string_ids_size {
//!     if let Some(bytes) = dex.string_by_index(idx)? {
//!         println!("{}", String::from_utf8_lossy(bytes));
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Checksum Repair
//!
//! The repair operations are the only mutations in the crate and take the
//! buffer by `&mut`, so they cannot overlap with a live [`Dex`] reader:
//!
//! ```rust,no_run
//! use dexscope::{compute_checksum, repair_image};
//!
//! let mut buffer = std::fs::read("classes.dex")?;
//! let size = buffer.len();
//! let written = repair_image(&mut buffer, size)?;
//! assert_eq!(written, compute_checksum(&buffer, size)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`prelude`] - Convenient re-exports of commonly used types
//! - `image` - Byte-level primitives: cursor parsing, LEB128, checksums
//! - `metadata` - Format-aware layer: header, id tables, class data, strings
//! - [`Error`] and [`Result`] - Error handling for adversarial input
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result):
//!
//! ```rust,no_run
//! use dexscope::{Dex, Error};
//!
//! match Dex::parse(&[0u8; 4]) {
//!     Ok(dex) => println!("parsed image of {} bytes", dex.header().file_size),
//!     Err(Error::NotSupported) => println!("not a DEX image"),
//!     Err(Error::OutOfBounds) => println!("reference outside the image"),
//!     Err(e) => println!("error: {e}"),
//! }
//! ```

#[macro_use]
pub(crate) mod error;
pub(crate) mod image;
pub(crate) mod metadata;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust,no_run
/// use dexscope::prelude::*;
///
/// # let buffer: Vec<u8> = Vec::new();
/// let dex = Dex::parse(&buffer)?;
/// println!("{} methods", dex.header().method_ids_size);
/// # Ok::<(), dexscope::Error>(())
/// ```
pub mod prelude;

/// `dexscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is
/// always [`Error`]. Used consistently throughout the crate for all fallible
/// operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `dexscope` Error type
///
/// The main error type for all operations in this crate. Every failure mode a
/// malformed image can trigger is represented as a variant.
pub use error::Error;

/// Validated view over a memory-resident DEX image.
///
/// The main entry point of the crate; see [`Dex::parse`].
pub use metadata::tables::Dex;

/// Decoded DEX header record and format generation detection.
pub use metadata::header::{DexHeader, DexVersion};

/// Format constants: magic tag, field offsets and endianness markers.
pub use metadata::header::{
    CHECKSUM_OFFSET, DEX_MAGIC, ENDIAN_CONSTANT, HEADER_SIZE, MAGIC_LEN, REVERSE_ENDIAN_CONSTANT,
    SIGNATURE_LEN, SIGNATURE_OFFSET,
};

/// Fixed-size id table records and the parameter/interface type list view.
pub use metadata::tables::{ClassDef, FieldId, MethodId, ProtoId, StringId, TypeId, TypeList};

/// Sequential class-data records and member access flags.
pub use metadata::class_data::{AccessFlags, ClassDataHeader, RawField, RawMethod};

/// The no-index sentinel for optional index fields.
pub use metadata::strings::NO_INDEX;

/// Placeholder text for unresolvable signatures.
pub use metadata::signatures::NO_SIGNATURE;

/// Cursor-based binary parser, including the ULEB128/SLEB128 decoders.
pub use image::parser::Parser;

/// LEB128 encoders, chiefly useful for constructing test images.
pub use image::parser::{encode_sleb128, encode_uleb128};

/// Checksum and signature computation, verification and repair.
pub use image::checksum::{
    compute_checksum, compute_signature, repair_checksum, repair_image, repair_signature,
    verify_signature,
};
