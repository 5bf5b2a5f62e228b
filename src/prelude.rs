//! # dexscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types
//! from the dexscope library. Import it to get quick access to the essentials
//! of DEX image analysis.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dexscope operations
pub use crate::Error;

/// The result type used throughout dexscope
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Main entry point for DEX image analysis
pub use crate::Dex;

/// Low-level byte stream parsing
pub use crate::Parser;

// ================================================================================================
// Header and Format Constants
// ================================================================================================

/// Decoded header record and format generation detection
pub use crate::{DexHeader, DexVersion};

/// Magic tag and no-index sentinel
pub use crate::{DEX_MAGIC, NO_INDEX};

// ================================================================================================
// Table Records
// ================================================================================================

/// Fixed-size id table records
pub use crate::{ClassDef, FieldId, MethodId, ProtoId, StringId, TypeId, TypeList};

/// Class-data records and member access flags
pub use crate::{AccessFlags, ClassDataHeader, RawField, RawMethod};

// ================================================================================================
// Integrity Fields
// ================================================================================================

/// Checksum and signature computation, verification and repair
pub use crate::{
    compute_checksum, compute_signature, repair_checksum, repair_image, repair_signature,
    verify_signature,
};
