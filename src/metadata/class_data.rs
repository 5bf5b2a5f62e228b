//! Sequential readers for class-data records.
//!
//! A class's data blob has no index table: it is a run of ULEB128 values that
//! can only be consumed front to back through a [`Parser`]. The blob opens with
//! a [`ClassDataHeader`] declaring four member counts, followed by that many
//! field and method records in a fixed section order (static fields, instance
//! fields, direct methods, virtual methods).
//!
//! # Delta-encoded indices
//!
//! The `field_idx_delta`/`method_idx_delta` values decoded here are not absolute
//! table indices. Within each section, the first record's delta is the absolute
//! index and every later record stores the difference from its predecessor; the
//! running sum is the caller's responsibility. Only the raw deltas are decoded
//! at this layer.

use bitflags::bitflags;

use crate::{image::parser::Parser, Result};

/// Size of the fixed code-item header, through the first (unread) 16-bit code
/// unit of the trailing instruction stream.
const CODE_HEADER_SIZE: u32 = 18;

bitflags! {
    /// Access flags carried by class-data field and method records and by
    /// class definitions.
    ///
    /// A few bit positions are overloaded by member kind: `VOLATILE` doubles as
    /// `BRIDGE` on methods, `TRANSIENT` as `VARARGS`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AccessFlags: u32 {
        /// Visible everywhere
        const PUBLIC = 0x0001;
        /// Visible only to the declaring class
        const PRIVATE = 0x0002;
        /// Visible to package and subclasses
        const PROTECTED = 0x0004;
        /// Per-class rather than per-instance
        const STATIC = 0x0008;
        /// Not mutable / not overridable
        const FINAL = 0x0010;
        /// Associated lock acquired around method call
        const SYNCHRONIZED = 0x0020;
        /// Field: special access rules; method: bridge (overloads `VOLATILE` bit)
        const VOLATILE = 0x0040;
        /// Field: not default-serialized; method: varargs (overloads `TRANSIENT` bit)
        const TRANSIENT = 0x0080;
        /// Implemented in native code
        const NATIVE = 0x0100;
        /// Interface class
        const INTERFACE = 0x0200;
        /// Not directly instantiable
        const ABSTRACT = 0x0400;
        /// Strict floating-point arithmetic
        const STRICT = 0x0800;
        /// Not directly defined in source
        const SYNTHETIC = 0x1000;
        /// Annotation class
        const ANNOTATION = 0x2000;
        /// Enum class or enum constant field
        const ENUM = 0x4000;
        /// Constructor method
        const CONSTRUCTOR = 0x1_0000;
        /// Method declared synchronized
        const DECLARED_SYNCHRONIZED = 0x2_0000;
    }
}

/// The four member counts opening a class-data blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassDataHeader {
    /// Number of static field records that follow
    pub static_fields_size: u32,
    /// Number of instance field records that follow
    pub instance_fields_size: u32,
    /// Number of direct method records that follow
    pub direct_methods_size: u32,
    /// Number of virtual method records that follow
    pub virtual_methods_size: u32,
}

impl ClassDataHeader {
    /// Decode the four counts as consecutive ULEB128 values, in declaration order.
    ///
    /// # Errors
    /// Returns [`crate::Error::Truncated`] if the stream ends mid-sequence.
    pub fn read(parser: &mut Parser) -> Result<ClassDataHeader> {
        Ok(ClassDataHeader {
            static_fields_size: parser.read_uleb128()?,
            instance_fields_size: parser.read_uleb128()?,
            direct_methods_size: parser.read_uleb128()?,
            virtual_methods_size: parser.read_uleb128()?,
        })
    }
}

/// One field record from a class-data blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawField {
    /// Delta from the previous record's absolute field table index (see module docs)
    pub field_idx_delta: u32,
    /// Raw access flags; decode with [`RawField::access_flags`]
    pub access_flags: u32,
}

impl RawField {
    /// Decode a field record as two consecutive ULEB128 values.
    ///
    /// # Errors
    /// Returns [`crate::Error::Truncated`] if the stream ends mid-sequence.
    pub fn read(parser: &mut Parser) -> Result<RawField> {
        Ok(RawField {
            field_idx_delta: parser.read_uleb128()?,
            access_flags: parser.read_uleb128()?,
        })
    }

    /// The record's access flags, with undefined bits dropped.
    #[must_use]
    pub fn access_flags(&self) -> AccessFlags {
        AccessFlags::from_bits_truncate(self.access_flags)
    }
}

/// One method record from a class-data blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMethod {
    /// Delta from the previous record's absolute method table index (see module docs)
    pub method_idx_delta: u32,
    /// Raw access flags; decode with [`RawMethod::access_flags`]
    pub access_flags: u32,
    /// Offset of the method's code item, or 0 for abstract/native methods
    pub code_off: u32,
}

impl RawMethod {
    /// Decode a method record as three consecutive ULEB128 values.
    ///
    /// # Errors
    /// Returns [`crate::Error::Truncated`] if the stream ends mid-sequence.
    pub fn read(parser: &mut Parser) -> Result<RawMethod> {
        Ok(RawMethod {
            method_idx_delta: parser.read_uleb128()?,
            access_flags: parser.read_uleb128()?,
            code_off: parser.read_uleb128()?,
        })
    }

    /// The record's access flags, with undefined bits dropped.
    #[must_use]
    pub fn access_flags(&self) -> AccessFlags {
        AccessFlags::from_bits_truncate(self.access_flags)
    }

    /// Byte offset of the first 16-bit code unit of this method's instructions.
    ///
    /// The instruction stream is the last field of the fixed code-item header,
    /// so it begins one code unit before the header's total size. Pure
    /// arithmetic over the stored `code_off`; a nonsense offset in a crafted
    /// image wraps rather than panics and is caught by the bounds check of
    /// whichever access uses the result.
    #[must_use]
    pub fn first_instruction_offset(&self) -> u32 {
        self.code_off.wrapping_add(CODE_HEADER_SIZE - 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::parser::encode_uleb128;
    use crate::Error;

    fn encode_all(values: &[u32]) -> Vec<u8> {
        let mut out = Vec::new();
        for &value in values {
            encode_uleb128(value, &mut out);
        }
        out
    }

    #[test]
    fn class_data_header_order() {
        let data = encode_all(&[1, 200, 3, 70_000]);
        let mut parser = Parser::new(&data);
        let header = ClassDataHeader::read(&mut parser).unwrap();

        assert_eq!(header.static_fields_size, 1);
        assert_eq!(header.instance_fields_size, 200);
        assert_eq!(header.direct_methods_size, 3);
        assert_eq!(header.virtual_methods_size, 70_000);
        assert!(!parser.has_more_data());
    }

    #[test]
    fn field_records_decode_raw_deltas() {
        // Two records; absolute indices would be 5 and 5+2=7, but only the
        // deltas are decoded here.
        let data = encode_all(&[5, 0x0001, 2, 0x0008]);
        let mut parser = Parser::new(&data);

        let first = RawField::read(&mut parser).unwrap();
        let second = RawField::read(&mut parser).unwrap();

        assert_eq!(first.field_idx_delta, 5);
        assert_eq!(first.access_flags(), AccessFlags::PUBLIC);
        assert_eq!(second.field_idx_delta, 2);
        assert_eq!(second.access_flags(), AccessFlags::STATIC);
    }

    #[test]
    fn method_record() {
        let data = encode_all(&[12, 0x1_0001, 0x2000]);
        let mut parser = Parser::new(&data);

        let method = RawMethod::read(&mut parser).unwrap();
        assert_eq!(method.method_idx_delta, 12);
        assert_eq!(
            method.access_flags(),
            AccessFlags::PUBLIC | AccessFlags::CONSTRUCTOR
        );
        assert_eq!(method.code_off, 0x2000);
    }

    #[test]
    fn first_instruction_offset_skips_code_header() {
        let method = RawMethod {
            method_idx_delta: 0,
            access_flags: 0,
            code_off: 0x1000,
        };
        assert_eq!(method.first_instruction_offset(), 0x1010);
    }

    #[test]
    fn truncated_record_reports_offset() {
        // Header cut off after two of four counts
        let data = encode_all(&[1, 2]);
        let mut parser = Parser::new(&data);
        assert!(matches!(
            ClassDataHeader::read(&mut parser),
            Err(Error::Truncated { offset: 2 })
        ));
    }

    #[test]
    fn access_flags_drop_undefined_bits() {
        let field = RawField {
            field_idx_delta: 0,
            access_flags: 0x8000_0001,
        };
        assert_eq!(field.access_flags(), AccessFlags::PUBLIC);
    }
}
