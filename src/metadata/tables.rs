//! Indexed id tables and the bounds-checked [`Dex`] accessor.
//!
//! A DEX image addresses everything through six fixed-record-size tables whose
//! locations the header declares: string ids, type ids, prototypes, fields,
//! methods and class definitions. Nothing in those tables carries a length of
//! its own, so every lookup must be validated against the header's declared
//! table size and the image bounds before a single byte is touched.
//!
//! The design rule here is that all offset arithmetic happens in byte units
//! from the image base: `base + table_off + idx * RECORD_SIZE`, computed with
//! checked `usize` math and then sliced out of the image. The reference C code
//! instead adds raw offsets to a header-typed pointer, which silently scales
//! them by the header's size; that pattern is reproduced nowhere in this crate.
//!
//! Every record type is a small owned copy of the fixed-size entry; the image
//! itself is never mutated by a lookup.

use crate::{image::parser::Parser, metadata::header::DexHeader, Error, Result};

/// One string id table entry: the offset of the string's data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringId {
    /// Offset, from the image base, of the ULEB128-prefixed string data
    pub string_data_off: u32,
}

impl StringId {
    /// Fixed record size in the string id table.
    pub const SIZE: usize = 4;

    fn read(parser: &mut Parser) -> Result<StringId> {
        Ok(StringId {
            string_data_off: parser.read_le::<u32>()?,
        })
    }
}

/// One type id table entry: an index into the string table for the descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeId {
    /// String table index of the type's descriptor
    pub descriptor_idx: u32,
}

impl TypeId {
    /// Fixed record size in the type id table.
    pub const SIZE: usize = 4;

    fn read(parser: &mut Parser) -> Result<TypeId> {
        Ok(TypeId {
            descriptor_idx: parser.read_le::<u32>()?,
        })
    }
}

/// One prototype table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtoId {
    /// String table index of the shorty descriptor
    pub shorty_idx: u32,
    /// Type table index of the return type
    pub return_type_idx: u32,
    /// Offset of the parameter [`TypeList`], or 0 when the prototype takes none
    pub parameters_off: u32,
}

impl ProtoId {
    /// Fixed record size in the proto id table.
    pub const SIZE: usize = 12;

    fn read(parser: &mut Parser) -> Result<ProtoId> {
        Ok(ProtoId {
            shorty_idx: parser.read_le::<u32>()?,
            return_type_idx: parser.read_le::<u32>()?,
            parameters_off: parser.read_le::<u32>()?,
        })
    }
}

/// One field id table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldId {
    /// Type table index of the declaring class
    pub class_idx: u16,
    /// Type table index of the field's type
    pub type_idx: u16,
    /// String table index of the field name
    pub name_idx: u32,
}

impl FieldId {
    /// Fixed record size in the field id table.
    pub const SIZE: usize = 8;

    fn read(parser: &mut Parser) -> Result<FieldId> {
        Ok(FieldId {
            class_idx: parser.read_le::<u16>()?,
            type_idx: parser.read_le::<u16>()?,
            name_idx: parser.read_le::<u32>()?,
        })
    }
}

/// One method id table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodId {
    /// Type table index of the declaring class
    pub class_idx: u16,
    /// Proto table index of the method's prototype
    pub proto_idx: u16,
    /// String table index of the method name
    pub name_idx: u32,
}

impl MethodId {
    /// Fixed record size in the method id table.
    pub const SIZE: usize = 8;

    fn read(parser: &mut Parser) -> Result<MethodId> {
        Ok(MethodId {
            class_idx: parser.read_le::<u16>()?,
            proto_idx: parser.read_le::<u16>()?,
            name_idx: parser.read_le::<u32>()?,
        })
    }
}

/// One class definition table entry.
///
/// The fields themselves are consumed by callers; only bounds-checked retrieval
/// is provided here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassDef {
    /// Type table index of this class
    pub class_idx: u32,
    /// Class access flags
    pub access_flags: u32,
    /// Type table index of the superclass, or the no-index sentinel
    pub superclass_idx: u32,
    /// Offset of the implemented-interfaces [`TypeList`], or 0
    pub interfaces_off: u32,
    /// String table index of the source file name, or the no-index sentinel
    pub source_file_idx: u32,
    /// Offset of the annotations directory, or 0
    pub annotations_off: u32,
    /// Offset of the class-data blob, or 0
    pub class_data_off: u32,
    /// Offset of the static-values encoded array, or 0
    pub static_values_off: u32,
}

impl ClassDef {
    /// Fixed record size in the class definition table.
    pub const SIZE: usize = 32;

    fn read(parser: &mut Parser) -> Result<ClassDef> {
        Ok(ClassDef {
            class_idx: parser.read_le::<u32>()?,
            access_flags: parser.read_le::<u32>()?,
            superclass_idx: parser.read_le::<u32>()?,
            interfaces_off: parser.read_le::<u32>()?,
            source_file_idx: parser.read_le::<u32>()?,
            annotations_off: parser.read_le::<u32>()?,
            class_data_off: parser.read_le::<u32>()?,
            static_values_off: parser.read_le::<u32>()?,
        })
    }
}

/// A size-prefixed sequence of type indices, used for prototype parameter lists
/// and interface lists.
///
/// The element count is validated against the image bounds when the list is
/// materialized, so iteration cannot run off the image.
#[derive(Debug, Clone, Copy)]
pub struct TypeList<'a> {
    /// Raw 2-byte entries, already bounds-checked
    entries: &'a [u8],
}

impl<'a> TypeList<'a> {
    /// Number of type indices in the list.
    #[must_use]
    pub fn size(&self) -> u32 {
        (self.entries.len() / 2) as u32
    }

    /// The type index at `position` within the list.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `position` is not below
    /// [`size`](TypeList::size).
    pub fn type_idx(&self, position: u32) -> Result<u16> {
        let offset = (position as usize).checked_mul(2).ok_or(Error::OutOfBounds)?;
        if offset + 2 > self.entries.len() {
            return Err(Error::OutOfBounds);
        }
        Ok(u16::from_le_bytes([self.entries[offset], self.entries[offset + 1]]))
    }

    /// Iterate the type indices in list order.
    pub fn iter(&self) -> impl Iterator<Item = u16> + 'a {
        self.entries
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
    }
}

/// A validated view over a memory-resident DEX image.
///
/// `Dex` pairs the raw byte buffer with its decoded [`DexHeader`] and offers
/// bounds-checked resolution of every indexed reference the format has. It
/// borrows the buffer immutably, so any number of `Dex` readers can work over
/// the same image concurrently; the checksum repair functions require `&mut`
/// access and therefore cannot overlap with them.
///
/// # Examples
///
/// ```rust,no_run
/// use dexscope::Dex;
///
/// # let buffer: Vec<u8> = Vec::new();
/// let dex = Dex::parse(&buffer)?;
/// let string_id = dex.string_id(0)?;
/// println!("first string data at {:#x}", string_id.string_data_off);
/// # Ok::<(), dexscope::Error>(())
/// ```
pub struct Dex<'a> {
    data: &'a [u8],
    base: usize,
    /// Exclusive end of the addressable image: `base + file_size`, clamped to the buffer.
    limit: usize,
    header: DexHeader,
}

impl<'a> Dex<'a> {
    /// Parse and validate a DEX image whose header starts at offset 0.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotSupported`] when the magic or version is not
    /// an accepted DEX generation, plus any header decoding failure.
    pub fn parse(data: &'a [u8]) -> Result<Dex<'a>> {
        Dex::parse_at(data, 0)
    }

    /// Parse and validate a DEX image whose header starts at `base`.
    ///
    /// All header offsets are interpreted relative to `base`. The declared
    /// `file_size` caps every later access; a `file_size` larger than the
    /// buffer is clamped to the bytes actually present.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotSupported`] when the magic or version is not
    /// an accepted DEX generation, plus any header decoding failure.
    pub fn parse_at(data: &'a [u8], base: usize) -> Result<Dex<'a>> {
        let header = DexHeader::read(data, base)?;
        if !header.is_valid_magic() {
            return Err(Error::NotSupported);
        }

        let limit = base
            .checked_add(header.file_size as usize)
            .map_or(data.len(), |end| end.min(data.len()));

        Ok(Dex {
            data,
            base,
            limit,
            header,
        })
    }

    /// The decoded header record.
    #[must_use]
    pub fn header(&self) -> &DexHeader {
        &self.header
    }

    /// The underlying image bytes.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// A cursor over `len` bytes at image-relative offset `off`.
    ///
    /// This is the single primitive every table accessor routes through; the
    /// arithmetic is in byte units from the image base with checked math.
    fn slice_at(&self, off: usize, len: usize) -> Result<Parser<'a>> {
        let start = self.base.checked_add(off).ok_or(Error::OutOfBounds)?;
        let end = start.checked_add(len).ok_or(Error::OutOfBounds)?;
        if start < self.base || end > self.limit {
            return Err(Error::OutOfBounds);
        }
        Ok(Parser::new(&self.data[start..end]))
    }

    /// A cursor from image-relative offset `off` to the end of the image.
    ///
    /// Used for records with no self-describing length, such as string data and
    /// class-data blobs; the cursor's own bounds stop any over-read.
    pub(crate) fn slice_from(&self, off: usize) -> Result<Parser<'a>> {
        let start = self.base.checked_add(off).ok_or(Error::OutOfBounds)?;
        if start >= self.limit {
            return Err(Error::OutOfBounds);
        }
        Ok(Parser::new(&self.data[start..self.limit]))
    }

    /// Locate record `idx` in a table of `count` entries of `record_size` bytes
    /// starting at image-relative offset `table_off`.
    fn record(&self, table_off: u32, count: u32, record_size: usize, idx: u32) -> Result<Parser<'a>> {
        if idx >= count {
            return Err(Error::OutOfBounds);
        }

        let off = (table_off as usize)
            .checked_add((idx as usize) * record_size)
            .ok_or(Error::OutOfBounds)?;
        self.slice_at(off, record_size)
    }

    /// The string id record at `idx`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `idx` is not strictly below the
    /// declared table size or the record does not fit inside the image.
    pub fn string_id(&self, idx: u32) -> Result<StringId> {
        let mut parser = self.record(
            self.header.string_ids_off,
            self.header.string_ids_size,
            StringId::SIZE,
            idx,
        )?;
        StringId::read(&mut parser)
    }

    /// The type id record at `idx`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `idx` is not strictly below the
    /// declared table size or the record does not fit inside the image.
    pub fn type_id(&self, idx: u32) -> Result<TypeId> {
        let mut parser = self.record(
            self.header.type_ids_off,
            self.header.type_ids_size,
            TypeId::SIZE,
            idx,
        )?;
        TypeId::read(&mut parser)
    }

    /// The proto id record at `idx`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `idx` is not strictly below the
    /// declared table size or the record does not fit inside the image.
    pub fn proto_id(&self, idx: u32) -> Result<ProtoId> {
        let mut parser = self.record(
            self.header.proto_ids_off,
            self.header.proto_ids_size,
            ProtoId::SIZE,
            idx,
        )?;
        ProtoId::read(&mut parser)
    }

    /// The field id record at `idx`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `idx` is not strictly below the
    /// declared table size or the record does not fit inside the image.
    pub fn field_id(&self, idx: u32) -> Result<FieldId> {
        let mut parser = self.record(
            self.header.field_ids_off,
            self.header.field_ids_size,
            FieldId::SIZE,
            idx,
        )?;
        FieldId::read(&mut parser)
    }

    /// The method id record at `idx`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `idx` is not strictly below the
    /// declared table size or the record does not fit inside the image.
    pub fn method_id(&self, idx: u32) -> Result<MethodId> {
        let mut parser = self.record(
            self.header.method_ids_off,
            self.header.method_ids_size,
            MethodId::SIZE,
            idx,
        )?;
        MethodId::read(&mut parser)
    }

    /// The class definition record at `idx`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `idx` is not strictly below the
    /// declared table size or the record does not fit inside the image.
    pub fn class_def(&self, idx: u32) -> Result<ClassDef> {
        let mut parser = self.record(
            self.header.class_defs_off,
            self.header.class_defs_size,
            ClassDef::SIZE,
            idx,
        )?;
        ClassDef::read(&mut parser)
    }

    /// The parameter list of a prototype, or `None` when it takes no parameters.
    ///
    /// A `parameters_off` of 0 means "no list"; otherwise the size-prefixed
    /// sequence of 2-byte type indices is bounds-checked against the image
    /// before a view over it is returned.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] when the declared element count
    /// does not fit inside the image.
    pub fn proto_parameters(&self, proto: &ProtoId) -> Result<Option<TypeList<'a>>> {
        if proto.parameters_off == 0 {
            return Ok(None);
        }

        let mut parser = self.slice_from(proto.parameters_off as usize)?;
        let size = parser.read_le::<u32>()?;
        let byte_len = (size as usize).checked_mul(2).ok_or(Error::OutOfBounds)?;
        let entries = parser.read_bytes(byte_len)?;

        Ok(Some(TypeList { entries }))
    }

    /// A cursor over a class's class-data blob, or `None` when the class has
    /// no data (`class_data_off` of 0, e.g. a marker interface).
    ///
    /// The blob has no self-describing length, so the cursor runs to the end of
    /// the image; decode it sequentially with [`crate::ClassDataHeader`],
    /// [`crate::RawField`] and [`crate::RawMethod`].
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] when the offset falls outside the
    /// image.
    pub fn class_data(&self, class_def: &ClassDef) -> Result<Option<Parser<'a>>> {
        if class_def.class_data_off == 0 {
            return Ok(None);
        }
        self.slice_from(class_def.class_data_off as usize).map(Some)
    }
}
