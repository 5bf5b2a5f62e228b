//! DEX header parsing, magic/version validation and diagnostics.
//!
//! The header is a fixed 112-byte record at the image base. Beyond the integrity
//! fields it is essentially a table of contents: six `(size, offset)` pairs
//! locating the string, type, proto, field, method and class-definition tables,
//! plus the link and data sections. [`DexHeader`] copies those fields out of the
//! image once; all later bounds checks work against this one decoded record.
//!
//! Magic validation is deliberately non-fatal: [`DexHeader::is_valid_magic`]
//! returns a boolean so the caller decides whether to reject, matching the
//! reference behavior. Several format generations are accepted, enumerated by
//! [`DexVersion`].

use strum::{EnumIter, IntoEnumIterator};
use tracing::{debug, trace};

use crate::{image::parser::Parser, Error, Result};

/// The 4-byte DEX magic tag preceding the version string.
pub const DEX_MAGIC: [u8; 4] = *b"dex\n";

/// Total magic field width: tag, 3-byte version string, NUL terminator.
pub const MAGIC_LEN: usize = 8;

/// Byte offset of the Adler-32 checksum field, immediately after the magic.
pub const CHECKSUM_OFFSET: usize = MAGIC_LEN;

/// Byte offset of the SHA-1 signature field.
pub const SIGNATURE_OFFSET: usize = CHECKSUM_OFFSET + 4;

/// Width of the SHA-1 signature field.
pub const SIGNATURE_LEN: usize = 20;

/// Size of the fixed DEX header record.
pub const HEADER_SIZE: usize = 0x70;

/// Endianness tag value for a little-endian image.
pub const ENDIAN_CONSTANT: u32 = 0x1234_5678;

/// Endianness tag value for a byte-swapped image.
pub const REVERSE_ENDIAN_CONSTANT: u32 = 0x7856_3412;

/// Accepted DEX format generations, identified by the 3-byte version string in
/// the magic field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, strum::Display)]
pub enum DexVersion {
    /// Original format, API level 1+
    #[strum(serialize = "035")]
    V035,
    /// Adds invoke-polymorphic, API level 26+
    #[strum(serialize = "037")]
    V037,
    /// Adds invoke-custom and method handles, API level 27+
    #[strum(serialize = "038")]
    V038,
    /// Adds const-method-handle and const-method-type, API level 28+
    #[strum(serialize = "039")]
    V039,
}

impl DexVersion {
    /// The 3-byte version string as it appears in the magic field.
    #[must_use]
    pub fn as_bytes(self) -> &'static [u8; 3] {
        match self {
            DexVersion::V035 => b"035",
            DexVersion::V037 => b"037",
            DexVersion::V038 => b"038",
            DexVersion::V039 => b"039",
        }
    }

    /// Match a raw 3-byte version field against the accepted generations.
    #[must_use]
    pub fn from_bytes(version: &[u8]) -> Option<DexVersion> {
        DexVersion::iter().find(|candidate| candidate.as_bytes()[..] == version[..])
    }
}

/// The fixed-size header record of a DEX image.
///
/// All multi-byte fields are little-endian in the image; they are decoded into
/// host integers on read. Offsets are relative to the image base and are byte
/// counts, never record counts.
///
/// # Examples
///
/// ```rust
/// use dexscope::DexHeader;
///
/// let mut image = vec![0u8; 0x70];
/// image[0..8].copy_from_slice(b"dex\n035\0");
/// image[32..36].copy_from_slice(&0x70u32.to_le_bytes()); // file_size
///
/// let header = DexHeader::read(&image, 0)?;
/// assert!(header.is_valid_magic());
/// assert_eq!(header.file_size, 0x70);
/// # Ok::<(), dexscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct DexHeader {
    /// Magic tag plus version string plus NUL
    pub magic: [u8; MAGIC_LEN],
    /// Adler-32 over the image body, excluding magic and this field
    pub checksum: u32,
    /// SHA-1 over the image body from offset 0x20; informational only
    pub signature: [u8; SIGNATURE_LEN],
    /// Declared size of the whole image in bytes
    pub file_size: u32,
    /// Declared size of this header record
    pub header_size: u32,
    /// [`ENDIAN_CONSTANT`] or [`REVERSE_ENDIAN_CONSTANT`]
    pub endian_tag: u32,
    /// Size of the link section, 0 when not statically linked
    pub link_size: u32,
    /// Offset of the link section
    pub link_off: u32,
    /// Offset of the map item list
    pub map_off: u32,
    /// Number of entries in the string id table
    pub string_ids_size: u32,
    /// Offset of the string id table
    pub string_ids_off: u32,
    /// Number of entries in the type id table
    pub type_ids_size: u32,
    /// Offset of the type id table
    pub type_ids_off: u32,
    /// Number of entries in the proto id table
    pub proto_ids_size: u32,
    /// Offset of the proto id table
    pub proto_ids_off: u32,
    /// Number of entries in the field id table
    pub field_ids_size: u32,
    /// Offset of the field id table
    pub field_ids_off: u32,
    /// Number of entries in the method id table
    pub method_ids_size: u32,
    /// Offset of the method id table
    pub method_ids_off: u32,
    /// Number of entries in the class definition table
    pub class_defs_size: u32,
    /// Offset of the class definition table
    pub class_defs_off: u32,
    /// Size of the data section
    pub data_size: u32,
    /// Offset of the data section
    pub data_off: u32,
}

impl DexHeader {
    /// Decode the header record located at `base` within `data`.
    ///
    /// Only the fixed-size record is read; table offsets are validated lazily by
    /// the accessors that use them, since eagerly checking every table is wasted
    /// work when few are touched.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] for an empty buffer and
    /// [`crate::Error::OutOfBounds`] when fewer than [`HEADER_SIZE`] bytes are
    /// available at `base`.
    pub fn read(data: &[u8], base: usize) -> Result<DexHeader> {
        if data.is_empty() {
            return Err(Error::Empty);
        }
        if base >= data.len() || data.len() - base < HEADER_SIZE {
            return Err(Error::OutOfBounds);
        }

        let mut parser = Parser::new(&data[base..base + HEADER_SIZE]);

        let mut magic = [0u8; MAGIC_LEN];
        magic.copy_from_slice(parser.read_bytes(MAGIC_LEN)?);

        let checksum = parser.read_le::<u32>()?;

        let mut signature = [0u8; SIGNATURE_LEN];
        signature.copy_from_slice(parser.read_bytes(SIGNATURE_LEN)?);

        Ok(DexHeader {
            magic,
            checksum,
            signature,
            file_size: parser.read_le::<u32>()?,
            header_size: parser.read_le::<u32>()?,
            endian_tag: parser.read_le::<u32>()?,
            link_size: parser.read_le::<u32>()?,
            link_off: parser.read_le::<u32>()?,
            map_off: parser.read_le::<u32>()?,
            string_ids_size: parser.read_le::<u32>()?,
            string_ids_off: parser.read_le::<u32>()?,
            type_ids_size: parser.read_le::<u32>()?,
            type_ids_off: parser.read_le::<u32>()?,
            proto_ids_size: parser.read_le::<u32>()?,
            proto_ids_off: parser.read_le::<u32>()?,
            field_ids_size: parser.read_le::<u32>()?,
            field_ids_off: parser.read_le::<u32>()?,
            method_ids_size: parser.read_le::<u32>()?,
            method_ids_off: parser.read_le::<u32>()?,
            class_defs_size: parser.read_le::<u32>()?,
            class_defs_off: parser.read_le::<u32>()?,
            data_size: parser.read_le::<u32>()?,
            data_off: parser.read_le::<u32>()?,
        })
    }

    /// Check the magic tag and version string against the accepted generations.
    ///
    /// Returns `false` on any mismatch rather than an error; rejecting the image
    /// is the caller's decision. Logs the detected version at debug level.
    #[must_use]
    pub fn is_valid_magic(&self) -> bool {
        if self.magic[..4] != DEX_MAGIC {
            return false;
        }

        match DexVersion::from_bytes(&self.magic[4..7]) {
            Some(version) => {
                debug!("Dex version '{version}' detected");
                true
            }
            None => false,
        }
    }

    /// The format generation of this image, if the version string is recognized.
    #[must_use]
    pub fn version(&self) -> Option<DexVersion> {
        if self.magic[..4] != DEX_MAGIC {
            return None;
        }
        DexVersion::from_bytes(&self.magic[4..7])
    }

    /// The SHA-1 signature field rendered as a lowercase hex string.
    #[must_use]
    pub fn signature_hex(&self) -> String {
        self.signature.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Log every header field in hexadecimal and decimal at trace level.
    ///
    /// This is a reporting surface for diagnostics; the exact text is not a
    /// compatibility contract.
    pub fn dump(&self) {
        trace!("------ Dex Header Info ------");
        trace!(
            "magic        : {}-{}",
            String::from_utf8_lossy(&self.magic[..3]),
            String::from_utf8_lossy(&self.magic[4..7])
        );
        trace!("checksum     : {:x} ({})", self.checksum, self.checksum);
        trace!("signature    : {}", self.signature_hex());
        trace!("fileSize     : {:x} ({})", self.file_size, self.file_size);
        trace!("headerSize   : {:x} ({})", self.header_size, self.header_size);
        trace!("endianTag    : {:x} ({})", self.endian_tag, self.endian_tag);
        trace!("linkSize     : {:x} ({})", self.link_size, self.link_size);
        trace!("linkOff      : {:x} ({})", self.link_off, self.link_off);
        trace!("mapOff       : {:x} ({})", self.map_off, self.map_off);
        trace!(
            "stringIdsSize: {:x} ({})",
            self.string_ids_size,
            self.string_ids_size
        );
        trace!(
            "stringIdsOff : {:x} ({})",
            self.string_ids_off,
            self.string_ids_off
        );
        trace!("typeIdsSize  : {:x} ({})", self.type_ids_size, self.type_ids_size);
        trace!("typeIdsOff   : {:x} ({})", self.type_ids_off, self.type_ids_off);
        trace!(
            "protoIdsSize : {:x} ({})",
            self.proto_ids_size,
            self.proto_ids_size
        );
        trace!(
            "protoIdsOff  : {:x} ({})",
            self.proto_ids_off,
            self.proto_ids_off
        );
        trace!(
            "fieldIdsSize : {:x} ({})",
            self.field_ids_size,
            self.field_ids_size
        );
        trace!(
            "fieldIdsOff  : {:x} ({})",
            self.field_ids_off,
            self.field_ids_off
        );
        trace!(
            "methodIdsSize: {:x} ({})",
            self.method_ids_size,
            self.method_ids_size
        );
        trace!(
            "methodIdsOff : {:x} ({})",
            self.method_ids_off,
            self.method_ids_off
        );
        trace!(
            "classDefsSize: {:x} ({})",
            self.class_defs_size,
            self.class_defs_size
        );
        trace!(
            "classDefsOff : {:x} ({})",
            self.class_defs_off,
            self.class_defs_off
        );
        trace!("dataSize     : {:x} ({})", self.data_size, self.data_size);
        trace!("dataOff      : {:x} ({})", self.data_off, self.data_off);
        trace!("-----------------------------");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_header_bytes(version: &[u8; 3]) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_SIZE];
        data[0..4].copy_from_slice(&DEX_MAGIC);
        data[4..7].copy_from_slice(version);
        data[32..36].copy_from_slice(&(HEADER_SIZE as u32).to_le_bytes());
        data[36..40].copy_from_slice(&(HEADER_SIZE as u32).to_le_bytes());
        data[40..44].copy_from_slice(&ENDIAN_CONSTANT.to_le_bytes());
        data
    }

    #[test]
    fn accepts_every_known_version() {
        for version in DexVersion::iter() {
            let data = minimal_header_bytes(version.as_bytes());
            let header = DexHeader::read(&data, 0).unwrap();
            assert!(header.is_valid_magic(), "version {version}");
            assert_eq!(header.version(), Some(version));
        }
    }

    #[test]
    fn rejects_single_byte_mutations() {
        let good = minimal_header_bytes(b"035");
        // Mutate each byte of the magic tag and version string in turn
        for i in 0..7 {
            let mut data = good.clone();
            data[i] ^= 0xFF;
            let header = DexHeader::read(&data, 0).unwrap();
            assert!(!header.is_valid_magic(), "mutated byte {i}");
        }
    }

    #[test]
    fn rejects_unknown_version() {
        let data = minimal_header_bytes(b"034");
        let header = DexHeader::read(&data, 0).unwrap();
        assert!(!header.is_valid_magic());
        assert_eq!(header.version(), None);
    }

    #[test]
    fn reads_fields_little_endian() {
        let mut data = minimal_header_bytes(b"039");
        data[56..60].copy_from_slice(&7u32.to_le_bytes()); // string_ids_size
        data[60..64].copy_from_slice(&0x70u32.to_le_bytes()); // string_ids_off

        let header = DexHeader::read(&data, 0).unwrap();
        assert_eq!(header.string_ids_size, 7);
        assert_eq!(header.string_ids_off, 0x70);
        assert_eq!(header.endian_tag, ENDIAN_CONSTANT);
        assert_eq!(header.header_size, HEADER_SIZE as u32);
    }

    #[test]
    fn read_at_nonzero_base() {
        let mut data = vec![0xAA; 16];
        data.extend_from_slice(&minimal_header_bytes(b"037"));
        let header = DexHeader::read(&data, 16).unwrap();
        assert!(header.is_valid_magic());
    }

    #[test]
    fn undersized_input() {
        assert!(matches!(DexHeader::read(&[], 0), Err(Error::Empty)));
        assert!(matches!(
            DexHeader::read(&[0u8; 0x40], 0),
            Err(Error::OutOfBounds)
        ));
        let data = vec![0u8; HEADER_SIZE];
        assert!(matches!(
            DexHeader::read(&data, 1),
            Err(Error::OutOfBounds)
        ));
    }

    #[test]
    fn signature_hex_rendering() {
        let mut data = minimal_header_bytes(b"035");
        data[SIGNATURE_OFFSET] = 0xDE;
        data[SIGNATURE_OFFSET + 1] = 0xAD;
        let header = DexHeader::read(&data, 0).unwrap();
        assert!(header.signature_hex().starts_with("dead"));
        assert_eq!(header.signature_hex().len(), SIGNATURE_LEN * 2);
    }
}
