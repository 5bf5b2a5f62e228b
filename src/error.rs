use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// DEX images are treated as adversarial input throughout: every failure mode that a crafted
/// or truncated file can trigger is represented as a returned variant, never as a panic or
/// process abort.
///
/// # Error Categories
///
/// ## Structural Errors
/// - [`Error::OutOfBounds`] - An index exceeded its table's declared size, or a computed
///   offset fell outside the image
/// - [`Error::Truncated`] - A variable-length read ran past the available bytes
/// - [`Error::Malformed`] - Corrupted or inconsistent image structure
///
/// ## Input Errors
/// - [`Error::NotSupported`] - Magic or version bytes do not match any accepted DEX generation
/// - [`Error::Empty`] - Empty input provided
///
/// # Examples
///
/// ```rust
/// use dexscope::{Dex, Error};
///
/// match Dex::parse(&[0u8; 16]) {
///     Ok(dex) => println!("parsed {} strings", dex.header().string_ids_size),
///     Err(Error::NotSupported) => eprintln!("not a DEX image"),
///     Err(Error::Truncated { offset }) => eprintln!("image cut short at byte {offset}"),
///     Err(e) => eprintln!("error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The image is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was
    /// detected for debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while resolving a reference.
    ///
    /// Raised when a table index is not strictly less than the table's declared
    /// size, or when a computed byte offset does not fit inside the image. This
    /// is a safety check to prevent buffer overruns on crafted input.
    #[error("Out of bound read would have occurred!")]
    OutOfBounds,

    /// A variable-length read ran out of bytes mid-sequence.
    ///
    /// Raised by the LEB128 decoders and the class-data readers when the stream
    /// ends before the encoding does. Carries the byte offset of the failed
    /// read so callers can report the malformed location.
    #[error("Stream truncated at byte offset {offset}")]
    Truncated {
        /// Byte offset, relative to the cursor's underlying data, of the read that failed
        offset: usize,
    },

    /// This image is not a supported DEX format generation.
    ///
    /// The magic tag or the 3-byte version string did not match any accepted
    /// value.
    #[error("This file type is not supported")]
    NotSupported,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_carries_location() {
        let err = malformed_error!("bad type list size - {}", 42);
        match err {
            Error::Malformed { message, file, .. } => {
                assert_eq!(message, "bad type list size - 42");
                assert!(file.ends_with("error.rs"));
            }
            _ => panic!("expected Malformed"),
        }
    }

    #[test]
    fn display_messages() {
        assert_eq!(
            Error::Truncated { offset: 7 }.to_string(),
            "Stream truncated at byte offset 7"
        );
        assert_eq!(
            Error::NotSupported.to_string(),
            "This file type is not supported"
        );
    }
}
