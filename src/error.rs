//! Error types for the ppz codec.

use std::fmt;

/// Result type alias for ppz operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the encoder, the decoder, and the envelope boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Encoder input is empty or exceeds the 1 GiB cap.
    InvalidInput(String),
    /// The container does not start with the `PP` magic.
    BadMagic {
        /// The two bytes found where the magic was expected.
        found: u16,
    },
    /// The container's major version is not 2, 3, or 4.
    UnsupportedVersion(u8),
    /// The container is too short for the header layout its version implies.
    TruncatedHeader {
        /// Bytes required by the header layout.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },
    /// A size field is zero, exceeds the 1 GiB cap, or overruns the container.
    InvalidSize(String),
    /// The serialized Huffman tree is structurally invalid.
    MalformedTree(String),
    /// The token stream contains a reserved flag or an impossible back-reference.
    BadToken(String),
    /// The decoder needed bits past the end of the token stream.
    Overrun,
    /// The recomputed checksum does not match the header.
    ChecksumMismatch {
        /// Checksum stored in the header.
        expected: u16,
        /// Checksum computed over the decoded output.
        actual: u16,
    },
    /// The encoder hit an internal bound (Huffman code length over 32 bits).
    InternalLimit(String),
    /// The envelope prefix marks an enciphered container the core cannot read.
    Enciphered,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(reason) => write!(f, "invalid input: {}", reason),
            Error::BadMagic { found } => {
                write!(f, "bad magic 0x{:04X}: not a PP container", found)
            }
            Error::UnsupportedVersion(v) => {
                write!(f, "unsupported container version {}", v)
            }
            Error::TruncatedHeader { expected, actual } => {
                write!(
                    f,
                    "truncated header: need {} bytes, got {}",
                    expected, actual
                )
            }
            Error::InvalidSize(reason) => write!(f, "invalid size: {}", reason),
            Error::MalformedTree(reason) => write!(f, "malformed Huffman tree: {}", reason),
            Error::BadToken(reason) => write!(f, "bad token: {}", reason),
            Error::Overrun => write!(f, "token stream ended prematurely"),
            Error::ChecksumMismatch { expected, actual } => {
                write!(
                    f,
                    "checksum mismatch: header 0x{:04X}, computed 0x{:04X}",
                    expected, actual
                )
            }
            Error::InternalLimit(reason) => write!(f, "internal limit: {}", reason),
            Error::Enciphered => {
                write!(f, "enciphered container: decrypt before decompressing")
            }
        }
    }
}

impl std::error::Error for Error {}
