//! PP container header: layouts, versions, and modes.
//!
//! Two header generations coexist. Versions 2 and 3 use a 16-byte layout;
//! version 4 grew to 20 bytes, moving the checksum to make room for the
//! mode byte. All fields are little-endian. The writer always produces
//! version 4; the parser accepts all three.

use crate::error::{Error, Result};
use crate::sniff::FileType;

/// The two-byte container magic, `PP`.
pub const MAGIC: u16 = 0x5050;

/// Major version written by this encoder.
pub const CURRENT_MAJOR: u8 = 4;

/// Minor version written by this encoder.
pub const CURRENT_MINOR: u8 = 0;

/// Hard cap on input and decoded sizes (1 GiB).
pub const MAX_BUFFER_LEN: usize = 1 << 30;

/// Legacy (v2/v3) header length in bytes.
pub const LEGACY_HEADER_LEN: usize = 16;

/// Current (v4) header length in bytes.
pub const CURRENT_HEADER_LEN: usize = 20;

/// Container format generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    /// Single-bit flags, Huffman literals, no end marker.
    V2,
    /// Two-bit flags, 64 KiB window, min match 3.
    V3,
    /// Two-bit flags, 128 KiB window, min match 4.
    V4,
}

impl Version {
    /// Map a header major-version byte to a generation.
    pub fn from_major(major: u8) -> Result<Version> {
        match major {
            2 => Ok(Version::V2),
            3 => Ok(Version::V3),
            4 => Ok(Version::V4),
            other => Err(Error::UnsupportedVersion(other)),
        }
    }

    /// The major-version byte for this generation.
    pub fn major(self) -> u8 {
        match self {
            Version::V2 => 2,
            Version::V3 => 3,
            Version::V4 => 4,
        }
    }

    /// Header length implied by this generation.
    pub fn header_len(self) -> usize {
        match self {
            Version::V2 | Version::V3 => LEGACY_HEADER_LEN,
            Version::V4 => CURRENT_HEADER_LEN,
        }
    }

    /// Token grammar parameters for this generation.
    pub fn layout(self) -> TokenLayout {
        match self {
            Version::V2 => TokenLayout {
                flag_width: 1,
                offset_bits: 16,
                offset_bias: 0,
                length_bits: 8,
                min_match: 3,
                has_end_marker: false,
            },
            Version::V3 => TokenLayout {
                flag_width: 2,
                offset_bits: 16,
                offset_bias: 1,
                length_bits: 9,
                min_match: 3,
                has_end_marker: true,
            },
            Version::V4 => TokenLayout {
                flag_width: 2,
                offset_bits: 17,
                offset_bias: 1,
                length_bits: 10,
                min_match: 4,
                has_end_marker: true,
            },
        }
    }
}

/// Per-generation token grammar, driving a single decode loop.
#[derive(Debug, Clone, Copy)]
pub struct TokenLayout {
    /// Bits per token flag (1 in v2, 2 in v3/v4).
    pub flag_width: u8,
    /// Bits in the back-reference offset field.
    pub offset_bits: u8,
    /// Added to the raw offset field (1 for v3/v4's offset-minus-one).
    pub offset_bias: u32,
    /// Bits in the back-reference length field.
    pub length_bits: u8,
    /// Shortest encodable match; added to the raw length field.
    pub min_match: usize,
    /// Whether the stream terminates with an explicit end marker.
    pub has_end_marker: bool,
}

/// Compression mode recorded in v4 headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Shallow chains, early exits, short literal runs.
    Fast,
    /// Deep chains with lazy matching.
    Balanced,
    /// Mid-depth chains with lazy matching, tuned for text.
    Web,
    /// Deepest chains plus optimal-parse lookahead.
    Ultra,
}

impl Mode {
    /// The header byte for this mode.
    pub fn as_byte(self) -> u8 {
        match self {
            Mode::Fast => 1,
            Mode::Balanced => 2,
            Mode::Web => 3,
            Mode::Ultra => 4,
        }
    }

    /// Decode a header mode byte.
    pub fn from_byte(byte: u8) -> Option<Mode> {
        match byte {
            1 => Some(Mode::Fast),
            2 => Some(Mode::Balanced),
            3 => Some(Mode::Web),
            4 => Some(Mode::Ultra),
            _ => None,
        }
    }

    /// Pick a mode from the compression level and the sniffed file type.
    pub fn select(level: u8, filetype: FileType) -> Mode {
        if level == 9 {
            Mode::Ultra
        } else if level <= 2 {
            Mode::Fast
        } else if filetype == FileType::Text {
            Mode::Web
        } else {
            Mode::Balanced
        }
    }

    /// Short human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Mode::Fast => "fast",
            Mode::Balanced => "balanced",
            Mode::Web => "web",
            Mode::Ultra => "ultra",
        }
    }
}

/// Parsed container header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Container generation.
    pub version: Version,
    /// Minor version byte (informational).
    pub version_minor: u8,
    /// Exact decoded length in bytes.
    pub uncompressed_size: u32,
    /// Token stream length in bytes, padding included.
    pub compressed_size: u32,
    /// Compression level recorded by the writer.
    pub level: u8,
    /// Sniffed file-type byte (informational).
    pub filetype: u8,
    /// Mode byte, present and recognized only in v4 headers.
    pub mode: Option<Mode>,
    /// Additive checksum of the uncompressed data.
    pub checksum: u16,
}

impl Header {
    /// Serialize a v4 header (20 bytes).
    pub fn to_bytes(&self) -> [u8; CURRENT_HEADER_LEN] {
        debug_assert_eq!(self.version, Version::V4);
        let mut out = [0u8; CURRENT_HEADER_LEN];
        out[0..2].copy_from_slice(&MAGIC.to_le_bytes());
        out[2] = self.version.major();
        out[3] = self.version_minor;
        out[4..8].copy_from_slice(&self.uncompressed_size.to_le_bytes());
        out[8..12].copy_from_slice(&self.compressed_size.to_le_bytes());
        out[12] = self.level;
        out[13] = self.filetype;
        out[14] = self.mode.map(Mode::as_byte).unwrap_or(0);
        out[15] = 0;
        out[16..18].copy_from_slice(&self.checksum.to_le_bytes());
        out[18] = 0;
        out[19] = 0;
        out
    }

    /// Parse a header from the front of a container.
    ///
    /// Returns the header and its length in bytes.
    pub fn parse(data: &[u8]) -> Result<(Header, usize)> {
        if data.len() < 4 {
            return Err(Error::TruncatedHeader {
                expected: LEGACY_HEADER_LEN,
                actual: data.len(),
            });
        }
        let magic = u16::from_le_bytes([data[0], data[1]]);
        if magic != MAGIC {
            return Err(Error::BadMagic { found: magic });
        }

        let version = Version::from_major(data[2])?;
        let header_len = version.header_len();
        if data.len() < header_len {
            return Err(Error::TruncatedHeader {
                expected: header_len,
                actual: data.len(),
            });
        }

        let uncompressed_size = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        if uncompressed_size == 0 {
            return Err(Error::InvalidSize("uncompressed size is zero".into()));
        }
        if uncompressed_size as usize > MAX_BUFFER_LEN {
            return Err(Error::InvalidSize(format!(
                "uncompressed size {} exceeds 1 GiB",
                uncompressed_size
            )));
        }

        let compressed_size = u32::from_le_bytes([data[8], data[9], data[10], data[11]]);
        let (mode, checksum) = match version {
            Version::V2 | Version::V3 => {
                (None, u16::from_le_bytes([data[14], data[15]]))
            }
            Version::V4 => (
                Mode::from_byte(data[14]),
                u16::from_le_bytes([data[16], data[17]]),
            ),
        };

        Ok((
            Header {
                version,
                version_minor: data[3],
                uncompressed_size,
                compressed_size,
                level: data[12],
                filetype: data[13],
                mode,
                checksum,
            },
            header_len,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> Header {
        Header {
            version: Version::V4,
            version_minor: CURRENT_MINOR,
            uncompressed_size: 1000,
            compressed_size: 420,
            level: 6,
            filetype: FileType::Text.as_byte(),
            mode: Some(Mode::Web),
            checksum: 0xBEEF,
        }
    }

    #[test]
    fn test_header_roundtrip_v4() {
        let header = sample_header();
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), CURRENT_HEADER_LEN);
        let (parsed, len) = Header::parse(&bytes).unwrap();
        assert_eq!(len, CURRENT_HEADER_LEN);
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_header_bad_magic() {
        let mut bytes = sample_header().to_bytes();
        bytes[0] = 0x51;
        assert_eq!(
            Header::parse(&bytes),
            Err(Error::BadMagic { found: 0x5051 })
        );
    }

    #[test]
    fn test_header_unsupported_version() {
        let mut bytes = sample_header().to_bytes();
        bytes[2] = 5;
        assert_eq!(Header::parse(&bytes), Err(Error::UnsupportedVersion(5)));
        bytes[2] = 1;
        assert_eq!(Header::parse(&bytes), Err(Error::UnsupportedVersion(1)));
    }

    #[test]
    fn test_header_truncated() {
        let bytes = sample_header().to_bytes();
        assert!(matches!(
            Header::parse(&bytes[..3]),
            Err(Error::TruncatedHeader { .. })
        ));
        assert!(matches!(
            Header::parse(&bytes[..19]),
            Err(Error::TruncatedHeader { expected: 20, actual: 19 })
        ));
    }

    #[test]
    fn test_header_zero_size_rejected() {
        let mut header = sample_header();
        header.uncompressed_size = 0;
        assert!(matches!(
            Header::parse(&header.to_bytes()),
            Err(Error::InvalidSize(_))
        ));
    }

    #[test]
    fn test_header_legacy_checksum_position() {
        // Hand-rolled 16-byte v3 header with the checksum at offset 14.
        let mut bytes = [0u8; LEGACY_HEADER_LEN];
        bytes[0..2].copy_from_slice(&MAGIC.to_le_bytes());
        bytes[2] = 3;
        bytes[3] = 1;
        bytes[4..8].copy_from_slice(&64u32.to_le_bytes());
        bytes[8..12].copy_from_slice(&32u32.to_le_bytes());
        bytes[12] = 6;
        bytes[13] = 0;
        bytes[14..16].copy_from_slice(&0xCAFEu16.to_le_bytes());

        let (parsed, len) = Header::parse(&bytes).unwrap();
        assert_eq!(len, LEGACY_HEADER_LEN);
        assert_eq!(parsed.version, Version::V3);
        assert_eq!(parsed.checksum, 0xCAFE);
        assert_eq!(parsed.mode, None);
    }

    #[test]
    fn test_mode_selection() {
        assert_eq!(Mode::select(9, FileType::Binary), Mode::Ultra);
        assert_eq!(Mode::select(9, FileType::Text), Mode::Ultra);
        assert_eq!(Mode::select(1, FileType::Text), Mode::Fast);
        assert_eq!(Mode::select(2, FileType::Binary), Mode::Fast);
        assert_eq!(Mode::select(6, FileType::Text), Mode::Web);
        assert_eq!(Mode::select(6, FileType::Png), Mode::Balanced);
    }

    #[test]
    fn test_layout_parameters() {
        let v4 = Version::V4.layout();
        assert_eq!(v4.offset_bits, 17);
        assert_eq!(v4.length_bits, 10);
        assert_eq!(v4.min_match, 4);
        assert!(v4.has_end_marker);

        let v3 = Version::V3.layout();
        assert_eq!(v3.offset_bits, 16);
        assert_eq!(v3.length_bits, 9);
        assert_eq!(v3.min_match, 3);

        let v2 = Version::V2.layout();
        assert_eq!(v2.flag_width, 1);
        assert_eq!(v2.offset_bias, 0);
        assert!(!v2.has_end_marker);
    }
}
