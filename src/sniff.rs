//! File-type sniffer.
//!
//! Classifies the input from its leading magic bytes, falling back to a
//! printable-ratio scan. The tag is recorded in the container header but
//! never changes how the stream is decoded; the encoder only uses it to
//! pick a compression mode.

/// How many leading bytes the printable-ratio scan samples.
const TEXT_SAMPLE_LEN: usize = 2048;

/// Fraction of printable bytes (percent) required to call the input text.
const TEXT_THRESHOLD_PCT: usize = 85;

/// File-type tag stored in the container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// No recognized magic and mostly non-printable content.
    Binary,
    /// PNG image.
    Png,
    /// JPEG image.
    Jpeg,
    /// GIF image.
    Gif,
    /// ZIP archive.
    Zip,
    /// PDF document.
    Pdf,
    /// GZIP stream.
    Gzip,
    /// Mostly printable ASCII.
    Text,
}

impl FileType {
    /// The header byte for this tag.
    pub fn as_byte(self) -> u8 {
        match self {
            FileType::Binary => 0,
            FileType::Png => 1,
            FileType::Jpeg => 2,
            FileType::Gif => 3,
            FileType::Zip => 4,
            FileType::Pdf => 5,
            FileType::Gzip => 6,
            FileType::Text => 7,
        }
    }

    /// Decode a header byte; unknown values read as binary.
    pub fn from_byte(byte: u8) -> FileType {
        match byte {
            1 => FileType::Png,
            2 => FileType::Jpeg,
            3 => FileType::Gif,
            4 => FileType::Zip,
            5 => FileType::Pdf,
            6 => FileType::Gzip,
            7 => FileType::Text,
            _ => FileType::Binary,
        }
    }

    /// Short human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            FileType::Binary => "binary",
            FileType::Png => "png",
            FileType::Jpeg => "jpeg",
            FileType::Gif => "gif",
            FileType::Zip => "zip",
            FileType::Pdf => "pdf",
            FileType::Gzip => "gzip",
            FileType::Text => "text",
        }
    }
}

/// Classify `data` from its magic bytes, else by printable ratio.
pub fn sniff(data: &[u8]) -> FileType {
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return FileType::Png;
    }
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return FileType::Jpeg;
    }
    if data.starts_with(&[0x47, 0x49, 0x46]) {
        return FileType::Gif;
    }
    if data.starts_with(&[0x50, 0x4B]) {
        return FileType::Zip;
    }
    if data.starts_with(&[0x25, 0x50, 0x44, 0x46]) {
        return FileType::Pdf;
    }
    if data.starts_with(&[0x1F, 0x8B]) {
        return FileType::Gzip;
    }

    let sample = &data[..data.len().min(TEXT_SAMPLE_LEN)];
    if sample.is_empty() {
        return FileType::Binary;
    }
    let printable = sample
        .iter()
        .filter(|&&b| (0x20..=0x7E).contains(&b) || b == b'\t' || b == b'\r' || b == b'\n')
        .count();
    if printable * 100 >= sample.len() * TEXT_THRESHOLD_PCT {
        FileType::Text
    } else {
        FileType::Binary
    }
}
