//! PP decoder: header dispatch, token replay, checksum verification.
//!
//! One decode loop serves all three container generations; the per-version
//! [`TokenLayout`](crate::header::TokenLayout) supplies the flag width,
//! field widths, minimum match, and whether an end marker exists. Matches
//! copy byte by byte so an offset smaller than the length correctly
//! propagates the run pattern being written.

pub mod bit_reader;
pub mod tree;

use crate::checksum::sum16;
use crate::compress::{FLAG_END, FLAG_REF, FLAG_RUN};
use crate::error::{Error, Result};
use crate::header::{Header, TokenLayout};
use crate::progress::{percent, Progress, ProgressFn, Stage};

use self::bit_reader::BitReader;
use self::tree::DecodeTree;

/// Decompress a PP container (any supported generation) to its original bytes.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>> {
    decompress_inner(input, Progress::none())
}

/// [`decompress`] with a progress callback.
pub fn decompress_with_progress(input: &[u8], callback: ProgressFn<'_>) -> Result<Vec<u8>> {
    decompress_inner(input, Progress::new(callback))
}

fn decompress_inner(input: &[u8], mut progress: Progress<'_>) -> Result<Vec<u8>> {
    let (header, header_len) = Header::parse(input)?;
    let layout = header.version.layout();
    let expected_len = header.uncompressed_size as usize;

    let rest = &input[header_len..];
    if rest.len() < 4 {
        return Err(Error::InvalidSize("tree size field missing".into()));
    }
    let tree_size = u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
    if tree_size == 0 {
        return Err(Error::InvalidSize("tree size is zero".into()));
    }
    if tree_size > rest.len() - 4 {
        return Err(Error::InvalidSize(format!(
            "tree of {} bytes overruns container",
            tree_size
        )));
    }

    let huffman = DecodeTree::parse(&rest[4..4 + tree_size])?;
    let mut reader = BitReader::new(&rest[4 + tree_size..]);

    let mut out: Vec<u8> = Vec::with_capacity(expected_len);
    let mut next_percent = 5u8;

    loop {
        if layout.has_end_marker {
            match reader.read_bits(2)? {
                FLAG_END => break,
                FLAG_RUN => {
                    let run_len = reader.read_bits(8)? as usize;
                    if run_len == 0 {
                        return Err(Error::BadToken("empty literal run".into()));
                    }
                    if out.len() + run_len > expected_len {
                        return Err(Error::BadToken("literal run past output end".into()));
                    }
                    for _ in 0..run_len {
                        out.push(huffman.decode_symbol(&mut reader)?);
                    }
                }
                FLAG_REF => {
                    copy_match(&mut out, expected_len, &mut reader, &layout)?;
                }
                _ => return Err(Error::BadToken("reserved flag 01".into())),
            }
        } else {
            // v2 carries no end marker; the output length is the terminator.
            if out.len() >= expected_len {
                break;
            }
            if reader.read_bit()? {
                copy_match(&mut out, expected_len, &mut reader, &layout)?;
            } else {
                out.push(huffman.decode_symbol(&mut reader)?);
            }
        }

        let done = percent(out.len(), expected_len);
        if done >= next_percent {
            progress.report(Stage::Decode, done, "replaying tokens");
            next_percent = done - done % 5 + 5;
        }
    }

    if out.len() != expected_len {
        return Err(Error::BadToken("stream ended before output complete".into()));
    }

    let actual = sum16(&out);
    if actual != header.checksum {
        return Err(Error::ChecksumMismatch {
            expected: header.checksum,
            actual,
        });
    }

    Ok(out)
}

// Replay one back-reference with a forward byte-by-byte copy.
fn copy_match(
    out: &mut Vec<u8>,
    expected_len: usize,
    reader: &mut BitReader<'_>,
    layout: &TokenLayout,
) -> Result<()> {
    let raw_offset = reader.read_bits(layout.offset_bits)?;
    let raw_length = reader.read_bits(layout.length_bits)?;
    let offset = (raw_offset + layout.offset_bias) as usize;
    let length = raw_length as usize + layout.min_match;

    if offset == 0 {
        return Err(Error::BadToken("back-reference offset is zero".into()));
    }
    if offset > out.len() {
        return Err(Error::BadToken(format!(
            "back-reference offset {} reaches before output start",
            offset
        )));
    }
    if out.len() + length > expected_len {
        return Err(Error::BadToken("back-reference past output end".into()));
    }

    let start = out.len() - offset;
    for i in 0..length {
        let byte = out[start + i];
        out.push(byte);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::compress;

    #[test]
    fn test_roundtrip_simple() {
        let data = b"the rain in spain stays mainly in the plain";
        let container = compress(data, 6).unwrap();
        assert_eq!(decompress(&container).unwrap(), data.to_vec());
    }

    #[test]
    fn test_overlapping_copy_propagates_runs() {
        let data = vec![0x5Au8; 5000];
        let container = compress(&data, 6).unwrap();
        assert_eq!(decompress(&container).unwrap(), data);
    }

    #[test]
    fn test_decode_reports_progress() {
        let data = vec![1u8; 40_000];
        let container = compress(&data, 6).unwrap();
        let mut percents = Vec::new();
        let mut cb = |stage: Stage, pct: u8, _msg: &str| {
            if stage == Stage::Decode {
                percents.push(pct);
            }
        };
        let out = decompress_with_progress(&container, &mut cb).unwrap();
        assert_eq!(out, data);
        assert_eq!(percents.last(), Some(&100));
        assert!(percents.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_not_a_container() {
        assert!(matches!(
            decompress(b"QQxxxxxxxxxxxxxxxxxxxxxx"),
            Err(Error::BadMagic { .. })
        ));
    }

    #[test]
    fn test_missing_tree_size_field() {
        let container = compress(b"some data here", 6).unwrap();
        assert!(matches!(
            decompress(&container[..21]),
            Err(Error::InvalidSize(_))
        ));
    }

    #[test]
    fn test_tree_overruns_container() {
        let mut container = compress(b"some data here", 6).unwrap();
        // Inflate the tree_size word past the container end.
        container[20..24].copy_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
        assert!(matches!(
            decompress(&container),
            Err(Error::InvalidSize(_))
        ));
    }

    #[test]
    fn test_truncated_token_stream() {
        let data = b"abcdefghijklmnopqrstuvwxyz".repeat(20);
        let container = compress(&data, 6).unwrap();
        let result = decompress(&container[..container.len() - 1]);
        assert!(
            matches!(
                result,
                Err(Error::Overrun)
                    | Err(Error::ChecksumMismatch { .. })
                    | Err(Error::BadToken(_))
            ),
            "unexpected result: {:?}",
            result
        );
    }

    #[test]
    fn test_corrupted_checksum_detected() {
        let data = b"checksums catch silent corruption in transit";
        let mut container = compress(data, 6).unwrap();
        // The checksum lives at bytes 16..18 of the v4 header.
        container[16] ^= 0xFF;
        assert!(matches!(
            decompress(&container),
            Err(Error::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_is_idempotent() {
        let data = b"decode twice, get the same bytes twice".repeat(8);
        let container = compress(&data, 4).unwrap();
        let first = decompress(&container).unwrap();
        let second = decompress(&container).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, data);
    }
}
