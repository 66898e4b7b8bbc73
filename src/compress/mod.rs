//! PP encoder: token emission and container assembly.
//!
//! Pipeline: validate, sniff, pick a mode, count frequencies, build and
//! serialize the Huffman tree, index the input, tokenize, then pack the
//! token stream. Literals accumulate in a run buffer that is flushed when
//! full or when a back-reference interrupts it; the stream ends with an
//! explicit marker and a zero-padded final byte.

pub mod huffman;
pub mod matcher;

use crate::bits::BitWriter;
use crate::checksum::sum16;
use crate::error::{Error, Result};
use crate::header::{Header, Mode, Version, CURRENT_HEADER_LEN, CURRENT_MINOR, MAX_BUFFER_LEN};
use crate::progress::{Progress, ProgressFn};
use crate::sniff;

use self::huffman::HuffmanCode;
use self::matcher::Token;

/// Token flag: end of stream.
pub(crate) const FLAG_END: u32 = 0b00;

/// Token flag: literal run (8-bit length, then Huffman symbols).
pub(crate) const FLAG_RUN: u32 = 0b10;

/// Token flag: back-reference (offset field, then length field).
pub(crate) const FLAG_REF: u32 = 0b11;

/// Bits in the v4 back-reference offset field.
const OFFSET_BITS: u8 = 17;

/// Bits in the v4 back-reference length field.
const LENGTH_BITS: u8 = 10;

/// Longest literal run per mode.
fn run_limit(mode: Mode) -> usize {
    match mode {
        Mode::Fast => 64,
        _ => 255,
    }
}

/// Compress `input` into a v4 PP container.
///
/// `level` is clamped to 1..=9 and, together with the sniffed file type,
/// selects the compression mode. Fails with [`Error::InvalidInput`] for an
/// empty or over-1-GiB input and [`Error::InternalLimit`] if the Huffman
/// tree would exceed 32 levels.
pub fn compress(input: &[u8], level: u8) -> Result<Vec<u8>> {
    compress_inner(input, level, Progress::none())
}

/// [`compress`] with a progress callback.
pub fn compress_with_progress(
    input: &[u8],
    level: u8,
    callback: ProgressFn<'_>,
) -> Result<Vec<u8>> {
    compress_inner(input, level, Progress::new(callback))
}

fn compress_inner(input: &[u8], level: u8, mut progress: Progress<'_>) -> Result<Vec<u8>> {
    if input.is_empty() {
        return Err(Error::InvalidInput("input is empty".into()));
    }
    if input.len() > MAX_BUFFER_LEN {
        return Err(Error::InvalidInput(format!(
            "input of {} bytes exceeds 1 GiB",
            input.len()
        )));
    }

    let level = level.clamp(1, 9);
    let filetype = sniff::sniff(input);
    let mode = Mode::select(level, filetype);

    let freqs = huffman::count_frequencies(input, &mut progress);
    let tree = huffman::build_tree(&freqs)?;
    let codes = huffman::generate_codes(&tree)?;
    let tree_blob = huffman::serialize_tree(&tree)?;

    let tokens = matcher::tokenize(input, mode, &mut progress);
    let token_bytes = pack_tokens(&tokens, &codes, run_limit(mode));

    let header = Header {
        version: Version::V4,
        version_minor: CURRENT_MINOR,
        uncompressed_size: input.len() as u32,
        compressed_size: token_bytes.len() as u32,
        level,
        filetype: filetype.as_byte(),
        mode: Some(mode),
        checksum: sum16(input),
    };

    let mut out =
        Vec::with_capacity(CURRENT_HEADER_LEN + 4 + tree_blob.len() + token_bytes.len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(&(tree_blob.len() as u32).to_le_bytes());
    out.extend_from_slice(&tree_blob);
    out.extend_from_slice(&token_bytes);
    Ok(out)
}

/// Pack tokens into the v4 bit stream.
fn pack_tokens(tokens: &[Token], codes: &[HuffmanCode; 256], run_limit: usize) -> Vec<u8> {
    let mut writer = BitWriter::with_capacity(1024);
    let mut run: Vec<u8> = Vec::with_capacity(run_limit);

    for token in tokens {
        match *token {
            Token::Literal(byte) => {
                run.push(byte);
                if run.len() == run_limit {
                    flush_run(&mut writer, &mut run, codes);
                }
            }
            Token::Match { offset, length } => {
                flush_run(&mut writer, &mut run, codes);
                writer.write_bits(FLAG_REF, 2);
                writer.write_bits(offset - 1, OFFSET_BITS);
                writer.write_bits(length as u32 - matcher::MIN_MATCH as u32, LENGTH_BITS);
            }
        }
    }

    flush_run(&mut writer, &mut run, codes);
    writer.write_bits(FLAG_END, 2);
    writer.finish()
}

/// Emit a pending literal run: flag, 8-bit length, then each symbol's code.
fn flush_run(writer: &mut BitWriter, run: &mut Vec<u8>, codes: &[HuffmanCode; 256]) {
    if run.is_empty() {
        return;
    }
    writer.write_bits(FLAG_RUN, 2);
    writer.write_bits(run.len() as u32, 8);
    for &byte in run.iter() {
        let code = codes[byte as usize];
        // Branch decisions are consumed root-first, so the code is emitted
        // reversed into the LSB-first stream.
        writer.write_bits(reverse_bits(code.code, code.length), code.length);
    }
    run.clear();
}

/// Reverse the low `length` bits of `code`.
#[inline]
fn reverse_bits(code: u32, length: u8) -> u32 {
    let mut result = 0u32;
    let mut code = code;
    for _ in 0..length {
        result = (result << 1) | (code & 1);
        code >>= 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::MAGIC;

    #[test]
    fn test_compress_rejects_empty_input() {
        assert!(matches!(compress(&[], 6), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_container_shape_single_byte() {
        let container = compress(&[0x41], 6).unwrap();
        let (header, header_len) = Header::parse(&container).unwrap();
        assert_eq!(header_len, CURRENT_HEADER_LEN);
        assert_eq!(header.version, Version::V4);
        assert_eq!(header.uncompressed_size, 1);
        assert_eq!(header.checksum, 0x41);

        let tree_size = u32::from_le_bytes(
            container[CURRENT_HEADER_LEN..CURRENT_HEADER_LEN + 4]
                .try_into()
                .unwrap(),
        ) as usize;
        assert!(tree_size > 0);
        assert_eq!(
            container.len(),
            CURRENT_HEADER_LEN + 4 + tree_size + header.compressed_size as usize
        );
    }

    #[test]
    fn test_container_magic_first() {
        let container = compress(b"hello world", 3).unwrap();
        assert_eq!(u16::from_le_bytes([container[0], container[1]]), MAGIC);
        assert_eq!(container[2], 4);
    }

    #[test]
    fn test_repetitive_input_shrinks() {
        let data = vec![0u8; 100_000];
        let container = compress(&data, 6).unwrap();
        assert!(
            container.len() < data.len() / 10,
            "container {} bytes for 100000 zeros",
            container.len()
        );
    }

    #[test]
    fn test_level_maps_to_mode_byte() {
        let data = vec![0xABu8; 4096];
        for (level, mode) in [(1, Mode::Fast), (5, Mode::Balanced), (9, Mode::Ultra)] {
            let container = compress(&data, level).unwrap();
            let (header, _) = Header::parse(&container).unwrap();
            assert_eq!(header.mode, Some(mode));
            assert_eq!(header.level, level);
        }
    }

    #[test]
    fn test_text_input_selects_web_mode() {
        let data = b"a perfectly ordinary sentence, repeated. ".repeat(40);
        let container = compress(&data, 6).unwrap();
        let (header, _) = Header::parse(&container).unwrap();
        assert_eq!(header.mode, Some(Mode::Web));
    }

    #[test]
    fn test_reverse_bits() {
        assert_eq!(reverse_bits(0b101, 3), 0b101);
        assert_eq!(reverse_bits(0b100, 3), 0b001);
        assert_eq!(reverse_bits(0b11110000, 8), 0b00001111);
        assert_eq!(reverse_bits(1, 32), 1 << 31);
    }
}
