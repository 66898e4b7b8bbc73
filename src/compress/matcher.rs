//! LZ77 match finder with a hash-chain index over the whole input.
//!
//! The index is built once per encode: every position with four bytes of
//! lookahead is pushed onto its hash bucket's chain (`head` per bucket,
//! `link` per position, `-1` meaning empty). Searches walk a chain newest
//! to oldest, skipping entries at or ahead of the probe position, until
//! the window edge or the mode's chain depth. Hashes are only ever used
//! inside one encode; the decoder never sees them.

use crate::header::Mode;
use crate::progress::{percent, Progress, Stage};

/// Back-reference window (128 KiB).
pub const WINDOW_SIZE: usize = 1 << 17;

/// Shortest match worth a back-reference.
pub const MIN_MATCH: usize = 4;

/// Longest encodable match.
pub const MAX_MATCH: usize = 1024;

const HASH_BITS: u32 = 18;
const HASH_SIZE: usize = 1 << HASH_BITS;
const EMPTY: i32 = -1;

/// Optimal-parse lookahead distance (ULTRA).
const LOOKAHEAD: usize = 4;

/// Token-cost weight of a back-reference in the optimal parse.
const MATCH_COST: usize = 4;

/// Progress granularity while scanning (4 MiB).
const SCAN_REPORT_STEP: usize = 4 << 20;

/// Progress granularity while indexing (1 MiB).
const INDEX_REPORT_STEP: usize = 1 << 20;

/// LZ77 token: a raw byte or a back-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Uncompressed byte.
    Literal(u8),
    /// Back-reference into the already-emitted output.
    Match {
        /// Backward distance in bytes (1..=131072).
        offset: u32,
        /// Match length in bytes (4..=1024).
        length: u16,
    },
}

/// Search tuning per compression mode.
#[derive(Debug, Clone, Copy)]
pub struct SearchParams {
    /// Chain entries examined per search.
    pub chain_depth: usize,
    /// Stop searching once a match reaches this length.
    pub early_exit: Option<usize>,
    /// Defer a match when the next position matches longer.
    pub lazy: bool,
    /// Probe a short lookahead and pick the cheapest start.
    pub optimal: bool,
    /// Use the cheaper multiplicative hash.
    pub fast_hash: bool,
}

impl SearchParams {
    /// Tuning for a mode.
    pub fn for_mode(mode: Mode) -> SearchParams {
        match mode {
            Mode::Fast => SearchParams {
                chain_depth: 16,
                early_exit: Some(32),
                lazy: false,
                optimal: false,
                fast_hash: true,
            },
            Mode::Balanced => SearchParams {
                chain_depth: 512,
                early_exit: Some(256),
                lazy: true,
                optimal: false,
                fast_hash: false,
            },
            Mode::Web => SearchParams {
                chain_depth: 128,
                early_exit: None,
                lazy: true,
                optimal: false,
                fast_hash: false,
            },
            Mode::Ultra => SearchParams {
                chain_depth: 1024,
                early_exit: None,
                lazy: false,
                optimal: true,
                fast_hash: false,
            },
        }
    }
}

// Multiplicative hash; 0x1E35_A7BD shows up in several LZ implementations.
#[inline]
fn hash4_fast(value: u32) -> usize {
    (value.wrapping_mul(0x1E35_A7BD) >> (32 - HASH_BITS)) as usize
}

// Avalanching mixer for the deeper-searching modes.
#[inline]
fn hash4_mix(value: u32) -> usize {
    let mut h = value;
    h ^= h >> 16;
    h = h.wrapping_mul(0x85EB_CA6B);
    h ^= h >> 13;
    h = h.wrapping_mul(0xC2B2_AE35);
    h ^= h >> 16;
    (h as usize) & (HASH_SIZE - 1)
}

#[inline]
fn prefix4(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

/// Hash-chain index plus search state for one encode.
pub struct MatchFinder<'a> {
    data: &'a [u8],
    head: Vec<i32>,
    link: Vec<i32>,
    params: SearchParams,
}

impl<'a> MatchFinder<'a> {
    /// Index every position of `data` with four bytes of lookahead.
    pub fn build(data: &'a [u8], params: SearchParams, progress: &mut Progress<'_>) -> Self {
        let mut head = vec![EMPTY; HASH_SIZE];
        let mut link = vec![EMPTY; data.len()];

        let indexable = data.len().saturating_sub(MIN_MATCH - 1);
        let mut next_report = INDEX_REPORT_STEP;
        for pos in 0..indexable {
            let hash = if params.fast_hash {
                hash4_fast(prefix4(data, pos))
            } else {
                hash4_mix(prefix4(data, pos))
            };
            link[pos] = head[hash];
            head[hash] = pos as i32;

            if pos >= next_report {
                progress.report(
                    Stage::Index,
                    percent(pos, indexable),
                    "building hash chains",
                );
                next_report += INDEX_REPORT_STEP;
            }
        }
        progress.report(Stage::Index, 100, "hash chains ready");

        Self {
            data,
            head,
            link,
            params,
        }
    }

    /// Find the longest match at `pos`, or `None` below the minimum length.
    pub fn find(&self, pos: usize) -> Option<(usize, usize)> {
        let data = self.data;
        if pos + MIN_MATCH > data.len() {
            return None;
        }

        let target = prefix4(data, pos);
        let hash = if self.params.fast_hash {
            hash4_fast(target)
        } else {
            hash4_mix(target)
        };

        let mut chain = self.head[hash];
        let mut best_len = MIN_MATCH - 1;
        let mut best_offset = 0usize;
        let max_len = (data.len() - pos).min(MAX_MATCH);
        let mut depth = self.params.chain_depth;

        while chain >= 0 && depth > 0 {
            let cand = chain as usize;
            // The index covers the whole input; entries at or ahead of the
            // cursor are not in the search space.
            if cand >= pos {
                chain = self.link[cand];
                continue;
            }
            let distance = pos - cand;
            if distance > WINDOW_SIZE {
                break;
            }

            // A candidate that cannot beat the current best is rejected on
            // one byte; the 4-byte prefix weeds out hash collisions.
            if data[cand + best_len] != data[pos + best_len]
                || prefix4(data, cand) != target
            {
                chain = self.link[cand];
                depth -= 1;
                continue;
            }

            let len = match_length(data, cand, pos, max_len);
            if len > best_len {
                best_len = len;
                best_offset = distance;
                if len == max_len {
                    break;
                }
                if let Some(threshold) = self.params.early_exit {
                    if len >= threshold {
                        break;
                    }
                }
            }

            chain = self.link[cand];
            depth -= 1;
        }

        if best_len >= MIN_MATCH {
            Some((best_offset, best_len))
        } else {
            None
        }
    }
}

/// Match length between two positions, capped at `max_len`.
///
/// Compares eight bytes at a time, then finishes byte-wise.
#[inline]
fn match_length(data: &[u8], pos1: usize, pos2: usize, max_len: usize) -> usize {
    let mut length = 0;

    while length + 8 <= max_len {
        let a = u64::from_le_bytes(
            data[pos1 + length..pos1 + length + 8]
                .try_into()
                .expect("eight bytes"),
        );
        let b = u64::from_le_bytes(
            data[pos2 + length..pos2 + length + 8]
                .try_into()
                .expect("eight bytes"),
        );
        if a != b {
            return length + ((a ^ b).trailing_zeros() / 8) as usize;
        }
        length += 8;
    }

    while length < max_len && data[pos1 + length] == data[pos2 + length] {
        length += 1;
    }

    length
}

/// Tokenize the input under the given mode's search policy.
pub fn tokenize(data: &[u8], mode: Mode, progress: &mut Progress<'_>) -> Vec<Token> {
    let params = SearchParams::for_mode(mode);
    let finder = MatchFinder::build(data, params, progress);

    let mut tokens = Vec::new();
    let mut pos = 0;
    let n = data.len();
    let mut next_report = SCAN_REPORT_STEP;

    while pos < n {
        if pos >= next_report {
            progress.report(Stage::Encode, percent(pos, n), "emitting tokens");
            next_report += SCAN_REPORT_STEP;
        }

        if params.optimal {
            pos = step_optimal(data, &finder, &mut tokens, pos);
        } else if params.lazy {
            pos = step_lazy(data, &finder, &mut tokens, pos);
        } else {
            pos = step_greedy(data, &finder, &mut tokens, pos);
        }
    }

    progress.report(Stage::Encode, 100, "token stream complete");
    tokens
}

fn push_match(tokens: &mut Vec<Token>, offset: usize, length: usize) {
    tokens.push(Token::Match {
        offset: offset as u32,
        length: length as u16,
    });
}

fn step_greedy(data: &[u8], finder: &MatchFinder<'_>, tokens: &mut Vec<Token>, pos: usize) -> usize {
    match finder.find(pos) {
        Some((offset, length)) => {
            push_match(tokens, offset, length);
            pos + length
        }
        None => {
            tokens.push(Token::Literal(data[pos]));
            pos + 1
        }
    }
}

// Defer one position when the next match is more than one byte longer.
fn step_lazy(data: &[u8], finder: &MatchFinder<'_>, tokens: &mut Vec<Token>, pos: usize) -> usize {
    match finder.find(pos) {
        Some((offset, length)) => {
            if pos + 1 < data.len() {
                if let Some((_, next_length)) = finder.find(pos + 1) {
                    if next_length > length + 1 {
                        tokens.push(Token::Literal(data[pos]));
                        return pos + 1;
                    }
                }
            }
            push_match(tokens, offset, length);
            pos + length
        }
        None => {
            tokens.push(Token::Literal(data[pos]));
            pos + 1
        }
    }
}

// Probe pos..pos+4 and start the match where length minus the cost of the
// skipped literals and the reference itself is largest.
fn step_optimal(
    data: &[u8],
    finder: &MatchFinder<'_>,
    tokens: &mut Vec<Token>,
    pos: usize,
) -> usize {
    let mut best: Option<(usize, usize, usize, isize)> = None;
    let max_skip = LOOKAHEAD.min(data.len() - pos - 1);

    for skip in 0..=max_skip {
        if let Some((offset, length)) = finder.find(pos + skip) {
            let score = length as isize - (skip + MATCH_COST) as isize;
            let better = match best {
                Some((_, _, _, best_score)) => score > best_score,
                None => true,
            };
            if better {
                best = Some((skip, offset, length, score));
            }
        }
    }

    match best {
        Some((skip, offset, length, _)) => {
            for i in 0..skip {
                tokens.push(Token::Literal(data[pos + i]));
            }
            push_match(tokens, offset, length);
            pos + skip + length
        }
        None => {
            tokens.push(Token::Literal(data[pos]));
            pos + 1
        }
    }
}
