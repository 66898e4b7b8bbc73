//! Huffman coding over the byte alphabet.
//!
//! The encoder builds one tree per container from input frequencies and
//! serializes it into the header area as a pre-order bit stream: `1` plus
//! eight symbol bits for a leaf, `0` followed by both subtrees for an
//! internal node. Leaves are self-delimiting, so the blob needs no length
//! fields of its own. The blob packs bits MSB-first, unlike the token
//! stream.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::bits::MsbBitWriter;
use crate::error::{Error, Result};
use crate::progress::{percent, Progress, Stage};

/// Hard bound on codeword length; deeper trees are refused.
pub const MAX_CODE_LENGTH: u8 = 32;

/// Chunk size for progress reporting while counting frequencies.
const ANALYZE_CHUNK: usize = 1 << 20;

/// Huffman code for one symbol: branch bits in root-to-leaf order,
/// right-aligned. `length == 0` means the symbol never occurs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HuffmanCode {
    /// The code bits.
    pub code: u32,
    /// Number of bits in the code.
    pub length: u8,
}

/// Encoder-side Huffman tree.
#[derive(Debug, Clone)]
pub enum Tree {
    /// Terminal node carrying a byte symbol.
    Leaf(u8),
    /// Interior node with exactly two children (left, right).
    Internal(Box<Tree>, Box<Tree>),
}

/// Count byte frequencies over the input, reporting progress per MiB.
pub fn count_frequencies(data: &[u8], progress: &mut Progress<'_>) -> [u32; 256] {
    let mut freqs = [0u32; 256];
    let mut done = 0usize;
    for chunk in data.chunks(ANALYZE_CHUNK) {
        for &b in chunk {
            freqs[b as usize] += 1;
        }
        done += chunk.len();
        progress.report(
            Stage::Analyze,
            percent(done, data.len()),
            "counting byte frequencies",
        );
    }
    freqs
}

// Min-heap entry; insertion order breaks frequency ties.
struct HeapNode {
    frequency: u32,
    seq: u32,
    tree: Tree,
}

impl PartialEq for HeapNode {
    fn eq(&self, other: &Self) -> bool {
        self.frequency == other.frequency && self.seq == other.seq
    }
}

impl Eq for HeapNode {}

impl Ord for HeapNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the BinaryHeap pops the smallest first.
        other
            .frequency
            .cmp(&self.frequency)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for HeapNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Build a Huffman tree from symbol frequencies.
///
/// A one-symbol alphabet yields an internal root with the leaf on both
/// branches, so the symbol still costs one bit and the serialized form
/// stays self-delimiting.
pub fn build_tree(freqs: &[u32; 256]) -> Result<Tree> {
    let mut heap = BinaryHeap::new();
    let mut seq = 0u32;
    for (symbol, &freq) in freqs.iter().enumerate() {
        if freq > 0 {
            heap.push(HeapNode {
                frequency: freq,
                seq,
                tree: Tree::Leaf(symbol as u8),
            });
            seq += 1;
        }
    }

    match heap.len() {
        0 => Err(Error::InvalidInput("no symbols to encode".into())),
        1 => {
            let leaf = heap.pop().expect("heap has one node").tree;
            Ok(Tree::Internal(Box::new(leaf.clone()), Box::new(leaf)))
        }
        _ => {
            while heap.len() > 1 {
                let left = heap.pop().expect("heap has two nodes");
                let right = heap.pop().expect("heap has two nodes");
                heap.push(HeapNode {
                    frequency: left.frequency + right.frequency,
                    seq,
                    tree: Tree::Internal(Box::new(left.tree), Box::new(right.tree)),
                });
                seq += 1;
            }
            Ok(heap.pop().expect("heap has the root").tree)
        }
    }
}

/// Assign codes by tree walk: `0` for left, `1` for right.
///
/// Fails with [`Error::InternalLimit`] if any code would exceed
/// [`MAX_CODE_LENGTH`] bits.
pub fn generate_codes(tree: &Tree) -> Result<[HuffmanCode; 256]> {
    let mut codes = [HuffmanCode::default(); 256];
    let mut stack: Vec<(&Tree, u32, u8)> = vec![(tree, 0, 0)];

    while let Some((node, code, depth)) = stack.pop() {
        match node {
            Tree::Leaf(symbol) => {
                codes[*symbol as usize] = HuffmanCode {
                    code,
                    length: depth.max(1),
                };
            }
            Tree::Internal(left, right) => {
                if depth == MAX_CODE_LENGTH {
                    return Err(Error::InternalLimit(format!(
                        "Huffman code longer than {} bits",
                        MAX_CODE_LENGTH
                    )));
                }
                stack.push((right, (code << 1) | 1, depth + 1));
                stack.push((left, code << 1, depth + 1));
            }
        }
    }

    Ok(codes)
}

/// Serialize a tree into its pre-order MSB-first bit form.
pub fn serialize_tree(tree: &Tree) -> Result<Vec<u8>> {
    let mut writer = MsbBitWriter::new();
    let mut stack: Vec<(&Tree, u8)> = vec![(tree, 0)];

    while let Some((node, depth)) = stack.pop() {
        match node {
            Tree::Leaf(symbol) => {
                writer.write_bit(true);
                writer.write_bits(*symbol as u32, 8);
            }
            Tree::Internal(left, right) => {
                if depth == MAX_CODE_LENGTH {
                    return Err(Error::InternalLimit(format!(
                        "Huffman tree deeper than {} levels",
                        MAX_CODE_LENGTH
                    )));
                }
                writer.write_bit(false);
                // Right is pushed first so the left subtree pops first.
                stack.push((right, depth + 1));
                stack.push((left, depth + 1));
            }
        }
    }

    Ok(writer.finish())
}
