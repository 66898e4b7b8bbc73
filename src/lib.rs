//! # ppz
//!
//! A self-contained lossless codec for the `PP` container format.
//!
//! The encoder combines LZ77 dictionary compression (hash-chain match
//! search, lazy matching, and an optimal-parse lookahead at the highest
//! level) with Huffman-coded literal runs, and frames the result behind a
//! small versioned header carrying a 16-bit checksum of the original
//! bytes. The writer produces generation 4 containers; the decoder also
//! accepts the legacy generations 2 and 3.
//!
//! Both directions work on whole in-memory buffers (1 byte to 1 GiB) and
//! run synchronously on the calling thread. An optional progress callback
//! receives `(stage, percent, message)` reports at coarse intervals.
//!
//! ## Example
//!
//! ```rust
//! let data = b"the quick brown fox jumps over the quick brown fox";
//! let container = ppz::compress(data, 6).unwrap();
//! let restored = ppz::decompress(&container).unwrap();
//! assert_eq!(restored, data.to_vec());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bits;
pub mod checksum;
pub mod compress;
pub mod decode;
pub mod envelope;
pub mod error;
pub mod header;
pub mod progress;
pub mod sniff;

pub use compress::{compress, compress_with_progress};
pub use decode::{decompress, decompress_with_progress};
pub use error::{Error, Result};
pub use header::Mode;
pub use progress::Stage;
pub use sniff::FileType;
