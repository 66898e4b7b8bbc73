//! One-byte envelope prefix around a PP container.
//!
//! Hosts may wrap a container before storage: `0x00` marks a raw container,
//! `0x01` an enciphered one. The cipher itself lives outside this crate;
//! enciphered envelopes must be stripped and decrypted by the host before
//! the container reaches [`crate::decompress`].

use crate::error::{Error, Result};

/// Prefix byte for a raw (plaintext) container.
pub const PREFIX_PLAIN: u8 = 0x00;

/// Prefix byte for an enciphered container.
pub const PREFIX_ENCIPHERED: u8 = 0x01;

/// Prepend the plaintext envelope prefix to a container.
pub fn wrap(container: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(container.len() + 1);
    out.push(PREFIX_PLAIN);
    out.extend_from_slice(container);
    out
}

/// Strip the envelope prefix, returning the raw container bytes.
///
/// Fails with [`Error::Enciphered`] for the `0x01` prefix and
/// [`Error::BadMagic`] for anything that is neither an envelope nor a
/// recognizable container start.
pub fn unwrap(data: &[u8]) -> Result<&[u8]> {
    match data.first() {
        Some(&PREFIX_PLAIN) => Ok(&data[1..]),
        Some(&PREFIX_ENCIPHERED) => Err(Error::Enciphered),
        Some(&other) => Err(Error::BadMagic {
            found: u16::from_le_bytes([other, data.get(1).copied().unwrap_or(0)]),
        }),
        None => Err(Error::BadMagic { found: 0 }),
    }
}
