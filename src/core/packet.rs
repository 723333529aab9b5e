//! # Wire Packet
//!
//! Outer framing of a sealed DTO packet.
//!
//! ```text
//! [HeaderLen u16 LE] [Header (MessagePack map)] [Ciphertext + Tag(16)]
//! ```
//!
//! The associated data for the AEAD is exactly the first `2 + HeaderLen` bytes,
//! prefix included, so the length field itself is authenticated.

use crate::core::envelope::{length_u16, take_prefixed, LENGTH_PREFIX_LEN};
use crate::core::header::CryptoDtoHeader;
use crate::error::{constants, CryptoDtoError, Result};
use crate::utils::crypto::TAG_LEN;
use bytes::BufMut;

/// A received packet split into its regions. Borrows from the input buffer.
#[derive(Debug, Clone)]
pub struct PacketParts<'a> {
    /// Decoded header
    pub header: CryptoDtoHeader,
    /// `[HeaderLen][Header]`, byte-for-byte as received
    pub associated_data: &'a [u8],
    /// Everything after the header, tag included
    pub ciphertext: &'a [u8],
}

/// Build `[HeaderLen][Header]` for an encoded header.
pub fn associated_data(encoded_header: &[u8]) -> Result<Vec<u8>> {
    let header_len = length_u16("header", encoded_header.len())?;
    let mut aad = Vec::with_capacity(LENGTH_PREFIX_LEN + encoded_header.len());
    aad.put_u16_le(header_len);
    aad.put_slice(encoded_header);
    Ok(aad)
}

/// Split a received buffer into header, associated data and ciphertext.
///
/// Only the framing is checked here; whether the mode is usable and whether
/// the ciphertext authenticates is up to the caller.
pub fn split(bytes: &[u8]) -> Result<PacketParts<'_>> {
    let mut cursor = bytes;
    let header_bytes = take_prefixed(&mut cursor)?;
    let header = CryptoDtoHeader::decode(header_bytes)?;

    let aad_len = LENGTH_PREFIX_LEN + header_bytes.len();
    let (associated_data, ciphertext) = bytes.split_at(aad_len);
    debug_assert_eq!(ciphertext.len(), cursor.len());

    Ok(PacketParts {
        header,
        associated_data,
        ciphertext,
    })
}

/// Check that a ciphertext region is at least long enough to hold a tag.
pub fn check_ciphertext_len(ciphertext: &[u8]) -> Result<()> {
    if ciphertext.len() < TAG_LEN {
        return Err(CryptoDtoError::Malformed(constants::ERR_SHORT_CIPHERTEXT));
    }
    Ok(())
}
