//! # DTO Envelope
//!
//! The plaintext that gets sealed inside every packet:
//!
//! ```text
//! [NameLen u16 LE] [Name] [DataLen u16 LE] [Data]
//! ```
//!
//! Both lengths must describe their regions exactly. Encoding refuses anything
//! that would overflow a 16-bit field rather than truncating it, and decoding
//! refuses short buffers and trailing bytes.

use crate::error::{constants, CryptoDtoError, Result};
use bytes::{Buf, BufMut};

/// Size of each length prefix in the envelope and the outer packet
pub const LENGTH_PREFIX_LEN: usize = 2;

/// A decoded envelope borrowing from the decrypted plaintext
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeRef<'a> {
    pub name: &'a str,
    pub data: &'a [u8],
}

/// Total encoded length of an envelope for the given name and payload sizes
#[inline]
pub fn encoded_len(name_len: usize, data_len: usize) -> usize {
    LENGTH_PREFIX_LEN + name_len + LENGTH_PREFIX_LEN + data_len
}

/// Convert a region length to its 16-bit wire form.
pub(crate) fn length_u16(field: &'static str, len: usize) -> Result<u16> {
    u16::try_from(len).map_err(|_| CryptoDtoError::LengthOverflow { field, len })
}

/// Build the envelope for a DTO short name and its encoded payload.
pub fn encode(name: &str, data: &[u8]) -> Result<Vec<u8>> {
    let name_len = length_u16("dtoName", name.len())?;
    let data_len = length_u16("dto", data.len())?;

    let mut out = Vec::with_capacity(encoded_len(name.len(), data.len()));
    out.put_u16_le(name_len);
    out.put_slice(name.as_bytes());
    out.put_u16_le(data_len);
    out.put_slice(data);
    Ok(out)
}

/// Read one `[u16 len][bytes]` region off the front of `buf`.
pub(crate) fn take_prefixed<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8]> {
    if buf.len() < LENGTH_PREFIX_LEN {
        return Err(CryptoDtoError::Malformed(constants::ERR_TRUNCATED_LENGTH));
    }
    let len = buf.get_u16_le() as usize;
    let rest: &'a [u8] = *buf;
    if rest.len() < len {
        return Err(CryptoDtoError::Malformed(constants::ERR_TRUNCATED_REGION));
    }
    let (region, rest) = rest.split_at(len);
    *buf = rest;
    Ok(region)
}

/// Parse a decrypted envelope. The whole buffer must be consumed.
pub fn decode(plaintext: &[u8]) -> Result<EnvelopeRef<'_>> {
    let mut cursor = plaintext;
    let name = take_prefixed(&mut cursor)?;
    let data = take_prefixed(&mut cursor)?;
    if !cursor.is_empty() {
        return Err(CryptoDtoError::Malformed(constants::ERR_TRAILING_BYTES));
    }

    let name =
        std::str::from_utf8(name).map_err(|_| CryptoDtoError::Malformed(constants::ERR_INVALID_NAME))?;
    Ok(EnvelopeRef { name, data })
}
