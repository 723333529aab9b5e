//! Packet header: channel tag, sequence number and crypto mode.
//!
//! The header travels in the clear but is covered by the AEAD tag as associated
//! data. It is encoded as a MessagePack map keyed by field name so that peers
//! using a schema-based map encoder read it without a shared struct layout.

use crate::core::mode::CryptoDtoMode;
use crate::error::{constants, CryptoDtoError, Result};
use serde::{Deserialize, Serialize};

/// Largest encoded header that fits the 16-bit length prefix
pub const MAX_HEADER_LEN: usize = u16::MAX as usize;

/// Per-packet header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoDtoHeader {
    /// Logical channel / session identifier
    #[serde(rename = "ChannelTag")]
    pub channel_tag: String,

    /// Sender's sequence number; also the nonce source
    #[serde(rename = "Sequence")]
    pub sequence: u32,

    #[serde(rename = "Mode")]
    pub mode: CryptoDtoMode,
}

impl CryptoDtoHeader {
    pub fn new(channel_tag: impl Into<String>, sequence: u32, mode: CryptoDtoMode) -> Self {
        Self {
            channel_tag: channel_tag.into(),
            sequence,
            mode,
        }
    }

    /// Encode as a MessagePack map. Fails if the result would not fit a `u16` prefix.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let bytes = rmp_serde::to_vec_named(self)
            .map_err(|e| CryptoDtoError::SerializeError(e.to_string()))?;
        if bytes.len() > MAX_HEADER_LEN {
            return Err(CryptoDtoError::HeaderTooLarge(bytes.len()));
        }
        Ok(bytes)
    }

    /// Decode from the exact header region of a packet.
    ///
    /// The region must hold one header and nothing else, so a `headerLength`
    /// that overstates the encoded header is rejected.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut cursor = bytes;
        let header = {
            let mut de = rmp_serde::Deserializer::new(&mut cursor);
            Self::deserialize(&mut de)
                .map_err(|_| CryptoDtoError::Malformed(constants::ERR_HEADER_DECODE))?
        };
        if !cursor.is_empty() {
            return Err(CryptoDtoError::Malformed(constants::ERR_TRAILING_BYTES));
        }
        Ok(header)
    }
}
