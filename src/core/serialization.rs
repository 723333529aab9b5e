//! # DTO Serialization
//!
//! Payload encoding for the typed DTOs carried inside a sealed envelope, and
//! the [`Dto`] capability every payload type implements.
//!
//! ## Formats
//! - **MessagePack**: default, map-encoded (field names on the wire) to match
//!   the voice server's schema-based encoder
//! - **Bincode**: compact, Rust-to-Rust only
//! - **JSON**: debugging and interop with text tooling
//!
//! The envelope does not record which format was used. Both peers agree on it
//! through the DTO type, which is identified on the wire by its short name.
//!
//! ## Usage
//! ```rust
//! use crypto_dto::core::serialization::Dto;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct ClientVoiceHeartbeat {
//!     callsign: String,
//! }
//!
//! impl Dto for ClientVoiceHeartbeat {
//!     const NAME: &'static str = "ClientVoiceHeartbeatDto";
//!     const SHORT_NAME: &'static str = "CVH";
//! }
//!
//! let hb = ClientVoiceHeartbeat { callsign: "DLH123".into() };
//! let bytes = hb.encode().unwrap();
//! assert_eq!(ClientVoiceHeartbeat::decode(&bytes).unwrap(), hb);
//! ```

use crate::error::{CryptoDtoError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Supported payload encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SerializationFormat {
    /// Binary compact format (fastest, Rust peers only)
    Bincode,
    /// Human-readable JSON format (debugging, interop)
    Json,
    /// MessagePack map encoding (default, voice server compatible)
    #[default]
    MessagePack,
}

impl SerializationFormat {
    /// Get human-readable name
    pub fn name(self) -> &'static str {
        match self {
            SerializationFormat::Bincode => "Bincode",
            SerializationFormat::Json => "JSON",
            SerializationFormat::MessagePack => "MessagePack",
        }
    }

    /// Serialize a value with this format
    pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> Result<Vec<u8>> {
        match self {
            SerializationFormat::Bincode => {
                bincode::serialize(value).map_err(CryptoDtoError::Serialization)
            }
            SerializationFormat::Json => serde_json::to_vec(value)
                .map_err(|e| CryptoDtoError::SerializeError(e.to_string())),
            SerializationFormat::MessagePack => rmp_serde::to_vec_named(value)
                .map_err(|e| CryptoDtoError::SerializeError(e.to_string())),
        }
    }

    /// Deserialize a value with this format
    pub fn decode<T: DeserializeOwned>(self, data: &[u8]) -> Result<T> {
        match self {
            SerializationFormat::Bincode => bincode::deserialize(data)
                .map_err(|e| CryptoDtoError::DeserializeError(e.to_string())),
            SerializationFormat::Json => serde_json::from_slice(data)
                .map_err(|e| CryptoDtoError::DeserializeError(e.to_string())),
            SerializationFormat::MessagePack => rmp_serde::from_slice(data)
                .map_err(|e| CryptoDtoError::DeserializeError(e.to_string())),
        }
    }
}

/// A payload type that can travel through a crypto DTO channel.
///
/// `NAME` is the canonical type name, `SHORT_NAME` is what goes on the wire.
/// A receiver accepts either form when extracting a `T`.
pub trait Dto: Serialize + DeserializeOwned + Sized {
    /// Canonical (long) type name
    const NAME: &'static str;

    /// Wire name, kept short to save bytes per packet
    const SHORT_NAME: &'static str;

    /// Payload encoding for this type
    const FORMAT: SerializationFormat = SerializationFormat::MessagePack;

    /// Encode the payload bytes placed in the envelope
    fn encode(&self) -> Result<Vec<u8>> {
        Self::FORMAT.encode(self)
    }

    /// Decode payload bytes taken from the envelope
    fn decode(data: &[u8]) -> Result<Self> {
        Self::FORMAT.decode(data)
    }

    /// Whether a wire name refers to this type
    fn matches_name(name: &str) -> bool {
        name == Self::SHORT_NAME || name == Self::NAME
    }
}
