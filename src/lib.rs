//! # crypto-dto
//!
//! Authenticated framing for typed DTOs exchanged between a voice client and
//! its voice/data servers.
//!
//! Each packet carries a clear-text header (channel tag, sequence number,
//! crypto mode) followed by a ChaCha20-Poly1305 sealed envelope holding the
//! DTO's short type name and its encoded body. The header is authenticated as
//! associated data, and the nonce is derived from the sequence number, so a
//! channel must never reuse a sequence under the same key. Receivers enforce
//! that with a per-direction replay window.
//!
//! ## Example
//! ```rust
//! use crypto_dto::{deserialize, serialize_with_channel};
//! use crypto_dto::{ChannelConfig, CryptoDtoChannel, CryptoDtoMode, Dto};
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
//! # fn main() -> crypto_dto::Result<()> {
//! let server_config = ChannelConfig::generate("voice")?;
//! let client = CryptoDtoChannel::new(&server_config.mirrored())?;
//! let server = CryptoDtoChannel::new(&server_config)?;
//!
//! let hb = ClientVoiceHeartbeat { callsign: "EDDF_TWR".into() };
//! let bytes = serialize_with_channel(&client, CryptoDtoMode::ChaCha20Poly1305, &hb)?;
//!
//! let received = deserialize(&server, &bytes, false);
//! assert!(received.is_verified());
//! assert_eq!(received.get_dto::<ClientVoiceHeartbeat>()?, hb);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::unwrap_used, clippy::expect_used)]

pub mod channel;
pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod utils;

pub use crate::channel::{Channel, ChannelConfig, ChannelKey, CryptoDtoChannel, SequenceDirection};
pub use crate::config::CryptoDtoConfig;
pub use crate::core::header::CryptoDtoHeader;
pub use crate::core::mode::CryptoDtoMode;
pub use crate::core::serialization::{Dto, SerializationFormat};
pub use crate::error::{CryptoDtoError, Result};
pub use crate::protocol::{
    deserialize, deserialize_with_key, deserialize_with_limits, serialize, serialize_with_channel,
    Deserializer, Dispatcher, DtoRegistry,
};
