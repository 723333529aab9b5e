//! # Error Types
//!
//! Error handling for the crypto DTO channel.
//!
//! Every failure in this crate is local and non-fatal: a packet that cannot be
//! sealed is never emitted, and a packet that cannot be opened is dropped by the
//! caller. Nothing here retries.
//!
//! ## Error Categories
//! - **Mode Errors**: a crypto mode other than ChaCha20-Poly1305 was requested
//! - **Framing Errors**: truncated buffers, length fields that do not match
//! - **Cryptographic Errors**: seal failures, authentication failures, bad keys
//! - **Sequence Errors**: replayed packets, exhausted transmit counters
//! - **Payload Errors**: type-name mismatches, DTO encode/decode failures
//!
//! `Malformed` and `AuthenticationFailed` share one `Display` text so that
//! logging a rejected packet to a peer-visible sink does not reveal which check
//! tripped.
//!
//! ## Example Usage
//! ```rust
//! use crypto_dto::error::{CryptoDtoError, Result};
//! use tracing::warn;
//!
//! fn check_key(key: &[u8]) -> Result<()> {
//!     if key.len() != 32 {
//!         return Err(CryptoDtoError::InvalidKeyLength {
//!             expected: 32,
//!             actual: key.len(),
//!         });
//!     }
//!     Ok(())
//! }
//!
//! if let Err(e) = check_key(&[0u8; 16]) {
//!     warn!(error = %e, "Refusing to use key");
//! }
//! ```

use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Shared text for malformed and unauthenticated packets
    pub const ERR_PACKET_REJECTED: &str = "packet rejected";

    /// Framing errors
    pub const ERR_TRUNCATED_LENGTH: &str = "buffer too short for length prefix";
    pub const ERR_TRUNCATED_REGION: &str = "length prefix points past end of buffer";
    pub const ERR_TRAILING_BYTES: &str = "unexpected trailing bytes after envelope";
    pub const ERR_SHORT_CIPHERTEXT: &str = "ciphertext shorter than authentication tag";
    pub const ERR_OVERSIZED_PACKET: &str = "packet exceeds configured maximum size";
    pub const ERR_INVALID_NAME: &str = "DTO name is not valid UTF-8";
    pub const ERR_HEADER_DECODE: &str = "header could not be decoded";

    /// Channel errors
    pub const ERR_LOCK_POISONED: &str = "Synchronization primitive poisoned";
    pub const ERR_KEY_DECODE: &str = "channel key is not valid base64";
}

/// Primary error type for all crypto DTO operations
#[derive(Error, Debug)]
pub enum CryptoDtoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Deserialize error: {0}")]
    DeserializeError(String),

    #[error("Unsupported crypto mode: {0}")]
    UnsupportedMode(u8),

    /// Framing failure. The detail is for local diagnostics only.
    #[error("{}", constants::ERR_PACKET_REJECTED)]
    Malformed(&'static str),

    #[error("{}", constants::ERR_PACKET_REJECTED)]
    AuthenticationFailed,

    #[error("Packet replayed or outside the receive window: sequence {0}")]
    Replay(u32),

    #[error("Seal failed")]
    SealFailed,

    #[error("Invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("{field} length {len} exceeds the 16-bit length field")]
    LengthOverflow { field: &'static str, len: usize },

    #[error("Encoded header too large: {0} bytes")]
    HeaderTooLarge(usize),

    #[error("Transmit sequence exhausted for channel {0}")]
    SequenceExhausted(String),

    #[error("Packet has not been verified")]
    NotVerified,

    #[error("DTO type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: String },

    #[error("DTO name {short} conflicts with existing registration {existing}")]
    DuplicateDtoName { short: String, existing: String },

    #[error("No handler registered for DTO {0}")]
    UnknownDto(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("{}", constants::ERR_LOCK_POISONED)]
    LockPoisoned,
}

impl CryptoDtoError {
    /// Whether this error means an inbound packet should simply be dropped.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            CryptoDtoError::Malformed(_)
                | CryptoDtoError::AuthenticationFailed
                | CryptoDtoError::Replay(_)
                | CryptoDtoError::UnsupportedMode(_)
        )
    }
}

/// Type alias for Results using CryptoDtoError
pub type Result<T> = std::result::Result<T, CryptoDtoError>;
