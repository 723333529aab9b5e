//! Crypto mode identifiers carried in every packet header.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Cryptographic mode of a packet.
///
/// Only [`CryptoDtoMode::ChaCha20Poly1305`] is implemented. The other variants
/// exist so that headers from newer or misconfigured peers still decode and can
/// be dropped without tearing anything down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CryptoDtoMode {
    /// No mode negotiated
    #[default]
    Undefined,
    /// Plaintext framing (never accepted by this crate)
    None,
    /// AEAD ChaCha20-Poly1305, IETF variant (12-byte nonce)
    ChaCha20Poly1305,
    /// A wire value this crate does not know about
    Unknown(u8),
}

impl CryptoDtoMode {
    /// Wire identifier for this mode
    pub fn to_byte(self) -> u8 {
        match self {
            CryptoDtoMode::Undefined => 0,
            CryptoDtoMode::None => 1,
            CryptoDtoMode::ChaCha20Poly1305 => 2,
            CryptoDtoMode::Unknown(raw) => raw,
        }
    }

    /// Map a wire identifier back to a mode. Never fails.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => CryptoDtoMode::Undefined,
            1 => CryptoDtoMode::None,
            2 => CryptoDtoMode::ChaCha20Poly1305,
            other => CryptoDtoMode::Unknown(other),
        }
    }

    /// Whether this crate can seal and open packets in this mode
    pub fn is_supported(self) -> bool {
        matches!(self, CryptoDtoMode::ChaCha20Poly1305)
    }

    /// Return `self` if supported, otherwise `UnsupportedMode`.
    pub fn require_supported(self) -> crate::error::Result<Self> {
        if self.is_supported() {
            Ok(self)
        } else {
            Err(crate::error::CryptoDtoError::UnsupportedMode(self.to_byte()))
        }
    }
}

impl fmt::Display for CryptoDtoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoDtoMode::Undefined => f.write_str("Undefined"),
            CryptoDtoMode::None => f.write_str("None"),
            CryptoDtoMode::ChaCha20Poly1305 => f.write_str("AEAD_ChaCha20Poly1305"),
            CryptoDtoMode::Unknown(raw) => write!(f, "Unknown({raw})"),
        }
    }
}

impl Serialize for CryptoDtoMode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.to_byte())
    }
}

impl<'de> Deserialize<'de> for CryptoDtoMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = u8::deserialize(deserializer)?;
        Ok(CryptoDtoMode::from_byte(raw))
    }
}
