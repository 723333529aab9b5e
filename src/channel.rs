//! # Crypto DTO Channel
//!
//! The key and sequence bookkeeping that the serializer and deserializer lean on.
//!
//! The [`Channel`] trait is the contract: it hands out the transmit key together
//! with a sequence number that is never handed out again, supplies the receive
//! key, and decides whether an incoming sequence number is fresh.
//!
//! [`CryptoDtoChannel`] is an in-memory implementation built from the
//! [`ChannelConfig`] a voice or data server returns at login:
//!
//! ```json
//! {
//!   "ChannelTag": "7e6b3c1a-...",
//!   "AeadReceiveKey": "<base64, 32 bytes>",
//!   "AeadTransmitKey": "<base64, 32 bytes>",
//!   "HmacKey": "<base64>"
//! }
//! ```
//!
//! The in-memory counter starts at 0 on every construction. If a key outlives
//! the process, persist [`CryptoDtoChannel::next_transmit_sequence`] and pass it
//! to [`CryptoDtoChannel::resume`]; otherwise sequences, and therefore nonces,
//! repeat under the same key.

use crate::config::ReplayConfig;
use crate::core::mode::CryptoDtoMode;
use crate::error::{constants, CryptoDtoError, Result};
use crate::utils::crypto::KEY_LEN;
use crate::utils::replay_window::{ReplayPolicy, SequenceWindow, WindowStats};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::{debug, instrument, warn};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// A 32-byte AEAD key that is wiped when dropped
pub type ChannelKey = Zeroizing<[u8; KEY_LEN]>;

/// Which replay window an incoming sequence is checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceDirection {
    /// Packets from the peer, opened with the receive key
    Receive,
    /// Our own packets echoed back, opened with the transmit key
    Loopback,
}

/// Key and sequence provider for one logical channel
pub trait Channel: Send + Sync {
    /// Identifier written into every header
    fn channel_tag(&self) -> &str;

    /// Key used to seal outgoing packets (and to open loopback packets)
    fn transmit_key(&self, mode: CryptoDtoMode) -> Result<ChannelKey>;

    /// Key used to open packets from the peer
    fn receive_key(&self, mode: CryptoDtoMode) -> Result<ChannelKey>;

    /// Transmit key plus the next sequence number. Each number is returned
    /// at most once for the lifetime of the key.
    fn next_transmit(&self, mode: CryptoDtoMode) -> Result<(ChannelKey, u32)>;

    /// Record an authenticated incoming sequence. Returns `false` for replays.
    fn check_received_sequence(&self, direction: SequenceDirection, sequence: u32) -> bool;
}

/// Channel keys as issued by the server
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ChannelConfig {
    #[serde(rename = "ChannelTag")]
    pub channel_tag: String,

    #[serde(rename = "AeadReceiveKey", with = "base64_bytes")]
    pub aead_receive_key: Vec<u8>,

    #[serde(rename = "AeadTransmitKey", with = "base64_bytes")]
    pub aead_transmit_key: Vec<u8>,

    /// Issued alongside the AEAD keys; unused by the ChaCha20-Poly1305 mode
    #[serde(rename = "HmacKey", with = "base64_bytes", default)]
    pub hmac_key: Vec<u8>,
}

impl fmt::Debug for ChannelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelConfig")
            .field("channel_tag", &self.channel_tag)
            .field("aead_receive_key", &"<redacted>")
            .field("aead_transmit_key", &"<redacted>")
            .field("hmac_key", &"<redacted>")
            .finish()
    }
}

impl ChannelConfig {
    /// Parse the server's JSON channel configuration
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CryptoDtoError::DeserializeError(e.to_string()))
    }

    /// Serialize back to the server's JSON shape
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| CryptoDtoError::SerializeError(e.to_string()))
    }

    /// Fresh random keys for a new channel (server side, or tests)
    pub fn generate(channel_tag: impl Into<String>) -> Result<Self> {
        let mut receive = vec![0u8; KEY_LEN];
        let mut transmit = vec![0u8; KEY_LEN];
        let mut hmac = vec![0u8; KEY_LEN];
        for buf in [&mut receive, &mut transmit, &mut hmac] {
            getrandom::fill(buf).map_err(|e| CryptoDtoError::ChannelError(e.to_string()))?;
        }
        Ok(Self {
            channel_tag: channel_tag.into(),
            aead_receive_key: receive,
            aead_transmit_key: transmit,
            hmac_key: hmac,
        })
    }

    /// The peer's view of this channel: receive and transmit keys swapped
    pub fn mirrored(&self) -> Self {
        Self {
            channel_tag: self.channel_tag.clone(),
            aead_receive_key: self.aead_transmit_key.clone(),
            aead_transmit_key: self.aead_receive_key.clone(),
            hmac_key: self.hmac_key.clone(),
        }
    }
}

fn key_from_slice(name: &'static str, bytes: &[u8]) -> Result<ChannelKey> {
    let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
        warn!(key = name, len = bytes.len(), "Channel key has wrong length");
        CryptoDtoError::InvalidKeyLength {
            expected: KEY_LEN,
            actual: bytes.len(),
        }
    })?;
    Ok(Zeroizing::new(key))
}

/// In-memory channel: keys, outgoing counter, and one replay window per direction
pub struct CryptoDtoChannel {
    channel_tag: String,
    receive_key: ChannelKey,
    transmit_key: ChannelKey,
    /// Next sequence to hand out; values above `u32::MAX` mean exhausted
    next_sequence: AtomicU64,
    receive_window: Mutex<SequenceWindow>,
    loopback_window: Mutex<SequenceWindow>,
}

impl fmt::Debug for CryptoDtoChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoDtoChannel")
            .field("channel_tag", &self.channel_tag)
            .field("next_sequence", &self.next_sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl CryptoDtoChannel {
    /// Build a channel with the default replay policy
    pub fn new(config: &ChannelConfig) -> Result<Self> {
        Self::with_replay(config, &ReplayConfig::default())
    }

    /// Build a channel with an explicit replay configuration
    pub fn with_replay(config: &ChannelConfig, replay: &ReplayConfig) -> Result<Self> {
        Self::resume(config, replay.policy(), 0)
    }

    /// Build a channel whose transmit counter continues from `next_sequence`
    pub fn resume(config: &ChannelConfig, policy: ReplayPolicy, next_sequence: u32) -> Result<Self> {
        let receive_key = key_from_slice("AeadReceiveKey", &config.aead_receive_key)?;
        let transmit_key = key_from_slice("AeadTransmitKey", &config.aead_transmit_key)?;
        debug!(channel = %config.channel_tag, next_sequence, ?policy, "Channel created");
        Ok(Self {
            channel_tag: config.channel_tag.clone(),
            receive_key,
            transmit_key,
            next_sequence: AtomicU64::new(u64::from(next_sequence)),
            receive_window: Mutex::new(SequenceWindow::new(policy)),
            loopback_window: Mutex::new(SequenceWindow::new(policy)),
        })
    }

    /// Sequence the next `next_transmit` call will hand out, if any remain
    pub fn next_transmit_sequence(&self) -> Option<u32> {
        u32::try_from(self.next_sequence.load(Ordering::SeqCst)).ok()
    }

    fn window(&self, direction: SequenceDirection) -> &Mutex<SequenceWindow> {
        match direction {
            SequenceDirection::Receive => &self.receive_window,
            SequenceDirection::Loopback => &self.loopback_window,
        }
    }

    /// Replay window statistics for one direction
    pub fn window_stats(&self, direction: SequenceDirection) -> Result<WindowStats> {
        self.window(direction)
            .lock()
            .map(|w| w.stats())
            .map_err(|_| CryptoDtoError::LockPoisoned)
    }
}

impl Channel for CryptoDtoChannel {
    fn channel_tag(&self) -> &str {
        &self.channel_tag
    }

    fn transmit_key(&self, mode: CryptoDtoMode) -> Result<ChannelKey> {
        mode.require_supported()?;
        Ok(self.transmit_key.clone())
    }

    fn receive_key(&self, mode: CryptoDtoMode) -> Result<ChannelKey> {
        mode.require_supported()?;
        Ok(self.receive_key.clone())
    }

    #[instrument(skip(self), fields(channel = %self.channel_tag))]
    fn next_transmit(&self, mode: CryptoDtoMode) -> Result<(ChannelKey, u32)> {
        mode.require_supported()?;
        let limit = u64::from(u32::MAX);
        let previous = self
            .next_sequence
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |next| {
                (next <= limit).then_some(next + 1)
            })
            .map_err(|_| {
                warn!("Transmit sequence space exhausted; channel must be re-keyed");
                CryptoDtoError::SequenceExhausted(self.channel_tag.clone())
            })?;

        // `previous <= u32::MAX` is guaranteed by the update closure
        let sequence = u32::try_from(previous)
            .map_err(|_| CryptoDtoError::SequenceExhausted(self.channel_tag.clone()))?;
        Ok((self.transmit_key.clone(), sequence))
    }

    fn check_received_sequence(&self, direction: SequenceDirection, sequence: u32) -> bool {
        match self.window(direction).lock() {
            Ok(mut window) => window.check_and_record(sequence),
            Err(_) => {
                warn!(
                    channel = %self.channel_tag,
                    error = constants::ERR_LOCK_POISONED,
                    "Replay window unavailable; dropping packet"
                );
                false
            }
        }
    }
}

/// Base64 (standard alphabet) encoding for key fields
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text.as_bytes()).map_err(|_| {
            serde::de::Error::custom(crate::error::constants::ERR_KEY_DECODE)
        })
    }
}
