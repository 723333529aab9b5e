//! Incoming side: wire packet → verified envelope → typed DTO.
//!
//! A [`Deserializer`] is built fresh for every received buffer. It never
//! panics on hostile input and never exposes a name or payload unless the
//! packet authenticated *and* its sequence passed the channel's replay check.

use crate::channel::{Channel, SequenceDirection};
use crate::config::{LimitsConfig, MAX_PACKET_SIZE};
use crate::core::envelope;
use crate::core::header::CryptoDtoHeader;
use crate::core::packet;
use crate::core::serialization::Dto;
use crate::error::{constants, CryptoDtoError, Result};
use crate::utils::crypto::Crypto;
use crate::utils::metrics::global_metrics;
use tracing::{debug, instrument, warn};
use zeroize::Zeroizing;

/// Result of decoding one received packet
#[derive(Debug, Default)]
pub struct Deserializer {
    header: Option<CryptoDtoHeader>,
    verified: bool,
    dto_name: String,
    data: Zeroizing<Vec<u8>>,
    failure: Option<CryptoDtoError>,
}

/// Open a received packet with keys and replay state from `channel`.
///
/// With `loopback` set the packet is one we sent ourselves, so it is opened
/// with the transmit key and checked against the loopback replay window.
pub fn deserialize<C>(channel: &C, bytes: &[u8], loopback: bool) -> Deserializer
where
    C: Channel + ?Sized,
{
    deserialize_with_limits(channel, bytes, loopback, &LimitsConfig::default())
}

/// [`deserialize`] with an explicit inbound size limit
#[instrument(skip(channel, bytes, limits), fields(len = bytes.len()), level = "debug")]
pub fn deserialize_with_limits<C>(
    channel: &C,
    bytes: &[u8],
    loopback: bool,
    limits: &LimitsConfig,
) -> Deserializer
where
    C: Channel + ?Sized,
{
    let direction = if loopback {
        SequenceDirection::Loopback
    } else {
        SequenceDirection::Receive
    };

    let mut state = Deserializer::default();
    let outcome = state.decode(
        bytes,
        limits.max_packet_size,
        |header| {
            let key = if loopback {
                channel.transmit_key(header.mode)?
            } else {
                channel.receive_key(header.mode)?
            };
            Crypto::new(&key[..])
        },
        |header| channel.check_received_sequence(direction, header.sequence),
    );
    state.finish(outcome);
    state
}

/// Open a packet with an explicit key and no replay tracking.
///
/// Returns the precise error instead of an unverified state. Intended for
/// diagnostics and tests; live traffic should go through [`deserialize`].
pub fn deserialize_with_key(key: &[u8], bytes: &[u8]) -> Result<Deserializer> {
    let mut state = Deserializer::default();
    let outcome = state.decode(bytes, MAX_PACKET_SIZE, |_| Crypto::new(key), |_| true);
    state.finish(outcome);
    match state.failure.take() {
        Some(e) => Err(e),
        None => Ok(state),
    }
}

impl Deserializer {
    fn decode<K, A>(&mut self, bytes: &[u8], max_len: usize, select_key: K, accept: A) -> Result<()>
    where
        K: FnOnce(&CryptoDtoHeader) -> Result<Crypto>,
        A: FnOnce(&CryptoDtoHeader) -> bool,
    {
        global_metrics().open_attempt(bytes.len() as u64);

        if bytes.len() > max_len {
            return Err(CryptoDtoError::Malformed(constants::ERR_OVERSIZED_PACKET));
        }

        let parts = packet::split(bytes)?;
        let header = self.header.insert(parts.header);

        // Unknown modes are inert: no key lookup, no decryption attempt.
        header.mode.require_supported()?;
        packet::check_ciphertext_len(parts.ciphertext)?;

        let crypto = select_key(header)?;
        let plaintext = Zeroizing::new(crypto.open(
            header.sequence,
            parts.associated_data,
            parts.ciphertext,
        )?);
        let env = envelope::decode(&plaintext)?;

        // Only authenticated sequences reach the replay window, so forged
        // packets cannot advance it.
        if !accept(header) {
            return Err(CryptoDtoError::Replay(header.sequence));
        }

        self.dto_name = env.name.to_string();
        self.data = Zeroizing::new(env.data.to_vec());
        self.verified = true;
        Ok(())
    }

    fn finish(&mut self, outcome: Result<()>) {
        let metrics = global_metrics();
        let (tag, sequence) = self
            .header
            .as_ref()
            .map_or(("", 0), |h| (h.channel_tag.as_str(), h.sequence));

        match outcome {
            Ok(()) => {
                metrics.open_verified();
                debug!(channel = tag, sequence, dto = %self.dto_name, "Packet verified");
            }
            Err(e) => {
                match &e {
                    CryptoDtoError::UnsupportedMode(mode) => {
                        metrics.unsupported_mode();
                        debug!(channel = tag, sequence, mode, "Ignoring packet in unsupported mode");
                    }
                    CryptoDtoError::AuthenticationFailed => {
                        metrics.auth_failure();
                        warn!(channel = tag, sequence, "Packet failed authentication");
                    }
                    CryptoDtoError::Replay(_) => {
                        metrics.replay_rejected();
                        warn!(channel = tag, sequence, "Replayed packet dropped");
                    }
                    CryptoDtoError::Malformed(detail) => {
                        metrics.malformed();
                        debug!(channel = tag, detail, "Malformed packet dropped");
                    }
                    other => warn!(channel = tag, sequence, error = %other, "Packet dropped"),
                }
                self.verified = false;
                self.dto_name.clear();
                self.data = Zeroizing::new(Vec::new());
                self.failure = Some(e);
            }
        }
    }

    /// Whether the packet authenticated and passed the replay check
    pub fn is_verified(&self) -> bool {
        self.verified
    }

    /// Decoded header, if the framing was readable. Present even for
    /// rejected packets; it is unauthenticated unless `is_verified()`.
    pub fn header(&self) -> Option<&CryptoDtoHeader> {
        self.header.as_ref()
    }

    /// Wire name of the payload (verified packets only)
    pub fn dto_name(&self) -> Option<&str> {
        self.verified.then_some(self.dto_name.as_str())
    }

    /// Raw payload bytes (verified packets only)
    pub fn data(&self) -> Option<&[u8]> {
        self.verified.then_some(self.data.as_slice())
    }

    /// Why the packet was rejected, for local diagnostics
    pub fn failure(&self) -> Option<&CryptoDtoError> {
        self.failure.as_ref()
    }

    /// Whether the payload is a `T`
    pub fn is<T: Dto>(&self) -> bool {
        self.verified && T::matches_name(&self.dto_name)
    }

    /// Extract the payload as a `T`.
    ///
    /// Accepts either `T::SHORT_NAME` or `T::NAME` on the wire.
    pub fn get_dto<T: Dto>(&self) -> Result<T> {
        if !self.verified {
            return Err(CryptoDtoError::NotVerified);
        }
        if !T::matches_name(&self.dto_name) {
            global_metrics().type_mismatch();
            return Err(CryptoDtoError::TypeMismatch {
                expected: T::SHORT_NAME,
                found: self.dto_name.clone(),
            });
        }
        T::decode(&self.data)
    }
}
