//! Outgoing side: DTO → sealed wire packet.

use crate::channel::Channel;
use crate::core::envelope;
use crate::core::header::CryptoDtoHeader;
use crate::core::mode::CryptoDtoMode;
use crate::core::packet;
use crate::core::serialization::Dto;
use crate::error::Result;
use crate::utils::crypto::Crypto;
use crate::utils::metrics::{global_metrics, Timer};
use tracing::{debug, instrument, warn};
use zeroize::Zeroizing;

/// Seal a DTO into a wire packet.
///
/// Deterministic: the same inputs always give the same bytes, because the
/// nonce comes from `sequence`. The caller must never reuse a sequence with
/// the same key. Nothing is emitted on error.
///
/// Output length is `2 + headerLen + 2 + nameLen + 2 + dtoLen + 16`.
#[instrument(skip(transmit_key, dto), fields(dto = T::SHORT_NAME), level = "debug")]
pub fn serialize<T: Dto>(
    channel_tag: &str,
    mode: CryptoDtoMode,
    transmit_key: &[u8],
    sequence: u32,
    dto: &T,
) -> Result<Vec<u8>> {
    let _timer = Timer::start("crypto_dto_serialize");
    let metrics = global_metrics();
    metrics.seal_attempt();

    let result = seal(channel_tag, mode, transmit_key, sequence, dto);
    match &result {
        Ok(bytes) => {
            metrics.seal_success(bytes.len() as u64);
            debug!(len = bytes.len(), "Packet sealed");
        }
        Err(e) => warn!(error = %e, "Refusing to emit packet"),
    }
    result
}

fn seal<T: Dto>(
    channel_tag: &str,
    mode: CryptoDtoMode,
    transmit_key: &[u8],
    sequence: u32,
    dto: &T,
) -> Result<Vec<u8>> {
    mode.require_supported()?;
    let crypto = Crypto::new(transmit_key)?;

    let header = CryptoDtoHeader::new(channel_tag, sequence, mode).encode()?;

    let payload = Zeroizing::new(dto.encode()?);
    let plaintext = Zeroizing::new(envelope::encode(T::SHORT_NAME, &payload)?);

    let mut packet = packet::associated_data(&header)?;
    let sealed = crypto.seal(sequence, &packet, &plaintext)?;
    packet.extend_from_slice(&sealed);
    Ok(packet)
}

/// Seal a DTO using the channel's transmit key and next sequence number.
///
/// The mode is checked before a sequence is drawn, so a refused call does not
/// consume one. A sequence drawn for a packet that then fails to seal is
/// discarded, never reissued.
pub fn serialize_with_channel<C, T>(channel: &C, mode: CryptoDtoMode, dto: &T) -> Result<Vec<u8>>
where
    C: Channel + ?Sized,
    T: Dto,
{
    mode.require_supported()?;
    let (key, sequence) = channel.next_transmit(mode)?;
    serialize(channel.channel_tag(), mode, &key[..], sequence, dto)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::envelope::LENGTH_PREFIX_LEN;
    use crate::error::CryptoDtoError;
    use crate::utils::crypto::TAG_LEN;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Ping {
        n: u32,
    }

    impl Dto for Ping {
        const NAME: &'static str = "PingDto";
        const SHORT_NAME: &'static str = "P";
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn test_output_length() {
        let dto = Ping { n: 1 };
        let bytes = serialize("tag", CryptoDtoMode::ChaCha20Poly1305, &[0u8; 32], 1, &dto)
            .expect("serialize");

        let header_len = u16::from_le_bytes([bytes[0], bytes[1]]) as usize;
        let payload_len = dto.encode().expect("encode").len();
        let expected = LENGTH_PREFIX_LEN
            + header_len
            + envelope::encoded_len(Ping::SHORT_NAME.len(), payload_len)
            + TAG_LEN;
        assert_eq!(bytes.len(), expected);
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn test_header_in_clear() {
        let bytes = serialize("abc", CryptoDtoMode::ChaCha20Poly1305, &[0u8; 32], 77, &Ping { n: 1 })
            .expect("serialize");
        let header_len = u16::from_le_bytes([bytes[0], bytes[1]]) as usize;
        let header = CryptoDtoHeader::decode(&bytes[2..2 + header_len]).expect("header");
        assert_eq!(header.channel_tag, "abc");
        assert_eq!(header.sequence, 77);
        assert_eq!(header.mode, CryptoDtoMode::ChaCha20Poly1305);
    }

    #[test]
    fn test_unsupported_mode_refused() {
        for mode in [
            CryptoDtoMode::None,
            CryptoDtoMode::Undefined,
            CryptoDtoMode::Unknown(9),
        ] {
            assert!(matches!(
                serialize("tag", mode, &[0u8; 32], 1, &Ping { n: 1 }),
                Err(CryptoDtoError::UnsupportedMode(_))
            ));
        }
    }

    #[test]
    fn test_short_key_refused() {
        assert!(matches!(
            serialize("tag", CryptoDtoMode::ChaCha20Poly1305, &[0u8; 31], 1, &Ping { n: 1 }),
            Err(CryptoDtoError::InvalidKeyLength { .. })
        ));
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn test_deterministic_and_sequence_sensitive() {
        let key = [9u8; 32];
        let a = serialize("t", CryptoDtoMode::ChaCha20Poly1305, &key, 5, &Ping { n: 3 }).expect("a");
        let b = serialize("t", CryptoDtoMode::ChaCha20Poly1305, &key, 5, &Ping { n: 3 }).expect("b");
        let c = serialize("t", CryptoDtoMode::ChaCha20Poly1305, &key, 6, &Ping { n: 3 }).expect("c");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
