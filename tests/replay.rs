#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Replay protection across the receive and loopback directions.

use crypto_dto::config::{ReplayConfig, ReplayPolicyKind};
use crypto_dto::error::CryptoDtoError;
use crypto_dto::utils::ReplayPolicy;
use crypto_dto::{
    deserialize, serialize, serialize_with_channel, ChannelConfig, CryptoDtoChannel,
    CryptoDtoMode, Dto, SequenceDirection,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TextMessage {
    from: String,
    to: String,
    message: String,
}

impl Dto for TextMessage {
    const NAME: &'static str = "TextMessageDto";
    const SHORT_NAME: &'static str = "TM";
}

fn text(message: &str) -> TextMessage {
    TextMessage {
        from: "EGLL_GND".into(),
        to: "BAW12".into(),
        message: message.into(),
    }
}

fn pair_with(replay: &ReplayConfig) -> (ChannelConfig, CryptoDtoChannel, CryptoDtoChannel) {
    let server = ChannelConfig::generate("replay").expect("generate");
    let client = CryptoDtoChannel::with_replay(&server.mirrored(), replay).expect("client");
    let receiver = CryptoDtoChannel::with_replay(&server, replay).expect("server");
    (server, client, receiver)
}

#[test]
fn test_duplicate_packet_rejected() {
    let (_, client, server) = pair_with(&ReplayConfig::default());
    let bytes = serialize_with_channel(&client, CryptoDtoMode::ChaCha20Poly1305, &text("hello"))
        .expect("serialize");

    assert!(deserialize(&server, &bytes, false).is_verified());
    let again = deserialize(&server, &bytes, false);
    assert!(!again.is_verified());
    assert!(matches!(again.failure(), Some(CryptoDtoError::Replay(0))));
}

#[test]
fn test_same_sequence_different_payload_rejected() {
    let (config, _, server) = pair_with(&ReplayConfig::default());
    // A sender that reuses a sequence under the same key
    let key = &config.aead_receive_key;
    let first = serialize("replay", CryptoDtoMode::ChaCha20Poly1305, key, 5, &text("one"))
        .expect("serialize");
    let second = serialize("replay", CryptoDtoMode::ChaCha20Poly1305, key, 5, &text("two"))
        .expect("serialize");

    assert!(deserialize(&server, &first, false).is_verified());
    assert!(!deserialize(&server, &second, false).is_verified());
}

#[test]
fn test_window_tolerates_reordering() {
    let (_, client, server) = pair_with(&ReplayConfig::default());
    let packets: Vec<Vec<u8>> = (0..5)
        .map(|i| {
            serialize_with_channel(
                &client,
                CryptoDtoMode::ChaCha20Poly1305,
                &text(&format!("msg {i}")),
            )
            .expect("serialize")
        })
        .collect();

    for index in [4usize, 0, 2, 1, 3] {
        let de = deserialize(&server, &packets[index], false);
        assert!(de.is_verified(), "packet {index} rejected");
        assert_eq!(de.header().expect("header").sequence, index as u32);
    }
    for packet in &packets {
        assert!(!deserialize(&server, packet, false).is_verified());
    }
}

#[test]
fn test_strict_policy_refuses_late_packets() {
    let strict = ReplayConfig {
        policy: ReplayPolicyKind::Strict,
        ..ReplayConfig::default()
    };
    assert_eq!(strict.policy(), ReplayPolicy::StrictMonotonic);

    let (_, client, server) = pair_with(&strict);
    let early = serialize_with_channel(&client, CryptoDtoMode::ChaCha20Poly1305, &text("a"))
        .expect("serialize");
    let late = serialize_with_channel(&client, CryptoDtoMode::ChaCha20Poly1305, &text("b"))
        .expect("serialize");

    assert!(deserialize(&server, &late, false).is_verified());
    assert!(!deserialize(&server, &early, false).is_verified());
}

#[test]
fn test_sequence_below_window_rejected() {
    let small = ReplayConfig {
        policy: ReplayPolicyKind::Window,
        window_size: 4,
    };
    let (config, _, server) = pair_with(&small);
    let key = &config.aead_receive_key;
    let seal = |seq: u32| {
        serialize("replay", CryptoDtoMode::ChaCha20Poly1305, key, seq, &text("w"))
            .expect("serialize")
    };

    assert!(deserialize(&server, &seal(10), false).is_verified());
    assert!(deserialize(&server, &seal(7), false).is_verified());
    assert!(!deserialize(&server, &seal(6), false).is_verified());
}

#[test]
fn test_directions_tracked_separately() {
    let (_, client, server) = pair_with(&ReplayConfig::default());
    let outgoing = serialize_with_channel(&client, CryptoDtoMode::ChaCha20Poly1305, &text("out"))
        .expect("serialize");
    let incoming = serialize_with_channel(&server, CryptoDtoMode::ChaCha20Poly1305, &text("in"))
        .expect("serialize");

    // Both carry sequence 0 but land in different windows
    assert!(deserialize(&client, &outgoing, true).is_verified());
    assert!(deserialize(&client, &incoming, false).is_verified());
    assert!(!deserialize(&client, &outgoing, true).is_verified());

    let loopback = client
        .window_stats(SequenceDirection::Loopback)
        .expect("stats");
    let receive = client
        .window_stats(SequenceDirection::Receive)
        .expect("stats");
    assert_eq!(loopback.accepted, 1);
    assert_eq!(loopback.rejected, 1);
    assert_eq!(receive.accepted, 1);
    assert_eq!(receive.highest, Some(0));
}

#[test]
fn test_resumed_channel_continues_sequence() {
    let config = ChannelConfig::generate("resume").expect("generate");
    let channel =
        CryptoDtoChannel::resume(&config, ReplayPolicy::default(), 1_000).expect("resume");
    let bytes = serialize_with_channel(&channel, CryptoDtoMode::ChaCha20Poly1305, &text("r"))
        .expect("serialize");
    let peer = CryptoDtoChannel::new(&config.mirrored()).expect("peer");

    let de = deserialize(&peer, &bytes, false);
    assert_eq!(de.header().expect("header").sequence, 1_000);
    assert_eq!(channel.next_transmit_sequence(), Some(1_001));
}

#[test]
fn test_sequence_exhaustion() {
    let config = ChannelConfig::generate("exhaust").expect("generate");
    let channel =
        CryptoDtoChannel::resume(&config, ReplayPolicy::default(), u32::MAX).expect("resume");

    let last = serialize_with_channel(&channel, CryptoDtoMode::ChaCha20Poly1305, &text("last"))
        .expect("final sequence is usable");
    assert!(!last.is_empty());
    assert_eq!(channel.next_transmit_sequence(), None);
    assert!(matches!(
        serialize_with_channel(&channel, CryptoDtoMode::ChaCha20Poly1305, &text("over")),
        Err(CryptoDtoError::SequenceExhausted(tag)) if tag == "exhaust"
    ));
}
