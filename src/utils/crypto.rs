//! ChaCha20-Poly1305 (IETF) sealing with sequence-derived nonces.
//!
//! There is no random component in the nonce. It is built from the packet's
//! sequence number alone, which is why a (key, sequence) pair must never be
//! used twice.

use crate::error::{CryptoDtoError, Result};
use chacha20poly1305::aead::{Aead, AeadInPlace, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Nonce, Tag};
use zeroize::Zeroize;

/// Key size in bytes
pub const KEY_LEN: usize = 32;
/// IETF nonce size in bytes
pub const NONCE_LEN: usize = 12;
/// Poly1305 tag size in bytes
pub const TAG_LEN: usize = 16;

/// Build the 12-byte nonce for a sequence number.
///
/// Layout: a zero `u32`, then the sequence widened to a little-endian `u64`.
/// That is 4 zero bytes, the 4 sequence bytes, and 4 more zero bytes.
#[inline]
pub fn sequence_nonce(sequence: u32) -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    nonce[4..].copy_from_slice(&u64::from(sequence).to_le_bytes());
    nonce
}

/// AEAD cipher bound to one key
pub struct Crypto {
    cipher: ChaCha20Poly1305,
}

impl Crypto {
    /// Create a cipher from a 32-byte key.
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != KEY_LEN {
            return Err(CryptoDtoError::InvalidKeyLength {
                expected: KEY_LEN,
                actual: key.len(),
            });
        }
        let cipher = ChaCha20Poly1305::new_from_slice(key).map_err(|_| {
            CryptoDtoError::InvalidKeyLength {
                expected: KEY_LEN,
                actual: key.len(),
            }
        })?;
        Ok(Self { cipher })
    }

    /// Seal `plaintext`, returning ciphertext with the tag appended.
    pub fn seal(&self, sequence: u32, aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = sequence_nonce(sequence);
        self.cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .map_err(|_| CryptoDtoError::SealFailed)
    }

    /// Open `ciphertext` (tag appended). Fails closed: nothing is returned
    /// unless the tag verifies.
    pub fn open(&self, sequence: u32, aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() < TAG_LEN {
            return Err(CryptoDtoError::AuthenticationFailed);
        }
        let (body, tag) = ciphertext.split_at(ciphertext.len() - TAG_LEN);
        let nonce = sequence_nonce(sequence);

        let mut buffer = Vec::with_capacity(body.len());
        buffer.extend_from_slice(body);

        match self.cipher.decrypt_in_place_detached(
            Nonce::from_slice(&nonce),
            aad,
            &mut buffer,
            Tag::from_slice(tag),
        ) {
            Ok(()) => Ok(buffer),
            Err(_) => {
                buffer.zeroize();
                Err(CryptoDtoError::AuthenticationFailed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_layout() {
        let nonce = sequence_nonce(0x0403_0201);
        assert_eq!(nonce, [0, 0, 0, 0, 1, 2, 3, 4, 0, 0, 0, 0]);
        assert_eq!(sequence_nonce(0), [0u8; NONCE_LEN]);
    }

    #[test]
    fn test_invalid_key_length() {
        assert!(matches!(
            Crypto::new(&[0u8; 16]),
            Err(CryptoDtoError::InvalidKeyLength {
                expected: 32,
                actual: 16
            })
        ));
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn test_seal_open() {
        let crypto = Crypto::new(&[7u8; KEY_LEN]).expect("key");
        let sealed = crypto.seal(5, b"aad", b"hello").expect("seal");
        assert_eq!(sealed.len(), 5 + TAG_LEN);

        let opened = crypto.open(5, b"aad", &sealed).expect("open");
        assert_eq!(opened, b"hello");
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn test_open_binds_sequence_and_aad() {
        let crypto = Crypto::new(&[7u8; KEY_LEN]).expect("key");
        let sealed = crypto.seal(5, b"aad", b"hello").expect("seal");

        assert!(matches!(
            crypto.open(6, b"aad", &sealed),
            Err(CryptoDtoError::AuthenticationFailed)
        ));
        assert!(matches!(
            crypto.open(5, b"aae", &sealed),
            Err(CryptoDtoError::AuthenticationFailed)
        ));
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn test_open_short_input() {
        let crypto = Crypto::new(&[1u8; KEY_LEN]).expect("key");
        assert!(crypto.open(0, &[], &[0u8; 10]).is_err());
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn test_deterministic() {
        let crypto = Crypto::new(&[3u8; KEY_LEN]).expect("key");
        let a = crypto.seal(9, b"x", b"same").expect("seal");
        let b = crypto.seal(9, b"x", b"same").expect("seal");
        assert_eq!(a, b);
    }
}
