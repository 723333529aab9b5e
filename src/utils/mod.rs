//! # Utility Modules
//!
//! Supporting utilities for cryptography, replay protection, logging, and metrics.
//!
//! ## Components
//! - **Crypto**: ChaCha20-Poly1305 IETF AEAD with sequence-derived nonces
//! - **Replay Window**: per-direction sequence tracking (strict or bounded reorder)
//! - **Logging**: Structured logging configuration
//! - **Metrics**: Thread-safe observability counters
//!
//! ## Security
//! - Decryption fails closed; rejected plaintext buffers are zeroed
//! - Channel keys are zeroed on drop (zeroize crate)

pub mod crypto;
pub mod logging;
pub mod metrics;
pub mod replay_window;

// Re-export public types for advanced users
pub use replay_window::{ReplayPolicy, SequenceWindow};
