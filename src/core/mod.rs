//! # Core Packet Components
//!
//! Wire format building blocks for the crypto DTO channel.
//!
//! ## Components
//! - **Mode**: crypto mode identifiers carried in each header
//! - **Header**: channel tag, sequence and mode, MessagePack map encoded
//! - **Envelope**: the sealed `[name][payload]` plaintext
//! - **Packet**: outer `[headerLen][header][ciphertext]` framing and AAD slicing
//! - **Serialization**: payload formats and the `Dto` trait
//!
//! ## Wire Format
//! ```text
//! [HeaderLen(2)] [Header(N)] [Sealed([NameLen(2)] [Name] [DtoLen(2)] [Dto]) + Tag(16)]
//! ```
//!
//! All length fields are little-endian `u16` and must match their regions exactly.

pub mod envelope;
pub mod header;
pub mod mode;
pub mod packet;
pub mod serialization;
