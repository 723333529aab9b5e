//! # Protocol Layer
//!
//! Sealing DTOs into packets and getting them back out.
//!
//! ## Components
//! - **Serializer**: DTO → `[headerLen][header][sealed envelope]`
//! - **Deserializer**: packet → verified envelope → typed DTO, with replay checks
//! - **Registry**: long-name ↔ short-name table for DTO types
//! - **Dispatcher**: routes verified packets to typed handlers
//!
//! ## Flow
//! ```text
//! serialize_with_channel(channel, mode, dto)
//!     → channel.next_transmit(mode) → (key, seq)
//!     → header{tag, seq, mode} → AAD → seal(envelope) → bytes
//!
//! deserialize(channel, bytes, loopback)
//!     → split → mode check → key (rx, or tx if loopback)
//!     → open → envelope → replay check → verified
//! ```

pub mod deserializer;
pub mod dispatcher;
pub mod registry;
pub mod serializer;


pub use deserializer::{deserialize, deserialize_with_key, deserialize_with_limits, Deserializer};
pub use dispatcher::Dispatcher;
pub use registry::DtoRegistry;
pub use serializer::{serialize, serialize_with_channel};
