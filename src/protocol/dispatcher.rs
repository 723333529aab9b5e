use crate::core::serialization::Dto;
use crate::error::{CryptoDtoError, Result};
use crate::protocol::deserializer::Deserializer;
use crate::protocol::registry::DtoRegistry;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

type HandlerFn = dyn Fn(&Deserializer) -> Result<()> + Send + Sync + 'static;

/// Routes verified packets to typed handlers by DTO short name.
///
/// Handlers are keyed by the short name; a packet carrying the long name is
/// resolved through the dispatcher's own [`DtoRegistry`].
pub struct Dispatcher {
    registry: Arc<RwLock<DtoRegistry>>,
    handlers: Arc<RwLock<HashMap<Cow<'static, str>, Box<HandlerFn>>>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(RwLock::new(DtoRegistry::new())),
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a handler for DTO type `T`.
    ///
    /// Both tables are locked before either is touched, so a name is never
    /// left registered without its handler.
    pub fn register<T, F>(&self, handler: F) -> Result<()>
    where
        T: Dto + 'static,
        F: Fn(T) -> Result<()> + Send + Sync + 'static,
    {
        let mut registry = self
            .registry
            .write()
            .map_err(|_| CryptoDtoError::LockPoisoned)?;
        let mut handlers = self
            .handlers
            .write()
            .map_err(|_| CryptoDtoError::LockPoisoned)?;

        registry.register::<T>()?;
        handlers.insert(
            Cow::Borrowed(T::SHORT_NAME),
            Box::new(move |de: &Deserializer| handler(de.get_dto::<T>()?)),
        );
        Ok(())
    }

    /// Hand a verified packet to its handler
    pub fn dispatch(&self, de: &Deserializer) -> Result<()> {
        let name = de.dto_name().ok_or(CryptoDtoError::NotVerified)?;

        let short = {
            let registry = self
                .registry
                .read()
                .map_err(|_| CryptoDtoError::LockPoisoned)?;
            match registry.resolve(name) {
                Some(short) => short.to_string(),
                None => {
                    debug!(dto = name, "No handler for received DTO");
                    return Err(CryptoDtoError::UnknownDto(name.to_string()));
                }
            }
        };

        let handlers = self
            .handlers
            .read()
            .map_err(|_| CryptoDtoError::LockPoisoned)?;

        handlers
            .get(short.as_str())
            .ok_or_else(|| CryptoDtoError::UnknownDto(name.to_string()))
            .and_then(|handler| handler(de))
    }

    /// Snapshot of the names this dispatcher knows
    pub fn registry(&self) -> Result<DtoRegistry> {
        self.registry
            .read()
            .map(|r| r.clone())
            .map_err(|_| CryptoDtoError::LockPoisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mode::CryptoDtoMode;
    use crate::protocol::deserializer::deserialize_with_key;
    use crate::protocol::serializer::serialize;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct VoiceHeartbeatAck;

    impl Dto for VoiceHeartbeatAck {
        const NAME: &'static str = "ClientVoiceHeartbeatAckDto";
        const SHORT_NAME: &'static str = "VHA";
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct AudioRx {
        callsign: String,
        sequence_counter: u32,
    }

    impl Dto for AudioRx {
        const NAME: &'static str = "AudioRxOnTransceiversDto";
        const SHORT_NAME: &'static str = "AR";
    }

    const KEY: [u8; 32] = [0x5A; 32];

    fn packet<T: Dto>(dto: &T, seq: u32) -> Deserializer {
        let bytes = serialize("dispatch", CryptoDtoMode::ChaCha20Poly1305, &KEY, seq, dto)
            .unwrap_or_default();
        deserialize_with_key(&KEY, &bytes).unwrap_or_default()
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn test_routes_by_short_name() {
        let dispatcher = Dispatcher::new();
        let heartbeats = Arc::new(AtomicU32::new(0));
        let audio = Arc::new(AtomicU32::new(0));

        let hb = heartbeats.clone();
        dispatcher
            .register::<VoiceHeartbeatAck, _>(move |_| {
                hb.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .expect("register");
        let au = audio.clone();
        dispatcher
            .register::<AudioRx, _>(move |dto| {
                assert_eq!(dto.callsign, "DLH4AB");
                au.fetch_add(dto.sequence_counter, Ordering::SeqCst);
                Ok(())
            })
            .expect("register");

        dispatcher
            .dispatch(&packet(&VoiceHeartbeatAck, 1))
            .expect("dispatch");
        dispatcher
            .dispatch(&packet(
                &AudioRx {
                    callsign: "DLH4AB".into(),
                    sequence_counter: 7,
                },
                2,
            ))
            .expect("dispatch");

        assert_eq!(heartbeats.load(Ordering::SeqCst), 1);
        assert_eq!(audio.load(Ordering::SeqCst), 7);
        assert_eq!(dispatcher.registry().expect("registry").len(), 2);
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn test_failed_register_leaves_no_orphan_name() {
        let dispatcher = Dispatcher::new();

        // poison the handler table
        let handlers = dispatcher.handlers.clone();
        let _ = std::thread::spawn(move || {
            let _guard = handlers.write().expect("lock");
            panic!("poison handler table");
        })
        .join();

        assert!(matches!(
            dispatcher.register::<VoiceHeartbeatAck, _>(|_| Ok(())),
            Err(CryptoDtoError::LockPoisoned)
        ));
        assert!(dispatcher.registry().expect("registry").is_empty());
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn test_conflicting_register_keeps_first_handler() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct ImpostorAck;

        impl Dto for ImpostorAck {
            const NAME: &'static str = "ImpostorAckDto";
            const SHORT_NAME: &'static str = "VHA";
        }

        let dispatcher = Dispatcher::new();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        dispatcher
            .register::<VoiceHeartbeatAck, _>(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .expect("register");
        assert!(matches!(
            dispatcher.register::<ImpostorAck, _>(|_| Ok(())),
            Err(CryptoDtoError::DuplicateDtoName { .. })
        ));

        dispatcher
            .dispatch(&packet(&VoiceHeartbeatAck, 3))
            .expect("dispatch");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_and_unverified() {
        let dispatcher = Dispatcher::new();
        assert!(matches!(
            dispatcher.dispatch(&packet(&VoiceHeartbeatAck, 1)),
            Err(CryptoDtoError::UnknownDto(name)) if name == "VHA"
        ));
        assert!(matches!(
            dispatcher.dispatch(&Deserializer::default()),
            Err(CryptoDtoError::NotVerified)
        ));
    }
}
