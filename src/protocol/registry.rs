//! Name table for DTO types.
//!
//! Maps canonical DTO names to the short names used on the wire and back.
//! Each registry is an ordinary value, so independent channels or tests never
//! share name state.

use crate::core::serialization::Dto;
use crate::error::{CryptoDtoError, Result};
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::debug;

/// Long-name / short-name lookup for registered DTO types
#[derive(Debug, Default, Clone)]
pub struct DtoRegistry {
    short_by_long: HashMap<Cow<'static, str>, Cow<'static, str>>,
    long_by_short: HashMap<Cow<'static, str>, Cow<'static, str>>,
}

impl DtoRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a DTO type under its own names
    pub fn register<T: Dto>(&mut self) -> Result<()> {
        self.insert(Cow::Borrowed(T::NAME), Cow::Borrowed(T::SHORT_NAME))
    }

    /// Register a name pair not backed by a local type (e.g. a DTO this
    /// side only forwards)
    pub fn register_names(&mut self, long: &str, short: &str) -> Result<()> {
        self.insert(Cow::Owned(long.to_string()), Cow::Owned(short.to_string()))
    }

    fn insert(&mut self, long: Cow<'static, str>, short: Cow<'static, str>) -> Result<()> {
        let bound_long = self.long_by_short.get(&short);
        let bound_short = self.short_by_long.get(&long);

        match (bound_long, bound_short) {
            (Some(existing_long), Some(existing_short))
                if *existing_long == long && *existing_short == short =>
            {
                return Ok(());
            }
            (Some(existing_long), _) => {
                return Err(CryptoDtoError::DuplicateDtoName {
                    short: short.into_owned(),
                    existing: existing_long.to_string(),
                });
            }
            (None, Some(existing_short)) => {
                return Err(CryptoDtoError::DuplicateDtoName {
                    short: short.into_owned(),
                    existing: format!("{long} (as {existing_short})"),
                });
            }
            (None, None) => {}
        }

        debug!(long = %long, short = %short, "DTO registered");
        self.short_by_long.insert(long.clone(), short.clone());
        self.long_by_short.insert(short, long);
        Ok(())
    }

    /// Short wire name for a canonical name
    pub fn short_name(&self, long: &str) -> Option<&str> {
        self.short_by_long.get(long).map(|s| s.as_ref())
    }

    /// Canonical name for a short wire name
    pub fn long_name(&self, short: &str) -> Option<&str> {
        self.long_by_short.get(short).map(|s| s.as_ref())
    }

    /// Resolve either form of a name to the short form
    pub fn resolve(&self, name: &str) -> Option<&str> {
        if let Some((short, _)) = self.long_by_short.get_key_value(name) {
            return Some(short.as_ref());
        }
        self.short_name(name)
    }

    /// Whether either form of `name` is known
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.long_by_short.len()
    }

    pub fn is_empty(&self) -> bool {
        self.long_by_short.is_empty()
    }
}
