//! The dirty sentinel.
//!
//! Dirtiness is asserted by giving a property's persisted value something
//! its current value can never equal. A token carries a UUID v7, so two
//! tokens never collide and no domain value can match one.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A one-of-a-kind marker stored in place of a persisted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirtyToken(Uuid);

impl DirtyToken {
    /// Mints a fresh token.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for DirtyToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DirtyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dirty:{}", self.0)
    }
}
