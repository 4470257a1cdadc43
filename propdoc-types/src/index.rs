//! Slot addresses inside container values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Addresses one slot of a container value.
///
/// Positions address list elements, keys address map entries. Either form
/// is accepted by either container: a position on a map looks up its
/// decimal key, and a numeric key on a list is read as a position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Index {
    Position(usize),
    Key(String),
}

impl Index {
    /// Returns the slot as a list position, if it can be read as one.
    #[must_use]
    pub fn as_position(&self) -> Option<usize> {
        match self {
            Self::Position(pos) => Some(*pos),
            Self::Key(key) => key.parse().ok(),
        }
    }

    /// Returns the slot as a map key.
    #[must_use]
    pub fn to_key(&self) -> String {
        match self {
            Self::Position(pos) => pos.to_string(),
            Self::Key(key) => key.clone(),
        }
    }
}

impl From<usize> for Index {
    fn from(pos: usize) -> Self {
        Self::Position(pos)
    }
}

impl From<&str> for Index {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for Index {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position(pos) => write!(f, "{pos}"),
            Self::Key(key) => write!(f, "'{key}'"),
        }
    }
}
