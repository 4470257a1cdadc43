//! The tagged value held by every property.
//!
//! A property's current and persisted values may be scalars, sequences or
//! nested document snapshots. Two variants are reserved and never produced
//! from domain input: [`Value::Unset`] and [`Value::Dirty`].

use crate::{DirtyToken, Index};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered string-keyed map of values (a nested document snapshot).
pub type Map = IndexMap<String, Value>;

/// A type-erased property value.
///
/// Snapshots serialize with an explicit `kind` tag so the sentinels survive
/// a round trip distinct from `null`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// The unset sentinel: no value has been assigned.
    #[default]
    Unset,
    /// The dirty sentinel; never equal to anything but itself.
    Dirty(DirtyToken),
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Map(Map),
}

impl Value {
    /// Mints a fresh dirty sentinel.
    #[must_use]
    pub fn dirty() -> Self {
        Self::Dirty(DirtyToken::new())
    }

    /// Short name of the variant, used in coercion messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Dirty(_) => "dirty marker",
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    #[must_use]
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    #[must_use]
    pub fn is_dirty_marker(&self) -> bool {
        matches!(self, Self::Dirty(_))
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// True for lists and maps.
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self, Self::List(_) | Self::Map(_))
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a float; integers are widened.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up one slot of a container value.
    #[must_use]
    pub fn slot(&self, index: &Index) -> Option<&Value> {
        match self {
            Self::List(items) => index.as_position().and_then(|pos| items.get(pos)),
            Self::Map(map) => map.get(&index.to_key()),
            _ => None,
        }
    }

    /// Replaces an existing slot. Returns false if the slot is absent.
    pub fn replace_slot(&mut self, index: &Index, value: Value) -> bool {
        let slot = match self {
            Self::List(items) => index.as_position().and_then(|pos| items.get_mut(pos)),
            Self::Map(map) => map.get_mut(&index.to_key()),
            _ => None,
        };
        match slot {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Writes a slot, creating it if needed.
    ///
    /// Lists are padded with [`Value::Unset`] up to the position. A
    /// non-container value is first replaced by an empty map, or an empty
    /// list when the index is a position.
    pub fn insert_slot(&mut self, index: &Index, value: Value) {
        if !self.is_container() {
            *self = match index {
                Index::Position(_) => Self::List(Vec::new()),
                Index::Key(_) => Self::Map(Map::new()),
            };
        }
        match self {
            Self::List(items) => match index.as_position() {
                Some(pos) => {
                    if pos >= items.len() {
                        items.resize(pos + 1, Self::Unset);
                    }
                    items[pos] = value;
                }
                None => {
                    // A non-numeric key turns the list into a map.
                    let mut map: Map = items
                        .drain(..)
                        .enumerate()
                        .map(|(pos, item)| (pos.to_string(), item))
                        .collect();
                    map.insert(index.to_key(), value);
                    *self = Self::Map(map);
                }
            },
            Self::Map(map) => {
                map.insert(index.to_key(), value);
            }
            _ => {}
        }
    }

    /// Removes a slot, returning its value if it was present.
    ///
    /// Removing a list element shifts the elements after it.
    pub fn remove_slot(&mut self, index: &Index) -> Option<Value> {
        match self {
            Self::List(items) => index
                .as_position()
                .filter(|pos| *pos < items.len())
                .map(|pos| items.remove(pos)),
            Self::Map(map) => map.shift_remove(&index.to_key()),
            _ => None,
        }
    }

    /// Returns an empty container of the same shape (a map for non-containers).
    #[must_use]
    pub fn empty_container(&self) -> Value {
        match self {
            Self::List(_) => Self::List(Vec::new()),
            _ => Self::Map(Map::new()),
        }
    }

    /// Strips dirty sentinels so the value can be parsed.
    ///
    /// A top-level marker becomes [`Value::Unset`], map entries holding a
    /// marker are dropped and list elements holding one become unset.
    #[must_use]
    pub fn without_dirty(&self) -> Value {
        match self {
            Self::Dirty(_) => Self::Unset,
            Self::List(items) => Self::List(items.iter().map(Self::without_dirty).collect()),
            Self::Map(map) => Self::Map(
                map.iter()
                    .filter(|(_, v)| !v.is_dirty_marker())
                    .map(|(k, v)| (k.clone(), v.without_dirty()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Renders a plain JSON value. Sentinels render as `null`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Self::Unset | Self::Dirty(_) | Self::Null => Json::Null,
            Self::Bool(b) => Json::Bool(*b),
            Self::Int(i) => Json::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
            Self::Text(s) => Json::String(s.clone()),
            Self::List(items) => Json::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map_or(Self::Null, Self::Float),
            },
            Json::String(s) => Self::Text(s),
            Json::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Json::Object(map) => Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Self::Map(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}
