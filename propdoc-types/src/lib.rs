//! Core value types for propdoc.
//!
//! This crate defines the leaf types every document layer depends on:
//! - [`Value`]: the tagged variant held by a property (scalar, sequence or
//!   nested document snapshot), including the reserved sentinels
//! - [`DirtyToken`]: a one-of-a-kind marker used to force dirtiness
//! - [`Index`]: the address of one slot inside a container value
//!
//! Type coercion rules, properties and entities live in `propdoc-model`.

mod index;
mod sentinel;
mod value;

pub use index::Index;
pub use sentinel::DirtyToken;
pub use value::{Map, Value};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the document model.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Raw input could not be normalized by the declared type.
    #[error("cannot coerce into {type_name}: {reason}")]
    TypeCoercion { type_name: String, reason: String },

    /// A property snapshot lacks a required field.
    #[error("snapshot is missing required field '{0}'")]
    MissingField(&'static str),

    /// Indexed access on a container value at an absent slot.
    #[error("index {index} is not present in property '{property}'")]
    IndexOutOfRange { property: String, index: Index },

    /// The property name is not declared on the entity.
    #[error("'{name}' is not a property of the {entity} entity")]
    UnknownProperty { entity: String, name: String },

    /// No type is registered under this identifier.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// No schema is defined under this name.
    #[error("unknown schema: {0}")]
    UnknownSchema(String),

    /// A type was resolved without an option it requires.
    #[error("type {type_name} requires the '{option}' option")]
    MissingOption {
        type_name: String,
        option: &'static str,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a [`Error::TypeCoercion`].
    pub fn coercion(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TypeCoercion {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}
