//! Value type descriptors.
//!
//! A descriptor normalizes raw input, renders the serializable form and
//! supplies the sentinels a property compares against. Descriptors are
//! resolved on demand through the [`Catalog`](crate::Catalog) from a type
//! identifier plus the property's options.

mod container;
mod scalar;

pub use container::{EntityType, ListEntityType, ListType};
pub use scalar::{BooleanType, DoubleType, IntegerType, MixedType, StringType};

use crate::Schema;
use indexmap::IndexMap;
use propdoc_types::{Result, Value};
use std::fmt;
use std::rc::Rc;

/// Open mapping of per-property configuration (element type, default value,
/// label, ...).
pub type Options = IndexMap<String, Value>;

/// How a property materializes its value on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// Returned as the parsed value.
    Scalar,
    /// Materialized as a watched child entity.
    Entity,
    /// Materialized eagerly; entity elements are watched per position.
    List,
    /// Materialized as a lazy cursor of watched entities.
    ListEntity,
}

/// Contract every value type fulfils.
pub trait ValueType: fmt::Debug {
    /// The identifier this type is registered under.
    fn name(&self) -> &str;

    fn kind(&self) -> TypeKind {
        TypeKind::Scalar
    }

    /// Normalizes raw input into a domain value.
    ///
    /// `Unset` and `Null` parse to the unset sentinel. Dirty markers are
    /// never accepted.
    fn parse(&self, raw: &Value) -> Result<Value>;

    /// Renders the serializable form stored as a property's current value.
    fn export(&self, value: &Value) -> Result<Value> {
        self.parse(value)
    }

    fn unset_value(&self) -> Value {
        Value::Unset
    }

    fn empty_value(&self) -> Value;

    /// A one-of-a-kind sentinel for forcing dirtiness.
    fn dirty_value(&self) -> Value {
        Value::dirty()
    }

    fn options(&self) -> &Options;

    fn option(&self, name: &str) -> Option<&Value> {
        self.options().get(name)
    }

    /// Element type of a container type.
    fn inner(&self) -> Option<Rc<dyn ValueType>> {
        None
    }

    /// Schema of the documents an entity-backed type materializes.
    fn schema(&self) -> Option<Rc<Schema>> {
        None
    }
}
