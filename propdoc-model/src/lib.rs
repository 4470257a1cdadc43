//! Change-tracked document model.
//!
//! - [`Property`]: a typed value slot remembering its last persisted value
//! - [`Entity`]: a document of properties with per-entity listeners
//! - [`Catalog`]: resolves type identifiers and entity [`Schema`]s
//! - [`watch`]: relays edits on materialized child documents to their parents
//!
//! Reading a nested document through [`Entity::get`] returns a fresh view.
//! Mutating that view updates the parent's stored value and dirty state,
//! level by level, so a deeply nested edit is visible at the root.

mod catalog;
mod cursor;
mod entity;
mod event;
mod property;
mod schema;
pub mod types;
pub mod watch;

pub use catalog::{Catalog, TypeFactory};
pub use cursor::{Cursor, CursorIter};
pub use entity::{Entity, EntitySnapshot, HydrateOptions};
pub use event::{Event, Listener, ListenerId, Notification};
pub use property::{Property, PropertySnapshot, PropertyValue};
pub use schema::{FieldDef, Schema};
pub use types::{Options, TypeKind, ValueType};
pub use watch::WatchContext;

pub use propdoc_types::{DirtyToken, Error, Index, Map, Result, Value};
