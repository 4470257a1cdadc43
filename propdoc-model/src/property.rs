//! A single named, typed, dirty-tracked value slot.
//!
//! A property keeps its current value next to the value it had when it was
//! last cleaned; the two differing is what makes it dirty. Every mutation
//! ends by writing the property back into its owning entity, which is the
//! only path by which the entity's stored state changes.

use crate::types::{Options, TypeKind, ValueType};
use crate::watch::{self, WatchContext};
use crate::{Catalog, Cursor, Entity, HydrateOptions, Notification};
use propdoc_types::{Error, Index, Result, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Everything needed to rebuild a property with no outside state.
///
/// Only `name` and `type` are required on import; absent values fall back
/// to the type's sentinels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySnapshot {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub options: Options,
    #[serde(default)]
    pub current_value: Option<Value>,
    #[serde(default)]
    pub persisted_value: Option<Value>,
    #[serde(default)]
    pub empty_value: Option<Value>,
    #[serde(default)]
    pub unset_value: Option<Value>,
    #[serde(default, rename = "type")]
    pub type_name: String,
}

/// What [`Property::get_value`] hands back, depending on the declared type.
#[derive(Debug, Clone)]
pub enum PropertyValue {
    /// A parsed scalar (or opaque) value.
    Value(Value),
    /// A watched nested document.
    Entity(Entity),
    /// The parsed elements of a list of plain values.
    List(Vec<Value>),
    /// The watched elements of a list of documents, materialized eagerly.
    Entities(Vec<Entity>),
    /// A lazy, restartable sequence of watched documents.
    Cursor(Cursor),
}

impl PropertyValue {
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_entity(self) -> Option<Entity> {
        match self {
            Self::Entity(e) => Some(e),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_list(self) -> Option<Vec<Value>> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_entities(self) -> Option<Vec<Entity>> {
        match self {
            Self::Entities(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_cursor(self) -> Option<Cursor> {
        match self {
            Self::Cursor(c) => Some(c),
            _ => None,
        }
    }
}

/// One property of an entity.
///
/// Properties handed out by [`Entity::property`] are attached views. Each
/// mutator first reloads the view from the entity, then writes the result
/// back, so a view held across other writes never undoes them. Reads and
/// [`Property::import`] act on the view as last loaded. A property built
/// directly with [`Property::new`] is detached until
/// [`Property::set_parent`] is called.
#[derive(Clone)]
pub struct Property {
    name: String,
    type_name: String,
    options: Options,
    current: Value,
    persisted: Value,
    unset: Value,
    empty: Value,
    catalog: Rc<Catalog>,
    /// Held by this view only; never serialized.
    parent: Option<Entity>,
}

impl Property {
    /// Creates a detached, unset, clean property.
    pub fn new(
        catalog: Rc<Catalog>,
        name: impl Into<String>,
        type_name: impl Into<String>,
        options: Options,
    ) -> Result<Self> {
        Self::from_snapshot(
            catalog,
            &PropertySnapshot {
                name: name.into(),
                type_name: type_name.into(),
                options,
                ..PropertySnapshot::default()
            },
        )
    }

    /// Rebuilds a detached property from a snapshot.
    pub fn from_snapshot(catalog: Rc<Catalog>, snapshot: &PropertySnapshot) -> Result<Self> {
        let mut property = Self {
            name: String::new(),
            type_name: String::new(),
            options: Options::new(),
            current: Value::Unset,
            persisted: Value::Unset,
            unset: Value::Unset,
            empty: Value::Unset,
            catalog,
            parent: None,
        };
        property.import(snapshot)?;
        Ok(property)
    }

    // ── snapshots ────────────────────────────────────────────────

    /// Replaces this property's state with a snapshot.
    ///
    /// The snapshot is validated before anything is touched. Importing
    /// never writes back to the parent, so an entity still under
    /// construction is not notified.
    pub fn import(&mut self, snapshot: &PropertySnapshot) -> Result<&mut Self> {
        if snapshot.type_name.is_empty() {
            return Err(Error::MissingField("type"));
        }
        if snapshot.name.is_empty() {
            return Err(Error::MissingField("name"));
        }

        let (unset, empty) = match (&snapshot.unset_value, &snapshot.empty_value) {
            (Some(unset), Some(empty)) => (unset.clone(), empty.clone()),
            (unset, empty) => {
                let ty = self.catalog.resolve(&snapshot.type_name, &snapshot.options)?;
                (
                    unset.clone().unwrap_or_else(|| ty.unset_value()),
                    empty.clone().unwrap_or_else(|| ty.empty_value()),
                )
            }
        };
        let current = snapshot.current_value.clone().unwrap_or_else(|| unset.clone());
        let persisted = snapshot
            .persisted_value
            .clone()
            .unwrap_or_else(|| current.clone());

        self.name = snapshot.name.clone();
        self.type_name = snapshot.type_name.clone();
        self.options = snapshot.options.clone();
        self.unset = unset;
        self.empty = empty;
        self.current = current;
        self.persisted = persisted;
        Ok(self)
    }

    /// Imports a snapshot given as JSON (the `export` field names).
    pub fn import_json(&mut self, json: &serde_json::Value) -> Result<&mut Self> {
        let snapshot: PropertySnapshot = serde_json::from_value(json.clone())?;
        self.import(&snapshot)
    }

    /// Captures the complete state of this property. The parent link is
    /// not part of it.
    #[must_use]
    pub fn export(&self) -> PropertySnapshot {
        PropertySnapshot {
            name: self.name.clone(),
            options: self.options.clone(),
            current_value: Some(self.current.clone()),
            persisted_value: Some(self.persisted.clone()),
            empty_value: Some(self.empty.clone()),
            unset_value: Some(self.unset.clone()),
            type_name: self.type_name.clone(),
        }
    }

    // ── values ───────────────────────────────────────────────────

    /// Normalizes `raw` through the declared type and makes it current.
    pub fn set_value(&mut self, raw: impl Into<Value>) -> Result<&mut Self> {
        self.refresh()?;
        let ty = self.value_type()?;
        self.current = ty.export(&ty.parse(&raw.into())?)?;
        self.save(Notification::Change)
    }

    /// Reads the current value, materializing nested documents.
    ///
    /// Every call produces fresh views; entity views are watched so edits
    /// on them flow back into this property.
    pub fn get_value(&self) -> Result<PropertyValue> {
        let ty = self.value_type()?;
        match ty.kind() {
            TypeKind::Scalar => Ok(PropertyValue::Value(ty.parse(&self.current)?)),
            TypeKind::Entity => self.entity_value(ty.as_ref()).map(PropertyValue::Entity),
            TypeKind::List => self.list_value(ty.as_ref()),
            TypeKind::ListEntity => self.cursor_value(ty.as_ref()).map(PropertyValue::Cursor),
        }
    }

    fn child_schema(&self, ty: &dyn ValueType) -> Result<Rc<crate::Schema>> {
        ty.schema()
            .ok_or_else(|| Error::UnknownSchema(format!("{} ({})", self.type_name, self.name)))
    }

    fn entity_value(&self, ty: &dyn ValueType) -> Result<Entity> {
        let schema = self.child_schema(ty)?;

        // Start from the last persisted state so the child's own dirty
        // tracking matches ours, then lay the in-progress edits over it.
        let base = match self.persisted.without_dirty() {
            persisted @ Value::Map(_) => persisted,
            _ => ty.empty_value(),
        };
        let child = Entity::materialize(&self.catalog, schema, &base)?;
        child.clear()?;
        if let Value::Map(overlay) = &self.current {
            child.from_array(overlay, HydrateOptions::default())?;
        }

        self.watch(&child, None);
        Ok(child)
    }

    fn list_value(&self, ty: &dyn ValueType) -> Result<PropertyValue> {
        let items = match ty.parse(&self.current)? {
            Value::List(items) => items,
            _ => Vec::new(),
        };

        let entity_elements = ty.inner().is_some_and(|inner| inner.kind() == TypeKind::Entity);
        if !entity_elements {
            return Ok(PropertyValue::List(items));
        }

        let schema = self.child_schema(ty)?;
        let entities = items
            .iter()
            .enumerate()
            .map(|(pos, item)| -> Result<Entity> {
                let child = Entity::materialize(&self.catalog, schema.clone(), item)?;
                self.watch(&child, Some(Index::Position(pos)));
                Ok(child)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(PropertyValue::Entities(entities))
    }

    fn cursor_value(&self, ty: &dyn ValueType) -> Result<Cursor> {
        let schema = self.child_schema(ty)?;
        let items = match ty.parse(&self.current)? {
            Value::List(items) => items,
            _ => Vec::new(),
        };
        let origin = self
            .parent
            .as_ref()
            .map(|parent| WatchContext::new(parent.clone(), &self.name, None));
        Ok(Cursor::new(self.catalog.clone(), schema, items, origin))
    }

    /// Wires a materialized child so its mutations flow back into this
    /// property, at `index` or as the whole value.
    pub fn watch(&self, child: &Entity, index: Option<Index>) {
        match &self.parent {
            Some(parent) => watch::watch(child, WatchContext::new(parent.clone(), &self.name, index)),
            None => debug!(property = %self.name, "Detached property, child is not watched"),
        }
    }

    /// Replaces one existing slot of a container value.
    ///
    /// Used by the watch protocol to write a list element back.
    pub fn set_value_at_index(
        &mut self,
        index: impl Into<Index>,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        self.refresh()?;
        let index = index.into();
        if self.current.slot(&index).is_none() {
            return Err(self.out_of_range(index));
        }

        let value = value.into();
        let value = match self.slot_type(&index)? {
            Some(ty) => ty.export(&ty.parse(&value)?)?,
            None => value,
        };
        self.current.replace_slot(&index, value);
        self.save(Notification::Change)
    }

    /// Reads one slot of a container value, unparsed.
    pub fn get_value_at_index(&self, index: impl Into<Index>) -> Result<&Value> {
        let index = index.into();
        match self.current.slot(&index) {
            Some(value) => Ok(value),
            None => Err(self.out_of_range(index)),
        }
    }

    fn out_of_range(&self, index: Index) -> Error {
        Error::IndexOutOfRange {
            property: self.name.clone(),
            index,
        }
    }

    /// The type governing one slot: the element type of a list, or the
    /// declared field type for a key of a nested document.
    fn slot_type(&self, index: &Index) -> Result<Option<Rc<dyn ValueType>>> {
        let ty = self.value_type()?;
        if let Some(inner) = ty.inner() {
            return Ok(Some(inner));
        }
        if let (TypeKind::Entity, Some(schema), Index::Key(key)) = (ty.kind(), ty.schema(), index)
            && let Some(field) = schema.field_def(key)
        {
            return self
                .catalog
                .resolve(&field.type_name, &field.options)
                .map(Some);
        }
        Ok(None)
    }

    /// Resets to the unset sentinel.
    pub fn clear(&mut self) -> Result<&mut Self> {
        self.refresh()?;
        self.current = self.unset.clone();
        self.save(Notification::Change)
    }

    /// Resets to the type's empty value.
    pub fn set_empty(&mut self) -> Result<&mut Self> {
        self.refresh()?;
        self.current = self.empty.clone();
        self.save(Notification::Change)
    }

    // ── dirty tracking ───────────────────────────────────────────

    /// Forces dirtiness by making the persisted value one-of-a-kind.
    pub fn set_dirty(&mut self) -> Result<&mut Self> {
        self.refresh()?;
        self.persisted = self.value_type()?.dirty_value();
        self.save(Notification::Dirty)
    }

    /// Forces dirtiness of one slot of a container value.
    ///
    /// A position must address an element of the current value. A key may
    /// name a field that is currently absent, such as an unset child field.
    pub fn set_dirty_at_index(&mut self, index: impl Into<Index>) -> Result<&mut Self> {
        self.refresh()?;
        let index = index.into();
        if index.as_position().is_some() && self.current.slot(&index).is_none() {
            return Err(self.out_of_range(index));
        }
        let marker = match self.slot_type(&index)? {
            Some(ty) => ty.dirty_value(),
            None => Value::dirty(),
        };
        self.shape_persisted();
        self.persisted.insert_slot(&index, marker);
        self.save(Notification::Dirty)
    }

    /// Marks the current value as persisted.
    pub fn clean(&mut self) -> Result<&mut Self> {
        self.refresh()?;
        self.persisted = self.current.clone();
        self.save(Notification::Clean)
    }

    /// Marks one slot as persisted. If the slot no longer exists in the
    /// current value, the persisted slot is dropped instead.
    pub fn clean_at_index(&mut self, index: impl Into<Index>) -> Result<&mut Self> {
        self.refresh()?;
        let index = index.into();
        match self.current.slot(&index).cloned() {
            Some(value) => {
                self.shape_persisted();
                self.persisted.insert_slot(&index, value);
            }
            None => {
                self.persisted.remove_slot(&index);
            }
        }
        // Saved even when the slot was already gone, since the removal only
        // reaches the entity through the write-back.
        self.save(Notification::Clean)
    }

    /// Gives a non-container persisted value the current value's shape.
    fn shape_persisted(&mut self) {
        if !self.persisted.is_container() {
            self.persisted = if self.current.is_container() {
                self.current.empty_container()
            } else {
                Value::Unset
            };
        }
    }

    #[must_use]
    pub fn is_unset(&self) -> bool {
        self.current == self.unset
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current == self.empty
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.current != self.persisted
    }

    /// The stored current value, without any coercion.
    #[must_use]
    pub fn get_export(&self) -> &Value {
        &self.current
    }

    /// The value as of the last clean, parsed. Dirty markers read as unset.
    pub fn get_persisted_value(&self) -> Result<Value> {
        self.value_type()?.parse(&self.persisted.without_dirty())
    }

    // ── type & options ───────────────────────────────────────────

    /// Resolves the declared type with this property's options.
    pub fn value_type(&self) -> Result<Rc<dyn ValueType>> {
        self.catalog.resolve(&self.type_name, &self.options)
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    #[must_use]
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    pub fn set_option(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<&mut Self> {
        self.refresh()?;
        self.options.insert(name.into(), value.into());
        self.save(Notification::Change)
    }

    pub fn set_options(&mut self, options: Options) -> Result<&mut Self> {
        self.refresh()?;
        self.options.extend(options);
        self.save(Notification::Change)
    }

    // ── parent link ──────────────────────────────────────────────

    #[must_use]
    pub fn parent(&self) -> Option<&Entity> {
        self.parent.as_ref()
    }

    pub fn set_parent(&mut self, parent: Option<&Entity>) -> &mut Self {
        self.parent = parent.cloned();
        self
    }

    /// Reloads an attached view from its entity, so a mutation always
    /// starts from the committed state rather than from an older copy.
    fn refresh(&mut self) -> Result<()> {
        if let Some(parent) = self.parent.clone() {
            *self = parent.property(&self.name)?;
        }
        Ok(())
    }

    /// Writes this property back into its parent, if attached.
    fn save(&mut self, notification: Notification) -> Result<&mut Self> {
        if let Some(parent) = self.parent.clone() {
            parent.save_property(self, notification)?;
        }
        Ok(self)
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("type", &self.type_name)
            .field("current", &self.current)
            .field("persisted", &self.persisted)
            .field("attached", &self.parent.is_some())
            .finish()
    }
}
