//! Documents made of properties.
//!
//! An [`Entity`] is a cheap, shared handle. Its registry stores one
//! property per declared field; [`Entity::property`] hands out attached
//! copies whose mutators write back through [`Entity::save_property`].
//! That write-back is where notifications originate, so listeners (the
//! watch protocol's included) see every committed mutation exactly once.

use crate::event::{Listener, Listeners};
use crate::property::{PropertySnapshot, PropertyValue};
use crate::watch::WatchContext;
use crate::{Catalog, Event, ListenerId, Notification, Property, Schema};
use indexmap::IndexMap;
use propdoc_types::{Error, Map, Result, Value};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace};

/// How [`Entity::from_array`] treats its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HydrateOptions {
    /// Skip fields whose value the declared type rejects.
    pub ignore_errors: bool,
    /// Keep unknown keys as extended properties.
    pub auto_extended: bool,
}

impl Default for HydrateOptions {
    fn default() -> Self {
        Self {
            ignore_errors: true,
            auto_extended: true,
        }
    }
}

impl HydrateOptions {
    /// Fail on the first rejected value and drop unknown keys.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            ignore_errors: false,
            auto_extended: false,
        }
    }
}

/// Complete state of an entity, property by property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub schema: String,
    pub properties: Vec<PropertySnapshot>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extended: Map,
}

struct EntityState {
    catalog: Rc<Catalog>,
    schema: Rc<Schema>,
    properties: IndexMap<String, Property>,
    extended: Map,
    listeners: Listeners,
    watch: Option<WatchContext>,
}

/// A document: an ordered set of named properties plus free-form extended
/// values, with per-entity listeners.
///
/// Cloning the handle does not copy the document.
#[derive(Clone)]
pub struct Entity {
    state: Rc<RefCell<EntityState>>,
}

impl Entity {
    /// Creates an empty entity for a schema defined in the catalog.
    pub fn new(catalog: &Rc<Catalog>, schema: &str) -> Result<Self> {
        let schema = catalog.schema(schema)?;
        Self::with_schema(catalog.clone(), schema)
    }

    /// Creates an empty entity for an ad-hoc schema.
    pub fn with_schema(catalog: Rc<Catalog>, schema: Rc<Schema>) -> Result<Self> {
        let properties = schema
            .fields()
            .map(|field| {
                Property::new(
                    catalog.clone(),
                    field.name.clone(),
                    field.type_name.clone(),
                    field.options.clone(),
                )
                .map(|property| (field.name.clone(), property))
            })
            .collect::<Result<IndexMap<_, _>>>()?;

        Ok(Self {
            state: Rc::new(RefCell::new(EntityState {
                catalog,
                schema,
                properties,
                extended: Map::new(),
                listeners: Listeners::default(),
                watch: None,
            })),
        })
    }

    /// Builds a clean entity holding `base`, for use as a materialized child.
    pub(crate) fn materialize(catalog: &Rc<Catalog>, schema: Rc<Schema>, base: &Value) -> Result<Self> {
        let entity = Self::with_schema(catalog.clone(), schema)?;
        if let Value::Map(values) = base {
            entity.from_array(values, HydrateOptions::default())?;
        }
        entity.clean()?;
        Ok(entity)
    }

    /// Rebuilds an entity from a snapshot. Fields the schema no longer
    /// declares are skipped.
    pub fn restore(catalog: &Rc<Catalog>, snapshot: &EntitySnapshot) -> Result<Self> {
        let entity = Self::new(catalog, &snapshot.schema)?;
        {
            let mut state = entity.state.borrow_mut();
            for property in &snapshot.properties {
                match state.properties.get_mut(&property.name) {
                    Some(slot) => {
                        slot.import(property)?;
                    }
                    None => debug!(
                        schema = %snapshot.schema,
                        property = %property.name,
                        "Skipping undeclared property"
                    ),
                }
            }
            state.extended = snapshot.extended.clone();
        }
        Ok(entity)
    }

    #[must_use]
    pub fn snapshot(&self) -> EntitySnapshot {
        let state = self.state.borrow();
        EntitySnapshot {
            schema: state.schema.name.clone(),
            properties: state.properties.values().map(Property::export).collect(),
            extended: state.extended.clone(),
        }
    }

    // ── identity ─────────────────────────────────────────────────

    #[must_use]
    pub fn schema(&self) -> Rc<Schema> {
        self.state.borrow().schema.clone()
    }

    #[must_use]
    pub fn schema_name(&self) -> String {
        self.state.borrow().schema.name.clone()
    }

    #[must_use]
    pub fn catalog(&self) -> Rc<Catalog> {
        self.state.borrow().catalog.clone()
    }

    /// True if both handles refer to the same document.
    #[must_use]
    pub fn ptr_eq(&self, other: &Entity) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    // ── properties ───────────────────────────────────────────────

    /// Returns an attached copy of a declared property.
    pub fn property(&self, name: &str) -> Result<Property> {
        let mut property = {
            let state = self.state.borrow();
            state
                .properties
                .get(name)
                .cloned()
                .ok_or_else(|| Error::UnknownProperty {
                    entity: state.schema.name.clone(),
                    name: name.to_string(),
                })?
        };
        property.set_parent(Some(self));
        Ok(property)
    }

    /// Commits a property's state into the registry and notifies listeners.
    pub fn save_property(&self, property: &Property, notification: Notification) -> Result<()> {
        let name = property.name().to_string();
        let plan = {
            let mut state = self.state.borrow_mut();
            let entity = state.schema.name.clone();
            let slot = state
                .properties
                .get_mut(&name)
                .ok_or_else(|| Error::UnknownProperty {
                    entity,
                    name: name.clone(),
                })?;
            slot.import(&property.export())?;
            state.listeners.dispatch_plan(notification)
        };
        trace!(property = %name, notification = %notification, "Property saved");
        plan.run(&Event::for_field(notification, self.clone(), &name))
    }

    #[must_use]
    pub fn property_exists(&self, name: &str) -> bool {
        self.state.borrow().properties.contains_key(name)
    }

    /// True if the property is declared and set.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.state
            .borrow()
            .properties
            .get(name)
            .is_some_and(|p| !p.is_unset())
    }

    /// Declared property names, optionally skipping unset ones.
    #[must_use]
    pub fn properties(&self, include_unset: bool) -> Vec<String> {
        self.state
            .borrow()
            .properties
            .values()
            .filter(|p| include_unset || !p.is_unset())
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Reads a property's value, materializing nested documents.
    pub fn get(&self, name: &str) -> Result<PropertyValue> {
        self.property(name)?.get_value()
    }

    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<&Self> {
        self.property(name)?.set_value(value)?;
        Ok(self)
    }

    /// Attached copies of every set property, in declaration order.
    #[must_use]
    pub fn iter(&self) -> std::vec::IntoIter<Property> {
        let names = self.properties(false);
        let mut properties = Vec::with_capacity(names.len());
        for name in names {
            if let Ok(property) = self.property(&name) {
                properties.push(property);
            }
        }
        properties.into_iter()
    }

    fn registry(&self) -> Vec<Property> {
        self.state.borrow().properties.values().cloned().collect()
    }

    // ── state ────────────────────────────────────────────────────

    /// Resets every property to unset.
    pub fn clear(&self) -> Result<&Self> {
        for name in self.properties(true) {
            self.clear_property(&name)?;
        }
        Ok(self)
    }

    pub fn clear_property(&self, name: &str) -> Result<&Self> {
        self.property(name)?.clear()?;
        Ok(self)
    }

    /// Marks every property as persisted.
    pub fn clean(&self) -> Result<&Self> {
        for name in self.properties(true) {
            self.clean_property(&name)?;
        }
        Ok(self)
    }

    pub fn clean_property(&self, name: &str) -> Result<&Self> {
        self.property(name)?.clean()?;
        Ok(self)
    }

    pub fn mark_dirty(&self, name: &str) -> Result<&Self> {
        self.property(name)?.set_dirty()?;
        Ok(self)
    }

    /// Names of the properties whose current value differs from the
    /// persisted one.
    #[must_use]
    pub fn dirty(&self) -> Vec<String> {
        self.state
            .borrow()
            .properties
            .values()
            .filter(|p| p.is_dirty())
            .map(|p| p.name().to_string())
            .collect()
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.state.borrow().properties.values().any(Property::is_dirty)
    }

    // ── hydration & export ───────────────────────────────────────

    /// Assigns every entry of `values`, in order.
    ///
    /// Keys naming no declared field become extended properties when
    /// `auto_extended` is set. Otherwise they are dropped with
    /// `ignore_errors`, and rejected without it. With `ignore_errors`,
    /// values the declared type rejects are skipped.
    pub fn from_array(&self, values: &Map, options: HydrateOptions) -> Result<&Self> {
        for (name, value) in values {
            if !self.property_exists(name) {
                if options.auto_extended {
                    self.set_extended_property(name, value.clone());
                } else if !options.ignore_errors {
                    return Err(Error::UnknownProperty {
                        entity: self.schema_name(),
                        name: name.clone(),
                    });
                }
                continue;
            }
            match self.set(name, value.clone()) {
                Ok(_) => {}
                Err(e @ Error::TypeCoercion { .. }) if options.ignore_errors => {
                    debug!(property = %name, error = %e, "Skipping rejected value");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(self)
    }

    /// [`from_array`](Self::from_array) for a JSON object.
    pub fn from_json(&self, json: &serde_json::Value, options: HydrateOptions) -> Result<&Self> {
        match Value::from(json.clone()) {
            Value::Map(values) => self.from_array(&values, options),
            other => Err(Error::coercion(
                self.schema_name(),
                format!("expected an object, got {}", other.kind_name()),
            )),
        }
    }

    /// Parsed property values by name.
    pub fn to_array(&self, include_unset: bool) -> Result<Map> {
        let mut out = Map::new();
        for property in self.registry() {
            if !include_unset && property.is_unset() {
                continue;
            }
            let value = property.value_type()?.parse(property.get_export())?;
            out.insert(property.name().to_string(), value);
        }
        Ok(out)
    }

    /// Serializable property values by name, optionally restricted to
    /// `include`. With `include_unset`, unset properties contribute their
    /// `defaultValue` option when they have one.
    pub fn export(&self, include: Option<&[&str]>, include_unset: bool) -> Result<Map> {
        let mut out = Map::new();
        for property in self.registry() {
            if include.is_some_and(|names| !names.iter().any(|n| *n == property.name())) {
                continue;
            }
            if property.is_unset() {
                if !include_unset {
                    continue;
                }
                let ty = property.value_type()?;
                let value = match property.option("defaultValue") {
                    Some(default) => ty.export(default)?,
                    None => ty.unset_value(),
                };
                out.insert(property.name().to_string(), value);
            } else {
                out.insert(property.name().to_string(), property.get_export().clone());
            }
        }
        Ok(out)
    }

    /// [`export`](Self::export) of the set properties, as JSON.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(Value::Map(self.export(None, false)?).to_json())
    }

    /// The stored current values of the set properties. This is what a
    /// watched child writes into its parent.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let state = self.state.borrow();
        Value::Map(
            state
                .properties
                .values()
                .filter(|p| !p.is_unset())
                .map(|p| (p.name().to_string(), p.get_export().clone()))
                .collect(),
        )
    }

    // ── extended properties ──────────────────────────────────────

    #[must_use]
    pub fn extended_property(&self, name: &str) -> Option<Value> {
        self.state.borrow().extended.get(name).cloned()
    }

    #[must_use]
    pub fn extended_properties(&self) -> Map {
        self.state.borrow().extended.clone()
    }

    /// Stores a value outside the schema. Not tracked, not exported.
    pub fn set_extended_property(&self, name: &str, value: impl Into<Value>) -> &Self {
        self.state
            .borrow_mut()
            .extended
            .insert(name.to_string(), value.into());
        self
    }

    // ── listeners ────────────────────────────────────────────────

    /// Registers a listener. Higher priorities run first; equal priorities
    /// run in registration order. A listener's error is logged and does not
    /// stop the others.
    pub fn attach(
        &self,
        notification: Notification,
        priority: i32,
        listener: impl Fn(&Event) -> Result<()> + 'static,
    ) -> ListenerId {
        self.state
            .borrow_mut()
            .listeners
            .attach(notification, priority, Rc::new(listener))
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn detach(&self, id: ListenerId) -> bool {
        self.state.borrow_mut().listeners.detach(id)
    }

    pub(crate) fn attach_sync(&self, notification: Notification, listener: Listener) -> ListenerId {
        self.state
            .borrow_mut()
            .listeners
            .attach_sync(notification, listener)
    }

    // ── watch ────────────────────────────────────────────────────

    #[must_use]
    pub fn watch_context(&self) -> Option<WatchContext> {
        self.state.borrow().watch.clone()
    }

    #[must_use]
    pub fn is_watched(&self) -> bool {
        self.state.borrow().watch.is_some()
    }

    /// Replaces the watch context. Returns true if the synchronization
    /// listeners were already installed.
    pub(crate) fn set_watch_context(&self, context: WatchContext) -> bool {
        let mut state = self.state.borrow_mut();
        state.watch = Some(context);
        state.listeners.has_sync()
    }
}

impl<'a> IntoIterator for &'a Entity {
    type Item = Property;
    type IntoIter = std::vec::IntoIter<Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.try_borrow() {
            Ok(state) => f
                .debug_struct("Entity")
                .field("schema", &state.schema.name)
                .field("properties", &state.properties.values().collect::<Vec<_>>())
                .field("extended", &state.extended)
                .field("watched", &state.watch.is_some())
                .finish(),
            Err(_) => f.write_str("Entity { <borrowed> }"),
        }
    }
}
