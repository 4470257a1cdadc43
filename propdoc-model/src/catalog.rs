//! Type and schema registry.
//!
//! Every type identifier a property carries is resolved here, together with
//! the property's options, into a [`ValueType`]. Entity-backed types look up
//! their child [`Schema`] by name, so schemas may refer to each other (or to
//! themselves) in any order.

use crate::Schema;
use crate::types::{
    BooleanType, DoubleType, EntityType, IntegerType, ListEntityType, ListType, MixedType,
    Options, StringType, ValueType,
};
use propdoc_types::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Builds a type from the catalog and a property's options.
pub type TypeFactory = Rc<dyn Fn(&Rc<Catalog>, &Options) -> Result<Rc<dyn ValueType>>>;

/// Registry of value types and entity schemas.
///
/// Built mutably, then shared behind an `Rc` by every entity and property
/// created from it.
pub struct Catalog {
    types: HashMap<String, TypeFactory>,
    schemas: HashMap<String, Rc<Schema>>,
}

impl Catalog {
    /// Creates a catalog with the built-in types registered.
    #[must_use]
    pub fn new() -> Self {
        let mut catalog = Self::empty();
        catalog.register_builtins();
        catalog
    }

    /// Creates a catalog with no types at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
            schemas: HashMap::new(),
        }
    }

    fn register_builtins(&mut self) {
        self.register_scalar(&["string", "text"], |o| Rc::new(StringType::new(o)));
        self.register_scalar(&["integer", "int"], |o| Rc::new(IntegerType::new(o)));
        self.register_scalar(&["double", "float"], |o| Rc::new(DoubleType::new(o)));
        self.register_scalar(&["boolean", "bool"], |o| Rc::new(BooleanType::new(o)));
        self.register_scalar(&["mixed"], |o| Rc::new(MixedType::new(o)));

        self.register_type(
            "entity",
            Rc::new(
                |catalog: &Rc<Catalog>, options: &Options| -> Result<Rc<dyn ValueType>> {
                    Ok(Rc::new(entity_type(catalog, "entity", options)?))
                },
            ),
        );
        self.register_type(
            "list",
            Rc::new(
                |catalog: &Rc<Catalog>, options: &Options| -> Result<Rc<dyn ValueType>> {
                    let element = options
                        .get("type")
                        .and_then(|v| v.as_str())
                        .unwrap_or("mixed");
                    // The element type must not see the list's own `type`
                    // option, or a list of lists would never bottom out.
                    let mut element_options = options.clone();
                    element_options.shift_remove("type");
                    let inner = catalog.resolve(element, &element_options)?;
                    Ok(Rc::new(ListType::new(inner, options.clone())))
                },
            ),
        );
        self.register_type(
            "listentity",
            Rc::new(
                |catalog: &Rc<Catalog>, options: &Options| -> Result<Rc<dyn ValueType>> {
                    let inner = entity_type(catalog, "listentity", options)?;
                    Ok(Rc::new(ListEntityType::new(Rc::new(inner), options.clone())))
                },
            ),
        );
    }

    fn register_scalar(&mut self, names: &[&str], build: fn(Options) -> Rc<dyn ValueType>) {
        for name in names {
            self.register_type(
                name,
                Rc::new(
                    move |_: &Rc<Catalog>, options: &Options| -> Result<Rc<dyn ValueType>> {
                        Ok(build(options.clone()))
                    },
                ),
            );
        }
    }

    /// Registers (or replaces) a type under an identifier. Identifiers are
    /// case-insensitive.
    pub fn register_type(&mut self, name: &str, factory: TypeFactory) -> &mut Self {
        self.types.insert(name.to_ascii_lowercase(), factory);
        self
    }

    #[must_use]
    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(&name.to_ascii_lowercase())
    }

    /// Defines (or redefines) a schema under its name.
    pub fn define(&mut self, schema: Schema) -> &mut Self {
        debug!(schema = %schema.name, fields = schema.len(), "Schema defined");
        self.schemas.insert(schema.name.clone(), Rc::new(schema));
        self
    }

    /// Defines every schema in a JSON array of schema objects.
    pub fn load_schemas_json(&mut self, json: &str) -> Result<&mut Self> {
        let schemas: Vec<Schema> = serde_json::from_str(json)?;
        for schema in schemas {
            self.define(schema);
        }
        Ok(self)
    }

    pub fn schema(&self, name: &str) -> Result<Rc<Schema>> {
        self.schemas
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownSchema(name.to_string()))
    }

    /// Resolves a type identifier with the given options.
    pub fn resolve(self: &Rc<Self>, name: &str, options: &Options) -> Result<Rc<dyn ValueType>> {
        let factory = self
            .types
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| Error::UnknownType(name.to_string()))?;
        factory(self, options)
    }
}

fn entity_type(catalog: &Rc<Catalog>, type_name: &str, options: &Options) -> Result<EntityType> {
    let schema_name = options
        .get("entity")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::MissingOption {
            type_name: type_name.to_string(),
            option: "entity",
        })?;
    let schema = catalog.schema(schema_name)?;
    Ok(EntityType::new(catalog.clone(), schema, options.clone()))
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.types.keys().collect();
        types.sort();
        let mut schemas: Vec<_> = self.schemas.keys().collect();
        schemas.sort();
        f.debug_struct("Catalog")
            .field("types", &types)
            .field("schemas", &schemas)
            .finish()
    }
}
