use super::{Options, TypeKind, ValueType};
use crate::{Catalog, Schema};
use propdoc_types::{Error, Map, Result, Value};
use std::rc::Rc;

/// A nested document. Stored as the map of its set field exports, in
/// declaration order.
#[derive(Debug, Clone)]
pub struct EntityType {
    catalog: Rc<Catalog>,
    schema: Rc<Schema>,
    options: Options,
}

impl EntityType {
    #[must_use]
    pub fn new(catalog: Rc<Catalog>, schema: Rc<Schema>, options: Options) -> Self {
        Self {
            catalog,
            schema,
            options,
        }
    }
}

impl ValueType for EntityType {
    fn name(&self) -> &str {
        "entity"
    }

    fn kind(&self) -> TypeKind {
        TypeKind::Entity
    }

    fn parse(&self, raw: &Value) -> Result<Value> {
        let map = match raw {
            Value::Unset | Value::Null => return Ok(Value::Unset),
            Value::Map(map) => map,
            other => {
                return Err(Error::coercion(
                    format!("entity<{}>", self.schema.name),
                    format!("expected a map, got {}", other.kind_name()),
                ));
            }
        };

        let mut normalized = Map::new();
        for field in self.schema.fields() {
            let Some(raw) = map.get(&field.name) else {
                continue;
            };
            let ty = self.catalog.resolve(&field.type_name, &field.options)?;
            let value = ty.export(&ty.parse(raw)?)?;
            if !value.is_unset() {
                normalized.insert(field.name.clone(), value);
            }
        }
        Ok(Value::Map(normalized))
    }

    fn empty_value(&self) -> Value {
        Value::Map(Map::new())
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn schema(&self) -> Option<Rc<Schema>> {
        Some(self.schema.clone())
    }
}

fn parse_elements(type_name: &str, inner: &dyn ValueType, raw: &Value) -> Result<Value> {
    let items: Vec<&Value> = match raw {
        Value::Unset | Value::Null => return Ok(Value::Unset),
        Value::List(items) => items.iter().collect(),
        // Maps are read as lists of their values, in order.
        Value::Map(map) => map.values().collect(),
        other => {
            return Err(Error::coercion(
                type_name,
                format!("expected a list, got {}", other.kind_name()),
            ));
        }
    };

    items
        .into_iter()
        .map(|item| inner.parse(item).and_then(|parsed| inner.export(&parsed)))
        .collect::<Result<Vec<_>>>()
        .map(Value::List)
}

/// A list of values of one element type (option `type`, default `mixed`).
#[derive(Debug, Clone)]
pub struct ListType {
    inner: Rc<dyn ValueType>,
    options: Options,
}

impl ListType {
    #[must_use]
    pub fn new(inner: Rc<dyn ValueType>, options: Options) -> Self {
        Self { inner, options }
    }
}

impl ValueType for ListType {
    fn name(&self) -> &str {
        "list"
    }

    fn kind(&self) -> TypeKind {
        TypeKind::List
    }

    fn parse(&self, raw: &Value) -> Result<Value> {
        parse_elements(self.name(), self.inner.as_ref(), raw)
    }

    fn empty_value(&self) -> Value {
        Value::List(Vec::new())
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn inner(&self) -> Option<Rc<dyn ValueType>> {
        Some(self.inner.clone())
    }

    fn schema(&self) -> Option<Rc<Schema>> {
        self.inner.schema()
    }
}

/// A list of nested documents, read back through a lazy cursor.
#[derive(Debug, Clone)]
pub struct ListEntityType {
    inner: Rc<EntityType>,
    options: Options,
}

impl ListEntityType {
    #[must_use]
    pub fn new(inner: Rc<EntityType>, options: Options) -> Self {
        Self { inner, options }
    }
}

impl ValueType for ListEntityType {
    fn name(&self) -> &str {
        "listentity"
    }

    fn kind(&self) -> TypeKind {
        TypeKind::ListEntity
    }

    fn parse(&self, raw: &Value) -> Result<Value> {
        parse_elements(self.name(), self.inner.as_ref(), raw)
    }

    fn empty_value(&self) -> Value {
        Value::List(Vec::new())
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn inner(&self) -> Option<Rc<dyn ValueType>> {
        Some(self.inner.clone() as Rc<dyn ValueType>)
    }

    fn schema(&self) -> Option<Rc<Schema>> {
        Some(self.inner.schema.clone())
    }
}
