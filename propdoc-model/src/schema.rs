use crate::types::Options;
use propdoc_types::Value;
use serde::{Deserialize, Serialize};

/// Declares an entity's fields, in declaration order.
///
/// Schemas are plain data so a catalog can be configured from JSON:
/// `{"name": "address", "fields": [{"name": "city", "type": "string"}]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    #[serde(default)]
    fields: Vec<FieldDef>,
}

/// One declared field: its name, type identifier and type options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Options::is_empty")]
    pub options: Options,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            options: Options::new(),
        }
    }

    /// Adds one type option.
    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Declares a field. Re-declaring a name replaces the earlier definition
    /// and moves it to the end.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.add_field(field);
        self
    }

    /// Shorthand for a field without options.
    pub fn field(self, name: &str, type_name: &str) -> Self {
        self.with_field(FieldDef::new(name, type_name))
    }

    /// Shorthand for a nested entity field.
    pub fn entity(self, name: &str, schema: &str) -> Self {
        self.with_field(FieldDef::new(name, "entity").with_option("entity", schema))
    }

    /// Shorthand for a list field of the given element type.
    pub fn list(self, name: &str, element_type: &str) -> Self {
        self.with_field(FieldDef::new(name, "list").with_option("type", element_type))
    }

    /// Shorthand for a cursor-backed list of nested entities.
    pub fn list_entity(self, name: &str, schema: &str) -> Self {
        self.with_field(FieldDef::new(name, "listentity").with_option("entity", schema))
    }

    pub fn add_field(&mut self, field: FieldDef) -> &mut Self {
        self.remove_field(&field.name);
        self.fields.push(field);
        self
    }

    pub fn remove_field(&mut self, name: &str) -> &mut Self {
        self.fields.retain(|f| f.name != name);
        self
    }

    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    #[must_use]
    pub fn field_def(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Declared fields, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Pulls in another schema's fields, which override same-named ones.
    pub fn extend(&mut self, other: &Schema) -> &mut Self {
        for field in &other.fields {
            self.add_field(field.clone());
        }
        self
    }
}
