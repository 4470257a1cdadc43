mod common;

use pretty_assertions::assert_eq;
use propdoc_model::{Catalog, Entity, Error, FieldDef, Schema, Value};
use serde_json::json;
use std::rc::Rc;

fn names(schema: &Schema) -> Vec<&str> {
    schema.fields().map(|f| f.name.as_str()).collect()
}

// ── Builder ──────────────────────────────────────────────────────

#[test]
fn fields_keep_declaration_order() {
    let schema = Schema::new("contact")
        .field("name", "string")
        .field("age", "integer")
        .entity("home", "address");
    assert_eq!(names(&schema), vec!["name", "age", "home"]);
    assert_eq!(schema.len(), 3);
    assert!(!schema.is_empty());
}

#[test]
fn redeclaring_a_field_replaces_it_and_moves_it_last() {
    let schema = Schema::new("contact")
        .field("name", "string")
        .field("age", "integer")
        .field("name", "mixed");
    assert_eq!(names(&schema), vec!["age", "name"]);
    assert_eq!(schema.field_def("name").unwrap().type_name, "mixed");
}

#[test]
fn shorthands_set_type_options() {
    let schema = Schema::new("user")
        .list("tags", "string")
        .list_entity("addresses", "address");

    let tags = schema.field_def("tags").unwrap();
    assert_eq!(tags.type_name, "list");
    assert_eq!(tags.options.get("type"), Some(&Value::from("string")));

    let addresses = schema.field_def("addresses").unwrap();
    assert_eq!(addresses.type_name, "listentity");
    assert_eq!(addresses.options.get("entity"), Some(&Value::from("address")));
}

#[test]
fn remove_and_extend() {
    let mut base = Schema::new("base").field("id", "integer").field("note", "string");
    base.remove_field("note");
    assert!(!base.has_field("note"));

    let extra = Schema::new("extra")
        .field("id", "string")
        .field("created", "integer");
    base.extend(&extra);
    assert_eq!(names(&base), vec!["id", "created"]);
    assert_eq!(base.field_def("id").unwrap().type_name, "string");
}

// ── Configuration ────────────────────────────────────────────────

#[test]
fn schema_serializes_with_type_key() {
    let schema = Schema::new("address")
        .field("city", "string")
        .with_field(FieldDef::new("zip", "string").with_option("label", "Postcode"));
    let json = serde_json::to_value(&schema).unwrap();
    assert_eq!(
        json["fields"][1],
        json!({"name": "zip", "type": "string", "options": {"label": {"kind": "text", "value": "Postcode"}}})
    );
    assert!(json["fields"][0].get("options").is_none());
}

#[test]
fn catalog_loads_schemas_from_json() {
    let mut catalog = Catalog::new();
    catalog
        .load_schemas_json(
            r#"[
                {"name": "address", "fields": [{"name": "city", "type": "string"}]},
                {"name": "person", "fields": [
                    {"name": "name", "type": "string"},
                    {"name": "home", "type": "entity",
                     "options": {"entity": {"kind": "text", "value": "address"}}}
                ]}
            ]"#,
        )
        .unwrap();
    let catalog = Rc::new(catalog);

    let person = Entity::new(&catalog, "person").unwrap();
    assert_eq!(person.properties(true), vec!["name", "home"]);

    let home = person.get("home").unwrap().into_entity().unwrap();
    home.set("city", "Oslo").unwrap();
    assert_eq!(person.to_json().unwrap(), json!({"home": {"city": "Oslo"}}));
}

#[test]
fn malformed_schema_json_is_a_serialization_error() {
    let mut catalog = Catalog::new();
    let err = catalog.load_schemas_json("{not json").unwrap_err();
    assert!(matches!(err, Error::Serialization(_)));
}

#[test]
fn schemas_may_be_defined_after_referencing_schemas() {
    let mut catalog = Catalog::new();
    catalog.define(Schema::new("outer").entity("inner", "inner"));
    catalog.define(Schema::new("inner").field("x", "integer"));
    let catalog = Rc::new(catalog);

    let outer = Entity::new(&catalog, "outer").unwrap();
    outer.set("inner", common::v(json!({"x": "5"}))).unwrap();
    assert_eq!(outer.to_json().unwrap(), json!({"inner": {"x": 5}}));
}
