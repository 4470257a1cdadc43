//! Shared fixtures for propdoc-model tests.

#![allow(dead_code)]

use propdoc_model::{Catalog, Entity, FieldDef, Schema, Value};
use std::rc::Rc;

/// Routes `tracing` output to the test harness. Set `RUST_LOG=propdoc_model=trace`
/// to see propagation steps.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A catalog with a small nested document model:
///
/// - `setting`: flat scalars
/// - `address`: leaf document
/// - `profile`: embeds an `address` and a list of tags
/// - `user`: embeds a `profile`, a cursor of addresses and an eager list of
///   address documents
pub fn catalog() -> Rc<Catalog> {
    init_tracing();
    let mut catalog = Catalog::new();
    catalog
        .define(
            Schema::new("setting")
                .field("value", "mixed")
                .field("label", "string")
                .with_field(FieldDef::new("count", "integer").with_option("defaultValue", 7))
                .field("enabled", "boolean"),
        )
        .define(Schema::new("address").field("city", "string").field("zip", "string"))
        .define(
            Schema::new("profile")
                .field("name", "string")
                .entity("address", "address")
                .list("tags", "string"),
        )
        .define(
            Schema::new("user")
                .field("id", "integer")
                .entity("profile", "profile")
                .list_entity("addresses", "address")
                .with_field(
                    FieldDef::new("contacts", "list")
                        .with_option("type", "entity")
                        .with_option("entity", "address"),
                ),
        );
    Rc::new(catalog)
}

pub fn entity(catalog: &Rc<Catalog>, schema: &str) -> Entity {
    Entity::new(catalog, schema).unwrap()
}

/// Builds a `Value` from JSON.
pub fn v(json: serde_json::Value) -> Value {
    Value::from(json)
}

/// Reads a field of a nested document snapshot.
pub fn field<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    value.as_map().and_then(|m| m.get(name))
}
