mod common;

use common::{catalog, v};
use pretty_assertions::assert_eq;
use propdoc_model::{
    Catalog, Entity, Error, Options, Result, Schema, TypeKind, Value, ValueType,
};
use serde_json::json;
use std::rc::Rc;

fn resolve(name: &str) -> Rc<dyn ValueType> {
    catalog().resolve(name, &Options::new()).unwrap()
}

fn with_option(name: &str, key: &str, value: &str) -> Rc<dyn ValueType> {
    let options = Options::from_iter([(key.to_string(), Value::from(value))]);
    catalog().resolve(name, &options).unwrap()
}

// ── Resolution ───────────────────────────────────────────────────

#[test]
fn aliases_and_case_resolve_to_the_same_type() {
    assert_eq!(resolve("int").name(), "integer");
    assert_eq!(resolve("TEXT").name(), "string");
    assert_eq!(resolve("Bool").name(), "boolean");
    assert_eq!(resolve("float").name(), "double");
}

#[test]
fn unknown_type_is_rejected() {
    let err = catalog().resolve("decimal", &Options::new()).unwrap_err();
    assert!(matches!(err, Error::UnknownType(name) if name == "decimal"));
}

#[test]
fn entity_type_requires_a_defined_schema() {
    let err = catalog().resolve("entity", &Options::new()).unwrap_err();
    assert!(matches!(err, Error::MissingOption { option: "entity", .. }));

    let err = catalog()
        .resolve(
            "entity",
            &Options::from_iter([("entity".to_string(), Value::from("nope"))]),
        )
        .unwrap_err();
    assert!(matches!(err, Error::UnknownSchema(_)));
}

#[test]
fn kinds_drive_materialization() {
    assert_eq!(resolve("mixed").kind(), TypeKind::Scalar);
    assert_eq!(with_option("entity", "entity", "address").kind(), TypeKind::Entity);
    assert_eq!(resolve("list").kind(), TypeKind::List);
    assert_eq!(with_option("listentity", "entity", "address").kind(), TypeKind::ListEntity);
}

#[test]
fn empty_values_per_type() {
    assert_eq!(resolve("string").empty_value(), Value::from(""));
    assert_eq!(resolve("integer").empty_value(), Value::Int(0));
    assert_eq!(resolve("boolean").empty_value(), Value::Bool(false));
    assert_eq!(resolve("double").empty_value(), Value::Float(0.0));
    assert_eq!(resolve("mixed").empty_value(), Value::Null);
    assert_eq!(with_option("entity", "entity", "address").empty_value(), v(json!({})));
    assert_eq!(resolve("list").empty_value(), v(json!([])));
}

#[test]
fn every_type_has_unset_sentinel_and_fresh_dirty_markers() {
    for name in ["string", "integer", "boolean", "double", "mixed", "list"] {
        let ty = resolve(name);
        assert_eq!(ty.unset_value(), Value::Unset);
        assert_ne!(ty.dirty_value(), ty.dirty_value());
        assert_eq!(ty.parse(&Value::Null).unwrap(), Value::Unset, "{name}");
    }
}

// ── Scalar coercion ──────────────────────────────────────────────

#[test]
fn integer_coercion() {
    let ty = resolve("integer");
    assert_eq!(ty.parse(&Value::from("42")).unwrap(), Value::Int(42));
    assert_eq!(ty.parse(&Value::from(" 4.0 ")).unwrap(), Value::Int(4));
    assert_eq!(ty.parse(&Value::Float(3.0)).unwrap(), Value::Int(3));
    assert_eq!(ty.parse(&Value::Bool(true)).unwrap(), Value::Int(1));
    assert!(ty.parse(&Value::Float(3.5)).is_err());
    assert!(ty.parse(&Value::from("abc")).is_err());
    assert!(ty.parse(&v(json!([1]))).is_err());
}

#[test]
fn string_coercion() {
    let ty = resolve("string");
    assert_eq!(ty.parse(&Value::Int(5)).unwrap(), Value::from("5"));
    assert_eq!(ty.parse(&Value::Bool(true)).unwrap(), Value::from("true"));
    assert!(ty.parse(&v(json!({"a": 1}))).is_err());
}

#[test]
fn boolean_coercion() {
    let ty = resolve("boolean");
    assert_eq!(ty.parse(&Value::from("yes")).unwrap(), Value::Bool(true));
    assert_eq!(ty.parse(&Value::from("OFF")).unwrap(), Value::Bool(false));
    assert_eq!(ty.parse(&Value::from("")).unwrap(), Value::Bool(false));
    assert_eq!(ty.parse(&Value::Int(1)).unwrap(), Value::Bool(true));
    assert!(ty.parse(&Value::Int(2)).is_err());
    assert!(ty.parse(&Value::from("maybe")).is_err());
}

#[test]
fn double_coercion() {
    let ty = resolve("double");
    assert_eq!(ty.parse(&Value::from("1.5")).unwrap(), Value::Float(1.5));
    assert_eq!(ty.parse(&Value::Int(2)).unwrap(), Value::Float(2.0));
    assert!(ty.parse(&Value::Bool(true)).is_err());
}

#[test]
fn mixed_accepts_domain_values_but_not_markers() {
    let ty = resolve("mixed");
    let doc = v(json!({"a": [1, "b"]}));
    assert_eq!(ty.parse(&doc).unwrap(), doc);
    assert!(ty.parse(&Value::dirty()).is_err());
}

// ── Containers ───────────────────────────────────────────────────

#[test]
fn entity_parse_normalizes_declared_fields_only() {
    let ty = with_option("entity", "entity", "address");
    let parsed = ty
        .parse(&v(json!({"zip": 75001, "city": "Paris", "bogus": 1, "unused": null})))
        .unwrap();
    assert_eq!(parsed, v(json!({"city": "Paris", "zip": "75001"})));
    // Declaration order, not input order.
    let keys: Vec<_> = parsed.as_map().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec!["city", "zip"]);
}

#[test]
fn entity_parse_rejects_scalars() {
    let ty = with_option("entity", "entity", "address");
    let err = ty.parse(&Value::Int(1)).unwrap_err();
    assert!(matches!(err, Error::TypeCoercion { type_name, .. } if type_name == "entity<address>"));
}

#[test]
fn list_parse_coerces_elements() {
    let ty = with_option("list", "type", "integer");
    assert_eq!(ty.parse(&v(json!(["1", 2]))).unwrap(), v(json!([1, 2])));
    // Maps are read as their values, in order.
    assert_eq!(ty.parse(&v(json!({"x": "3"}))).unwrap(), v(json!([3])));
    assert!(ty.parse(&v(json!(["x"]))).is_err());
    assert_eq!(ty.inner().unwrap().name(), "integer");
}

#[test]
fn list_element_type_defaults_to_mixed() {
    assert_eq!(resolve("list").inner().unwrap().name(), "mixed");
}

#[test]
fn list_of_lists_bottoms_out() {
    let ty = with_option("list", "type", "list");
    let inner = ty.inner().unwrap();
    assert_eq!(inner.name(), "list");
    assert_eq!(inner.inner().unwrap().name(), "mixed");
}

#[test]
fn list_entity_exposes_its_schema() {
    let ty = with_option("listentity", "entity", "address");
    assert_eq!(ty.schema().unwrap().name, "address");
    assert_eq!(ty.inner().unwrap().kind(), TypeKind::Entity);
}

// ── Custom types ─────────────────────────────────────────────────

#[derive(Debug)]
struct UpperType {
    options: Options,
}

impl ValueType for UpperType {
    fn name(&self) -> &str {
        "upper"
    }

    fn parse(&self, raw: &Value) -> Result<Value> {
        match raw {
            Value::Unset | Value::Null => Ok(Value::Unset),
            Value::Text(s) => Ok(Value::Text(s.to_uppercase())),
            other => Err(Error::coercion("upper", other.kind_name())),
        }
    }

    fn empty_value(&self) -> Value {
        Value::from("")
    }

    fn options(&self) -> &Options {
        &self.options
    }
}

#[test]
fn custom_types_plug_into_entities() {
    let mut catalog = Catalog::new();
    catalog.register_type(
        "Upper",
        Rc::new(|_: &Rc<Catalog>, options: &Options| -> Result<Rc<dyn ValueType>> {
            Ok(Rc::new(UpperType {
                options: options.clone(),
            }))
        }),
    );
    catalog.define(Schema::new("code").field("value", "UPPER"));
    assert!(catalog.has_type("upper"));

    let catalog = Rc::new(catalog);
    let doc = Entity::new(&catalog, "code").unwrap();
    doc.set("value", "abc").unwrap();
    assert_eq!(doc.get("value").unwrap().into_value(), Some(Value::from("ABC")));
}
