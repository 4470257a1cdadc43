//! Property-based tests for the property state machine.
//!
//! These check the invariants every property must keep regardless of the
//! order of operations applied to it:
//! - snapshots reconstruct an observationally identical property
//! - dirtiness is exactly "current differs from persisted"
//! - edits on a materialized child always reach the parent

mod common;

use common::{catalog, entity};
use propdoc_model::{Options, Property, Value};
use proptest::prelude::*;

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    Set(i64),
    Clear,
    SetEmpty,
    Clean,
    SetDirty,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<i64>().prop_map(Op::Set),
        1 => Just(Op::Clear),
        1 => Just(Op::SetEmpty),
        2 => Just(Op::Clean),
        1 => Just(Op::SetDirty),
    ]
}

fn apply(p: &mut Property, op: &Op) {
    match op {
        Op::Set(i) => p.set_value(*i),
        Op::Clear => p.clear(),
        Op::SetEmpty => p.set_empty(),
        Op::Clean => p.clean(),
        Op::SetDirty => p.set_dirty(),
    }
    .unwrap();
}

fn integer_property() -> Property {
    Property::new(catalog(), "n", "integer", Options::new()).unwrap()
}

// =============================================================================
// PROPERTY STATE MACHINE
// =============================================================================

proptest! {
    /// Round-trip: importing an export reproduces the property.
    #[test]
    fn export_import_reconstructs(ops in prop::collection::vec(op_strategy(), 0..12)) {
        let mut p = integer_property();
        for op in &ops {
            apply(&mut p, op);
        }

        let restored = Property::from_snapshot(catalog(), &p.export()).unwrap();
        prop_assert_eq!(restored.export(), p.export());
        prop_assert_eq!(restored.is_dirty(), p.is_dirty());
        prop_assert_eq!(restored.is_unset(), p.is_unset());
        prop_assert_eq!(restored.is_empty(), p.is_empty());
    }

    /// Dirty/clean duality for distinct values.
    #[test]
    fn distinct_values_are_dirty_until_cleaned(a in any::<i64>(), b in any::<i64>()) {
        prop_assume!(a != b);
        let mut p = integer_property();
        p.set_value(a).unwrap();
        p.clean().unwrap();
        p.set_value(b).unwrap();
        prop_assert!(p.is_dirty());
        p.clean().unwrap();
        prop_assert!(!p.is_dirty());
    }

    /// Clearing always lands on the unset sentinel; dirtiness then depends
    /// only on what was persisted.
    #[test]
    fn clear_reaches_unset(ops in prop::collection::vec(op_strategy(), 0..8)) {
        let mut p = integer_property();
        for op in &ops {
            apply(&mut p, op);
        }
        let persisted_was_unset = p.export().persisted_value == Some(Value::Unset);

        p.clear().unwrap();
        prop_assert!(p.is_unset());
        prop_assert_eq!(p.is_dirty(), !persisted_was_unset);
    }

    /// Setting the persisted value back never leaves the property dirty.
    #[test]
    fn returning_to_persisted_value_is_clean(a in any::<i64>(), b in any::<i64>()) {
        let mut p = integer_property();
        p.set_value(a).unwrap();
        p.clean().unwrap();
        p.set_value(b).unwrap();
        p.set_value(a).unwrap();
        prop_assert!(!p.is_dirty());
    }
}

// =============================================================================
// PROPAGATION
// =============================================================================

proptest! {
    /// Any edit on a nested view is reflected in the root's stored value.
    #[test]
    fn nested_edit_reaches_root(name in "[A-Za-z ]{1,16}", city in "[A-Za-z]{1,12}") {
        let user = entity(&catalog(), "user");
        user.clean().unwrap();

        let profile = user.get("profile").unwrap().into_entity().unwrap();
        profile.set("name", name.as_str()).unwrap();
        profile
            .get("address")
            .unwrap()
            .into_entity()
            .unwrap()
            .set("city", city.as_str())
            .unwrap();

        let stored = user.property("profile").unwrap().get_export().clone();
        let stored = stored.as_map().unwrap();
        prop_assert_eq!(stored.get("name"), Some(&Value::from(name)));
        let address = stored.get("address").and_then(Value::as_map).unwrap();
        prop_assert_eq!(address.get("city"), Some(&Value::from(city)));
        prop_assert_eq!(user.dirty(), vec!["profile".to_string()]);
    }
}
