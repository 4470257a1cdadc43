//! Property-based tests for `Value` slot handling and sentinel stripping.

use propdoc_types::{Index, Value};
use proptest::prelude::*;

fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        "[a-z]{0,8}".prop_map(Value::Text),
    ]
}

fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            prop::collection::vec(("[a-z]{1,4}", inner), 0..4)
                .prop_map(|entries| Value::Map(entries.into_iter().collect())),
        ]
    })
}

proptest! {
    /// Values built from domain input carry no sentinels to strip.
    #[test]
    fn without_dirty_is_identity_on_domain_values(value in value_strategy()) {
        prop_assert_eq!(value.without_dirty(), value);
    }

    /// Stripping twice is the same as stripping once.
    #[test]
    fn without_dirty_is_idempotent(value in value_strategy()) {
        let mut marked = Value::List(vec![value, Value::dirty()]);
        marked.insert_slot(&Index::Position(3), Value::dirty());
        let once = marked.without_dirty();
        prop_assert_eq!(once.without_dirty(), once);
    }

    /// A slot written by key reads back the same value.
    #[test]
    fn inserted_key_reads_back(key in "[a-z]{1,6}", value in value_strategy()) {
        let mut doc = Value::Unset;
        let index = Index::from(key.as_str());
        doc.insert_slot(&index, value.clone());
        prop_assert_eq!(doc.slot(&index), Some(&value));
    }

    /// Removing an inserted key restores the map's previous contents.
    #[test]
    fn insert_then_remove_restores_map(
        entries in prop::collection::vec(("[a-m]{1,4}", scalar_strategy()), 0..5),
        value in scalar_strategy(),
    ) {
        let original = Value::Map(entries.into_iter().collect());
        let index = Index::from("zz");
        let mut doc = original.clone();
        doc.insert_slot(&index, value);
        doc.remove_slot(&index);
        prop_assert_eq!(doc, original);
    }
}
