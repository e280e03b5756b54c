//! Key derivation properties

use crate::key::{KeyPattern, QueryKey, default_key_hash, derive_key};
use proptest::prelude::*;
use serde_json::{Value, json};

fn segments() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z][a-z0-9_]{0,8}", 1..5)
}

fn variables() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-z]{0,6}".prop_map(|s| json!(s)),
        (any::<u32>(), "[a-z]{1,4}").prop_map(|(id, tag)| json!({"id": id, "tag": tag})),
        prop::collection::vec(any::<u8>(), 0..4).prop_map(|v| json!(v)),
    ]
}

proptest! {
    /// The same prefix and variables always give the same key
    #[test]
    fn prop_derive_key_deterministic(prefix in segments(), vars in proptest::option::of(variables())) {
        let a = derive_key(&prefix, vars.clone());
        let b = derive_key(&prefix, vars);
        prop_assert_eq!(default_key_hash(&a), default_key_hash(&b));
        prop_assert_eq!(a, b);
    }

    /// Different variables under one prefix give different keys
    #[test]
    fn prop_distinct_variables_distinct_keys(prefix in segments(), v1 in variables(), v2 in variables()) {
        prop_assume!(v1 != v2);
        prop_assert_ne!(derive_key(&prefix, Some(v1)), derive_key(&prefix, Some(v2)));
    }

    /// Present variables add exactly one element, never flattened
    #[test]
    fn prop_variables_are_one_element(prefix in segments(), vars in variables()) {
        let bare = derive_key(&prefix, None);
        let key = derive_key(&prefix, Some(vars.clone()));
        prop_assert_eq!(bare.len(), prefix.len());
        prop_assert_eq!(key.len(), prefix.len() + 1);
        prop_assert_eq!(key.as_slice().last(), Some(&vars));
        prop_assert!(bare.is_prefix_of(&key));
    }

    /// Every path below a path matches the wildcard pattern of that path
    #[test]
    fn prop_wildcard_matches_descendants(
        parent in segments(),
        extra in prop::collection::vec("[a-z]{1,6}", 0..3),
    ) {
        let mut child = parent.clone();
        child.extend(extra);
        prop_assert!(KeyPattern::below(&parent).matches(&child));
        prop_assert!(KeyPattern::new(child.join(".")).matches(&child));
    }

    /// A string variable never reads as an extra path segment
    #[test]
    fn prop_string_variables_never_match(path in segments(), var in "[a-z]{1,6}") {
        let key = derive_key(&path, Some(json!(var.clone())));
        prop_assert_eq!(key.len(), path.len() + 1);
        let mut deeper = path.clone();
        deeper.push(var);
        prop_assert!(!KeyPattern::new(deeper.join(".")).matches(&path));
    }
}

#[test]
fn test_absent_and_empty_variables_differ() {
    let absent = derive_key(&["todos"], None);
    let empty = derive_key(&["todos"], Some(json!({})));
    assert_ne!(absent, empty);
    assert_eq!(absent.as_slice(), &[json!("todos")]);
    assert_eq!(empty.as_slice(), &[json!("todos"), json!({})]);
}

#[test]
fn test_key_serializes_as_array() {
    let key = derive_key(&["api", "users"], Some(json!({"id": 1})));
    assert_eq!(
        serde_json::to_value(&key).unwrap(),
        json!(["api", "users", {"id": 1}])
    );
    let back: QueryKey = serde_json::from_value(json!(["api", "users", {"id": 1}])).unwrap();
    assert_eq!(back, key);
}
