//! Query key derivation
//!
//! A [`QueryKey`] is the ordered sequence the query client uses to identify a
//! cached entry: the accessor's path segments, optionally followed by its
//! variables as one opaque element.
//!
//! ```rust,ignore
//! use query_kit::derive_key;
//! use serde_json::json;
//!
//! assert_eq!(derive_key(&["todos"], None).as_slice(), &[json!("todos")]);
//! assert_eq!(
//!     derive_key(&["api", "users"], Some(json!({"id": 1}))).as_slice(),
//!     &[json!("api"), json!("users"), json!({"id": 1})],
//! );
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Separator used when a key path is rendered as a dotted string.
pub const DEFAULT_SEPARATOR: char = '.';

/// Custom hash function for query keys, handed to the query client untouched.
pub type KeyHashFn = Arc<dyn Fn(&QueryKey) -> String + Send + Sync>;

/// Ordered, structurally compared cache key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryKey(Vec<Value>);

impl QueryKey {
    /// Build a key made only of path segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            segments
                .into_iter()
                .map(|s| Value::String(s.as_ref().to_string()))
                .collect(),
        )
    }

    /// The key elements in order.
    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for the empty key.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the key into its elements.
    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }

    /// Returns true if `prefix` is an element-wise prefix of this key.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Returns true if this key is an element-wise prefix of `other`.
    pub fn is_prefix_of(&self, other: &QueryKey) -> bool {
        other.starts_with(self)
    }
}

impl From<Vec<Value>> for QueryKey {
    fn from(elements: Vec<Value>) -> Self {
        Self(elements)
    }
}

impl From<QueryKey> for Value {
    fn from(key: QueryKey) -> Self {
        Value::Array(key.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Array(self.0.clone()))
    }
}

/// Derive the key for `prefix` and optional `variables`.
///
/// Absent variables leave the key equal to the prefix; present variables,
/// including `{}` and `null`, are appended as a single element.
pub fn derive_key<S: AsRef<str>>(prefix: &[S], variables: Option<Value>) -> QueryKey {
    let mut elements: Vec<Value> = Vec::with_capacity(prefix.len() + 1);
    elements.extend(
        prefix
            .iter()
            .map(|s| Value::String(s.as_ref().to_string())),
    );
    if let Some(variables) = variables {
        elements.push(variables);
    }
    QueryKey(elements)
}

/// Stable string rendering of a key, usable as a lookup hash.
///
/// Object members are rendered in sorted order, so structurally equal keys
/// always hash to the same string.
pub fn default_key_hash(key: &QueryKey) -> String {
    key.to_string()
}

/// Path pattern for selecting accessors, e.g. for hierarchical invalidation.
///
/// Supports:
/// - Exact match: `"api.users.profile"` matches exactly that path
/// - Wildcard suffix: `"api.users.*"` matches `api.users` and everything below it
/// - Global wildcard: `"*"` matches every path
///
/// Patterns are matched against a path (the key prefix of an accessor or
/// namespace), not against a full key. Variables never take part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPattern {
    pattern: String,
}

impl KeyPattern {
    /// Create a pattern from its dotted form.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// Pattern selecting a path and everything below it.
    pub fn below<S: AsRef<str>>(path: &[S]) -> Self {
        Self::new(format!("{}.*", join_path(path)))
    }

    /// The pattern string.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Check the pattern against a path prefix.
    pub fn matches<S: AsRef<str>>(&self, path: &[S]) -> bool {
        pattern_matches(&self.pattern, &join_path(path))
    }
}

impl From<&str> for KeyPattern {
    fn from(pattern: &str) -> Self {
        Self::new(pattern)
    }
}

fn join_path<S: AsRef<str>>(path: &[S]) -> String {
    let mut out = String::new();
    for (i, segment) in path.iter().enumerate() {
        if i > 0 {
            out.push(DEFAULT_SEPARATOR);
        }
        out.push_str(segment.as_ref());
    }
    out
}

fn pattern_matches(pattern: &str, path: &str) -> bool {
    if pattern == "*" {
        return true;
    }

    if let Some(prefix) = pattern.strip_suffix(".*") {
        if path == prefix {
            return true;
        }

        return path.len() > prefix.len() + 1
            && path.starts_with(prefix)
            && path.as_bytes()[prefix.len()] == b'.';
    }

    pattern == path
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_variables_keep_prefix() {
        let key = derive_key(&["todos"], None);
        assert_eq!(key.as_slice(), &[json!("todos")]);
    }

    #[test]
    fn test_empty_object_is_present() {
        let absent = derive_key(&["todos"], None);
        let empty = derive_key(&["todos"], Some(json!({})));
        assert_eq!(empty.as_slice(), &[json!("todos"), json!({})]);
        assert_ne!(absent, empty);
    }

    #[test]
    fn test_null_is_present() {
        let key = derive_key(&["todos"], Some(Value::Null));
        assert_eq!(key.len(), 2);
    }

    #[test]
    fn test_variables_not_flattened() {
        let key = derive_key(&["a", "b"], Some(json!(["c", "d"])));
        assert_eq!(key.as_slice(), &[json!("a"), json!("b"), json!(["c", "d"])]);
    }

    #[test]
    fn test_key_converts_to_json_array() {
        let key = derive_key(&["api", "users"], Some(json!({"id": 1})));
        assert_eq!(Value::from(key), json!(["api", "users", {"id": 1}]));
    }

    #[test]
    fn test_prefix_relation() {
        let parent = QueryKey::from_segments(["api", "users"]);
        let child = derive_key(&["api", "users", "profile"], Some(json!({"id": 1})));
        assert!(child.starts_with(&parent));
        assert!(parent.is_prefix_of(&child));
        assert!(!parent.starts_with(&child));
    }

    #[test]
    fn test_default_hash_ignores_member_order() {
        let a = derive_key(&["k"], Some(json!({"a": 1, "b": 2})));
        let b = derive_key(&["k"], Some(serde_json::from_str(r#"{"b":2,"a":1}"#).unwrap()));
        assert_eq!(default_key_hash(&a), default_key_hash(&b));
        assert_eq!(default_key_hash(&a), r#"["k",{"a":1,"b":2}]"#);
    }

    #[test]
    fn test_pattern_matches_exact() {
        assert!(pattern_matches("user.get", "user.get"));
        assert!(!pattern_matches("user.get", "user.create"));
    }

    #[test]
    fn test_pattern_matches_wildcard() {
        assert!(pattern_matches("user.*", "user.get"));
        assert!(pattern_matches("user.*", "user"));
        assert!(!pattern_matches("user.*", "users.get"));
        assert!(!pattern_matches("user.*", "post.get"));
    }

    #[test]
    fn test_pattern_matches_global() {
        assert!(pattern_matches("*", "anything"));
    }

    #[test]
    fn test_key_pattern_below() {
        let pattern = KeyPattern::below(&["api", "users"]);
        assert_eq!(pattern.as_str(), "api.users.*");
        assert!(pattern.matches(&["api", "users", "list"]));
        assert!(pattern.matches(&["api", "users"]));
        assert!(!pattern.matches(&["api", "posts"]));
    }

    #[test]
    fn test_key_pattern_matches_path_only() {
        let users = ["api".to_string(), "users".to_string()];
        assert!(KeyPattern::new("api.users").matches(&users));
        assert!(!KeyPattern::new("api.users.profile").matches(&users));
    }
}
