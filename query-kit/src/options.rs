//! Hook options
//!
//! [`HookOptions`] is the option object that travels through a middleware
//! chain into the query client. It is an open JSON map: the kit only reads a
//! handful of well-known keys (see the constants below) and forwards every
//! other key to the client untouched.
//!
//! Options from several sources are combined with [`HookOptions::merge`], a
//! shallow right-biased merge: top-level keys of the right side replace those
//! of the left side, nested objects are not merged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Variables of the call; appended to the query key.
pub const VARIABLES: &str = "variables";
/// Whether the client should run the query at all.
pub const ENABLED: &str = "enabled";
/// Suspend instead of returning a pending state.
pub const SUSPENSE: &str = "suspense";
/// Surface errors to the nearest failure boundary.
pub const THROW_ON_ERROR: &str = "throw_on_error";
/// Legacy spelling of [`THROW_ON_ERROR`] kept for older clients.
pub const USE_ERROR_BOUNDARY: &str = "use_error_boundary";
/// Resolved key of a query, as reported by `get_options`.
pub const QUERY_KEY: &str = "query_key";
/// Hash of the resolved query key, as reported by `get_options`.
pub const QUERY_KEY_HASH: &str = "query_key_hash";
/// Resolved key of a mutation, as reported by `get_options`.
pub const MUTATION_KEY: &str = "mutation_key";

/// Shallow-mergeable option map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HookOptions(Map<String, Value>);

impl HookOptions {
    /// Create an empty option map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, consuming and returning self.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Set the call variables.
    #[must_use]
    pub fn with_variables(self, variables: impl Into<Value>) -> Self {
        self.with(VARIABLES, variables)
    }

    /// Set `key` to `value` in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Serialize `value` and set it under `key`.
    ///
    /// On failure the map is left unchanged.
    pub fn try_set<T: Serialize + ?Sized>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> serde_json::Result<()> {
        let value = serde_json::to_value(value)?;
        self.0.insert(key.into(), value);
        Ok(())
    }

    /// Remove `key`, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Look up a raw value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Look up a boolean value.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// Returns true if `key` is present, even when it holds `null`.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// The variables entry, if present.
    pub fn variables(&self) -> Option<&Value> {
        self.get(VARIABLES)
    }

    /// The `enabled` flag, if present.
    pub fn enabled(&self) -> Option<bool> {
        self.get_bool(ENABLED)
    }

    /// The `suspense` flag, if present.
    pub fn suspense(&self) -> Option<bool> {
        self.get_bool(SUSPENSE)
    }

    /// The `throw_on_error` flag, if present.
    pub fn throw_on_error(&self) -> Option<bool> {
        self.get_bool(THROW_ON_ERROR)
    }

    /// Shallow right-biased merge: every top-level key of `other` replaces
    /// the key of the same name in `self`.
    pub fn merge(&mut self, other: &HookOptions) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Owned variant of [`merge`](Self::merge).
    #[must_use]
    pub fn merged(mut self, other: &HookOptions) -> Self {
        self.merge(other);
        self
    }

    /// Number of top-level keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no key is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the top-level entries.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into the underlying map.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for HookOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for HookOptions {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The fixed overlay that turns a regular query into a suspense query.
///
/// Applied on top of the merged options, so these four keys always win.
pub fn suspense_options() -> HookOptions {
    HookOptions::new()
        .with(ENABLED, true)
        .with(SUSPENSE, true)
        .with(THROW_ON_ERROR, true)
        .with(USE_ERROR_BOUNDARY, true)
}
