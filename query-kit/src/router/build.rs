//! Router construction
//!
//! Walks a [`RouterDef`] depth first, assigning every entry the path of its
//! parent plus its own name, and builds the matching accessor at each leaf.

use super::def::{RouterDef, RouterEntry};
use super::node::{InfiniteQueryLeaf, MutationLeaf, QueryLeaf, RouterChild, RouterNode};
use crate::accessor::{InfiniteQueryAccessor, MutationAccessor, QueryAccessor};
use crate::config::KitConfig;
use crate::error::{ConfigError, ConfigResult};
use std::collections::BTreeMap;

/// Build a router under `scope` with the default configuration.
///
/// # Example
/// ```rust,ignore
/// let api = router("api", RouterDef::new()
///     .namespace("users", RouterDef::new()
///         .query("profile", QueryDef::new(fetch_profile))))?;
///
/// let profile = api.node("users").and_then(|users| users.query("profile")).unwrap();
/// assert_eq!(profile.get_key(Some(json!({"id": 1}))).len(), 4);
/// ```
pub fn router(scope: impl Into<String>, def: RouterDef) -> ConfigResult<RouterNode> {
    router_with_config(scope, def, &KitConfig::default())
}

/// Build a router under `scope` with an explicit configuration
pub fn router_with_config(
    scope: impl Into<String>,
    def: RouterDef,
    config: &KitConfig,
) -> ConfigResult<RouterNode> {
    config
        .validate()
        .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;

    let scope = scope.into();
    if scope.is_empty() {
        return Err(ConfigError::EmptyPrimaryKey);
    }
    if config.validate_segments {
        validate_segment(&scope)?;
    }

    let builder = Builder { config };
    let node = builder.build_node(vec![scope], def)?;

    tracing::debug!(
        scope = %node.path().join("."),
        leaves = node.leaves().len(),
        "Router built"
    );
    Ok(node)
}

/// Check a segment name against `[A-Za-z0-9_-]`
pub fn validate_segment(segment: &str) -> ConfigResult<()> {
    if let Some(invalid) = segment
        .chars()
        .find(|&ch| !ch.is_ascii_alphanumeric() && ch != '_' && ch != '-')
    {
        return Err(ConfigError::InvalidSegment {
            segment: segment.to_string(),
            invalid,
        });
    }
    Ok(())
}

struct Builder<'a> {
    config: &'a KitConfig,
}

impl Builder<'_> {
    fn build_node(&self, path: Vec<String>, def: RouterDef) -> ConfigResult<RouterNode> {
        let mut children = BTreeMap::new();

        for (name, entry) in def.into_entries() {
            let child_path = self.child_path(&path, &name)?;
            if children.contains_key(&name) {
                return Err(ConfigError::DuplicateEntry {
                    parent: path.join("."),
                    name,
                });
            }
            let child = self.build_entry(child_path, entry)?;
            children.insert(name, child);
        }

        Ok(RouterNode::new(path, children))
    }

    fn child_path(&self, parent: &[String], name: &str) -> ConfigResult<Vec<String>> {
        if name.is_empty() {
            return Err(ConfigError::EmptySegment {
                parent: parent.join("."),
            });
        }
        if self.config.validate_segments {
            validate_segment(name)?;
        }

        let mut path = parent.to_vec();
        path.push(name.to_string());

        // the scope itself does not count towards the depth
        if path.len() - 1 > self.config.max_depth {
            return Err(ConfigError::TooDeep {
                path: path.join("."),
                max_depth: self.config.max_depth,
            });
        }
        Ok(path)
    }

    fn build_entry(&self, path: Vec<String>, entry: RouterEntry) -> ConfigResult<RouterChild> {
        let child = match entry {
            RouterEntry::Namespace(def) => {
                return Ok(RouterChild::Namespace(self.build_node(path, def)?));
            }
            RouterEntry::Query(def) => {
                RouterChild::Query(QueryLeaf::new(QueryAccessor::from_def(path, def)?))
            }
            RouterEntry::InfiniteQuery(def) => RouterChild::InfiniteQuery(InfiniteQueryLeaf::new(
                InfiniteQueryAccessor::from_def(path, def)?,
            )),
            RouterEntry::Mutation(def) => {
                RouterChild::Mutation(MutationLeaf::new(MutationAccessor::from_def(path, def)))
            }
        };

        if self.config.debug_logging {
            if let Some(kind) = child.kind() {
                tracing::debug!(
                    path = %child.path().join("."),
                    kind = %kind,
                    "Accessor registered"
                );
            }
        }
        Ok(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_segment() {
        assert!(validate_segment("users").is_ok());
        assert!(validate_segment("user_profile-v2").is_ok());
        assert_eq!(
            validate_segment("a.b"),
            Err(ConfigError::InvalidSegment {
                segment: "a.b".to_string(),
                invalid: '.'
            })
        );
        assert!(validate_segment("has space").is_err());
    }

    #[test]
    fn test_empty_scope() {
        assert_eq!(
            router("", RouterDef::new()).unwrap_err(),
            ConfigError::EmptyPrimaryKey
        );
    }

    #[test]
    fn test_invalid_config() {
        let config = KitConfig::new().with_max_depth(0);
        let err = router_with_config("api", RouterDef::new(), &config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig(_)));
    }

    #[test]
    fn test_empty_router() {
        let node = router("api", RouterDef::new()).unwrap();
        assert!(node.is_empty());
        assert_eq!(node.get_key(), crate::QueryKey::from_segments(["api"]));
    }

    #[test]
    fn test_too_deep() {
        let config = KitConfig::new().with_max_depth(2);
        let def = RouterDef::new().namespace(
            "a",
            RouterDef::new().namespace("b", RouterDef::new().namespace("c", RouterDef::new())),
        );
        let err = router_with_config("api", def, &config).unwrap_err();
        assert_eq!(
            err,
            ConfigError::TooDeep {
                path: "api.a.b.c".to_string(),
                max_depth: 2
            }
        );
    }

    #[test]
    fn test_segment_validation_can_be_disabled() {
        let config = KitConfig::new().with_segment_validation(false);
        let node = router_with_config("my api", RouterDef::new(), &config).unwrap();
        assert_eq!(node.path(), &["my api".to_string()]);
    }
}
