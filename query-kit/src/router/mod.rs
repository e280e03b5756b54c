//! Namespaced accessors
//!
//! A router turns a declarative tree of definitions into a tree of accessors
//! whose keys follow the tree: a query declared at `users.profile` under the
//! scope `api` gets the key prefix `["api", "users", "profile"]`.
//!
//! ```rust,ignore
//! use query_kit::prelude::*;
//!
//! let api = router("api", RouterDef::new()
//!     .namespace("users", RouterDef::new()
//!         .query("profile", QueryDef::new(fetch_profile))
//!         .mutation("rename", MutationDef::new(rename_user))))?;
//!
//! let users = api.node("users").unwrap();
//! let profile = users.query("profile").unwrap();
//!
//! // keys for prefetching and invalidation
//! let key = profile.get_key(Some(json!({"id": 1})));
//! let everything_below_users = users.get_key();
//!
//! // calls
//! let data = profile.use_query(&client, CallOptions::new().with_variables(json!({"id": 1}))).await?;
//! ```

mod build;
mod def;
mod node;

pub use build::{router, router_with_config, validate_segment};
pub use def::{RouterDef, RouterEntry, infinite_query, mutation, namespace, query};
pub use node::{InfiniteQueryLeaf, MutationLeaf, QueryLeaf, RouterChild, RouterNode};
