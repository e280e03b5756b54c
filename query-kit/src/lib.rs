//! # query-kit
//!
//! Typed, composable remote-data accessors over an external query client.
//!
//! ## Overview
//!
//! query-kit does not fetch, cache or retry anything by itself. It builds
//! *accessors* (queries, paginated "infinite" queries and mutations) that:
//!
//! - derive a stable hierarchical cache key from their position and variables
//! - run a chain of middleware before delegating to the query client
//! - expose introspection (`get_key`, `get_primary_key`, `get_fetch_options`,
//!   `get_options`) so other code can prefetch or invalidate without
//!   re-declaring keys
//!
//! ## Architecture
//!
//! ```text
//! RouterDef ──router()──▶ RouterNode ──▶ QueryLeaf / InfiniteQueryLeaf / MutationLeaf
//!                                              │
//!                                              ▼  call(client, CallOptions)
//!                       client defaults ++ definition ++ call middleware
//!                                              │
//!                                              ▼
//!                       QueryClient::execute / execute_infinite / execute_mutation
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use query_kit::prelude::*;
//! use serde_json::json;
//!
//! async fn fetch_profile(vars: ProfileVars, _ctx: FetchContext) -> QueryResult<Profile> {
//!     api::profile(vars.id).await
//! }
//!
//! let api = router("api", RouterDef::new()
//!     .namespace("users", RouterDef::new()
//!         .query("profile", QueryDef::new(fetch_profile))))?;
//!
//! let profile = api.at("users.profile").and_then(RouterChild::as_query).unwrap();
//! assert_eq!(
//!     profile.get_key(Some(json!({"id": 1}))).as_slice(),
//!     &[json!("api"), json!("users"), json!("profile"), json!({"id": 1})],
//! );
//!
//! let client = ClientContext::new(MyQueryClient::default());
//! let data = profile
//!     .use_query(&client, CallOptions::new().with_variables(json!({"id": 1})))
//!     .await?;
//! ```
//!
//! ## Middleware
//!
//! Middleware wraps the call operation. For one call the order is: the
//! client's defaults for the accessor kind (outermost), the definition's
//! middleware, then the middleware passed with the call (innermost).
//!
//! ```rust,ignore
//! let timing = from_fn(|client, req, next| async move {
//!     let start = std::time::Instant::now();
//!     let result = next(client, req).await;
//!     tracing::info!(elapsed = ?start.elapsed(), "done");
//!     result
//! });
//! ```

mod accessor;
mod chain;
mod client;
mod config;
mod context;
mod error;
mod handler;
mod key;
pub mod logging;
pub mod middleware;
pub mod options;
mod router;
mod signal;

#[cfg(test)]
mod tests;

pub use accessor::{
    CallOptions, InfiniteQueryAccessor, InfiniteQueryDef, MutationAccessor, MutationDef,
    QueryAccessor, QueryDef, create_infinite_query, create_mutation, create_query,
    create_suspense_infinite_query, create_suspense_query,
};
pub use chain::{MiddlewareSources, Resolved, build_middleware_chain, merge_options, resolve};
pub use client::{
    DefaultMiddleware, InfiniteQueryRequest, MutationId, MutationRequest, PageParams,
    QueryClient, QueryRequest,
};
pub use config::{ConfigValidationError, DEFAULT_MAX_DEPTH, KitConfig};
pub use context::ClientContext;
pub use error::{ConfigError, ConfigResult, QueryError, QueryErrorCode, QueryResult};
pub use handler::{
    FetchContext, Fetcher, MutateFn, MutationContext, MutationFn, PageContext, PageParamFn,
    QueryFn, into_fetcher, into_mutation_fn, page_param_fn,
};
pub use key::{DEFAULT_SEPARATOR, KeyHashFn, KeyPattern, QueryKey, default_key_hash, derive_key};
pub use logging::{LogConfig, LogLevel, RequestId, logging_middleware};
pub use middleware::{
    AccessorKind, DefaultsScope, Middleware, MiddlewareRef, Next, Request, Response, from_fn,
    map_options,
};
pub use options::{HookOptions, suspense_options};
pub use router::{
    InfiniteQueryLeaf, MutationLeaf, QueryLeaf, RouterChild, RouterDef, RouterEntry, RouterNode,
    infinite_query, mutation, namespace, query, router, router_with_config, validate_segment,
};
pub use signal::AbortSignal;

/// Prelude for convenient imports
///
/// ```rust,ignore
/// use query_kit::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        AbortSignal, AccessorKind, CallOptions, ClientContext, ConfigError, ConfigResult,
        DefaultMiddleware, DefaultsScope, FetchContext, HookOptions, InfiniteQueryDef,
        InfiniteQueryRequest, KeyPattern, KitConfig, LogConfig, Middleware, MiddlewareRef,
        MutationContext, MutationDef, MutationRequest, Next, PageContext, QueryClient, QueryDef,
        QueryError, QueryErrorCode, QueryKey, QueryRequest, QueryResult, Request, Response,
        RouterChild, RouterDef, RouterNode, derive_key, from_fn, logging_middleware, router,
        router_with_config,
    };
}
