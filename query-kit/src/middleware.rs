//! Middleware support for accessor calls
//!
//! Every accessor call runs through a single operation signature, [`Next`]:
//! it takes the client handle and a [`Request`] and resolves to the client's
//! response. A [`Middleware`] wraps one `Next` into another `Next` of the same
//! signature, so interceptors compose by plain function composition.

use crate::key::{QueryKey, derive_key};
use crate::options::HookOptions;
use crate::{ClientContext, QueryResult};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

/// Kind of accessor being called
#[derive(Clone, Debug, PartialEq, Eq, Hash, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum AccessorKind {
    /// Single result set query
    Query,
    /// Paginated query fetching one page per cursor
    InfiniteQuery,
    /// Side-effecting action
    Mutation,
}

impl AccessorKind {
    /// Scope of the client's default-middleware registry this kind reads.
    ///
    /// Both query kinds share the `queries` scope.
    pub fn defaults_scope(&self) -> DefaultsScope {
        match self {
            Self::Query | Self::InfiniteQuery => DefaultsScope::Queries,
            Self::Mutation => DefaultsScope::Mutations,
        }
    }
}

impl std::fmt::Display for AccessorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::InfiniteQuery => write!(f, "infinite_query"),
            Self::Mutation => write!(f, "mutation"),
        }
    }
}

/// Section of the default-middleware registry
#[derive(Clone, Debug, PartialEq, Eq, Hash, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultsScope {
    /// Defaults for queries and infinite queries
    Queries,
    /// Defaults for mutations
    Mutations,
}

/// Call information passed through the middleware chain
#[derive(Clone, Debug)]
pub struct Request {
    kind: AccessorKind,
    prefix: Arc<[String]>,
    /// Merged options; middleware may rewrite them before calling `next`
    pub options: HookOptions,
}

impl Request {
    /// Create a request for the accessor at `prefix`
    pub fn new(kind: AccessorKind, prefix: Arc<[String]>, options: HookOptions) -> Self {
        Self {
            kind,
            prefix,
            options,
        }
    }

    /// Kind of the accessor being called
    pub fn kind(&self) -> AccessorKind {
        self.kind
    }

    /// Key prefix of the accessor
    pub fn prefix(&self) -> &[String] {
        &self.prefix
    }

    /// Dotted form of the key prefix (e.g. `"api.users.profile"`)
    pub fn path(&self) -> String {
        self.prefix.join(".")
    }

    /// First prefix segment
    pub fn primary_key(&self) -> &str {
        self.prefix.first().map(String::as_str).unwrap_or_default()
    }

    /// Key the request currently resolves to.
    ///
    /// Mutation keys never include variables.
    pub fn key(&self) -> QueryKey {
        match self.kind {
            AccessorKind::Mutation => derive_key(&self.prefix[..], None),
            _ => derive_key(&self.prefix[..], self.options.variables().cloned()),
        }
    }
}

/// Response type (JSON value)
pub type Response = serde_json::Value;

/// Operation in the middleware chain
pub type Next =
    Arc<dyn Fn(ClientContext, Request) -> BoxFuture<'static, QueryResult<Response>> + Send + Sync>;

/// Interceptor wrapping one operation into another of the same signature
pub trait Middleware: Send + Sync {
    /// Wrap `next`, returning the operation that runs in its place
    fn wrap(&self, next: Next) -> Next;
}

/// Shared middleware handle, as stored in definitions and registries
pub type MiddlewareRef = Arc<dyn Middleware>;

/// Any `Fn(Next) -> Next` is a middleware.
///
/// ```rust,ignore
/// let force_enabled = |next: Next| -> Next {
///     Arc::new(move |client, mut req: Request| {
///         req.options.set("enabled", true);
///         next(client, req)
///     })
/// };
/// ```
impl<F> Middleware for F
where
    F: Fn(Next) -> Next + Send + Sync,
{
    fn wrap(&self, next: Next) -> Next {
        self(next)
    }
}

/// Create middleware from an async function
///
/// # Example
/// ```rust,ignore
/// async fn log_calls(client: ClientContext, req: Request, next: Next) -> QueryResult<Response> {
///     println!("[{}] {}", req.kind(), req.path());
///     next(client, req).await
/// }
///
/// let middleware = from_fn(log_calls);
/// ```
pub fn from_fn<F, Fut>(f: F) -> MiddlewareRef
where
    F: Fn(ClientContext, Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = QueryResult<Response>> + Send + 'static,
{
    let f = Arc::new(f);
    Arc::new(move |next: Next| -> Next {
        let f = f.clone();
        Arc::new(
            move |client: ClientContext, req: Request| -> BoxFuture<'static, QueryResult<Response>> {
                Box::pin(f(client, req, next.clone()))
            },
        )
    })
}

/// Create middleware that only rewrites the request options
///
/// ```rust,ignore
/// let stale = map_options(|options| options.with("stale_time", 30_000));
/// ```
pub fn map_options<F>(f: F) -> MiddlewareRef
where
    F: Fn(HookOptions) -> HookOptions + Send + Sync + 'static,
{
    let f = Arc::new(f);
    Arc::new(move |next: Next| -> Next {
        let f = f.clone();
        Arc::new(
            move |client: ClientContext, mut req: Request| -> BoxFuture<'static, QueryResult<Response>> {
                req.options = f(std::mem::take(&mut req.options));
                next(client, req)
            },
        )
    })
}
