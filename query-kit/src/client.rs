//! Query client contract
//!
//! The kit does not cache, retry or deduplicate anything itself. Those jobs
//! belong to the query client, an external engine reached through the
//! [`QueryClient`] trait. Each accessor call ends in one of the three
//! `execute*` methods with a fully resolved request object.
//!
//! The client also owns the [`DefaultMiddleware`] registry: middleware that
//! runs in front of every accessor of a given kind.

use crate::handler::{
    FetchContext, Fetcher, MutationContext, MutationFn, PageContext, PageParamFn,
};
use crate::key::{KeyHashFn, QueryKey, default_key_hash};
use crate::middleware::{AccessorKind, DefaultsScope, MiddlewareRef, Response};
use crate::options::HookOptions;
use crate::signal::AbortSignal;
use crate::QueryResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{PoisonError, RwLock};

/// The engine that actually runs queries and mutations.
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Run a query
    async fn execute(&self, request: QueryRequest) -> QueryResult<Response>;

    /// Run a paginated query
    async fn execute_infinite(&self, request: InfiniteQueryRequest) -> QueryResult<Response>;

    /// Run a mutation
    async fn execute_mutation(&self, request: MutationRequest) -> QueryResult<Response>;

    /// The client's default-middleware registry
    fn defaults(&self) -> &DefaultMiddleware;

    /// Middleware applied in front of every accessor of `kind`.
    ///
    /// Read on every call, so registry changes apply to the next call.
    fn default_middleware(&self, kind: AccessorKind) -> Vec<MiddlewareRef> {
        self.defaults().get(kind.defaults_scope())
    }
}

/// Per-scope lists of default middleware.
///
/// Reads take a snapshot of the list; a poisoned lock is recovered rather
/// than propagated.
#[derive(Default)]
pub struct DefaultMiddleware {
    queries: RwLock<Vec<MiddlewareRef>>,
    mutations: RwLock<Vec<MiddlewareRef>>,
}

impl DefaultMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, scope: DefaultsScope) -> &RwLock<Vec<MiddlewareRef>> {
        match scope {
            DefaultsScope::Queries => &self.queries,
            DefaultsScope::Mutations => &self.mutations,
        }
    }

    /// Snapshot of the middleware registered for `scope`
    pub fn get(&self, scope: DefaultsScope) -> Vec<MiddlewareRef> {
        self.slot(scope)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the middleware of `scope`
    pub fn set(&self, scope: DefaultsScope, middleware: Vec<MiddlewareRef>) {
        *self
            .slot(scope)
            .write()
            .unwrap_or_else(PoisonError::into_inner) = middleware;
    }

    /// Append one middleware to `scope` (it runs innermost of the defaults)
    pub fn push(&self, scope: DefaultsScope, middleware: MiddlewareRef) {
        self.slot(scope)
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(middleware);
    }

    /// Remove every middleware of `scope`
    pub fn clear(&self, scope: DefaultsScope) {
        self.slot(scope)
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of middleware registered for `scope`
    pub fn len(&self, scope: DefaultsScope) -> usize {
        self.slot(scope)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if `scope` has no middleware
    pub fn is_empty(&self, scope: DefaultsScope) -> bool {
        self.len(scope) == 0
    }
}

impl std::fmt::Debug for DefaultMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultMiddleware")
            .field("queries", &self.len(DefaultsScope::Queries))
            .field("mutations", &self.len(DefaultsScope::Mutations))
            .finish()
    }
}

fn variables_of(options: &HookOptions) -> Value {
    options.variables().cloned().unwrap_or(Value::Null)
}

fn hash_with(hash_fn: &Option<KeyHashFn>, key: &QueryKey) -> String {
    match hash_fn {
        Some(hash) => hash(key),
        None => default_key_hash(key),
    }
}

/// Fully resolved query handed to [`QueryClient::execute`]
#[derive(Clone)]
pub struct QueryRequest {
    /// Derived cache key
    pub key: QueryKey,
    /// Fetch function of the definition
    pub fetcher: Fetcher,
    /// Custom key hash, if the definition supplied one
    pub hash_fn: Option<KeyHashFn>,
    /// Merged options, including `variables`
    pub options: HookOptions,
}

impl QueryRequest {
    /// Hash of the key, using the custom hash when present
    pub fn key_hash(&self) -> String {
        hash_with(&self.hash_fn, &self.key)
    }

    /// Variables of the call (`null` when absent)
    pub fn variables(&self) -> Value {
        variables_of(&self.options)
    }

    /// Run the fetch function
    pub async fn fetch(&self, signal: Option<AbortSignal>) -> QueryResult<Value> {
        let mut ctx = FetchContext::new(self.key.clone());
        ctx.signal = signal;
        (self.fetcher)(self.variables(), ctx).await
    }
}

impl std::fmt::Debug for QueryRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryRequest")
            .field("key", &self.key)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Cursor functions of an infinite query
#[derive(Clone)]
pub struct PageParams {
    /// Cursor of the first page
    pub initial: Value,
    /// Cursor after the last loaded page
    pub get_next: PageParamFn,
    /// Cursor before the first loaded page, for bidirectional lists
    pub get_previous: Option<PageParamFn>,
}

impl std::fmt::Debug for PageParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageParams")
            .field("initial", &self.initial)
            .field("bidirectional", &self.get_previous.is_some())
            .finish_non_exhaustive()
    }
}

/// Fully resolved paginated query handed to [`QueryClient::execute_infinite`]
#[derive(Clone)]
pub struct InfiniteQueryRequest {
    pub key: QueryKey,
    pub fetcher: Fetcher,
    pub hash_fn: Option<KeyHashFn>,
    pub options: HookOptions,
    pub page_params: PageParams,
}

impl InfiniteQueryRequest {
    pub fn key_hash(&self) -> String {
        hash_with(&self.hash_fn, &self.key)
    }

    pub fn variables(&self) -> Value {
        variables_of(&self.options)
    }

    pub fn initial_page_param(&self) -> &Value {
        &self.page_params.initial
    }

    /// Fetch the page at `page_param`
    pub async fn fetch_page(
        &self,
        page_param: Value,
        signal: Option<AbortSignal>,
    ) -> QueryResult<Value> {
        let mut ctx = FetchContext::new(self.key.clone()).with_page_param(page_param);
        ctx.signal = signal;
        (self.fetcher)(self.variables(), ctx).await
    }

    /// Cursor of the page after the loaded ones, `None` at the end
    pub fn next_page_param(&self, pages: &PageContext<'_>) -> Option<Value> {
        (self.page_params.get_next)(pages)
    }

    /// Cursor of the page before the loaded ones, `None` at the start or
    /// when the list is one-directional
    pub fn previous_page_param(&self, pages: &PageContext<'_>) -> Option<Value> {
        self.page_params
            .get_previous
            .as_ref()
            .and_then(|previous| previous(pages))
    }
}

impl std::fmt::Debug for InfiniteQueryRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfiniteQueryRequest")
            .field("key", &self.key)
            .field("options", &self.options)
            .field("page_params", &self.page_params)
            .finish_non_exhaustive()
    }
}

/// Id of one mutation invocation.
///
/// UUID v7, so ids sort by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MutationId(uuid::Uuid);

impl MutationId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext)))
    }

    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for MutationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MutationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<uuid::Uuid> for MutationId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}

/// Fully resolved mutation handed to [`QueryClient::execute_mutation`]
#[derive(Clone)]
pub struct MutationRequest {
    /// Mutation key; never includes variables
    pub key: QueryKey,
    /// Fresh id of this invocation
    pub mutation_id: MutationId,
    pub mutation_fn: MutationFn,
    /// Merged options; `variables` is the mutation input
    pub options: HookOptions,
}

impl MutationRequest {
    pub fn variables(&self) -> Value {
        variables_of(&self.options)
    }

    /// Run the mutation function with the request's variables
    pub async fn mutate(&self) -> QueryResult<Value> {
        let ctx = MutationContext {
            key: self.key.clone(),
            mutation_id: self.mutation_id,
        };
        (self.mutation_fn)(self.variables(), ctx).await
    }
}

impl std::fmt::Debug for MutationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationRequest")
            .field("key", &self.key)
            .field("mutation_id", &self.mutation_id)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
