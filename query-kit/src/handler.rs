//! Fetch, mutate and page-param functions
//!
//! Definitions take typed async functions and store them boxed over JSON
//! values, so accessors of different variable and result types can live in
//! the same router.

use crate::client::MutationId;
use crate::key::QueryKey;
use crate::signal::AbortSignal;
use crate::{QueryError, QueryResult};
use futures::future::BoxFuture;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Context handed to a fetch function by the query client
#[derive(Debug, Clone)]
pub struct FetchContext {
    /// Key the result is stored under
    pub key: QueryKey,
    /// Cursor of the page being fetched (infinite queries only)
    pub page_param: Option<Value>,
    /// Cancellation signal owned by the client
    pub signal: Option<AbortSignal>,
}

impl FetchContext {
    /// Context for a plain query fetch
    pub fn new(key: QueryKey) -> Self {
        Self {
            key,
            page_param: None,
            signal: None,
        }
    }

    /// Set the page cursor
    #[must_use]
    pub fn with_page_param(mut self, page_param: Value) -> Self {
        self.page_param = Some(page_param);
        self
    }

    /// Attach a cancellation signal
    #[must_use]
    pub fn with_signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Decode the page cursor into `P`
    pub fn page_param_as<P: DeserializeOwned>(&self) -> QueryResult<P> {
        let value = self.page_param.clone().unwrap_or(Value::Null);
        serde_json::from_value(value)
            .map_err(|e| QueryError::bad_request(format!("Invalid page param: {}", e)))
    }

    /// Return a `CANCELLED` error if the client aborted this fetch
    pub fn check_aborted(&self) -> QueryResult<()> {
        match &self.signal {
            Some(signal) => signal.check(),
            None => Ok(()),
        }
    }
}

/// Context handed to a mutation function
#[derive(Debug, Clone)]
pub struct MutationContext {
    /// Mutation key (path only)
    pub key: QueryKey,
    /// Id of this invocation
    pub mutation_id: MutationId,
}

/// Boxed fetch function
pub type Fetcher =
    Arc<dyn Fn(Value, FetchContext) -> BoxFuture<'static, QueryResult<Value>> + Send + Sync>;

/// Boxed mutation function
pub type MutationFn =
    Arc<dyn Fn(Value, MutationContext) -> BoxFuture<'static, QueryResult<Value>> + Send + Sync>;

/// Pages loaded so far, as seen by the page-param functions
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    /// Loaded pages, oldest first
    pub pages: &'a [Value],
    /// Cursor each page was loaded with, parallel to `pages`
    pub page_params: &'a [Value],
}

impl<'a> PageContext<'a> {
    pub fn new(pages: &'a [Value], page_params: &'a [Value]) -> Self {
        Self { pages, page_params }
    }

    pub fn first_page(&self) -> Option<&'a Value> {
        self.pages.first()
    }

    pub fn last_page(&self) -> Option<&'a Value> {
        self.pages.last()
    }

    pub fn first_page_param(&self) -> Option<&'a Value> {
        self.page_params.first()
    }

    pub fn last_page_param(&self) -> Option<&'a Value> {
        self.page_params.last()
    }
}

/// Computes the next (or previous) cursor; `None` means there is no such page
pub type PageParamFn = Arc<dyn Fn(&PageContext<'_>) -> Option<Value> + Send + Sync>;

/// Trait for fetch functions
///
/// Automatically implemented for async functions with the signature:
/// `async fn(Variables, FetchContext) -> QueryResult<Output>`
pub trait QueryFn<V, T>: Clone + Send + Sync + 'static
where
    V: DeserializeOwned + Send + 'static,
    T: Serialize + Send + 'static,
{
    /// The future type returned by the function
    type Future: Future<Output = QueryResult<T>> + Send;

    /// Run the fetch
    fn call(&self, variables: V, ctx: FetchContext) -> Self::Future;
}

impl<V, T, F, Fut> QueryFn<V, T> for F
where
    V: DeserializeOwned + Send + 'static,
    T: Serialize + Send + 'static,
    F: Fn(V, FetchContext) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = QueryResult<T>> + Send + 'static,
{
    type Future = Fut;

    fn call(&self, variables: V, ctx: FetchContext) -> Self::Future {
        (self)(variables, ctx)
    }
}

/// Trait for mutation functions
///
/// Automatically implemented for async functions with the signature:
/// `async fn(Variables, MutationContext) -> QueryResult<Output>`
pub trait MutateFn<V, T>: Clone + Send + Sync + 'static
where
    V: DeserializeOwned + Send + 'static,
    T: Serialize + Send + 'static,
{
    /// The future type returned by the function
    type Future: Future<Output = QueryResult<T>> + Send;

    /// Run the mutation
    fn call(&self, variables: V, ctx: MutationContext) -> Self::Future;
}

impl<V, T, F, Fut> MutateFn<V, T> for F
where
    V: DeserializeOwned + Send + 'static,
    T: Serialize + Send + 'static,
    F: Fn(V, MutationContext) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = QueryResult<T>> + Send + 'static,
{
    type Future = Fut;

    fn call(&self, variables: V, ctx: MutationContext) -> Self::Future {
        (self)(variables, ctx)
    }
}

fn decode_variables<V: DeserializeOwned>(value: Value) -> QueryResult<V> {
    serde_json::from_value(value)
        .map_err(|e| QueryError::bad_request(format!("Invalid variables: {}", e)))
}

fn encode_output<T: Serialize>(output: T) -> QueryResult<Value> {
    serde_json::to_value(output).map_err(|e| {
        QueryError::serialization(format!("Failed to serialize result: {}", e))
    })
}

/// Convert a fetch function into a boxed [`Fetcher`]
pub fn into_fetcher<V, T, H>(handler: H) -> Fetcher
where
    V: DeserializeOwned + Send + 'static,
    T: Serialize + Send + 'static,
    H: QueryFn<V, T>,
{
    Arc::new(move |variables, ctx| {
        let handler = handler.clone();
        Box::pin(async move {
            let variables: V = decode_variables(variables)?;
            let output = handler.call(variables, ctx).await?;
            encode_output(output)
        })
    })
}

/// Convert a mutation function into a boxed [`MutationFn`]
pub fn into_mutation_fn<V, T, H>(handler: H) -> MutationFn
where
    V: DeserializeOwned + Send + 'static,
    T: Serialize + Send + 'static,
    H: MutateFn<V, T>,
{
    Arc::new(move |variables, ctx| {
        let handler = handler.clone();
        Box::pin(async move {
            let variables: V = decode_variables(variables)?;
            let output = handler.call(variables, ctx).await?;
            encode_output(output)
        })
    })
}

/// Box a page-param function
pub fn page_param_fn<F>(f: F) -> PageParamFn
where
    F: Fn(&PageContext<'_>) -> Option<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}
