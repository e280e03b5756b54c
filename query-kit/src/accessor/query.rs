use super::{
    AccessorCore, CallOptions, check_primary_key, decode_response, definition_value, key_for,
};
use crate::client::QueryRequest;
use crate::error::{ConfigError, ConfigResult};
use crate::handler::{Fetcher, QueryFn, into_fetcher};
use crate::key::{KeyHashFn, QueryKey};
use crate::middleware::{AccessorKind, MiddlewareRef, Next, Request, Response};
use crate::options::{self, HookOptions, suspense_options};
use crate::{ClientContext, QueryResult};
use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Definition of a query.
///
/// ```rust,ignore
/// let def = QueryDef::new(fetch_profile)
///     .option("stale_time", 30_000)
///     .use_middleware(logging_middleware(LogConfig::new()));
/// ```
#[derive(Clone)]
pub struct QueryDef {
    pub(crate) fetcher: Fetcher,
    pub(crate) middleware: Vec<MiddlewareRef>,
    pub(crate) options: HookOptions,
    pub(crate) hash_fn: Option<KeyHashFn>,
    pub(crate) invalid: Option<ConfigError>,
}

impl QueryDef {
    /// Define a query from a typed fetch function
    pub fn new<V, T, H>(fetcher: H) -> Self
    where
        V: DeserializeOwned + Send + 'static,
        T: Serialize + Send + 'static,
        H: QueryFn<V, T>,
    {
        Self::from_fetcher(into_fetcher(fetcher))
    }

    /// Define a query from an already boxed fetcher
    pub fn from_fetcher(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            middleware: Vec::new(),
            options: HookOptions::new(),
            hash_fn: None,
            invalid: None,
        }
    }

    /// Default variables, used when a call passes none.
    ///
    /// Variables that fail to serialize make the accessor build fail.
    #[must_use]
    pub fn variables(mut self, variables: impl Serialize) -> Self {
        match definition_value(options::VARIABLES, variables) {
            Ok(value) => self.options.set(options::VARIABLES, value),
            Err(error) => {
                self.invalid.get_or_insert(error);
            }
        }
        self
    }

    /// Set one default option
    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.set(key, value);
        self
    }

    /// Merge default options (right-biased)
    #[must_use]
    pub fn options(mut self, options: &HookOptions) -> Self {
        self.options.merge(options);
        self
    }

    /// Add middleware that runs on every call of this query
    #[must_use]
    pub fn use_middleware(mut self, middleware: MiddlewareRef) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Custom key hash, handed to the client untouched
    #[must_use]
    pub fn key_hash_fn<F>(mut self, hash: F) -> Self
    where
        F: Fn(&QueryKey) -> String + Send + Sync + 'static,
    {
        self.hash_fn = Some(Arc::new(hash));
        self
    }
}

impl std::fmt::Debug for QueryDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryDef")
            .field("middleware", &self.middleware.len())
            .field("options", &self.options)
            .field("custom_hash", &self.hash_fn.is_some())
            .field("invalid", &self.invalid)
            .finish_non_exhaustive()
    }
}

struct QueryInner {
    core: AccessorCore,
    fetcher: Fetcher,
}

/// Callable query accessor.
///
/// Cloning is cheap; clones share the definition.
#[derive(Clone)]
pub struct QueryAccessor {
    inner: Arc<QueryInner>,
    suspense: bool,
}

impl QueryAccessor {
    pub(crate) fn from_def(prefix: Vec<String>, def: QueryDef) -> ConfigResult<Self> {
        if let Some(error) = def.invalid {
            return Err(error);
        }
        let core = AccessorCore::new(
            AccessorKind::Query,
            prefix,
            def.middleware,
            def.options,
            def.hash_fn,
        );
        Ok(Self {
            inner: Arc::new(QueryInner {
                core,
                fetcher: def.fetcher,
            }),
            suspense: false,
        })
    }

    /// Suspense-mode accessor over the same definition
    pub fn suspense(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            suspense: true,
        }
    }

    /// Returns true if calls run in suspense mode
    pub fn is_suspense(&self) -> bool {
        self.suspense
    }

    /// First key segment
    pub fn get_primary_key(&self) -> &str {
        self.inner.core.primary_key()
    }

    /// Key prefix of this accessor
    pub fn prefix(&self) -> &[String] {
        self.inner.core.prefix()
    }

    /// Dotted key prefix
    pub fn path(&self) -> String {
        self.inner.core.path()
    }

    /// Key for `variables`; `None` yields the bare prefix
    pub fn get_key(&self, variables: Option<Value>) -> QueryKey {
        self.inner.core.key(variables)
    }

    /// Key for typed variables
    pub fn get_key_for<V: Serialize>(&self, variables: &V) -> QueryResult<QueryKey> {
        key_for(&self.inner.core, variables)
    }

    fn resolved_options(&self, variables: Option<Value>) -> HookOptions {
        let options = self.inner.core.options_for(variables);
        if self.suspense {
            options.merged(&suspense_options())
        } else {
            options
        }
    }

    /// Everything the client needs for a one-off fetch or prefetch.
    ///
    /// Absent variables fall back to the definition's default variables.
    pub fn get_fetch_options(&self, variables: Option<Value>) -> QueryRequest {
        let options = self.resolved_options(variables);
        QueryRequest {
            key: self.get_key(options.variables().cloned()),
            fetcher: self.inner.fetcher.clone(),
            hash_fn: self.inner.core.hash_fn(),
            options,
        }
    }

    /// Options a call with `variables` would hand on, including the key
    pub fn get_options(&self, variables: Option<Value>) -> HookOptions {
        let described = self.inner.core.describe(variables);
        if self.suspense {
            described.merged(&suspense_options())
        } else {
            described
        }
    }

    /// Default options of the definition
    pub fn definition_options(&self) -> &HookOptions {
        self.inner.core.definition_options()
    }

    /// The definition's fetch function
    pub fn fetcher(&self) -> &Fetcher {
        &self.inner.fetcher
    }

    /// The definition's custom key hash, if any
    pub fn hash_fn(&self) -> Option<KeyHashFn> {
        self.inner.core.hash_fn()
    }

    fn base(&self, suspense: bool) -> Next {
        let inner = self.inner.clone();
        Arc::new(
            move |client: ClientContext, req: Request| -> BoxFuture<'static, QueryResult<Response>> {
                let inner = inner.clone();
                Box::pin(async move {
                    let key = req.key();
                    let mut options = req.options;
                    if suspense {
                        options.merge(&suspense_options());
                    }
                    let request = QueryRequest {
                        key,
                        fetcher: inner.fetcher.clone(),
                        hash_fn: inner.core.hash_fn(),
                        options,
                    };
                    client.execute(request).await
                })
            },
        )
    }

    /// Run the query through the middleware chain into the client
    pub async fn call(&self, client: &ClientContext, call: CallOptions) -> QueryResult<Response> {
        self.inner
            .core
            .invoke(client, call, self.base(self.suspense))
            .await
    }

    /// Like [`call`](Self::call), decoding the response into `T`
    pub async fn call_as<T: DeserializeOwned>(
        &self,
        client: &ClientContext,
        call: CallOptions,
    ) -> QueryResult<T> {
        decode_response(self.call(client, call).await?)
    }

    /// Run the query in suspense mode regardless of how this accessor was built
    pub async fn call_suspense(
        &self,
        client: &ClientContext,
        call: CallOptions,
    ) -> QueryResult<Response> {
        self.inner.core.invoke(client, call, self.base(true)).await
    }
}

impl std::fmt::Debug for QueryAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryAccessor")
            .field("core", &self.inner.core)
            .field("suspense", &self.suspense)
            .finish()
    }
}

/// Create a standalone query keyed by `primary_key`
pub fn create_query(primary_key: impl Into<String>, def: QueryDef) -> ConfigResult<QueryAccessor> {
    let primary_key = primary_key.into();
    check_primary_key(&primary_key)?;
    QueryAccessor::from_def(vec![primary_key], def)
}

/// Create a standalone query that always runs in suspense mode
pub fn create_suspense_query(
    primary_key: impl Into<String>,
    def: QueryDef,
) -> ConfigResult<QueryAccessor> {
    Ok(create_query(primary_key, def)?.suspense())
}
