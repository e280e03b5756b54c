use super::{
    AccessorCore, CallOptions, check_primary_key, decode_response, definition_value, key_for,
};
use crate::client::{InfiniteQueryRequest, PageParams};
use crate::error::{ConfigError, ConfigResult};
use crate::handler::{Fetcher, PageContext, PageParamFn, QueryFn, into_fetcher};
use crate::key::{KeyHashFn, QueryKey};
use crate::middleware::{AccessorKind, MiddlewareRef, Next, Request, Response};
use crate::options::{self, HookOptions, suspense_options};
use crate::{ClientContext, QueryResult};
use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Definition of a paginated query.
///
/// `next_page_param` is required; building an accessor without it fails.
///
/// ```rust,ignore
/// let def = InfiniteQueryDef::new(fetch_feed)
///     .initial_page_param(0)
///     .next_page_param(|pages| pages.last_page()?.get("next_cursor").cloned());
/// ```
#[derive(Clone)]
pub struct InfiniteQueryDef {
    pub(crate) fetcher: Fetcher,
    pub(crate) middleware: Vec<MiddlewareRef>,
    pub(crate) options: HookOptions,
    pub(crate) hash_fn: Option<KeyHashFn>,
    pub(crate) initial_page_param: Value,
    pub(crate) get_next: Option<PageParamFn>,
    pub(crate) get_previous: Option<PageParamFn>,
    pub(crate) invalid: Option<ConfigError>,
}

impl InfiniteQueryDef {
    /// Define a paginated query from a typed fetch function.
    ///
    /// The fetch function reads its cursor from [`FetchContext::page_param`].
    ///
    /// [`FetchContext::page_param`]: crate::FetchContext::page_param
    pub fn new<V, T, H>(fetcher: H) -> Self
    where
        V: DeserializeOwned + Send + 'static,
        T: Serialize + Send + 'static,
        H: QueryFn<V, T>,
    {
        Self::from_fetcher(into_fetcher(fetcher))
    }

    /// Define a paginated query from an already boxed fetcher
    pub fn from_fetcher(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            middleware: Vec::new(),
            options: HookOptions::new(),
            hash_fn: None,
            initial_page_param: Value::Null,
            get_next: None,
            get_previous: None,
            invalid: None,
        }
    }

    /// Cursor of the first page (`null` unless set)
    #[must_use]
    pub fn initial_page_param(mut self, page_param: impl Serialize) -> Self {
        match definition_value("initial_page_param", page_param) {
            Ok(value) => self.initial_page_param = value,
            Err(error) => {
                self.invalid.get_or_insert(error);
            }
        }
        self
    }

    /// Cursor after the loaded pages; return `None` when there are no more
    #[must_use]
    pub fn next_page_param<F>(mut self, f: F) -> Self
    where
        F: Fn(&PageContext<'_>) -> Option<Value> + Send + Sync + 'static,
    {
        self.get_next = Some(Arc::new(f));
        self
    }

    /// Cursor before the loaded pages, for bidirectional lists
    #[must_use]
    pub fn previous_page_param<F>(mut self, f: F) -> Self
    where
        F: Fn(&PageContext<'_>) -> Option<Value> + Send + Sync + 'static,
    {
        self.get_previous = Some(Arc::new(f));
        self
    }

    /// Default variables, used when a call passes none
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

    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.set(key, value);
        self
    }

    #[must_use]
    pub fn options(mut self, options: &HookOptions) -> Self {
        self.options.merge(options);
        self
    }

    #[must_use]
    pub fn use_middleware(mut self, middleware: MiddlewareRef) -> Self {
        self.middleware.push(middleware);
        self
    }

    #[must_use]
    pub fn key_hash_fn<F>(mut self, hash: F) -> Self
    where
        F: Fn(&QueryKey) -> String + Send + Sync + 'static,
    {
        self.hash_fn = Some(Arc::new(hash));
        self
    }
}

impl std::fmt::Debug for InfiniteQueryDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfiniteQueryDef")
            .field("middleware", &self.middleware.len())
            .field("options", &self.options)
            .field("initial_page_param", &self.initial_page_param)
            .field("has_next", &self.get_next.is_some())
            .field("has_previous", &self.get_previous.is_some())
            .field("invalid", &self.invalid)
            .finish_non_exhaustive()
    }
}

struct InfiniteInner {
    core: AccessorCore,
    fetcher: Fetcher,
    page_params: PageParams,
}

/// Callable paginated query accessor
#[derive(Clone)]
pub struct InfiniteQueryAccessor {
    inner: Arc<InfiniteInner>,
    suspense: bool,
}

impl InfiniteQueryAccessor {
    pub(crate) fn from_def(prefix: Vec<String>, def: InfiniteQueryDef) -> ConfigResult<Self> {
        if let Some(error) = def.invalid {
            return Err(error);
        }
        let Some(get_next) = def.get_next else {
            return Err(ConfigError::MissingNextPageParam {
                path: prefix.join("."),
            });
        };

        let core = AccessorCore::new(
            AccessorKind::InfiniteQuery,
            prefix,
            def.middleware,
            def.options,
            def.hash_fn,
        );
        Ok(Self {
            inner: Arc::new(InfiniteInner {
                core,
                fetcher: def.fetcher,
                page_params: PageParams {
                    initial: def.initial_page_param,
                    get_next,
                    get_previous: def.get_previous,
                },
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

    /// Everything the client needs to fetch or prefetch the first page
    pub fn get_fetch_options(&self, variables: Option<Value>) -> InfiniteQueryRequest {
        let mut options = self.inner.core.options_for(variables);
        if self.suspense {
            options.merge(&suspense_options());
        }
        InfiniteQueryRequest {
            key: self.get_key(options.variables().cloned()),
            fetcher: self.inner.fetcher.clone(),
            hash_fn: self.inner.core.hash_fn(),
            options,
            page_params: self.inner.page_params.clone(),
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

    /// The definition's page fetch function
    pub fn fetcher(&self) -> &Fetcher {
        &self.inner.fetcher
    }

    /// Initial cursor and the next/previous page functions
    pub fn page_params(&self) -> &PageParams {
        &self.inner.page_params
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
                    let request = InfiniteQueryRequest {
                        key,
                        fetcher: inner.fetcher.clone(),
                        hash_fn: inner.core.hash_fn(),
                        options,
                        page_params: inner.page_params.clone(),
                    };
                    client.execute_infinite(request).await
                })
            },
        )
    }

    /// Run the paginated query through the middleware chain into the client
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

    /// Run in suspense mode regardless of how this accessor was built
    pub async fn call_suspense(
        &self,
        client: &ClientContext,
        call: CallOptions,
    ) -> QueryResult<Response> {
        self.inner.core.invoke(client, call, self.base(true)).await
    }
}

impl std::fmt::Debug for InfiniteQueryAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfiniteQueryAccessor")
            .field("core", &self.inner.core)
            .field("page_params", &self.inner.page_params)
            .field("suspense", &self.suspense)
            .finish()
    }
}

/// Create a standalone paginated query keyed by `primary_key`
pub fn create_infinite_query(
    primary_key: impl Into<String>,
    def: InfiniteQueryDef,
) -> ConfigResult<InfiniteQueryAccessor> {
    let primary_key = primary_key.into();
    check_primary_key(&primary_key)?;
    InfiniteQueryAccessor::from_def(vec![primary_key], def)
}

/// Create a standalone paginated query that always runs in suspense mode
pub fn create_suspense_infinite_query(
    primary_key: impl Into<String>,
    def: InfiniteQueryDef,
) -> ConfigResult<InfiniteQueryAccessor> {
    Ok(create_infinite_query(primary_key, def)?.suspense())
}
