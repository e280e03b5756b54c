use super::{AccessorCore, CallOptions, decode_response};
use crate::client::{MutationId, MutationRequest};
use crate::error::{ConfigError, ConfigResult};
use crate::handler::{MutateFn, MutationFn, into_mutation_fn};
use crate::key::QueryKey;
use crate::middleware::{AccessorKind, MiddlewareRef, Next, Request, Response};
use crate::options::HookOptions;
use crate::{ClientContext, QueryResult};
use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Definition of a mutation
#[derive(Clone)]
pub struct MutationDef {
    pub(crate) mutation_fn: MutationFn,
    pub(crate) middleware: Vec<MiddlewareRef>,
    pub(crate) options: HookOptions,
    pub(crate) mutation_key: Option<Vec<String>>,
}

impl MutationDef {
    /// Define a mutation from a typed function
    pub fn new<V, T, H>(mutation_fn: H) -> Self
    where
        V: DeserializeOwned + Send + 'static,
        T: Serialize + Send + 'static,
        H: MutateFn<V, T>,
    {
        Self::from_mutation_fn(into_mutation_fn(mutation_fn))
    }

    pub fn from_mutation_fn(mutation_fn: MutationFn) -> Self {
        Self {
            mutation_fn,
            middleware: Vec::new(),
            options: HookOptions::new(),
            mutation_key: None,
        }
    }

    /// Key of a standalone mutation. Routers assign the key themselves and
    /// ignore this value.
    #[must_use]
    pub fn mutation_key<I, S>(mut self, key: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mutation_key = Some(key.into_iter().map(Into::into).collect());
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
}

impl std::fmt::Debug for MutationDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationDef")
            .field("middleware", &self.middleware.len())
            .field("options", &self.options)
            .field("mutation_key", &self.mutation_key)
            .finish_non_exhaustive()
    }
}

struct MutationInner {
    core: AccessorCore,
    mutation_fn: MutationFn,
}

/// Callable mutation accessor.
///
/// The key is the path alone; variables never extend it.
#[derive(Clone)]
pub struct MutationAccessor {
    inner: Arc<MutationInner>,
}

impl MutationAccessor {
    pub(crate) fn from_def(prefix: Vec<String>, def: MutationDef) -> Self {
        let core = AccessorCore::new(
            AccessorKind::Mutation,
            prefix,
            def.middleware,
            def.options,
            None,
        );
        Self {
            inner: Arc::new(MutationInner {
                core,
                mutation_fn: def.mutation_fn,
            }),
        }
    }

    /// First key segment; empty for a keyless standalone mutation
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

    /// The mutation key
    pub fn get_key(&self) -> QueryKey {
        self.inner.core.key(None)
    }

    /// Request a call with `variables` would hand to the client, with a
    /// fresh mutation id
    pub fn get_fetch_options(&self, variables: Option<Value>) -> MutationRequest {
        MutationRequest {
            key: self.get_key(),
            mutation_id: MutationId::new(),
            mutation_fn: self.inner.mutation_fn.clone(),
            options: self.inner.core.options_for(variables),
        }
    }

    /// Options a call with `variables` would hand on, including the key
    pub fn get_options(&self, variables: Option<Value>) -> HookOptions {
        self.inner.core.describe(variables)
    }

    /// Default options of the definition
    pub fn definition_options(&self) -> &HookOptions {
        self.inner.core.definition_options()
    }

    /// The definition's mutation function
    pub fn mutation_fn(&self) -> &MutationFn {
        &self.inner.mutation_fn
    }

    fn base(&self) -> Next {
        let inner = self.inner.clone();
        Arc::new(
            move |client: ClientContext, req: Request| -> BoxFuture<'static, QueryResult<Response>> {
                let inner = inner.clone();
                Box::pin(async move {
                    let mutation_id = MutationId::new();
                    tracing::trace!(path = %req.path(), mutation_id = %mutation_id, "Dispatching mutation");
                    let request = MutationRequest {
                        key: req.key(),
                        mutation_id,
                        mutation_fn: inner.mutation_fn.clone(),
                        options: req.options,
                    };
                    client.execute_mutation(request).await
                })
            },
        )
    }

    /// Run the mutation; `variables` of the call options are its input
    pub async fn call(&self, client: &ClientContext, call: CallOptions) -> QueryResult<Response> {
        self.inner.core.invoke(client, call, self.base()).await
    }

    /// Like [`call`](Self::call), decoding the response into `T`
    pub async fn call_as<T: DeserializeOwned>(
        &self,
        client: &ClientContext,
        call: CallOptions,
    ) -> QueryResult<T> {
        decode_response(self.call(client, call).await?)
    }

    /// Shorthand for a call that only sets variables
    pub async fn mutate(
        &self,
        client: &ClientContext,
        variables: impl Serialize,
    ) -> QueryResult<Response> {
        self.call(client, CallOptions::new().with_variables(variables))
            .await
    }
}

impl std::fmt::Debug for MutationAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationAccessor")
            .field("core", &self.inner.core)
            .finish()
    }
}

/// Create a standalone mutation, keyed by its `mutation_key` if it has one
pub fn create_mutation(def: MutationDef) -> ConfigResult<MutationAccessor> {
    let key = def.mutation_key.clone().unwrap_or_default();
    if key.iter().any(String::is_empty) {
        return Err(ConfigError::EmptySegment {
            parent: key.join("."),
        });
    }
    Ok(MutationAccessor::from_def(key, def))
}
