//! Accessor factories
//!
//! An accessor is the callable object built from a definition: it knows its
//! key prefix, derives keys, exposes introspection and runs calls through the
//! middleware chain into the query client.
//!
//! - [`QueryAccessor`]: single result set, backed by [`QueryClient::execute`]
//! - [`InfiniteQueryAccessor`]: paginated, backed by [`QueryClient::execute_infinite`]
//! - [`MutationAccessor`]: side effects, backed by [`QueryClient::execute_mutation`]
//!
//! [`QueryClient::execute`]: crate::QueryClient::execute
//! [`QueryClient::execute_infinite`]: crate::QueryClient::execute_infinite
//! [`QueryClient::execute_mutation`]: crate::QueryClient::execute_mutation

mod infinite;
mod mutation;
mod query;

pub use infinite::{
    InfiniteQueryAccessor, InfiniteQueryDef, create_infinite_query,
    create_suspense_infinite_query,
};
pub use mutation::{MutationAccessor, MutationDef, create_mutation};
pub use query::{QueryAccessor, QueryDef, create_query, create_suspense_query};

use crate::chain::{MiddlewareSources, resolve};
use crate::error::{ConfigError, ConfigResult};
use crate::key::{KeyHashFn, QueryKey, default_key_hash, derive_key};
use crate::middleware::{AccessorKind, MiddlewareRef, Next, Response};
use crate::options::{self, HookOptions};
use crate::{ClientContext, QueryError, QueryResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Per-call input: option overrides and extra middleware.
///
/// Call middleware runs innermost, after the client defaults and the
/// definition's own middleware.
#[derive(Clone, Default)]
pub struct CallOptions {
    pub options: HookOptions,
    pub middleware: Vec<MiddlewareRef>,
    invalid_variables: Option<QueryError>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the call variables.
    ///
    /// Variables that fail to serialize fail the call before any middleware
    /// runs.
    #[must_use]
    pub fn with_variables(mut self, variables: impl Serialize) -> Self {
        self.invalid_variables = self
            .options
            .try_set(options::VARIABLES, &variables)
            .err()
            .map(variables_error);
        self
    }

    /// Set one option
    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.set(key, value);
        self
    }

    /// Merge a whole option map (right-biased)
    #[must_use]
    pub fn with_options(mut self, options: &HookOptions) -> Self {
        self.options.merge(options);
        self
    }

    /// Add middleware for this call only
    #[must_use]
    pub fn use_middleware(mut self, middleware: MiddlewareRef) -> Self {
        self.middleware.push(middleware);
        self
    }
}

impl From<HookOptions> for CallOptions {
    fn from(options: HookOptions) -> Self {
        Self {
            options,
            middleware: Vec::new(),
            invalid_variables: None,
        }
    }
}

impl std::fmt::Debug for CallOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallOptions")
            .field("options", &self.options)
            .field("middleware", &self.middleware.len())
            .field("invalid_variables", &self.invalid_variables)
            .finish()
    }
}

/// State shared by all accessor kinds
pub(crate) struct AccessorCore {
    kind: AccessorKind,
    prefix: Arc<[String]>,
    middleware: Vec<MiddlewareRef>,
    options: HookOptions,
    hash_fn: Option<KeyHashFn>,
}

impl AccessorCore {
    pub(crate) fn new(
        kind: AccessorKind,
        prefix: Vec<String>,
        middleware: Vec<MiddlewareRef>,
        options: HookOptions,
        hash_fn: Option<KeyHashFn>,
    ) -> Self {
        Self {
            kind,
            prefix: prefix.into(),
            middleware,
            options,
            hash_fn,
        }
    }

    pub(crate) fn prefix(&self) -> &[String] {
        &self.prefix
    }

    pub(crate) fn primary_key(&self) -> &str {
        self.prefix.first().map(String::as_str).unwrap_or_default()
    }

    pub(crate) fn path(&self) -> String {
        self.prefix.join(".")
    }

    pub(crate) fn hash_fn(&self) -> Option<KeyHashFn> {
        self.hash_fn.clone()
    }

    pub(crate) fn definition_options(&self) -> &HookOptions {
        &self.options
    }

    pub(crate) fn key(&self, variables: Option<Value>) -> QueryKey {
        match self.kind {
            AccessorKind::Mutation => derive_key(&self.prefix[..], None),
            _ => derive_key(&self.prefix[..], variables),
        }
    }

    pub(crate) fn key_hash(&self, key: &QueryKey) -> String {
        match &self.hash_fn {
            Some(hash) => hash(key),
            None => default_key_hash(key),
        }
    }

    /// Definition options with `variables` applied; absent variables keep
    /// the definition default
    pub(crate) fn options_for(&self, variables: Option<Value>) -> HookOptions {
        let mut merged = self.options.clone();
        if let Some(variables) = variables {
            merged.set(options::VARIABLES, variables);
        }
        merged
    }

    /// Options as handed on internally, with the resolved key fields
    pub(crate) fn describe(&self, variables: Option<Value>) -> HookOptions {
        let mut described = self.options_for(variables);
        let key = self.key(described.variables().cloned());
        match self.kind {
            AccessorKind::Mutation => described.set(options::MUTATION_KEY, key),
            _ => {
                described.set(options::QUERY_KEY_HASH, self.key_hash(&key));
                described.set(options::QUERY_KEY, key);
            }
        }
        described
    }

    /// Resolve middleware and options for one call and run it
    pub(crate) async fn invoke(
        &self,
        client: &ClientContext,
        call: CallOptions,
        base: Next,
    ) -> QueryResult<Response> {
        if let Some(error) = call.invalid_variables {
            return Err(error);
        }
        let sources = MiddlewareSources {
            global: client.default_middleware(self.kind),
            definition: self.middleware.clone(),
            call: call.middleware,
        };
        let resolved = resolve(
            base,
            sources,
            &self.options,
            &call.options,
            self.kind,
            self.prefix.clone(),
        );
        resolved.run(client.clone()).await
    }
}

impl std::fmt::Debug for AccessorCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessorCore")
            .field("kind", &self.kind)
            .field("prefix", &self.prefix)
            .field("middleware", &self.middleware.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn variables_error(e: serde_json::Error) -> QueryError {
    QueryError::serialization(format!("Failed to serialize variables: {}", e))
}

fn variables_value<V: Serialize>(variables: &V) -> QueryResult<Value> {
    serde_json::to_value(variables).map_err(variables_error)
}

/// Serialize a definition value, naming the option on failure
pub(crate) fn definition_value(key: &str, value: impl Serialize) -> ConfigResult<Value> {
    serde_json::to_value(value).map_err(|e| ConfigError::InvalidOption {
        key: key.to_string(),
        message: e.to_string(),
    })
}

pub(crate) fn decode_response<T: DeserializeOwned>(response: Response) -> QueryResult<T> {
    serde_json::from_value(response)
        .map_err(|e| QueryError::serialization(format!("Failed to decode response: {}", e)))
}

pub(crate) fn check_primary_key(primary_key: &str) -> ConfigResult<()> {
    if primary_key.is_empty() {
        return Err(ConfigError::EmptyPrimaryKey);
    }
    Ok(())
}

/// Typed key lookup shared by the accessors
pub(crate) fn key_for<V: Serialize>(core: &AccessorCore, variables: &V) -> QueryResult<QueryKey> {
    Ok(core.key(Some(variables_value(variables)?)))
}
