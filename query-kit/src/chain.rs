//! Middleware chain resolution
//!
//! Turns a base operation plus the three middleware sources of a call into
//! one composed operation and the request it should run with.

use crate::middleware::{AccessorKind, MiddlewareRef, Next, Request, Response};
use crate::options::HookOptions;
use crate::{ClientContext, QueryResult};
use std::sync::Arc;

/// Middleware contributing to one call, outermost source first
#[derive(Clone, Default)]
pub struct MiddlewareSources {
    /// Client defaults for the accessor kind
    pub global: Vec<MiddlewareRef>,
    /// Middleware declared on the definition
    pub definition: Vec<MiddlewareRef>,
    /// Middleware passed with this call
    pub call: Vec<MiddlewareRef>,
}

impl MiddlewareSources {
    /// All middleware in application order (`global ++ definition ++ call`)
    pub fn flatten(self) -> Vec<MiddlewareRef> {
        let mut all = self.global;
        all.extend(self.definition);
        all.extend(self.call);
        all
    }

    /// Total number of middleware across the three sources
    pub fn len(&self) -> usize {
        self.global.len() + self.definition.len() + self.call.len()
    }

    /// Returns true if no source contributes middleware
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for MiddlewareSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareSources")
            .field("global", &self.global.len())
            .field("definition", &self.definition.len())
            .field("call", &self.call.len())
            .finish()
    }
}

/// Build a middleware chain from a list of middleware and a final operation.
///
/// Middleware is applied in reverse order (last added = innermost), meaning
/// the first middleware in the list wraps all subsequent middleware.
///
/// ```rust,ignore
/// // Given middleware [M1, M2, M3] and base operation B:
/// // Execution order: M1 → M2 → M3 → B → M3 → M2 → M1
/// let chain = build_middleware_chain(vec![m1, m2, m3], base);
/// ```
pub fn build_middleware_chain(middleware: Vec<MiddlewareRef>, base: Next) -> Next {
    middleware
        .into_iter()
        .rev()
        .fold(base, |next, mw| mw.wrap(next))
}

/// Merge definition options with per-call options (call wins, shallow)
pub fn merge_options(definition: &HookOptions, call: &HookOptions) -> HookOptions {
    let mut merged = HookOptions::new();
    merged.merge(definition);
    merged.merge(call);
    merged
}

/// Composed operation and the request it runs with
#[derive(Clone)]
pub struct Resolved {
    pub chain: Next,
    pub request: Request,
}

impl Resolved {
    /// Run the chain against `client`
    pub async fn run(self, client: ClientContext) -> QueryResult<Response> {
        (self.chain)(client, self.request).await
    }
}

impl std::fmt::Debug for Resolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolved")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

/// Resolve the chain for one call.
///
/// Global middleware contributes no options. Never fails and performs no I/O.
pub fn resolve(
    base: Next,
    sources: MiddlewareSources,
    definition_options: &HookOptions,
    call_options: &HookOptions,
    kind: AccessorKind,
    prefix: Arc<[String]>,
) -> Resolved {
    tracing::trace!(
        kind = %kind,
        path = %prefix.join("."),
        global = sources.global.len(),
        definition = sources.definition.len(),
        call = sources.call.len(),
        "Resolving middleware chain"
    );

    let options = merge_options(definition_options, call_options);
    let chain = build_middleware_chain(sources.flatten(), base);

    Resolved {
        chain,
        request: Request::new(kind, prefix, options),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::from_fn;
    use crate::QueryError;
    use crate::tests::support::RecordingClient;
    use futures::future::BoxFuture;
    use serde_json::json;
    use std::sync::Mutex;

    fn tagging(tag: &'static str, log: Arc<Mutex<Vec<String>>>) -> MiddlewareRef {
        from_fn(move |client, req, next: Next| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(format!("{}:before", tag));
                let result = next(client, req).await;
                log.lock().unwrap().push(format!("{}:after", tag));
                result
            }
        })
    }

    fn echo_options() -> Next {
        Arc::new(
            |_client: ClientContext, req: Request| -> BoxFuture<'static, QueryResult<Response>> {
                Box::pin(async move { serde_json::to_value(&req.options).map_err(QueryError::from) })
            },
        )
    }

    #[tokio::test]
    async fn test_middleware_chain_execution_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = build_middleware_chain(
            vec![
                tagging("m1", log.clone()),
                tagging("m2", log.clone()),
                tagging("m3", log.clone()),
            ],
            echo_options(),
        );

        let req = Request::new(AccessorKind::Query, vec!["t".to_string()].into(), HookOptions::new());
        chain(RecordingClient::context(), req).await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["m1:before", "m2:before", "m3:before", "m3:after", "m2:after", "m1:after"]
        );
    }

    #[test]
    fn test_merge_options_call_wins() {
        let merged = merge_options(
            &HookOptions::new().with("x", 2).with("stale_time", 10),
            &HookOptions::new().with("x", 1),
        );
        assert_eq!(merged.get("x"), Some(&json!(1)));
        assert_eq!(merged.get("stale_time"), Some(&json!(10)));
    }

    #[tokio::test]
    async fn test_resolve_orders_sources() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sources = MiddlewareSources {
            global: vec![tagging("G", log.clone())],
            definition: vec![tagging("D", log.clone())],
            call: vec![tagging("C", log.clone())],
        };
        assert_eq!(sources.len(), 3);

        let resolved = resolve(
            echo_options(),
            sources,
            &HookOptions::new().with("x", 2),
            &HookOptions::new().with("x", 1),
            AccessorKind::Query,
            vec!["k".to_string()].into(),
        );
        let out = resolved.run(RecordingClient::context()).await.unwrap();

        assert_eq!(out, json!({"x": 1}));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["G:before", "D:before", "C:before", "C:after", "D:after", "G:after"]
        );
    }

    #[test]
    fn test_empty_sources_return_base() {
        let sources = MiddlewareSources::default();
        assert!(sources.is_empty());
        assert!(sources.flatten().is_empty());
    }
}
