//! In-memory query client that records every request it receives

use crate::client::{
    DefaultMiddleware, InfiniteQueryRequest, MutationRequest, QueryClient, QueryRequest,
};
use crate::handler::PageContext;
use crate::key::QueryKey;
use crate::middleware::Response;
use crate::options::HookOptions;
use crate::{ClientContext, QueryResult};
use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug)]
pub(crate) enum RecordedCall {
    Query(QueryRequest),
    Infinite(InfiniteQueryRequest),
    Mutation(MutationRequest),
}

impl RecordedCall {
    pub(crate) fn key(&self) -> &QueryKey {
        match self {
            Self::Query(request) => &request.key,
            Self::Infinite(request) => &request.key,
            Self::Mutation(request) => &request.key,
        }
    }

    pub(crate) fn options(&self) -> &HookOptions {
        match self {
            Self::Query(request) => &request.options,
            Self::Infinite(request) => &request.options,
            Self::Mutation(request) => &request.options,
        }
    }
}

/// Runs fetchers directly, without caching, and keeps a log of requests.
///
/// Infinite queries load only the first page and answer with
/// `{"pages", "page_params", "next_page_param"}`.
#[derive(Default)]
pub(crate) struct RecordingClient {
    defaults: DefaultMiddleware,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingClient {
    /// Context over a fresh client nobody else observes
    pub(crate) fn context() -> ClientContext {
        ClientContext::new(Self::default())
    }

    /// Fresh client plus a context sharing it
    pub(crate) fn shared() -> (Arc<Self>, ClientContext) {
        let client = Arc::new(Self::default());
        let ctx = ClientContext::from_arc(client.clone());
        (client, ctx)
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().unwrap().push(call);
    }

    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn last_key(&self) -> Option<QueryKey> {
        self.calls.lock().unwrap().last().map(|call| call.key().clone())
    }

    pub(crate) fn last_options(&self) -> Option<HookOptions> {
        self.calls
            .lock()
            .unwrap()
            .last()
            .map(|call| call.options().clone())
    }
}

#[async_trait]
impl QueryClient for RecordingClient {
    async fn execute(&self, request: QueryRequest) -> QueryResult<Response> {
        self.record(RecordedCall::Query(request.clone()));
        request.fetch(None).await
    }

    async fn execute_infinite(&self, request: InfiniteQueryRequest) -> QueryResult<Response> {
        self.record(RecordedCall::Infinite(request.clone()));
        let initial = request.initial_page_param().clone();
        let first = request.fetch_page(initial.clone(), None).await?;
        let pages = vec![first];
        let page_params = vec![initial];
        let next = request.next_page_param(&PageContext::new(&pages, &page_params));
        Ok(json!({
            "pages": pages,
            "page_params": page_params,
            "next_page_param": next,
        }))
    }

    async fn execute_mutation(&self, request: MutationRequest) -> QueryResult<Response> {
        self.record(RecordedCall::Mutation(request.clone()));
        request.mutate().await
    }

    fn defaults(&self) -> &DefaultMiddleware {
        &self.defaults
    }
}
