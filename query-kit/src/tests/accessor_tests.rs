//! Accessor introspection and suspense behaviour

use crate::accessor::{
    CallOptions, InfiniteQueryDef, MutationDef, QueryDef, create_infinite_query, create_mutation,
    create_query, create_suspense_query,
};
use crate::error::ConfigError;
use crate::handler::{FetchContext, MutationContext};
use crate::options::{
    ENABLED, HookOptions, QUERY_KEY, QUERY_KEY_HASH, SUSPENSE, THROW_ON_ERROR, USE_ERROR_BOUNDARY,
};
use crate::tests::support::RecordingClient;
use crate::{QueryError, QueryErrorCode};
use std::collections::HashMap;
use proptest::prelude::*;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn counting(counter: Arc<AtomicUsize>) -> QueryDef {
    QueryDef::new(move |vars: Value, _ctx: FetchContext| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, QueryError>(vars)
        }
    })
}

proptest! {
    /// Introspection is pure: equal inputs, equal outputs, no fetch
    #[test]
    fn prop_get_options_idempotent(id in any::<u32>(), stale in 0u64..100_000) {
        let counter = Arc::new(AtomicUsize::new(0));
        let query = create_query(
            "users",
            counting(counter.clone()).option("stale_time", stale),
        )
        .unwrap();

        let vars = json!({"id": id});
        let first = query.get_options(Some(vars.clone()));
        let second = query.get_options(Some(vars.clone()));
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.get(QUERY_KEY), Some(&json!(["users", {"id": id}])));

        let fetch = query.get_fetch_options(Some(vars.clone()));
        prop_assert_eq!(fetch.key, query.get_key(Some(vars)));
        prop_assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}

#[test]
fn test_custom_hash_is_reported_and_passed_through() {
    let query = create_query(
        "users",
        counting(Arc::new(AtomicUsize::new(0))).key_hash_fn(|key| format!("h{}", key.len())),
    )
    .unwrap();

    assert_eq!(
        query.get_options(Some(json!(1))).get(QUERY_KEY_HASH),
        Some(&json!("h2"))
    );
    let request = query.get_fetch_options(Some(json!(1)));
    assert_eq!(request.key_hash(), "h2");
    assert!(query.hash_fn().is_some());
}

#[tokio::test]
async fn test_fetch_options_support_prefetch() {
    let counter = Arc::new(AtomicUsize::new(0));
    let query = create_query("users", counting(counter.clone())).unwrap();

    let request = query.get_fetch_options(Some(json!({"id": 4})));
    let data = request.fetch(None).await.unwrap();
    assert_eq!(data, json!({"id": 4}));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_fetcher_is_exposed() {
    let query = create_query("users", counting(Arc::new(AtomicUsize::new(0)))).unwrap();
    let fetcher = query.fetcher().clone();
    let out = fetcher(json!("x"), FetchContext::new(query.get_key(None)))
        .await
        .unwrap();
    assert_eq!(out, json!("x"));
}

#[tokio::test]
async fn test_suspense_overlay_beats_definition_and_call() {
    let (client, ctx) = RecordingClient::shared();
    let overrides = HookOptions::new()
        .with(ENABLED, false)
        .with(SUSPENSE, false)
        .with(THROW_ON_ERROR, false)
        .with(USE_ERROR_BOUNDARY, false);

    let query = create_suspense_query(
        "users",
        counting(Arc::new(AtomicUsize::new(0))).options(&overrides),
    )
    .unwrap();
    query
        .call(&ctx, CallOptions::new().with_options(&overrides))
        .await
        .unwrap();

    let sent = client.last_options().unwrap();
    for flag in [ENABLED, SUSPENSE, THROW_ON_ERROR, USE_ERROR_BOUNDARY] {
        assert_eq!(sent.get_bool(flag), Some(true), "{flag} should be forced on");
    }
    assert_eq!(query.get_options(None).get_bool(ENABLED), Some(true));
}

#[tokio::test]
async fn test_suspense_overlay_beats_middleware() {
    let (client, ctx) = RecordingClient::shared();
    let disable = crate::middleware::map_options(|options| options.with(ENABLED, false));
    let query = create_query("users", counting(Arc::new(AtomicUsize::new(0))).use_middleware(disable))
        .unwrap();

    query.call(&ctx, CallOptions::new()).await.unwrap();
    assert_eq!(client.last_options().unwrap().enabled(), Some(false));

    query.call_suspense(&ctx, CallOptions::new()).await.unwrap();
    assert_eq!(client.last_options().unwrap().enabled(), Some(true));
}

#[tokio::test]
async fn test_call_variables_override_default() {
    let (client, ctx) = RecordingClient::shared();
    let query = create_query(
        "users",
        counting(Arc::new(AtomicUsize::new(0))).variables(json!({"id": 1})),
    )
    .unwrap();

    assert_eq!(
        query.call(&ctx, CallOptions::new()).await.unwrap(),
        json!({"id": 1})
    );
    assert_eq!(
        query
            .call(&ctx, CallOptions::new().with_variables(json!({"id": 2})))
            .await
            .unwrap(),
        json!({"id": 2})
    );
    assert_eq!(
        client.last_key().unwrap().as_slice(),
        &[json!("users"), json!({"id": 2})]
    );
}

/// Map with tuple keys: serde_json cannot turn it into an object
fn unserializable() -> HashMap<(i32, i32), i32> {
    HashMap::from([((1, 2), 3)])
}

#[tokio::test]
async fn test_unserializable_call_variables_fail_the_call() {
    let counter = Arc::new(AtomicUsize::new(0));
    let (client, ctx) = RecordingClient::shared();
    let query = create_query("items", counting(counter.clone())).unwrap();

    let call = CallOptions::new().with_variables(&unserializable());
    assert_eq!(call.options.variables(), None);

    let err = query.call(&ctx, call).await.unwrap_err();
    assert_eq!(err.code, QueryErrorCode::SerializationError);
    assert!(err.message.starts_with("Failed to serialize variables"));
    assert_eq!(client.call_count(), 0);
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    let recovered = CallOptions::new()
        .with_variables(&unserializable())
        .with_variables(json!({"id": 1}));
    assert_eq!(query.call(&ctx, recovered).await.unwrap(), json!({"id": 1}));
}

#[tokio::test]
async fn test_unserializable_mutation_input_fails() {
    let (client, ctx) = RecordingClient::shared();
    let mutation = create_mutation(
        MutationDef::new(|input: Value, _ctx: MutationContext| async move {
            Ok::<_, QueryError>(input)
        })
        .mutation_key(["items", "add"]),
    )
    .unwrap();

    let err = mutation.mutate(&ctx, unserializable()).await.unwrap_err();
    assert_eq!(err.code, QueryErrorCode::SerializationError);
    assert_eq!(client.call_count(), 0);
}

#[test]
fn test_unserializable_definition_values_fail_the_build() {
    let err = create_query(
        "items",
        counting(Arc::new(AtomicUsize::new(0))).variables(unserializable()),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidOption { ref key, .. } if key == "variables"));

    let feed = || {
        InfiniteQueryDef::new(|vars: Value, _ctx: FetchContext| async move {
            Ok::<_, QueryError>(vars)
        })
        .next_page_param(|_pages| None)
    };
    let err = create_infinite_query("feed", feed().initial_page_param(unserializable()))
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidOption { ref key, .. } if key == "initial_page_param"));
    assert!(err.to_string().starts_with("invalid option 'initial_page_param'"));

    let err = create_infinite_query("feed", feed().variables(unserializable())).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidOption { ref key, .. } if key == "variables"));
}
