//! Client handle passed explicitly into every accessor call

use crate::client::QueryClient;
use std::sync::Arc;

/// Shared handle to the query client.
///
/// Every accessor call receives the client through this handle; the kit
/// never looks a client up from ambient state. Cloning is cheap.
#[derive(Clone)]
pub struct ClientContext {
    inner: Arc<dyn QueryClient>,
}

impl ClientContext {
    /// Wrap a client value
    pub fn new<C: QueryClient + 'static>(client: C) -> Self {
        Self {
            inner: Arc::new(client),
        }
    }

    /// Wrap an already shared client
    pub fn from_arc(client: Arc<dyn QueryClient>) -> Self {
        Self { inner: client }
    }

    /// Get a reference to the client
    pub fn inner(&self) -> &dyn QueryClient {
        self.inner.as_ref()
    }

    /// Get the Arc for sharing
    pub fn arc(&self) -> Arc<dyn QueryClient> {
        self.inner.clone()
    }
}

impl std::ops::Deref for ClientContext {
    type Target = dyn QueryClient;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext").finish_non_exhaustive()
    }
}
