use rusoto_core::credential::StaticProvider;
use rusoto_core::request::{DispatchSignedRequest, DispatchSignedRequestFuture};
use rusoto_core::signature::SignedRequest;
use rusoto_core::Region;
use std::sync::Arc;
use std::time::Duration;

use crate::credentials::ResolvedCredentials;

/// Cloneable handle on the HTTP layer every service client sends through.
///
/// Production wraps `rusoto_core::HttpClient`; tests wrap mock dispatchers.
#[derive(Clone)]
pub struct SharedDispatcher {
    inner: Arc<dyn DispatchSignedRequest + Send + Sync>,
}

impl SharedDispatcher {
    pub fn new<D>(dispatcher: D) -> Self
    where
        D: DispatchSignedRequest + Send + Sync + 'static,
    {
        SharedDispatcher {
            inner: Arc::new(dispatcher),
        }
    }
}

impl DispatchSignedRequest for SharedDispatcher {
    fn dispatch(
        &self,
        request: SignedRequest,
        timeout: Option<Duration>,
    ) -> DispatchSignedRequestFuture {
        self.inner.dispatch(request, timeout)
    }
}

/// Everything needed to build one service client for one call.
pub struct ClientContext {
    dispatcher: SharedDispatcher,
    credentials: ResolvedCredentials,
    region: Region,
}

impl ClientContext {
    pub fn new(
        dispatcher: SharedDispatcher,
        credentials: ResolvedCredentials,
        region: Region,
    ) -> Self {
        ClientContext {
            dispatcher,
            credentials,
            region,
        }
    }

    pub fn dispatcher(&self) -> SharedDispatcher {
        self.dispatcher.clone()
    }

    /// A provider that hands out exactly the resolved triple.
    pub fn provider(&self) -> StaticProvider {
        self.credentials.provider()
    }

    pub fn region(&self) -> Region {
        self.region.clone()
    }
}
