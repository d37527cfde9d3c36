use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::client::{ClientContext, SharedDispatcher};
use crate::config::{InvocationContext, InvocationRequest};
use crate::credentials::{ResolveCredentials, StsCredentialResolver};
use crate::error::BlockError;
use crate::registry::Registry;

/// Where the result of an invocation is published.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: Value) -> Result<(), BlockError>;
}

/// Keeps emitted events in memory, in order.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<Value>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_events(self) -> Vec<Value> {
        match self.events.into_inner() {
            Ok(events) => events,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl EventSink for CollectingSink {
    async fn emit(&self, event: Value) -> Result<(), BlockError> {
        self.events
            .lock()
            .map_err(|e| BlockError::Emit(e.to_string()))?
            .push(event);
        Ok(())
    }
}

/// Runs one operation per request: resolve credentials, send the command, emit the response.
#[derive(Clone)]
pub struct Invoker {
    registry: &'static Registry,
    dispatcher: SharedDispatcher,
    resolver: Arc<dyn ResolveCredentials + Send + Sync>,
}

impl Invoker {
    pub fn new(registry: &'static Registry, dispatcher: SharedDispatcher) -> Self {
        let resolver = Arc::new(StsCredentialResolver::new(dispatcher.clone()));
        Invoker {
            registry,
            dispatcher,
            resolver,
        }
    }

    pub fn registry(&self) -> &'static Registry {
        self.registry
    }

    /// Emits exactly one event on success and nothing on failure.
    pub async fn invoke(
        &self,
        request: &InvocationRequest,
        sink: &dyn EventSink,
    ) -> Result<(), BlockError> {
        let block = self.registry.get(&request.operation)?;
        let descriptor = block.descriptor();
        let ctx = InvocationContext::from_request(request)?;
        descriptor.validate(&ctx.payload)?;

        info!(
            operation = descriptor.name,
            region = %ctx.region,
            assume_role = ctx.assume_role_arn.is_some(),
            "invoking operation"
        );
        let region = ctx.aws_region()?;
        let credentials = self.resolver.resolve(&ctx).await?;
        let clients = ClientContext::new(self.dispatcher.clone(), credentials, region);

        let event = match block.invoke(&clients, ctx.payload).await {
            Ok(event) => event,
            Err(e) => {
                warn!(operation = descriptor.name, error = %e, "operation failed");
                return Err(e);
            }
        };
        debug!(operation = descriptor.name, "emitting event");
        sink.emit(event).await
    }
}
