use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::client::ClientContext;
use crate::error::BlockError;
use crate::sanitize;
use crate::schema::OperationDescriptor;

/// One AWS API operation with a typed request and response.
#[async_trait]
pub trait Operation: Send + Sync {
    type Input: DeserializeOwned + Send;
    type Output: Serialize + Send;

    fn descriptor(&self) -> OperationDescriptor;

    /// Builds the service client from `clients` and sends the single command.
    async fn send(
        &self,
        clients: &ClientContext,
        input: Self::Input,
    ) -> Result<Self::Output, BlockError>;
}

/// Type-erased operation as stored in the registry.
#[async_trait]
pub trait Block: Send + Sync {
    fn descriptor(&self) -> OperationDescriptor;

    async fn invoke(
        &self,
        clients: &ClientContext,
        payload: Map<String, Value>,
    ) -> Result<Value, BlockError>;
}

#[async_trait]
impl<O> Block for O
where
    O: Operation,
{
    fn descriptor(&self) -> OperationDescriptor {
        Operation::descriptor(self)
    }

    async fn invoke(
        &self,
        clients: &ClientContext,
        payload: Map<String, Value>,
    ) -> Result<Value, BlockError> {
        let descriptor = Operation::descriptor(self);
        let input: O::Input = serde_json::from_value(Value::Object(payload))
            .map_err(|e| BlockError::InvalidInput(e.to_string()))?;

        let output = self.send(clients, input).await?;
        let value = if descriptor.needs_serialization {
            sanitize::to_emittable(&output)?
        } else {
            sanitize::to_event(&output)?
        };
        Ok(normalize(value))
    }
}

/// An empty response is emitted as an empty object.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Null => Value::Object(Map::new()),
        value => value,
    }
}
