mod client;
mod config;
mod credentials;
mod dispatcher;
mod error;
mod operation;
mod operations;
mod registry;
mod sanitize;
mod schema;
#[cfg(test)]
mod test_util;

use anyhow::Context as _;
use lambda_runtime::{handler_fn, Context};
use rusoto_core::HttpClient;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::client::SharedDispatcher;
use crate::config::InvocationRequest;
use crate::dispatcher::{CollectingSink, Invoker};
use crate::error::BlockError;
use crate::registry::Registry;

/// The envelope the host sends to the function.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum HostRequest {
    Invoke(InvocationRequest),
    Describe {
        #[serde(default)]
        operation: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let http = HttpClient::new().context("failed to create the HTTP client")?;
    let invoker = Invoker::new(Registry::global(), SharedDispatcher::new(http));
    info!(operations = invoker.registry().len(), "blocks ready");

    lambda_runtime::run(handler_fn(move |event: Value, _: Context| {
        let invoker = invoker.clone();
        async move { blocks_handler(&invoker, event).await }
    }))
    .await
    .map_err(anyhow::Error::msg)?;
    Ok(())
}

async fn blocks_handler(invoker: &Invoker, event: Value) -> Result<Value, lambda_runtime::Error> {
    let request: HostRequest = serde_json::from_value(event)?;
    Ok(handle(invoker, request).await?)
}

async fn handle(invoker: &Invoker, request: HostRequest) -> Result<Value, BlockError> {
    match request {
        HostRequest::Invoke(request) => {
            let sink = CollectingSink::new();
            invoker.invoke(&request, &sink).await?;
            Ok(sink.into_events().into_iter().next().unwrap_or_default())
        }
        HostRequest::Describe { operation: None } => {
            Ok(serde_json::to_value(invoker.registry().descriptors())?)
        }
        HostRequest::Describe {
            operation: Some(name),
        } => Ok(serde_json::to_value(
            invoker.registry().get(&name)?.descriptor(),
        )?),
    }
}

#[cfg(test)]
mod tests {
    use crate::dispatcher::Invoker;
    use crate::error::BlockError;
    use crate::registry::Registry;
    use crate::test_util::{MockQueue, BASE_ACCESS_KEY};
    use crate::{blocks_handler, handle, HostRequest};
    use rusoto_mock::{MockRequestDispatcher, MockResponseReader, ReadMockResponse};
    use serde_json::json;

    #[tokio::test]
    async fn test_describe_all_operations() {
        let queue = MockQueue::new(vec![]);
        let invoker = Invoker::new(Registry::global(), queue.dispatcher());

        let catalog = blocks_handler(&invoker, json!({ "action": "describe" }))
            .await
            .unwrap();

        let catalog = catalog.as_array().unwrap();
        assert_eq!(catalog.len(), Registry::global().len());
        assert_eq!(catalog[0]["name"], json!("cloudfront.GetInvalidation"));
        assert_eq!(catalog[0]["displayName"], json!("Get Invalidation"));
        assert_eq!(
            catalog[0]["inputFields"][0],
            json!({
                "name": "DistributionId",
                "type": "string",
                "required": true,
                "description": "The distribution's ID.",
            })
        );
    }

    #[tokio::test]
    async fn test_describe_one_operation() {
        let queue = MockQueue::new(vec![]);
        let invoker = Invoker::new(Registry::global(), queue.dispatcher());

        let descriptor = handle(
            &invoker,
            HostRequest::Describe {
                operation: Some("s3.GetObject".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(descriptor["service"], json!("s3"));
        assert_eq!(descriptor["needsSerialization"], json!(true));

        let unknown = handle(
            &invoker,
            HostRequest::Describe {
                operation: Some("s3.PutBucketPolicy".to_string()),
            },
        )
        .await;
        assert!(matches!(unknown, Err(BlockError::UnknownOperation(_))));
    }

    #[tokio::test]
    async fn test_invoke_returns_emitted_event() {
        let queue = MockQueue::new(vec![MockRequestDispatcher::default().with_body(
            &*MockResponseReader::read_response("test_resources/valid", "get_caller_identity.xml"),
        )]);
        let invoker = Invoker::new(Registry::global(), queue.dispatcher());

        let event = blocks_handler(
            &invoker,
            json!({
                "action": "invoke",
                "operation": "sts.GetCallerIdentity",
                "app": {
                    "config": {
                        "accessKeyId": BASE_ACCESS_KEY,
                        "secretAccessKey": "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY",
                    },
                },
                "event": { "inputConfig": { "region": "eu-west-1" } },
            }),
        )
        .await
        .unwrap();

        assert_eq!(event["Account"], json!("123456789012"));
        assert_eq!(queue.requests()[0].region, "eu-west-1");
    }

    #[tokio::test]
    async fn test_unknown_action_is_rejected() {
        let queue = MockQueue::new(vec![]);
        let invoker = Invoker::new(Registry::global(), queue.dispatcher());

        let result = blocks_handler(&invoker, json!({ "action": "delete" })).await;

        assert!(result.is_err());
        assert!(queue.requests().is_empty());
    }
}
