use async_trait::async_trait;
use rusoto_sts::{GetCallerIdentityRequest, GetCallerIdentityResponse, Sts, StsClient};
use serde::Deserialize;
use serde_json::json;

use crate::client::ClientContext;
use crate::error::BlockError;
use crate::operation::Operation;
use crate::schema::{object_schema, OperationDescriptor};

pub struct GetCallerIdentity;

#[derive(Debug, Default, Deserialize)]
pub struct GetCallerIdentityInput {}

#[async_trait]
impl Operation for GetCallerIdentity {
    type Input = GetCallerIdentityInput;
    type Output = GetCallerIdentityResponse;

    fn descriptor(&self) -> OperationDescriptor {
        OperationDescriptor {
            name: "sts.GetCallerIdentity",
            service: "sts",
            display_name: "Get Caller Identity",
            description: "Returns details about the IAM identity whose credentials sign the call.",
            input_fields: &[],
            output_schema: object_schema(json!({
                "UserId": { "type": "string" },
                "Account": { "type": "string" },
                "Arn": { "type": "string" },
            })),
            needs_serialization: false,
        }
    }

    async fn send(
        &self,
        clients: &ClientContext,
        _input: GetCallerIdentityInput,
    ) -> Result<GetCallerIdentityResponse, BlockError> {
        let client =
            StsClient::new_with(clients.dispatcher(), clients.provider(), clients.region());
        client
            .get_caller_identity(GetCallerIdentityRequest {})
            .await
            .map_err(|e| BlockError::api("sts.GetCallerIdentity", e))
    }
}

#[cfg(test)]
mod tests {
    use crate::client::ClientContext;
    use crate::credentials::ResolvedCredentials;
    use crate::operation::Block;
    use crate::operations::sts::GetCallerIdentity;
    use crate::test_util::{base_config, MockQueue, BASE_ACCESS_KEY};
    use rusoto_core::Region;
    use rusoto_mock::{MockRequestDispatcher, MockResponseReader, ReadMockResponse};
    use serde_json::{json, Map};

    #[tokio::test]
    async fn test_get_caller_identity() {
        let queue = MockQueue::new(vec![MockRequestDispatcher::default().with_body(
            &*MockResponseReader::read_response("test_resources/valid", "get_caller_identity.xml"),
        )]);
        let clients = ClientContext::new(
            queue.dispatcher(),
            ResolvedCredentials::from(&base_config()),
            Region::UsEast1,
        );

        let event = GetCallerIdentity
            .invoke(&clients, Map::new())
            .await
            .unwrap();

        assert_eq!(
            event,
            json!({
                "UserId": "AIDASAMPLEUSERID",
                "Account": "123456789012",
                "Arn": "arn:aws:iam::123456789012:user/deployer",
            })
        );
        let requests = queue.requests();
        assert!(requests[0].body.contains("Action=GetCallerIdentity"));
        assert_eq!(requests[0].access_key.as_deref(), Some(BASE_ACCESS_KEY));
    }
}
