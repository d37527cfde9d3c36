use async_trait::async_trait;
use rusoto_cloudformation::{
    CloudFormation, CloudFormationClient, DescribeStacksInput, DescribeStacksOutput,
};
use serde::Deserialize;
use serde_json::json;

use crate::client::ClientContext;
use crate::error::BlockError;
use crate::operation::Operation;
use crate::schema::{object_schema, FieldDescriptor, FieldType, OperationDescriptor};

pub struct DescribeStacks;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeStacksRequest {
    #[serde(default)]
    pub stack_name: Option<String>,
    #[serde(default)]
    pub next_token: Option<String>,
}

const DESCRIBE_STACKS_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::optional(
        "StackName",
        FieldType::String,
        "The name or unique stack ID of the stack to describe. All stacks when omitted.",
    ),
    FieldDescriptor::optional(
        "NextToken",
        FieldType::String,
        "A string that identifies the next page of stacks.",
    ),
];

#[async_trait]
impl Operation for DescribeStacks {
    type Input = DescribeStacksRequest;
    type Output = DescribeStacksOutput;

    fn descriptor(&self) -> OperationDescriptor {
        OperationDescriptor {
            name: "cloudformation.DescribeStacks",
            service: "cloudformation",
            display_name: "Describe Stacks",
            description: "Returns the description for the specified stack, or all stacks.",
            input_fields: DESCRIBE_STACKS_FIELDS,
            output_schema: object_schema(json!({
                "Stacks": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "StackId": { "type": "string" },
                            "StackName": { "type": "string" },
                            "CreationTime": { "type": "string" },
                            "StackStatus": { "type": "string" },
                            "DisableRollback": { "type": "boolean" },
                            "Outputs": { "type": "array", "items": { "type": "object" } },
                        },
                        "additionalProperties": true,
                    },
                },
                "NextToken": { "type": "string" },
            })),
            needs_serialization: false,
        }
    }

    async fn send(
        &self,
        clients: &ClientContext,
        input: DescribeStacksRequest,
    ) -> Result<DescribeStacksOutput, BlockError> {
        let client = CloudFormationClient::new_with(
            clients.dispatcher(),
            clients.provider(),
            clients.region(),
        );
        client
            .describe_stacks(DescribeStacksInput {
                stack_name: input.stack_name,
                next_token: input.next_token,
                ..Default::default()
            })
            .await
            .map_err(|e| BlockError::api("cloudformation.DescribeStacks", e))
    }
}
