use async_trait::async_trait;
use rusoto_ec2::{DescribeInstancesRequest, DescribeInstancesResult, Ec2, Ec2Client, Filter};
use serde::Deserialize;
use serde_json::json;

use crate::client::ClientContext;
use crate::error::BlockError;
use crate::operation::Operation;
use crate::schema::{object_schema, FieldDescriptor, FieldType, OperationDescriptor};

pub struct DescribeInstances;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceFilter {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeInstancesInput {
    #[serde(default)]
    pub instance_ids: Option<Vec<String>>,
    #[serde(default)]
    pub filters: Option<Vec<InstanceFilter>>,
    #[serde(default)]
    pub max_results: Option<i64>,
    #[serde(default)]
    pub next_token: Option<String>,
    #[serde(default)]
    pub dry_run: Option<bool>,
}

const DESCRIBE_INSTANCES_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::optional("InstanceIds", FieldType::Array, "The instance IDs."),
    FieldDescriptor::optional(
        "Filters",
        FieldType::Array,
        "Filters, each with a Name and a list of Values.",
    ),
    FieldDescriptor::optional(
        "MaxResults",
        FieldType::Number,
        "The maximum number of items to return for this request.",
    ),
    FieldDescriptor::optional(
        "NextToken",
        FieldType::String,
        "The token returned from a previous paginated request.",
    ),
    FieldDescriptor::optional(
        "DryRun",
        FieldType::Boolean,
        "Checks whether you have the required permissions, without making the request.",
    ),
];

#[async_trait]
impl Operation for DescribeInstances {
    type Input = DescribeInstancesInput;
    type Output = DescribeInstancesResult;

    fn descriptor(&self) -> OperationDescriptor {
        OperationDescriptor {
            name: "ec2.DescribeInstances",
            service: "ec2",
            display_name: "Describe Instances",
            description: "Describes the specified instances or all instances.",
            input_fields: DESCRIBE_INSTANCES_FIELDS,
            output_schema: object_schema(json!({
                "Reservations": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "ReservationId": { "type": "string" },
                            "OwnerId": { "type": "string" },
                            "Instances": { "type": "array", "items": { "type": "object" } },
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
        input: DescribeInstancesInput,
    ) -> Result<DescribeInstancesResult, BlockError> {
        let client =
            Ec2Client::new_with(clients.dispatcher(), clients.provider(), clients.region());
        let request = DescribeInstancesRequest {
            instance_ids: input.instance_ids,
            filters: input.filters.map(|filters| {
                filters
                    .into_iter()
                    .map(|filter| Filter {
                        name: Some(filter.name),
                        values: Some(filter.values),
                        ..Default::default()
                    })
                    .collect()
            }),
            max_results: input.max_results,
            next_token: input.next_token,
            dry_run: input.dry_run,
            ..Default::default()
        };

        client
            .describe_instances(request)
            .await
            .map_err(|e| BlockError::api("ec2.DescribeInstances", e))
    }
}
