use async_trait::async_trait;
use rusoto_cloudfront::{
    CloudFront, CloudFrontClient, CreateInvalidationRequest, CreateInvalidationResult,
    GetInvalidationRequest, GetInvalidationResult, InvalidationBatch, Paths,
};
use serde::Deserialize;
use serde_json::json;

use crate::client::ClientContext;
use crate::error::BlockError;
use crate::operation::Operation;
use crate::schema::{object_schema, FieldDescriptor, FieldType, OperationDescriptor};

const SERVICE: &str = "cloudfront";

fn client(clients: &ClientContext) -> CloudFrontClient {
    CloudFrontClient::new_with(clients.dispatcher(), clients.provider(), clients.region())
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct PathList {
    pub quantity: i64,
    #[serde(default)]
    pub items: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct InvalidationBatchShape {
    pub paths: PathList,
    pub caller_reference: String,
}

impl From<InvalidationBatchShape> for InvalidationBatch {
    fn from(batch: InvalidationBatchShape) -> Self {
        InvalidationBatch {
            caller_reference: batch.caller_reference,
            paths: Paths {
                items: batch.paths.items,
                quantity: batch.paths.quantity,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

fn invalidation_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "Id": { "type": "string" },
            "Status": { "type": "string" },
            "CreateTime": { "type": "string" },
            "InvalidationBatch": {
                "type": "object",
                "properties": {
                    "Paths": {
                        "type": "object",
                        "properties": {
                            "Quantity": { "type": "number" },
                            "Items": { "type": "array", "items": { "type": "string" } }
                        },
                        "required": ["Quantity"]
                    },
                    "CallerReference": { "type": "string" }
                },
                "required": ["Paths", "CallerReference"]
            }
        },
        "required": ["Id", "Status", "CreateTime", "InvalidationBatch"],
        "additionalProperties": true
    })
}

pub struct GetInvalidation;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetInvalidationInput {
    pub distribution_id: String,
    pub id: String,
}

const GET_INVALIDATION_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::required(
        "DistributionId",
        FieldType::String,
        "The distribution's ID.",
    ),
    FieldDescriptor::required(
        "Id",
        FieldType::String,
        "The identifier for the invalidation request.",
    ),
];

#[async_trait]
impl Operation for GetInvalidation {
    type Input = GetInvalidationInput;
    type Output = GetInvalidationResult;

    fn descriptor(&self) -> OperationDescriptor {
        OperationDescriptor {
            name: "cloudfront.GetInvalidation",
            service: SERVICE,
            display_name: "Get Invalidation",
            description: "Get the information about an invalidation.",
            input_fields: GET_INVALIDATION_FIELDS,
            output_schema: object_schema(json!({ "Invalidation": invalidation_schema() })),
            needs_serialization: false,
        }
    }

    async fn send(
        &self,
        clients: &ClientContext,
        input: GetInvalidationInput,
    ) -> Result<GetInvalidationResult, BlockError> {
        client(clients)
            .get_invalidation(GetInvalidationRequest {
                distribution_id: input.distribution_id,
                id: input.id,
                ..Default::default()
            })
            .await
            .map_err(|e| BlockError::api("cloudfront.GetInvalidation", e))
    }
}

pub struct CreateInvalidation;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateInvalidationInput {
    pub distribution_id: String,
    pub invalidation_batch: InvalidationBatchShape,
}

const CREATE_INVALIDATION_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::required(
        "DistributionId",
        FieldType::String,
        "The distribution's id.",
    ),
    FieldDescriptor::required(
        "InvalidationBatch",
        FieldType::Object,
        "The batch information for the invalidation: Paths (Quantity, Items) and CallerReference.",
    ),
];

#[async_trait]
impl Operation for CreateInvalidation {
    type Input = CreateInvalidationInput;
    type Output = CreateInvalidationResult;

    fn descriptor(&self) -> OperationDescriptor {
        OperationDescriptor {
            name: "cloudfront.CreateInvalidation",
            service: SERVICE,
            display_name: "Create Invalidation",
            description: "Create a new invalidation for a distribution.",
            input_fields: CREATE_INVALIDATION_FIELDS,
            output_schema: object_schema(json!({
                "Location": { "type": "string" },
                "Invalidation": invalidation_schema(),
            })),
            needs_serialization: false,
        }
    }

    async fn send(
        &self,
        clients: &ClientContext,
        input: CreateInvalidationInput,
    ) -> Result<CreateInvalidationResult, BlockError> {
        client(clients)
            .create_invalidation(CreateInvalidationRequest {
                distribution_id: input.distribution_id,
                invalidation_batch: input.invalidation_batch.into(),
                ..Default::default()
            })
            .await
            .map_err(|e| BlockError::api("cloudfront.CreateInvalidation", e))
    }
}
