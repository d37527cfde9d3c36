use async_trait::async_trait;
use rusoto_cloudwatch::{
    CloudWatch, CloudWatchClient, Dimension, GetMetricStatisticsInput, GetMetricStatisticsOutput,
    MetricDatum, PutMetricDataInput,
};
use serde::Deserialize;
use serde_json::json;

use crate::client::ClientContext;
use crate::error::BlockError;
use crate::operation::Operation;
use crate::schema::{object_schema, FieldDescriptor, FieldType, OperationDescriptor};

const SERVICE: &str = "cloudwatch";

fn client(clients: &ClientContext) -> CloudWatchClient {
    CloudWatchClient::new_with(clients.dispatcher(), clients.provider(), clients.region())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricDimension {
    pub name: String,
    pub value: String,
}

impl From<MetricDimension> for Dimension {
    fn from(dimension: MetricDimension) -> Self {
        Dimension {
            name: dimension.name,
            value: dimension.value,
        }
    }
}

pub struct GetMetricStatistics;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetMetricStatisticsRequest {
    pub namespace: String,
    pub metric_name: String,
    pub start_time: String,
    pub end_time: String,
    pub period: i64,
    #[serde(default)]
    pub dimensions: Option<Vec<MetricDimension>>,
    #[serde(default)]
    pub statistics: Option<Vec<String>>,
    #[serde(default)]
    pub extended_statistics: Option<Vec<String>>,
    #[serde(default)]
    pub unit: Option<String>,
}

const GET_METRIC_STATISTICS_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::required("Namespace", FieldType::String, "The namespace of the metric."),
    FieldDescriptor::required("MetricName", FieldType::String, "The name of the metric."),
    FieldDescriptor::required(
        "StartTime",
        FieldType::String,
        "The time stamp that determines the first data point to return (ISO 8601).",
    ),
    FieldDescriptor::required(
        "EndTime",
        FieldType::String,
        "The time stamp that determines the last data point to return (ISO 8601).",
    ),
    FieldDescriptor::required(
        "Period",
        FieldType::Number,
        "The granularity, in seconds, of the returned data points.",
    ),
    FieldDescriptor::optional(
        "Dimensions",
        FieldType::Array,
        "The dimensions, each with a Name and a Value.",
    ),
    FieldDescriptor::optional(
        "Statistics",
        FieldType::Array,
        "The metric statistics, other than percentile.",
    ),
    FieldDescriptor::optional(
        "ExtendedStatistics",
        FieldType::Array,
        "The percentile statistics, such as p99.",
    ),
    FieldDescriptor::optional("Unit", FieldType::String, "The unit for a given metric."),
];

#[async_trait]
impl Operation for GetMetricStatistics {
    type Input = GetMetricStatisticsRequest;
    type Output = GetMetricStatisticsOutput;

    fn descriptor(&self) -> OperationDescriptor {
        OperationDescriptor {
            name: "cloudwatch.GetMetricStatistics",
            service: SERVICE,
            display_name: "Get Metric Statistics",
            description: "Gets statistics for the specified metric.",
            input_fields: GET_METRIC_STATISTICS_FIELDS,
            output_schema: object_schema(json!({
                "Label": { "type": "string" },
                "Datapoints": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "Timestamp": { "type": "string" },
                            "SampleCount": { "type": "number" },
                            "Average": { "type": "number" },
                            "Sum": { "type": "number" },
                            "Minimum": { "type": "number" },
                            "Maximum": { "type": "number" },
                            "Unit": { "type": "string" },
                            "ExtendedStatistics": { "type": "object" },
                        },
                        "additionalProperties": true,
                    },
                },
            })),
            needs_serialization: false,
        }
    }

    async fn send(
        &self,
        clients: &ClientContext,
        input: GetMetricStatisticsRequest,
    ) -> Result<GetMetricStatisticsOutput, BlockError> {
        client(clients)
            .get_metric_statistics(GetMetricStatisticsInput {
                namespace: input.namespace,
                metric_name: input.metric_name,
                start_time: input.start_time,
                end_time: input.end_time,
                period: input.period,
                dimensions: input
                    .dimensions
                    .map(|dimensions| dimensions.into_iter().map(Dimension::from).collect()),
                statistics: input.statistics,
                extended_statistics: input.extended_statistics,
                unit: input.unit,
                ..Default::default()
            })
            .await
            .map_err(|e| BlockError::api("cloudwatch.GetMetricStatistics", e))
    }
}

pub struct PutMetricData;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricDatumInput {
    pub metric_name: String,
    #[serde(default)]
    pub dimensions: Option<Vec<MetricDimension>>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub storage_resolution: Option<i64>,
}

impl From<MetricDatumInput> for MetricDatum {
    fn from(datum: MetricDatumInput) -> Self {
        MetricDatum {
            metric_name: datum.metric_name,
            dimensions: datum
                .dimensions
                .map(|dimensions| dimensions.into_iter().map(Dimension::from).collect()),
            timestamp: datum.timestamp,
            value: datum.value,
            unit: datum.unit,
            storage_resolution: datum.storage_resolution,
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutMetricDataRequest {
    pub namespace: String,
    pub metric_data: Vec<MetricDatumInput>,
}

const PUT_METRIC_DATA_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::required("Namespace", FieldType::String, "The namespace for the metric data."),
    FieldDescriptor::required(
        "MetricData",
        FieldType::Array,
        "The data for the metric: MetricName, Dimensions, Timestamp, Value, Unit.",
    ),
];

#[async_trait]
impl Operation for PutMetricData {
    type Input = PutMetricDataRequest;
    type Output = ();

    fn descriptor(&self) -> OperationDescriptor {
        OperationDescriptor {
            name: "cloudwatch.PutMetricData",
            service: SERVICE,
            display_name: "Put Metric Data",
            description: "Publishes metric data points to CloudWatch.",
            input_fields: PUT_METRIC_DATA_FIELDS,
            output_schema: object_schema(json!({})),
            needs_serialization: false,
        }
    }

    async fn send(
        &self,
        clients: &ClientContext,
        input: PutMetricDataRequest,
    ) -> Result<(), BlockError> {
        client(clients)
            .put_metric_data(PutMetricDataInput {
                namespace: input.namespace,
                metric_data: input.metric_data.into_iter().map(MetricDatum::from).collect(),
                ..Default::default()
            })
            .await
            .map_err(|e| BlockError::api("cloudwatch.PutMetricData", e))
    }
}
