use async_trait::async_trait;
use rusoto_s3::{
    GetObjectOutput, GetObjectRequest, ListObjectsV2Output, ListObjectsV2Request, S3Client, S3,
};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde::Deserialize;
use serde_json::json;

use crate::client::ClientContext;
use crate::error::BlockError;
use crate::operation::Operation;
use crate::schema::{object_schema, FieldDescriptor, FieldType, OperationDescriptor};

const SERVICE: &str = "s3";

fn client(clients: &ClientContext) -> S3Client {
    S3Client::new_with(clients.dispatcher(), clients.provider(), clients.region())
}

pub struct ListObjectsV2;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListObjectsInput {
    pub bucket: String,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub delimiter: Option<String>,
    #[serde(default)]
    pub max_keys: Option<i64>,
    #[serde(default)]
    pub continuation_token: Option<String>,
    #[serde(default)]
    pub start_after: Option<String>,
    #[serde(default)]
    pub fetch_owner: Option<bool>,
}

const LIST_OBJECTS_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::required("Bucket", FieldType::String, "Bucket name to list."),
    FieldDescriptor::optional(
        "Prefix",
        FieldType::String,
        "Limits the response to keys that begin with the specified prefix.",
    ),
    FieldDescriptor::optional(
        "Delimiter",
        FieldType::String,
        "A character you use to group keys.",
    ),
    FieldDescriptor::optional(
        "MaxKeys",
        FieldType::Number,
        "Sets the maximum number of keys returned in the response.",
    ),
    FieldDescriptor::optional(
        "ContinuationToken",
        FieldType::String,
        "Continues the listing on this bucket with a token from a previous response.",
    ),
    FieldDescriptor::optional(
        "StartAfter",
        FieldType::String,
        "The key to start listing after.",
    ),
    FieldDescriptor::optional(
        "FetchOwner",
        FieldType::Boolean,
        "Return the owner field with each key in the result.",
    ),
];

#[async_trait]
impl Operation for ListObjectsV2 {
    type Input = ListObjectsInput;
    type Output = ListObjectsV2Output;

    fn descriptor(&self) -> OperationDescriptor {
        OperationDescriptor {
            name: "s3.ListObjectsV2",
            service: SERVICE,
            display_name: "List Objects V2",
            description: "Returns some or all (up to 1,000) of the objects in a bucket.",
            input_fields: LIST_OBJECTS_FIELDS,
            output_schema: object_schema(json!({
                "Name": { "type": "string" },
                "Prefix": { "type": "string" },
                "KeyCount": { "type": "number" },
                "IsTruncated": { "type": "boolean" },
                "Contents": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "Key": { "type": "string" },
                            "LastModified": { "type": "string" },
                            "ETag": { "type": "string" },
                            "Size": { "type": "number" },
                            "StorageClass": { "type": "string" },
                        },
                        "additionalProperties": true,
                    },
                },
                "CommonPrefixes": { "type": "array", "items": { "type": "object" } },
                "EncodingType": { "type": "string" },
                "NextContinuationToken": { "type": "string" },
            })),
            needs_serialization: true,
        }
    }

    async fn send(
        &self,
        clients: &ClientContext,
        input: ListObjectsInput,
    ) -> Result<ListObjectsV2Output, BlockError> {
        client(clients)
            .list_objects_v2(ListObjectsV2Request {
                bucket: input.bucket,
                prefix: input.prefix,
                delimiter: input.delimiter,
                max_keys: input.max_keys,
                continuation_token: input.continuation_token,
                start_after: input.start_after,
                fetch_owner: input.fetch_owner,
                ..Default::default()
            })
            .await
            .map_err(|e| BlockError::api("s3.ListObjectsV2", e))
    }
}

pub struct GetObject;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetObjectInput {
    pub bucket: String,
    pub key: String,
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub version_id: Option<String>,
}

/// `GetObjectOutput` owns the live body stream and has no `Serialize` impl.
/// Every member except the body is written out here.
#[derive(Debug)]
pub struct ObjectOutput(pub GetObjectOutput);

impl Serialize for ObjectOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let output = &self.0;
        let mut state = serializer.serialize_struct("GetObjectOutput", 31)?;
        state.serialize_field("accept_ranges", &output.accept_ranges)?;
        state.serialize_field("bucket_key_enabled", &output.bucket_key_enabled)?;
        state.serialize_field("cache_control", &output.cache_control)?;
        state.serialize_field("content_disposition", &output.content_disposition)?;
        state.serialize_field("content_encoding", &output.content_encoding)?;
        state.serialize_field("content_language", &output.content_language)?;
        state.serialize_field("content_length", &output.content_length)?;
        state.serialize_field("content_range", &output.content_range)?;
        state.serialize_field("content_type", &output.content_type)?;
        state.serialize_field("delete_marker", &output.delete_marker)?;
        state.serialize_field("e_tag", &output.e_tag)?;
        state.serialize_field("expiration", &output.expiration)?;
        state.serialize_field("expires", &output.expires)?;
        state.serialize_field("last_modified", &output.last_modified)?;
        state.serialize_field("metadata", &output.metadata)?;
        state.serialize_field("missing_meta", &output.missing_meta)?;
        state.serialize_field("object_lock_legal_hold_status", &output.object_lock_legal_hold_status)?;
        state.serialize_field("object_lock_mode", &output.object_lock_mode)?;
        state.serialize_field("object_lock_retain_until_date", &output.object_lock_retain_until_date)?;
        state.serialize_field("parts_count", &output.parts_count)?;
        state.serialize_field("replication_status", &output.replication_status)?;
        state.serialize_field("request_charged", &output.request_charged)?;
        state.serialize_field("restore", &output.restore)?;
        state.serialize_field("sse_customer_algorithm", &output.sse_customer_algorithm)?;
        state.serialize_field("sse_customer_key_md5", &output.sse_customer_key_md5)?;
        state.serialize_field("ssekms_key_id", &output.ssekms_key_id)?;
        state.serialize_field("server_side_encryption", &output.server_side_encryption)?;
        state.serialize_field("storage_class", &output.storage_class)?;
        state.serialize_field("tag_count", &output.tag_count)?;
        state.serialize_field("version_id", &output.version_id)?;
        state.serialize_field("website_redirect_location", &output.website_redirect_location)?;
        state.end()
    }
}

const GET_OBJECT_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::required(
        "Bucket",
        FieldType::String,
        "The bucket name containing the object.",
    ),
    FieldDescriptor::required("Key", FieldType::String, "Key of the object to get."),
    FieldDescriptor::optional(
        "Range",
        FieldType::String,
        "Downloads the specified range bytes of an object.",
    ),
    FieldDescriptor::optional(
        "VersionId",
        FieldType::String,
        "VersionId used to reference a specific version of the object.",
    ),
];

#[async_trait]
impl Operation for GetObject {
    type Input = GetObjectInput;
    type Output = ObjectOutput;

    fn descriptor(&self) -> OperationDescriptor {
        OperationDescriptor {
            name: "s3.GetObject",
            service: SERVICE,
            display_name: "Get Object",
            description: "Retrieves an object from Amazon S3. The event carries the object's \
                          metadata; the body stream is not part of it.",
            input_fields: GET_OBJECT_FIELDS,
            output_schema: object_schema(json!({
                "ContentLength": { "type": "number" },
                "ContentType": { "type": "string" },
                "ETag": { "type": "string" },
                "LastModified": { "type": "string" },
                "StorageClass": { "type": "string" },
                "CacheControl": { "type": "string" },
                "ServerSideEncryption": { "type": "string" },
                "Metadata": { "type": "object" },
                "VersionId": { "type": "string" },
            })),
            needs_serialization: true,
        }
    }

    async fn send(
        &self,
        clients: &ClientContext,
        input: GetObjectInput,
    ) -> Result<ObjectOutput, BlockError> {
        client(clients)
            .get_object(GetObjectRequest {
                bucket: input.bucket,
                key: input.key,
                range: input.range,
                version_id: input.version_id,
                ..Default::default()
            })
            .await
            .map(ObjectOutput)
            .map_err(|e| BlockError::api("s3.GetObject", e))
    }
}

#[cfg(test)]
mod tests {
    use crate::client::ClientContext;
    use crate::credentials::ResolvedCredentials;
    use crate::operation::Block;
    use crate::operations::s3::{GetObject, ListObjectsV2};
    use crate::test_util::{base_config, MockQueue};
    use rusoto_core::Region;
    use rusoto_mock::{MockRequestDispatcher, MockResponseReader, ReadMockResponse};
    use serde_json::{json, Map, Value};

    fn clients(queue: &MockQueue) -> ClientContext {
        ClientContext::new(
            queue.dispatcher(),
            ResolvedCredentials::from(&base_config()),
            Region::UsEast1,
        )
    }

    fn payload(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_descriptors() {
        let list = ListObjectsV2.descriptor();
        assert_eq!(list.display_name, "List Objects V2");
        assert!(list.needs_serialization);

        let get = GetObject.descriptor();
        assert!(get.description.starts_with("Retrieves an object"));
        assert!(get.description.contains("body stream is not part of it"));
    }

    #[tokio::test]
    async fn test_list_objects() {
        let queue = MockQueue::new(vec![MockRequestDispatcher::default().with_body(
            &*MockResponseReader::read_response("test_resources/valid", "list_objects_v2.xml"),
        )]);

        let event = ListObjectsV2
            .invoke(
                &clients(&queue),
                payload(json!({ "Bucket": "example-bucket", "Prefix": "logs/" })),
            )
            .await
            .unwrap();

        assert_eq!(event["Name"], json!("example-bucket"));
        assert_eq!(event["KeyCount"], json!(2));
        assert_eq!(event["IsTruncated"], json!(false));
        assert_eq!(event["Contents"][0]["Key"], json!("logs/2020-12-01.log"));
        assert_eq!(event["Contents"][0]["Size"], json!(434234));
        assert_eq!(event["Contents"][1]["Key"], json!("logs/2020-12-02.log"));
        assert_eq!(event["Contents"][0]["Owner"]["DisplayName"], json!("ops"));
        assert_eq!(event["EncodingType"], json!("url"));
        assert!(event.get("ContinuationToken").is_none());

        let requests = queue.requests();
        assert_eq!(requests[0].method, "GET");
        assert!(requests[0].path.contains("example-bucket"));
    }

    #[tokio::test]
    async fn test_get_object_elides_body() {
        let queue = MockQueue::new(vec![MockRequestDispatcher::default()
            .with_body("hello")
            .with_header("Content-Length", "5")
            .with_header("Content-Type", "text/plain")
            .with_header("ETag", "\"5d41402abc4b2a76b9719d911017c592\"")]);

        let event = GetObject
            .invoke(
                &clients(&queue),
                payload(json!({ "Bucket": "example-bucket", "Key": "greeting.txt" })),
            )
            .await
            .unwrap();

        assert!(event.get("Body").is_none());
        assert_eq!(event["ContentLength"], json!(5));
        assert_eq!(event["ContentType"], json!("text/plain"));
        assert_eq!(
            event["ETag"],
            json!("\"5d41402abc4b2a76b9719d911017c592\"")
        );

        let requests = queue.requests();
        assert_eq!(requests[0].method, "GET");
        assert!(requests[0].path.ends_with("greeting.txt"));
    }

    #[tokio::test]
    async fn test_get_object_keeps_every_header_member() {
        let queue = MockQueue::new(vec![MockRequestDispatcher::default()
            .with_body("archived")
            .with_header("Content-Length", "8")
            .with_header("x-amz-storage-class", "GLACIER")
            .with_header("Cache-Control", "no-cache")
            .with_header("x-amz-server-side-encryption", "aws:kms")
            .with_header(
                "x-amz-server-side-encryption-aws-kms-key-id",
                "arn:aws:kms:us-east-1:123456789012:key/1234abcd",
            )
            .with_header("x-amz-version-id", "3HL4kqtJlcpXroDTDmJ")
            .with_header("x-amz-meta-build-id", "42")]);

        let event = GetObject
            .invoke(
                &clients(&queue),
                payload(json!({ "Bucket": "example-bucket", "Key": "archive.tar" })),
            )
            .await
            .unwrap();

        assert_eq!(event["StorageClass"], json!("GLACIER"));
        assert_eq!(event["CacheControl"], json!("no-cache"));
        assert_eq!(event["ServerSideEncryption"], json!("aws:kms"));
        assert_eq!(
            event["SSEKMSKeyId"],
            json!("arn:aws:kms:us-east-1:123456789012:key/1234abcd")
        );
        assert_eq!(event["VersionId"], json!("3HL4kqtJlcpXroDTDmJ"));
        assert_eq!(event["Metadata"], json!({ "build-id": "42" }));
        assert!(event.get("Body").is_none());
        assert!(event.get("Expires").is_none());
    }
}
