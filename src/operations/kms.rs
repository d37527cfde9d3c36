use async_trait::async_trait;
use rusoto_kms::{
    DecryptRequest, DecryptResponse, EncryptRequest, EncryptResponse, Kms, KmsClient,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

use crate::client::ClientContext;
use crate::error::BlockError;
use crate::operation::Operation;
use crate::operations::decode_blob;
use crate::schema::{object_schema, FieldDescriptor, FieldType, OperationDescriptor};

const SERVICE: &str = "kms";

fn client(clients: &ClientContext) -> KmsClient {
    KmsClient::new_with(clients.dispatcher(), clients.provider(), clients.region())
}

pub struct Encrypt;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EncryptInput {
    pub key_id: String,
    pub plaintext: String,
    #[serde(default)]
    pub encryption_context: Option<HashMap<String, String>>,
    #[serde(default)]
    pub grant_tokens: Option<Vec<String>>,
    #[serde(default)]
    pub encryption_algorithm: Option<String>,
}

const ENCRYPT_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::required(
        "KeyId",
        FieldType::String,
        "Identifies the KMS key to use: key ID, key ARN, alias name or alias ARN.",
    ),
    FieldDescriptor::required(
        "Plaintext",
        FieldType::String,
        "Data to be encrypted, base64 encoded.",
    ),
    FieldDescriptor::optional(
        "EncryptionContext",
        FieldType::Object,
        "Non-secret key-value pairs bound to the ciphertext.",
    ),
    FieldDescriptor::optional("GrantTokens", FieldType::Array, "A list of grant tokens."),
    FieldDescriptor::optional(
        "EncryptionAlgorithm",
        FieldType::String,
        "The encryption algorithm, SYMMETRIC_DEFAULT unless the key is asymmetric.",
    ),
];

#[async_trait]
impl Operation for Encrypt {
    type Input = EncryptInput;
    type Output = EncryptResponse;

    fn descriptor(&self) -> OperationDescriptor {
        OperationDescriptor {
            name: "kms.Encrypt",
            service: SERVICE,
            display_name: "Encrypt",
            description: "Encrypts plaintext of up to 4,096 bytes using a KMS key.",
            input_fields: ENCRYPT_FIELDS,
            output_schema: object_schema(json!({
                "CiphertextBlob": { "type": "string", "contentEncoding": "base64" },
                "KeyId": { "type": "string" },
                "EncryptionAlgorithm": { "type": "string" },
            })),
            needs_serialization: false,
        }
    }

    async fn send(
        &self,
        clients: &ClientContext,
        input: EncryptInput,
    ) -> Result<EncryptResponse, BlockError> {
        let plaintext = decode_blob("Plaintext", &input.plaintext)?;
        client(clients)
            .encrypt(EncryptRequest {
                key_id: input.key_id,
                plaintext,
                encryption_context: input.encryption_context,
                grant_tokens: input.grant_tokens,
                encryption_algorithm: input.encryption_algorithm,
                ..Default::default()
            })
            .await
            .map_err(|e| BlockError::api("kms.Encrypt", e))
    }
}

pub struct Decrypt;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DecryptInput {
    pub ciphertext_blob: String,
    #[serde(default)]
    pub key_id: Option<String>,
    #[serde(default)]
    pub encryption_context: Option<HashMap<String, String>>,
    #[serde(default)]
    pub grant_tokens: Option<Vec<String>>,
    #[serde(default)]
    pub encryption_algorithm: Option<String>,
}

const DECRYPT_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::required(
        "CiphertextBlob",
        FieldType::String,
        "Ciphertext to be decrypted, base64 encoded.",
    ),
    FieldDescriptor::optional(
        "KeyId",
        FieldType::String,
        "The KMS key that was used to encrypt the ciphertext.",
    ),
    FieldDescriptor::optional(
        "EncryptionContext",
        FieldType::Object,
        "The encryption context supplied when the data was encrypted.",
    ),
    FieldDescriptor::optional("GrantTokens", FieldType::Array, "A list of grant tokens."),
    FieldDescriptor::optional(
        "EncryptionAlgorithm",
        FieldType::String,
        "The algorithm that was used to encrypt the ciphertext.",
    ),
];

#[async_trait]
impl Operation for Decrypt {
    type Input = DecryptInput;
    type Output = DecryptResponse;

    fn descriptor(&self) -> OperationDescriptor {
        OperationDescriptor {
            name: "kms.Decrypt",
            service: SERVICE,
            display_name: "Decrypt",
            description: "Decrypts ciphertext that was encrypted by a KMS key.",
            input_fields: DECRYPT_FIELDS,
            output_schema: object_schema(json!({
                "KeyId": { "type": "string" },
                "Plaintext": { "type": "string", "contentEncoding": "base64" },
                "EncryptionAlgorithm": { "type": "string" },
            })),
            needs_serialization: false,
        }
    }

    async fn send(
        &self,
        clients: &ClientContext,
        input: DecryptInput,
    ) -> Result<DecryptResponse, BlockError> {
        let ciphertext_blob = decode_blob("CiphertextBlob", &input.ciphertext_blob)?;
        client(clients)
            .decrypt(DecryptRequest {
                ciphertext_blob,
                key_id: input.key_id,
                encryption_context: input.encryption_context,
                grant_tokens: input.grant_tokens,
                encryption_algorithm: input.encryption_algorithm,
                ..Default::default()
            })
            .await
            .map_err(|e| BlockError::api("kms.Decrypt", e))
    }
}

#[cfg(test)]
mod tests {
    use crate::client::ClientContext;
    use crate::credentials::ResolvedCredentials;
    use crate::operation::Operation;
    use crate::operations::kms::{Decrypt, DecryptInput};
    use crate::test_util::{base_config, MockQueue};
    use bytes::Bytes;
    use rusoto_core::Region;
    use rusoto_mock::MockRequestDispatcher;

    #[tokio::test]
    async fn test_decrypt_round_trips_base64() {
        let queue = MockQueue::new(vec![MockRequestDispatcher::default().with_body(
            r#"{"KeyId":"alias/blocks","Plaintext":"aGVsbG8=","EncryptionAlgorithm":"SYMMETRIC_DEFAULT"}"#,
        )]);
        let clients = ClientContext::new(
            queue.dispatcher(),
            ResolvedCredentials::from(&base_config()),
            Region::UsEast1,
        );

        let result = Decrypt
            .send(
                &clients,
                DecryptInput {
                    ciphertext_blob: "AQIDBA==".to_string(),
                    key_id: None,
                    encryption_context: None,
                    grant_tokens: None,
                    encryption_algorithm: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(result.plaintext, Some(Bytes::from_static(b"hello")));
        assert_eq!(result.key_id.as_deref(), Some("alias/blocks"));
        assert!(queue.requests()[0]
            .body
            .contains("\"CiphertextBlob\":\"AQIDBA==\""));
    }
}
