use rusoto_core::Region;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::BlockError;
use crate::schema::FieldType;

const REGION_FIELD: &str = "region";
const ASSUME_ROLE_ARN_FIELD: &str = "assumeRoleArn";

/// Platform-level app configuration: the base credentials and an optional endpoint override.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"**")
            .field("session_token", &self.session_token.as_ref().map(|_| "**"))
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppInput {
    pub config: AppConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInput {
    #[serde(default)]
    pub input_config: Map<String, Value>,
}

/// One invocation as delivered by the host.
#[derive(Debug, Clone, Deserialize)]
pub struct InvocationRequest {
    pub operation: String,
    pub app: AppInput,
    pub event: EventInput,
}

/// Per-call state, with the routing fields split off the operation payload.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub region: String,
    pub assume_role_arn: Option<String>,
    pub endpoint: Option<String>,
    pub base: AppConfig,
    pub payload: Map<String, Value>,
}

impl InvocationContext {
    pub fn new(app: AppConfig, mut input_config: Map<String, Value>) -> Result<Self, BlockError> {
        let region = match input_config.remove(REGION_FIELD) {
            Some(Value::String(region)) if !region.is_empty() => region,
            Some(Value::String(_)) | Some(Value::Null) | None => {
                return Err(BlockError::MissingField(REGION_FIELD.to_string()))
            }
            Some(_) => {
                return Err(BlockError::InvalidFieldType {
                    field: REGION_FIELD.to_string(),
                    expected: FieldType::String,
                })
            }
        };
        let assume_role_arn = match input_config.remove(ASSUME_ROLE_ARN_FIELD) {
            Some(Value::String(arn)) if !arn.is_empty() => Some(arn),
            Some(Value::String(_)) | Some(Value::Null) | None => None,
            Some(_) => {
                return Err(BlockError::InvalidFieldType {
                    field: ASSUME_ROLE_ARN_FIELD.to_string(),
                    expected: FieldType::String,
                })
            }
        };
        let endpoint = app.endpoint.clone().filter(|endpoint| !endpoint.is_empty());

        Ok(InvocationContext {
            region,
            assume_role_arn,
            endpoint,
            base: app,
            payload: input_config,
        })
    }

    pub fn from_request(request: &InvocationRequest) -> Result<Self, BlockError> {
        Self::new(
            request.app.config.clone(),
            request.event.input_config.clone(),
        )
    }

    /// The signing region, pointed at the custom endpoint when one is configured.
    pub fn aws_region(&self) -> Result<Region, BlockError> {
        match self.endpoint {
            Some(ref endpoint) => Ok(Region::Custom {
                name: self.region.clone(),
                endpoint: endpoint.clone(),
            }),
            None => Ok(Region::from_str(&self.region)?),
        }
    }
}
