use async_trait::async_trait;
use chrono::Utc;
use rusoto_core::credential::StaticProvider;
use rusoto_sts::{AssumeRoleRequest, Sts, StsClient};
use std::fmt;
use tracing::{debug, info};

use crate::client::SharedDispatcher;
use crate::config::{AppConfig, InvocationContext};
use crate::error::BlockError;

const SESSION_NAME_PREFIX: &str = "blocks-";

/// The access key, secret key and session token used for one downstream call.
#[derive(Clone, PartialEq)]
pub struct ResolvedCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl ResolvedCredentials {
    pub fn provider(&self) -> StaticProvider {
        StaticProvider::new(
            self.access_key_id.clone(),
            self.secret_access_key.clone(),
            self.session_token.clone(),
            None,
        )
    }
}

impl From<&AppConfig> for ResolvedCredentials {
    fn from(config: &AppConfig) -> Self {
        ResolvedCredentials {
            access_key_id: config.access_key_id.clone(),
            secret_access_key: config.secret_access_key.clone(),
            session_token: config.session_token.clone(),
        }
    }
}

impl fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"**")
            .field("session_token", &self.session_token.as_ref().map(|_| "**"))
            .finish()
    }
}

#[async_trait]
pub trait ResolveCredentials {
    async fn resolve(&self, ctx: &InvocationContext) -> Result<ResolvedCredentials, BlockError>;
}

/// Uses the base credentials as they are, or trades them for a role's temporary credentials.
pub struct StsCredentialResolver {
    dispatcher: SharedDispatcher,
}

impl StsCredentialResolver {
    pub fn new(dispatcher: SharedDispatcher) -> Self {
        StsCredentialResolver { dispatcher }
    }

    async fn assume_role(
        &self,
        ctx: &InvocationContext,
        role_arn: &str,
    ) -> Result<ResolvedCredentials, BlockError> {
        // Always signed with the platform credentials, never with a previous resolution.
        let base = ResolvedCredentials::from(&ctx.base);
        let client = StsClient::new_with(
            self.dispatcher.clone(),
            base.provider(),
            ctx.aws_region()?,
        );

        let role_session_name = session_name();
        info!(%role_arn, %role_session_name, region = %ctx.region, "assuming role");
        let response = client
            .assume_role(AssumeRoleRequest {
                role_arn: role_arn.to_string(),
                role_session_name,
                ..Default::default()
            })
            .await?;

        let credentials = response
            .credentials
            .ok_or(BlockError::MissingAssumedCredentials)?;
        debug!(expiration = %credentials.expiration, "received temporary credentials");
        Ok(ResolvedCredentials {
            access_key_id: credentials.access_key_id,
            secret_access_key: credentials.secret_access_key,
            session_token: Some(credentials.session_token),
        })
    }
}

#[async_trait]
impl ResolveCredentials for StsCredentialResolver {
    async fn resolve(&self, ctx: &InvocationContext) -> Result<ResolvedCredentials, BlockError> {
        match ctx.assume_role_arn {
            Some(ref role_arn) => self.assume_role(ctx, role_arn).await,
            None => Ok(ResolvedCredentials::from(&ctx.base)),
        }
    }
}

fn session_name() -> String {
    format!("{}{}", SESSION_NAME_PREFIX, Utc::now().timestamp_millis())
}
