//! STS identity adapter

use super::errors::{classify, missing_field};
use crate::error::Result;
use crate::identity::IdentityGateway;
use async_trait::async_trait;
use aws_sdk_sts::Client;

pub struct StsIdentity {
    client: Client,
}

impl StsIdentity {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityGateway for StsIdentity {
    async fn caller_account_id(&self) -> Result<String> {
        let out = self
            .client
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| classify("identity", "get_caller_identity", "caller", e))?;
        out.account()
            .map(str::to_string)
            .ok_or_else(|| missing_field("identity", "get_caller_identity", "Account"))
    }
}
