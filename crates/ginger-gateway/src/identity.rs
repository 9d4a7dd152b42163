//! Caller identity

use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Account the current credentials belong to
    async fn caller_account_id(&self) -> Result<String>;
}
