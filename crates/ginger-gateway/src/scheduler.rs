//! Scheduled rule service

use crate::error::Result;
use async_trait::async_trait;
use ginger_types::RemoteId;

#[async_trait]
pub trait SchedulerGateway: Send + Sync {
    /// Create or update a rule, returning its ARN
    async fn put_rule(&self, name: &str, expression: &str, enabled: bool) -> Result<RemoteId>;

    /// Point the rule at a function; re-targeting the same function succeeds
    async fn put_target(&self, rule: &str, target_arn: &RemoteId) -> Result<()>;

    /// Remove the rule and its targets
    async fn delete_rule(&self, name: &str) -> Result<()>;
}
