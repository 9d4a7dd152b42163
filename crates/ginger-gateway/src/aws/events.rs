//! EventBridge scheduled-rule adapter

use super::errors::{classify, missing_field};
use crate::error::{GatewayError, Result};
use crate::scheduler::SchedulerGateway;
use async_trait::async_trait;
use aws_sdk_eventbridge::types::{RuleState, Target};
use aws_sdk_eventbridge::Client;
use ginger_types::RemoteId;

const SERVICE: &str = "scheduler";

pub struct EventBridgeScheduler {
    client: Client,
}

impl EventBridgeScheduler {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Target ids are scoped to the rule; one target per function
    fn target_id(target_arn: &RemoteId) -> String {
        let name = target_arn
            .as_str()
            .rsplit(':')
            .next()
            .unwrap_or(target_arn.as_str());
        let mut id = format!("ginger-{}", name);
        id.truncate(64);
        id
    }
}

#[async_trait]
impl SchedulerGateway for EventBridgeScheduler {
    async fn put_rule(&self, name: &str, expression: &str, enabled: bool) -> Result<RemoteId> {
        let state = if enabled {
            RuleState::Enabled
        } else {
            RuleState::Disabled
        };
        let out = self
            .client
            .put_rule()
            .name(name)
            .schedule_expression(expression)
            .state(state)
            .description("Managed by ginger")
            .send()
            .await
            .map_err(|e| classify(SERVICE, "put_rule", name, e))?;
        out.rule_arn()
            .map(RemoteId::from)
            .ok_or_else(|| missing_field(SERVICE, "put_rule", "RuleArn"))
    }

    async fn put_target(&self, rule: &str, target_arn: &RemoteId) -> Result<()> {
        let target = Target::builder()
            .id(Self::target_id(target_arn))
            .arn(target_arn.as_str())
            .build()
            .map_err(|e| GatewayError::Rejected {
                service: SERVICE,
                operation: "put_targets",
                code: "InvalidTarget".into(),
                message: e.to_string(),
            })?;

        let out = self
            .client
            .put_targets()
            .rule(rule)
            .targets(target)
            .send()
            .await
            .map_err(|e| classify(SERVICE, "put_targets", rule, e))?;

        if out.failed_entry_count() > 0 {
            let reason = out
                .failed_entries()
                .first()
                .and_then(|entry| entry.error_message())
                .unwrap_or("target rejected")
                .to_string();
            return Err(GatewayError::Rejected {
                service: SERVICE,
                operation: "put_targets",
                code: "FailedEntry".into(),
                message: reason,
            });
        }
        Ok(())
    }

    async fn delete_rule(&self, name: &str) -> Result<()> {
        let targets = self
            .client
            .list_targets_by_rule()
            .rule(name)
            .send()
            .await
            .map_err(|e| classify(SERVICE, "list_targets_by_rule", name, e))?;

        let ids: Vec<String> = targets
            .targets()
            .iter()
            .map(|t| t.id().to_string())
            .collect();
        if !ids.is_empty() {
            self.client
                .remove_targets()
                .rule(name)
                .set_ids(Some(ids))
                .send()
                .await
                .map_err(|e| classify(SERVICE, "remove_targets", name, e))?;
        }

        self.client
            .delete_rule()
            .name(name)
            .send()
            .await
            .map_err(|e| classify(SERVICE, "delete_rule", name, e))?;
        Ok(())
    }
}
