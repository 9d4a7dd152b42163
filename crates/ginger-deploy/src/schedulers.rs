//! Scheduler phase

use crate::error::{DeployError, Result};
use crate::orchestrator::Orchestrator;
use crate::report::{EntityKind, Outcome, Phase, PhaseReport};
use ginger_gateway::InvokeGrant;
use ginger_store::LocalState;
use ginger_types::RemoteId;
use tracing::{info, instrument, warn};

impl Orchestrator {
    /// Upsert every scheduler rule and point it at its attached functions.
    ///
    /// Each attached function gets an invoke grant for the rule before the
    /// target is added. An undeployed function fails only its attachment.
    #[instrument(skip(self, state), fields(count = state.schedulers.len()))]
    pub async fn deploy_schedulers(&self, state: &mut LocalState) -> Result<PhaseReport> {
        let mut report = PhaseReport::new(Phase::Schedulers);
        if state.schedulers.is_empty() {
            info!("No schedulers to deploy");
            return Ok(report);
        }
        for scheduler in &state.schedulers {
            scheduler.validate()?;
        }

        for index in 0..state.schedulers.len() {
            let scheduler = state.schedulers[index].clone();

            let rule_arn = match self
                .gateways
                .scheduler
                .put_rule(&scheduler.name, &scheduler.expression, scheduler.enabled)
                .await
            {
                Ok(arn) => arn,
                Err(e) => {
                    warn!(scheduler = %scheduler.name, error = %e, "Rule upsert failed");
                    report.fail(EntityKind::Scheduler, &scheduler.name, e);
                    continue;
                }
            };
            state.schedulers[index].remote_id = Some(rule_arn.clone());
            report.record(EntityKind::Scheduler, &scheduler.name, Outcome::Updated);

            for function in &scheduler.functions {
                let target = format!("{}/{}", scheduler.name, function);
                match self
                    .attach_target(state, &scheduler.name, &rule_arn, function)
                    .await
                {
                    Ok(()) => report.record(EntityKind::Target, target, Outcome::Updated),
                    Err(reason) => {
                        warn!(target = %target, reason = %reason, "Scheduler target failed");
                        report.fail(EntityKind::Target, target, reason);
                    }
                }
            }

            info!(
                scheduler = %scheduler.name,
                arn = %rule_arn,
                targets = scheduler.functions.len(),
                "Scheduler converged"
            );
        }

        Ok(report)
    }

    async fn attach_target(
        &self,
        state: &LocalState,
        rule: &str,
        rule_arn: &RemoteId,
        function: &str,
    ) -> std::result::Result<(), String> {
        let function_arn = self.function_arn(state, function).await?;

        let grant = InvokeGrant::new(function, InvokeGrant::SCHEDULER_PRINCIPAL, rule_arn.as_str());
        self.gateways
            .compute
            .grant_invoke(&grant)
            .await
            .map_err(|e| e.to_string())?;

        self.gateways
            .scheduler
            .put_target(rule, &function_arn)
            .await
            .map_err(|e| e.to_string())
    }

    /// Delete a scheduler rule and its local definition.
    ///
    /// A rule already gone remotely is only removed locally.
    #[instrument(skip(self, state))]
    pub async fn delete_scheduler(&self, state: &mut LocalState, name: &str) -> Result<PhaseReport> {
        state.scheduler(name)?;
        let mut report = PhaseReport::new(Phase::Delete);

        match self.gateways.scheduler.delete_rule(name).await {
            Ok(()) => info!(scheduler = %name, "Rule deleted remotely"),
            Err(e) if e.is_not_found() => {
                warn!(scheduler = %name, "Rule not found remotely, removing local definition only");
            }
            Err(e) => return Err(DeployError::remote(format!("scheduler {}", name), e)),
        }

        state.remove_scheduler(name);
        let dir = state.scheduler_dir();
        if dir.exists(name) {
            dir.delete(name)?;
        }
        report.record(EntityKind::Scheduler, name, Outcome::Deleted);
        Ok(report)
    }
}
