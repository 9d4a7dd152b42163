//! Stage snapshots

use crate::error::{DeployError, Result};
use crate::orchestrator::Orchestrator;
use crate::report::{EntityKind, Outcome, Phase, PhaseReport};
use ginger_store::{LocalState, StoreError};
use ginger_types::function::validate_name;
use ginger_types::{ConfigurationError, RemoteId, Stage};
use tracing::{debug, info, instrument, warn};

impl Orchestrator {
    /// Snapshot the current routing tree into `stage`.
    ///
    /// A stage with no local definition gets one written first.
    #[instrument(skip(self, state, message))]
    pub async fn deploy_stage(
        &self,
        state: &LocalState,
        stage: &str,
        message: Option<&str>,
    ) -> Result<RemoteId> {
        validate_name("stage name", stage)?;
        let container = state
            .document
            .project
            .api_id
            .clone()
            .ok_or(ConfigurationError::MissingSetting("api_id"))?;

        let stages = state.stage_dir();
        if !stages.exists(stage) {
            stages.create(&Stage::new(stage))?;
            info!(stage = %stage, "Stage definition created");
        }

        let deployment = self
            .gateways
            .routing
            .create_deployment(&container, stage, message)
            .await
            .map_err(|e| DeployError::remote(format!("stage {}", stage), e))?;
        info!(stage = %stage, deployment = %deployment, "Stage deployed");
        Ok(deployment)
    }

    /// Delete a stage remotely and its local definition.
    ///
    /// A stage already gone remotely, or never deployed, is only removed
    /// locally.
    #[instrument(skip(self, state))]
    pub async fn delete_stage(&self, state: &LocalState, stage: &str) -> Result<PhaseReport> {
        let stages = state.stage_dir();
        if !stages.exists(stage) {
            return Err(StoreError::DefinitionNotFound {
                kind: "Stage",
                name: stage.to_string(),
            }
            .into());
        }
        let mut report = PhaseReport::new(Phase::Delete);

        match &state.document.project.api_id {
            Some(container) => match self.gateways.routing.delete_stage(container, stage).await {
                Ok(()) => info!(stage = %stage, "Stage deleted remotely"),
                Err(e) if e.is_not_found() => {
                    warn!(stage = %stage, "Stage not found remotely, removing local definition only")
                }
                Err(e) => return Err(DeployError::remote(format!("stage {}", stage), e)),
            },
            None => debug!(stage = %stage, "No routing container, removing local definition only"),
        }

        stages.delete(stage)?;
        report.record(EntityKind::Stage, stage, Outcome::Deleted);
        Ok(report)
    }
}
