//! Storage phase

use crate::error::{DeployError, Result};
use crate::objects::collect_objects;
use crate::orchestrator::Orchestrator;
use crate::report::{EntityKind, Outcome, Phase, PhaseReport};
use ginger_store::LocalState;
use tracing::{info, instrument, warn};

impl Orchestrator {
    /// Upload every file under the storage directory to the project bucket.
    ///
    /// The bucket is created when missing. Failing to check or create it is
    /// a hard error; a failed upload only fails that object.
    #[instrument(skip(self, state))]
    pub async fn deploy_storage(&self, state: &LocalState) -> Result<PhaseReport> {
        let mut report = PhaseReport::new(Phase::Storage);

        let objects = collect_objects(&state.layout.storage_dir())?;
        if objects.is_empty() {
            info!("No storage objects to deploy");
            return Ok(report);
        }

        let bucket = state.document.project.bucket_name();
        let blob = &self.gateways.blob;

        let exists = blob
            .bucket_exists(&bucket)
            .await
            .map_err(|e| DeployError::remote(format!("bucket {}", bucket), e))?;
        if exists {
            report.record(EntityKind::Bucket, &bucket, Outcome::Unchanged);
        } else {
            blob.create_bucket(&bucket)
                .await
                .map_err(|e| DeployError::remote(format!("bucket {}", bucket), e))?;
            info!(bucket = %bucket, "Bucket created");
            report.record(EntityKind::Bucket, &bucket, Outcome::Created);
        }

        for object in &objects {
            match blob
                .put_object(&bucket, &object.key, object.data.clone(), &object.mime_type)
                .await
            {
                Ok(()) => report.record(EntityKind::Object, &object.key, Outcome::Updated),
                Err(e) => {
                    warn!(key = %object.key, error = %e, "Upload failed");
                    report.fail(EntityKind::Object, &object.key, e);
                }
            }
        }

        info!(
            bucket = %bucket,
            objects = objects.len(),
            failed = report.failures().count(),
            "Storage synchronized"
        );
        Ok(report)
    }
}
