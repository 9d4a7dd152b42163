//! Bundle of every backend the orchestrator talks to

use crate::blob::BlobGateway;
use crate::compute::ComputeGateway;
use crate::identity::IdentityGateway;
use crate::logs::LogsGateway;
use crate::memory::InMemoryCloud;
use crate::routing::RoutingGateway;
use crate::scheduler::SchedulerGateway;
use std::sync::Arc;

#[derive(Clone)]
pub struct Gateways {
    pub compute: Arc<dyn ComputeGateway>,
    pub routing: Arc<dyn RoutingGateway>,
    pub blob: Arc<dyn BlobGateway>,
    pub scheduler: Arc<dyn SchedulerGateway>,
    pub identity: Arc<dyn IdentityGateway>,
    pub logs: Arc<dyn LogsGateway>,
}

impl Gateways {
    /// Every service backed by the same in-memory cloud
    pub fn in_memory(cloud: Arc<InMemoryCloud>) -> Self {
        Self {
            compute: cloud.clone(),
            routing: cloud.clone(),
            blob: cloud.clone(),
            scheduler: cloud.clone(),
            identity: cloud.clone(),
            logs: cloud,
        }
    }
}
