//! AWS adapters
//!
//! Lambda for compute, API Gateway (REST) for routing, S3 for blobs,
//! EventBridge for scheduled rules, STS for identity and CloudWatch Logs for
//! log tailing. Provider error codes are folded into [`GatewayError`]
//! in [`errors`].
//!
//! [`GatewayError`]: crate::GatewayError

mod apigateway;
mod errors;
mod events;
mod lambda;
mod logs;
mod s3;
mod sts;

pub use apigateway::ApiGatewayRouting;
pub use events::EventBridgeScheduler;
pub use lambda::LambdaCompute;
pub use logs::CloudWatchLogs;
pub use s3::S3Blob;
pub use sts::StsIdentity;

use crate::gateways::Gateways;
use aws_config::{BehaviorVersion, Region};
use std::sync::Arc;
use tracing::debug;

/// Load credentials for `region` (and `profile`, if given) and build every
/// adapter from the shared configuration
pub async fn connect(region: &str, profile: Option<&str>) -> Gateways {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));
    if let Some(profile) = profile {
        loader = loader.profile_name(profile);
    }
    let config = loader.load().await;
    debug!(region, profile = ?profile, "AWS configuration loaded");

    Gateways {
        compute: Arc::new(LambdaCompute::new(aws_sdk_lambda::Client::new(&config))),
        routing: Arc::new(ApiGatewayRouting::new(
            aws_sdk_apigateway::Client::new(&config),
            region,
        )),
        blob: Arc::new(S3Blob::new(aws_sdk_s3::Client::new(&config), region)),
        scheduler: Arc::new(EventBridgeScheduler::new(aws_sdk_eventbridge::Client::new(
            &config,
        ))),
        identity: Arc::new(StsIdentity::new(aws_sdk_sts::Client::new(&config))),
        logs: Arc::new(CloudWatchLogs::new(aws_sdk_cloudwatchlogs::Client::new(
            &config,
        ))),
    }
}
