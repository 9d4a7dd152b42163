//! Ginger Gateway - Remote control plane facade
//!
//! One async trait per backend service. The orchestrator only ever talks to
//! these traits, so every reconciliation path can run against the
//! [`InMemoryCloud`] in tests and offline rehearsals.
//!
//! ## Idempotence contracts
//!
//! - Creation calls that race an identical existing object return
//!   [`GatewayError::AlreadyExists`]; callers adopt rather than fail.
//! - Bucket creation treats "already owned by caller" as success.
//! - Existence checks return `Ok(false)` only when the provider confirmed
//!   absence. Any other failure is an `Err` and means "could not determine".
//! - Invoke grants use statement ids derived from the grant, so re-granting
//!   is a no-op.
//!
//! ## Backends
//!
//! - [`memory`]: in-process cloud with a call journal and failure injection
//! - `aws` (feature `aws`): AWS SDK adapters

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod blob;
pub mod compute;
pub mod error;
pub mod gateways;
pub mod identity;
pub mod logs;
pub mod memory;
pub mod routing;
pub mod scheduler;

#[cfg(feature = "aws")]
pub mod aws;

// Re-exports
pub use blob::BlobGateway;
pub use compute::{unqualified_arn, ComputeGateway, FunctionSpec, Invocation, InvokeGrant};
pub use error::{GatewayError, Result};
pub use gateways::Gateways;
pub use identity::IdentityGateway;
pub use logs::{LogEvent, LogsGateway};
pub use memory::{CallRecord, FailureKind, InMemoryCloud};
pub use routing::{RemoteResource, RoutingGateway, Wiring};
pub use scheduler::SchedulerGateway;
