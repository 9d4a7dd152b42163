//! Ginger Deploy - Reconciliation engine
//!
//! Converges the remote control plane towards local desired state, one
//! subsystem at a time, through the traits in `ginger-gateway`.
//!
//! ## Architectural Boundaries
//!
//! - `ginger-store` owns: the local desired state and its persistence
//! - `ginger-build` owns: compiling and packaging functions
//! - `ginger-gateway` owns: talking to the provider
//! - `ginger-deploy` owns: ordering, existence checks, adopt-or-create,
//!   per-entity outcome reporting
//!
//! ## Key Principle
//!
//! Every operation is safe to re-run. There is no rollback: a failed run
//! leaves whatever converged in place, records the remote ids it obtained,
//! and the next run picks up from there.
//!
//! ## Phase order
//!
//! [`Orchestrator::deploy_all`] runs the pre-deploy hook once, then
//! functions, storage, schedulers and routing (followed by the optional
//! stage snapshot). The first hard error stops the run.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod confirm;
pub mod error;
pub mod hook;
pub mod logs;
pub mod objects;
pub mod options;
pub mod orchestrator;
pub mod report;

mod functions;
mod resources;
mod schedulers;
mod stage;
mod storage;

// Re-exports
pub use confirm::{AlwaysConfirm, Confirmation, NeverConfirm};
pub use error::{DeployError, Result};
pub use logs::LogTailer;
pub use objects::{collect_objects, sniff_mime_type};
pub use options::DeployOptions;
pub use orchestrator::Orchestrator;
pub use report::{DeployReport, DeployStatus, EntityKind, EntityOutcome, Outcome, Phase, PhaseReport};
