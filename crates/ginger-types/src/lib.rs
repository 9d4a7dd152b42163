//! Ginger Types - Core data model
//!
//! Shared types for the ginger deployment engine. Every other crate in the
//! workspace speaks in these types.
//!
//! ## Architectural Boundaries
//!
//! - `ginger-types` owns: entity shapes, path normalization, local validation
//! - `ginger-store` owns: loading and persisting entities
//! - `ginger-deploy` owns: reconciling entities against the remote side
//!
//! Nothing in this crate performs I/O.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod error;
pub mod function;
pub mod ids;
pub mod path;
pub mod project;
pub mod resource;
pub mod scheduler;
pub mod stage;
pub mod storage;

// Re-exports
pub use error::{ConfigurationError, ValidationError};
pub use function::{validate_memory_size, EventSource, Function, NetworkConfig};
pub use ids::RemoteId;
pub use path::normalize;
pub use project::ProjectSettings;
pub use resource::{HttpMethod, Integration, Resource};
pub use scheduler::Scheduler;
pub use stage::Stage;
pub use storage::StorageObject;
