//! Ginger Store - Local desired state
//!
//! Loads the project file and per-entity definition files into memory,
//! exposes the path-keyed [`ResourceStore`], and writes everything back
//! through the [`StateWriter`].
//!
//! ## On-disk layout
//!
//! ```text
//! <root>/
//!   Ginger.toml            [project], [[function]], [[resource]]
//!   functions/<name>/      function sources
//!   storage/               files synchronized to the bucket
//!   schedulers/<name>.toml one file per scheduler
//!   stages/<name>.toml     one file per stage
//!   .ginger/build/         compiled artifacts
//! ```
//!
//! The store is not synchronized internally: a single command owns it for
//! the duration of one invocation. Only the writer takes a lock.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod definitions;
pub mod document;
pub mod error;
pub mod layout;
pub mod resources;
pub mod state;
pub mod writer;

// Re-exports
pub use definitions::{DefinitionDir, Definition};
pub use document::ProjectDocument;
pub use error::{Result, StoreError};
pub use layout::ProjectLayout;
pub use resources::ResourceStore;
pub use state::LocalState;
pub use writer::StateWriter;
