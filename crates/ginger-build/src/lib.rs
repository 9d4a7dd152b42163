//! Ginger Build - Compile and package functions
//!
//! ## Architectural Boundaries
//!
//! - [`Compiler`] owns: turning one function's source directory into one artifact
//! - [`BuildPipeline`] owns: running compilers with bounded parallelism and
//!   collecting per-function outcomes
//! - [`Packager`] owns: wrapping one artifact into the archive the compute
//!   runtime accepts
//!
//! A failed build never fails the pipeline. Callers get a [`BuildReport`]
//! listing what built and what did not, and deploy what they can.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod compiler;
pub mod error;
pub mod packager;
pub mod pipeline;
pub mod template;

// Re-exports
pub use compiler::{BuildUnit, CommandCompiler, Compiler};
pub use error::{BuildError, Result};
pub use packager::Packager;
pub use pipeline::{BuildPipeline, BuildReport, DEFAULT_MAX_PARALLEL};
pub use template::render_handler;
