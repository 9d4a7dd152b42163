//! CLI command implementations

pub mod deploy;
pub mod function;
pub mod init;
pub mod integrate;
pub mod resource;
pub mod schedule;
pub mod stage;
