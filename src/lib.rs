//! Regression harness for the tgen traffic generator
//!
//! The harness partitions the command line into per-suite execution plans,
//! materializes the setup configuration, drives the remote daemon lifecycle
//! on the device under test and dispatches each suite to the external test
//! engine, collecting XML and free-text reports.

pub mod args;
pub mod common;
pub mod config;
pub mod plan;
pub mod remote;
pub mod report;
pub mod runner;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use plan::{ExecutionPlan, SuiteKind};
