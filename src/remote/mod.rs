//! Remote-host plumbing: shell transport and daemon lifecycle

pub mod lifecycle;
pub mod shell;

pub use lifecycle::DaemonController;
pub use shell::{RemoteOutput, RemoteShell};
