//! Daemon start/stop/kill sequencing on the device under test
//!
//! The product ships two daemons: the stateful control daemon managed
//! through its launcher script, and the interactive core started directly
//! for stateless runs. Everything here is idempotent; sequences tolerate a
//! daemon that is already up or already gone.

use std::collections::BTreeMap;

use crate::common::Result;

use super::shell::RemoteShell;

/// Core binary names the product may be running under
pub const CORE_BINARIES: &[&str] = &[
    "_tgen-64",
    "_tgen-64-o",
    "_tgen-64-debug",
    "_tgen-64-debug-o",
];

/// Common stem of every core binary name
pub const CORE_STEM: &str = "tgen-64";

/// Daemon launcher, relative to the scripts directory
pub const DAEMON_LAUNCHER: &str = "./tgen_daemon";

/// Stateful daemon log removed before each start
const DAEMON_LOG: &str = "/var/log/tgen/tgen_daemon.log";

/// Stop is issued twice: a half-dead daemon can survive one stop
fn stop_command() -> String {
    format!("{DAEMON_LAUNCHER} stop; sleep 1; {DAEMON_LAUNCHER} stop; sleep 1")
}

fn start_command() -> String {
    format!("rm {DAEMON_LOG}; {DAEMON_LAUNCHER} start; sleep 2; {DAEMON_LAUNCHER} show")
}

/// One row of the remote process table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreProcess {
    pub name: String,
    pub pid: u32,
    pub command: String,
}

/// Sequences daemon lifecycle commands over a remote shell
pub struct DaemonController<'a> {
    shell: &'a RemoteShell,
}

impl<'a> DaemonController<'a> {
    pub fn new(shell: &'a RemoteShell) -> Self {
        Self { shell }
    }

    /// Whether any core binary shows up in the remote process table
    pub async fn core_running(&self) -> Result<bool> {
        let probe = CORE_BINARIES
            .iter()
            .map(|name| format!("ps -C {name} > /dev/null"))
            .collect::<Vec<_>>()
            .join(" || ");
        Ok(self.shell.run(&probe).await?.success())
    }

    /// Kill every root-owned core process on the server
    pub async fn kill_core_processes(&self) -> Result<()> {
        let listing = self
            .shell
            .run_checked(&format!(
                "ps -u root --format comm,pid,cmd | grep {CORE_STEM} | grep -v grep || true"
            ))
            .await?;

        for process in parse_core_processes(&listing.stdout) {
            tracing::info!(pid = process.pid, command = %process.command, "killing remote core process");
            self.shell.run(&format!("kill {}", process.pid)).await?;
        }
        Ok(())
    }

    /// Stop the stateful control daemon
    pub async fn stop_stateful(&self) -> Result<()> {
        self.shell.run(&stop_command()).await?;
        Ok(())
    }

    /// Start the stateful control daemon and show its status
    pub async fn start_stateful(&self) -> Result<()> {
        self.shell.run(&start_command()).await?;
        Ok(())
    }

    /// Launch the interactive core for stateless runs
    pub async fn start_stateless(&self) -> Result<()> {
        self.shell.run_background("./tgen-64 -i").await
    }

    /// Best-effort fetch of the server version banner for the report
    ///
    /// Newer daemons print a JSON object; older ones print `key: value`
    /// lines. Either way a failure only costs the report its version block.
    pub async fn fetch_version(&self) -> Result<BTreeMap<String, String>> {
        let output = self.shell.run(&format!("{DAEMON_LAUNCHER} --version")).await?;
        Ok(parse_version_banner(&output.stdout))
    }
}

/// Parse `ps --format comm,pid,cmd` rows, keeping core processes only
///
/// Malformed rows are skipped.
pub fn parse_core_processes(listing: &str) -> Vec<CoreProcess> {
    let mut processes = Vec::new();
    for line in listing.lines() {
        let mut fields = line.split_whitespace();
        let (Some(name), Some(pid)) = (fields.next(), fields.next()) else {
            continue;
        };
        let Ok(pid) = pid.parse::<u32>() else {
            continue;
        };
        if !name.contains(CORE_STEM) {
            continue;
        }
        processes.push(CoreProcess {
            name: name.to_string(),
            pid,
            command: fields.collect::<Vec<_>>().join(" "),
        });
    }
    processes
}

/// Parse the daemon version banner into key/value pairs
pub fn parse_version_banner(banner: &str) -> BTreeMap<String, String> {
    let trimmed = banner.trim();
    if trimmed.starts_with('{') {
        if let Ok(map) = serde_json::from_str::<BTreeMap<String, String>>(trimmed) {
            return map;
        }
    }
    trimmed
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, value)| !key.is_empty() && !value.is_empty())
        .collect()
}
