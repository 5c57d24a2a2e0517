//! Setup and benchmark configuration
//!
//! A setup directory holds two YAML files: `config.yaml` describing the
//! device under test and its router peer, and `benchmark.yaml` with
//! per-test parameters. The benchmark file is opaque to the harness and is
//! handed to the suites as-is.

use serde::Deserialize;
use std::net::ToSocketAddrs;
use std::path::Path;

use crate::common::{Error, Result};

/// Attempts before giving up on resolving the server address
const RESOLVE_ATTEMPTS: usize = 10;

/// Complete setup description loaded from config.yaml
#[derive(Debug, Deserialize, Clone)]
pub struct SetupConfig {
    /// The traffic-generator host under test
    pub server: ServerConfig,

    /// Router peer, absent on loopback setups
    #[serde(default)]
    pub router: Option<RouterConfig>,

    /// TFTP service used for router image loading
    #[serde(default)]
    pub tftp: Option<TftpConfig>,
}

/// The device under test
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Hostname or address of the tgen server
    pub host: String,

    /// Setup modes (e.g. loopback, VM, 1G)
    #[serde(default)]
    pub modes: Vec<String>,

    /// Core count handed to the traffic daemons
    pub cores: Option<u32>,
}

/// Router peer description, consumed by the suites
#[derive(Debug, Deserialize, Clone)]
pub struct RouterConfig {
    pub model: Option<String>,
    pub image: Option<String>,

    /// Interfaces wired to the tgen ports
    #[serde(default)]
    pub interfaces: Vec<String>,
}

/// TFTP endpoint for image loading
#[derive(Debug, Deserialize, Clone)]
pub struct TftpConfig {
    pub server: String,
    pub root_dir: Option<String>,
}

/// Per-test benchmark parameters, opaque to the harness
pub type Benchmark = serde_yaml::Mapping;

impl SetupConfig {
    /// Load config.yaml from a setup directory
    pub fn load(setup_dir: &Path) -> Result<Self> {
        let path = setup_dir.join("config.yaml");
        let content =
            std::fs::read_to_string(&path).map_err(|e| Error::file_read(&path, e))?;
        serde_yaml::from_str(&content).map_err(|e| Error::config_parse(&path, e))
    }
}

/// Load benchmark.yaml from a setup directory
pub fn load_benchmark(setup_dir: &Path) -> Result<Benchmark> {
    let path = setup_dir.join("benchmark.yaml");
    let content = std::fs::read_to_string(&path).map_err(|e| Error::file_read(&path, e))?;
    serde_yaml::from_str(&content).map_err(|e| Error::config_parse(&path, e))
}

/// Resolve the server hostname to an address string
///
/// Transient resolver failures are retried; the last attempt's error is
/// the one surfaced.
pub fn resolve_host_ip(host: &str) -> Result<String> {
    for _ in 0..RESOLVE_ATTEMPTS {
        if let Ok(mut addrs) = (host, 0u16).to_socket_addrs() {
            if let Some(addr) = addrs.next() {
                return Ok(addr.ip().to_string());
            }
        }
    }
    let mut addrs = (host, 0u16)
        .to_socket_addrs()
        .map_err(|_| Error::HostResolve(host.to_string()))?;
    addrs
        .next()
        .map(|a| a.ip().to_string())
        .ok_or_else(|| Error::HostResolve(host.to_string()))
}
