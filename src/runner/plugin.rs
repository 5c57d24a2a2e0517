//! Shared run state and per-suite lifecycle hooks
//!
//! The context plays the role the test engine's configuration plugin used
//! to: materialize everything the suites share (setup config, benchmark
//! parameters, mode set, router preparation) before the first test runs,
//! and tear the remote daemons down after the last one.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::args::Args;
use crate::common::{paths, Error, Result};
use crate::config::{self, Benchmark, RouterConfig, SetupConfig, TftpConfig};
use crate::plan::SuiteKind;
use crate::remote::{DaemonController, RemoteShell};

/// Scratch directory used on the server for --copy runs
const SCRATCH_DIR: &str = "/tmp/tgen_scripts";

/// Settle time after killing running core processes
const KILL_SETTLE: Duration = Duration::from_secs(1);

/// Router preparation recorded for the suites
#[derive(Debug, Clone)]
pub struct RouterPrep {
    pub router: RouterConfig,
    pub tftp: Option<TftpConfig>,
    pub force_image_reload: bool,
    pub force_clean_config: bool,
    pub silent: bool,
}

/// State shared by every suite in the run
pub struct RunContext {
    pub args: Args,
    pub scripts_dir: PathBuf,
    pub setup_dir: Option<PathBuf>,
    pub setup_name: Option<String>,
    pub report_dir: PathBuf,
    pub config: Option<SetupConfig>,
    pub benchmark: Option<Benchmark>,
    pub modes: BTreeSet<String>,
    pub server_version: BTreeMap<String, String>,
    pub router_prep: Option<RouterPrep>,
    shell: Option<RemoteShell>,
    copied: bool,
}

impl RunContext {
    /// Resolve the product tree and setup directory once, up front
    pub fn prepare(args: Args) -> Result<Self> {
        let scripts_dir = paths::resolve_product_tree()?;
        let setup_dir = paths::resolve_setup_dir(args.config_path.as_deref())?;
        let setup_name = setup_dir
            .as_ref()
            .and_then(|dir| dir.file_name())
            .map(|name| name.to_string_lossy().into_owned());

        if let Some(dir) = &setup_dir {
            tracing::info!(setup = %dir.display(), "using setup directory");
        }

        Ok(Self {
            args,
            scripts_dir,
            setup_dir,
            setup_name,
            report_dir: PathBuf::from(paths::REPORT_DIR),
            config: None,
            benchmark: None,
            modes: BTreeSet::new(),
            server_version: BTreeMap::new(),
            router_prep: None,
            shell: None,
            copied: false,
        })
    }

    /// Load config/benchmark and resolve the server address (idempotent)
    fn ensure_configured(&mut self) -> Result<()> {
        if self.config.is_some() {
            return Ok(());
        }

        let dir = self.setup_dir.clone().ok_or(Error::SetupDirMissing)?;
        let mut cfg = SetupConfig::load(&dir)?;
        cfg.server.host = config::resolve_host_ip(&cfg.server.host)?;

        self.benchmark = Some(config::load_benchmark(&dir)?);
        self.modes = cfg.server.modes.iter().cloned().collect();
        self.shell = Some(RemoteShell::new(
            cfg.server.host.clone(),
            self.scripts_dir.clone(),
            !self.args.no_ssh,
            self.args.verbose_mode,
        ));
        self.config = Some(cfg);
        Ok(())
    }

    fn shell(&self) -> Result<&RemoteShell> {
        self.shell
            .as_ref()
            .ok_or_else(|| Error::Internal("remote shell used before configuration".to_string()))
    }

    /// Prepare the server for one suite
    ///
    /// Functional suites run against the local checkout only; collect-only
    /// runs never touch the server.
    pub async fn begin(&mut self, kind: SuiteKind) -> Result<()> {
        if kind == SuiteKind::Functional || self.args.collect_only {
            return Ok(());
        }

        self.ensure_configured()?;

        if self.args.copy && !self.copied && !self.args.no_ssh {
            let shell = self
                .shell
                .as_mut()
                .ok_or_else(|| Error::Internal("remote shell used before configuration".to_string()))?;
            shell.sync_product_tree(Path::new(SCRATCH_DIR)).await?;
            self.copied = true;
        }

        let shell = self.shell()?.clone();
        let daemon = DaemonController::new(&shell);

        if !self.args.no_ssh {
            if self.args.kill_running {
                if kind == SuiteKind::Stateful {
                    daemon.stop_stateful().await?;
                }
                daemon.kill_core_processes().await?;
                tokio::time::sleep(KILL_SETTLE).await;
            } else if daemon.core_running().await? {
                return Err(Error::CoreAlreadyRunning);
            }

            match kind {
                SuiteKind::Stateful => daemon.start_stateful().await?,
                SuiteKind::Stateless => daemon.start_stateless().await?,
                SuiteKind::Functional => {}
            }

            if self.server_version.is_empty() {
                match daemon.fetch_version().await {
                    Ok(version) => self.server_version = version,
                    Err(e) => tracing::warn!(error = %e, "could not fetch server version"),
                }
            }
        }

        if !self.modes.contains("loopback") {
            if let Some(router) = self.config.as_ref().and_then(|c| c.router.clone()) {
                self.router_prep = Some(RouterPrep {
                    router,
                    tftp: self.config.as_ref().and_then(|c| c.tftp.clone()),
                    force_image_reload: self.args.load_image,
                    force_clean_config: !self.args.skip_clean,
                    silent: !self.args.verbose_mode,
                });
            }
        }

        Ok(())
    }

    /// Tear remote daemons down after a suite
    pub async fn finalize(&mut self, kind: SuiteKind) -> Result<()> {
        if kind == SuiteKind::Functional || self.args.collect_only || self.args.no_ssh {
            return Ok(());
        }

        let shell = self.shell()?;
        let daemon = DaemonController::new(shell);
        if kind == SuiteKind::Stateful {
            daemon.stop_stateful().await?;
        }
        daemon.kill_core_processes().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;

    // prepare() reads process-wide environment variables
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    fn args(argv: &[&str]) -> Args {
        let mut full = vec!["tgen-regress"];
        full.extend_from_slice(argv);
        Args::parse_from(full)
    }

    fn fake_setup(dir: &Path) {
        fs::write(
            dir.join("config.yaml"),
            "server:\n  host: 127.0.0.1\n  modes: [loopback]\n",
        )
        .unwrap();
        fs::write(dir.join("benchmark.yaml"), "stf_imix:\n  multiplier: 1\n").unwrap();
    }

    fn fake_product_tree(dir: &Path) {
        fs::write(dir.join(paths::DAEMON_LAUNCHER), "#!/bin/sh\n").unwrap();
    }

    #[tokio::test]
    async fn test_functional_suite_needs_no_setup() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let tree = tempfile::tempdir().unwrap();
        fake_product_tree(tree.path());
        std::env::set_var(paths::PRODUCT_TREE_ENV, tree.path());
        std::env::remove_var(paths::SETUP_DIR_ENV);

        let mut ctx = RunContext::prepare(args(&["--func", "--no-ssh"])).unwrap();
        ctx.begin(SuiteKind::Functional).await.unwrap();
        ctx.finalize(SuiteKind::Functional).await.unwrap();
        assert!(ctx.config.is_none());
    }

    #[tokio::test]
    async fn test_stateful_begin_loads_config() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let tree = tempfile::tempdir().unwrap();
        fake_product_tree(tree.path());
        std::env::set_var(paths::PRODUCT_TREE_ENV, tree.path());
        std::env::remove_var(paths::SETUP_DIR_ENV);

        let setup = tempfile::tempdir().unwrap();
        fake_setup(setup.path());

        let mut ctx = RunContext::prepare(args(&[
            "--stf",
            "--no-ssh",
            "--cfg",
            setup.path().to_str().unwrap(),
        ]))
        .unwrap();

        ctx.begin(SuiteKind::Stateful).await.unwrap();
        assert!(ctx.config.is_some());
        assert!(ctx.modes.contains("loopback"));
        // loopback mode: no router preparation even if a router were listed
        assert!(ctx.router_prep.is_none());
        ctx.finalize(SuiteKind::Stateful).await.unwrap();
    }

    #[tokio::test]
    async fn test_stateful_begin_without_setup_dir_fails() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let tree = tempfile::tempdir().unwrap();
        fake_product_tree(tree.path());
        std::env::set_var(paths::PRODUCT_TREE_ENV, tree.path());
        std::env::remove_var(paths::SETUP_DIR_ENV);

        let mut ctx = RunContext::prepare(args(&["--stf", "--no-ssh"])).unwrap();
        let err = ctx.begin(SuiteKind::Stateful).await.unwrap_err();
        assert!(matches!(err, Error::SetupDirMissing));
    }
}
