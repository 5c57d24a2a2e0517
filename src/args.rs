//! CLI argument definitions
//!
//! The harness keeps the flag-style surface of its predecessors: every
//! option historically accepted both dashed and underscored spellings, so
//! the underscored forms are kept as aliases.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tgen-regress", about = "Regression harness for the tgen traffic generator")]
#[command(version, long_about = None)]
pub struct Args {
    /// Path to the folder with config.yaml and benchmark.yaml
    #[arg(long = "cfg", alias = "tgen-scenario-config", value_name = "DIR")]
    pub config_path: Option<PathBuf>,

    /// Skip the clean configuration replace on the platform
    #[arg(long = "skip-clean", alias = "skip_clean")]
    pub skip_clean: bool,

    /// Install the image specified in the config file on the router
    #[arg(long = "load-image", alias = "load_image")]
    pub load_image: bool,

    /// Write harness logs to this file. Also disables test-log capture in
    /// the engine
    #[arg(long = "log-path", alias = "log_path", value_name = "FILE")]
    pub log_path: Option<PathBuf>,

    /// Echo remote commands and engine command lines
    #[arg(long = "verbose-mode", alias = "verbose_mode")]
    pub verbose_mode: bool,

    /// Show server-side daemon logs per test
    #[arg(long = "server-logs", alias = "server_logs")]
    pub server_logs: bool,

    /// Kill tgen processes already running on the server instead of aborting
    #[arg(long = "kill-running", alias = "kill_running")]
    pub kill_running: bool,

    /// Run functional tests
    #[arg(long = "func", alias = "functional")]
    pub functional: bool,

    /// Run stateful tests
    #[arg(long = "stf", alias = "stateful")]
    pub stateful: bool,

    /// Run stateless tests
    #[arg(long = "stl", alias = "stateless")]
    pub stateless: bool,

    /// Copy the product tree to a temp directory on the server and run from
    /// there
    #[arg(long)]
    pub copy: bool,

    /// Never connect to the remote host; daemons are managed externally
    #[arg(long = "no-ssh", alias = "no_ssh")]
    pub no_ssh: bool,

    /// List the selected tests without running them
    #[arg(long = "collect-only", alias = "collect_only")]
    pub collect_only: bool,

    /// Explicit path to the test engine executable
    #[arg(long, value_name = "PATH")]
    pub engine: Option<PathBuf>,

    /// Arguments passed through to the test engine. Entries containing a
    /// suite path (e.g. stateful_tests/stf_imix) select specific tests
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ENGINE_ARGS")]
    pub engine_args: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underscore_aliases() {
        let args = Args::parse_from([
            "tgen-regress",
            "--kill_running",
            "--no_ssh",
            "--verbose_mode",
        ]);
        assert!(args.kill_running);
        assert!(args.no_ssh);
        assert!(args.verbose_mode);
    }

    #[test]
    fn test_trailing_args_collected() {
        let args = Args::parse_from([
            "tgen-regress",
            "--stf",
            "stateful_tests/stf_imix",
            "--unknown-engine-flag",
        ]);
        assert!(args.stateful);
        assert_eq!(
            args.engine_args,
            vec!["stateful_tests/stf_imix", "--unknown-engine-flag"]
        );
    }
}
