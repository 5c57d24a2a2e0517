//! End-to-end tests for the regression harness
//!
//! These tests build a fake product tree and setup directory, point the
//! harness at a stub engine executable and verify the argument rewriting
//! and report output of a whole run.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;

use tgen_regress::args::Args;
use tgen_regress::common::paths;
use tgen_regress::runner;

// runs mutate the working directory and process environment
static ENV_LOCK: Mutex<()> = Mutex::new(());

struct TestContext {
    // held for their Drop; the harness only sees the paths
    _tree: tempfile::TempDir,
    setup: tempfile::TempDir,
    workdir: tempfile::TempDir,
    argv_file: PathBuf,
}

impl TestContext {
    /// Fake product tree + loopback setup + stub engine with the given exit
    /// code; enters a scratch working directory
    fn new(engine_exit: i32) -> Self {
        let tree = tempfile::tempdir().unwrap();
        let setup = tempfile::tempdir().unwrap();
        let workdir = tempfile::tempdir().unwrap();
        let argv_file = workdir.path().join("engine_argv.txt");

        fs::write(tree.path().join(paths::DAEMON_LAUNCHER), "#!/bin/sh\n").unwrap();

        let engine_dir = tree.path().join("automation");
        fs::create_dir_all(&engine_dir).unwrap();
        let engine = engine_dir.join("tgen-test-runner");
        fs::write(
            &engine,
            format!(
                "#!/bin/sh\nprintf '%s\\n' \"$@\" > {}\nexit {}\n",
                argv_file.display(),
                engine_exit
            ),
        )
        .unwrap();
        fs::set_permissions(&engine, fs::Permissions::from_mode(0o755)).unwrap();

        fs::write(
            setup.path().join("config.yaml"),
            "server:\n  host: 127.0.0.1\n  modes: [loopback]\n",
        )
        .unwrap();
        fs::write(setup.path().join("benchmark.yaml"), "stf_imix:\n  multiplier: 1\n").unwrap();

        std::env::set_var(paths::PRODUCT_TREE_ENV, tree.path());
        std::env::remove_var(paths::SETUP_DIR_ENV);
        std::env::set_current_dir(workdir.path()).unwrap();

        Self {
            _tree: tree,
            setup,
            workdir,
            argv_file,
        }
    }

    fn args(&self, extra: &[&str]) -> Args {
        let setup_dir = self.setup.path().to_str().unwrap();
        let mut argv = vec!["tgen-regress", "--no-ssh", "--cfg", setup_dir];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    fn setup_name(&self) -> String {
        // prepare() canonicalizes the setup dir, so compare canonicalized
        self.setup
            .path()
            .canonicalize()
            .unwrap()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned()
    }

    fn engine_argv(&self) -> Vec<String> {
        fs::read_to_string(&self.argv_file)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn report_path(&self, name: &str) -> PathBuf {
        self.workdir.path().join("reports").join(name)
    }
}

#[tokio::test]
async fn test_stateful_run_end_to_end() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let ctx = TestContext::new(0);

    let passed = runner::run(ctx.args(&["--stf"])).await.unwrap();
    assert!(passed);

    let argv = ctx.engine_argv();
    assert!(argv.contains(&"--stf".to_string()));
    assert!(argv.contains(&"stateful_tests".to_string()));
    assert!(argv.contains(&"--with-xunit".to_string()));

    let name = ctx.setup_name();
    let xml_arg = argv
        .iter()
        .find(|a| a.starts_with("--xunit-file="))
        .expect("engine given an xml report path");
    assert!(xml_arg.ends_with(&format!("report_{name}_stateful.xml")));

    let summary =
        fs::read_to_string(ctx.report_path(&format!("report_{name}_harness.xml"))).unwrap();
    assert!(summary.contains("failures=\"0\""));
    assert!(summary.contains("<testcase name=\"stateful\""));
}

#[tokio::test]
async fn test_failing_suite_reported() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let ctx = TestContext::new(1);

    let passed = runner::run(ctx.args(&["--stl"])).await.unwrap();
    assert!(!passed);

    let argv = ctx.engine_argv();
    // the connectivity smoke test rides ahead of the stateless tree
    let smoke = argv
        .iter()
        .position(|a| a.contains("test_connectivity"))
        .unwrap();
    let tree = argv.iter().position(|a| a == "stateless_tests").unwrap();
    assert!(smoke < tree);

    let name = ctx.setup_name();
    let summary =
        fs::read_to_string(ctx.report_path(&format!("report_{name}_harness.xml"))).unwrap();
    assert!(summary.contains("failures=\"1\""));
    assert!(summary.contains("<failure message=\"stateless suite failed\""));
}

#[tokio::test]
async fn test_specific_test_selection_end_to_end() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let ctx = TestContext::new(0);

    let passed = runner::run(ctx.args(&["stateful_tests/stf_imix"])).await.unwrap();
    assert!(passed);

    let argv = ctx.engine_argv();
    assert!(argv.contains(&"stateful_tests/stf_imix".to_string()));
    // only the stateful suite ran; no functional or stateless selectors
    assert!(!argv.contains(&"functional_tests".to_string()));
    assert!(!argv.contains(&"stateless_tests".to_string()));
}
