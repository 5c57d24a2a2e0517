//! Execution-plan construction
//!
//! Scans the raw engine arguments, buckets test selectors into suite groups
//! and rewrites the argument vector handed to the external test engine for
//! each suite run.

use std::fmt;
use std::path::Path;

use crate::args::Args;

/// The product's test suites, in dispatch order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SuiteKind {
    Functional,
    Stateful,
    Stateless,
}

impl SuiteKind {
    pub const ALL: [SuiteKind; 3] = [
        SuiteKind::Functional,
        SuiteKind::Stateful,
        SuiteKind::Stateless,
    ];

    /// Path keyword selecting this suite's test tree
    pub fn keyword(self) -> &'static str {
        match self {
            SuiteKind::Functional => "functional_tests",
            SuiteKind::Stateful => "stateful_tests",
            SuiteKind::Stateless => "stateless_tests",
        }
    }

    /// Engine flag enabling this suite's fixtures
    pub fn flag(self) -> &'static str {
        match self {
            SuiteKind::Functional => "--func",
            SuiteKind::Stateful => "--stf",
            SuiteKind::Stateless => "--stl",
        }
    }

    /// Suffix inserted into the per-suite XML report name
    pub fn xml_suffix(self) -> &'static str {
        match self {
            SuiteKind::Functional => "functional",
            SuiteKind::Stateful => "stateful",
            SuiteKind::Stateless => "stateless",
        }
    }

    fn index(self) -> usize {
        match self {
            SuiteKind::Functional => 0,
            SuiteKind::Stateful => 1,
            SuiteKind::Stateless => 2,
        }
    }
}

impl fmt::Display for SuiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.xml_suffix())
    }
}

/// Engine arguments every suite run starts from
pub const BASE_ENGINE_ARGS: &[&str] = &["-s", "-v", "--detailed-errors"];

/// Disables the engine's own log capture when the harness logs to a file
pub const NO_CAPTURE_ARG: &str = "--no-capture";

/// Smoke test prepended to every stateless run, so connectivity failures
/// kill the suite before the long benchmarks start
pub const CONNECTIVITY_SMOKE_TEST: &str = "stateless_tests/stl_general:test_connectivity";

/// Partitioned view of the command line: which suites run, with which
/// specific tests, and what passes through to the engine untouched
#[derive(Debug, Default)]
pub struct ExecutionPlan {
    buckets: [Vec<String>; 3],
    passthrough: Vec<String>,
    forwarded: Vec<String>,
    no_capture: bool,
    collect_only: bool,
}

impl ExecutionPlan {
    /// Partition the parsed command line into an execution plan
    ///
    /// Any trailing argument containing a suite keyword selects specific
    /// tests: it is truncated to start at the keyword, appended to that
    /// suite's bucket and consumed. When no specific test was named, the
    /// suite flags select whole trees; with nothing selected at all, every
    /// suite runs.
    pub fn from_args(args: &Args) -> Self {
        let mut plan = ExecutionPlan {
            no_capture: args.log_path.is_some(),
            collect_only: args.collect_only,
            ..Default::default()
        };

        let mut specific_tests = false;
        for arg in &args.engine_args {
            if arg.contains("log-path") {
                // the engine must not swallow test logs the harness is
                // writing to a file
                plan.no_capture = true;
                plan.passthrough.push(arg.clone());
                continue;
            }
            let mut consumed = false;
            for kind in SuiteKind::ALL {
                if let Some(pos) = arg.find(kind.keyword()) {
                    plan.buckets[kind.index()].push(arg[pos..].to_string());
                    specific_tests = true;
                    consumed = true;
                    break;
                }
            }
            if !consumed {
                plan.passthrough.push(arg.clone());
            }
        }

        if !specific_tests {
            let wanted = [
                (SuiteKind::Functional, args.functional),
                (SuiteKind::Stateful, args.stateful),
                (SuiteKind::Stateless, args.stateless),
            ];
            for (kind, selected) in wanted {
                if selected {
                    plan.buckets[kind.index()].push(kind.keyword().to_string());
                }
            }
            // run the whole regression when nothing was selected
            if plan.buckets.iter().all(|b| b.is_empty()) {
                for kind in SuiteKind::ALL {
                    plan.buckets[kind.index()].push(kind.keyword().to_string());
                }
            }
        }

        plan.forwarded = forwarded_options(args);
        plan
    }

    /// Suites with a non-empty bucket, in dispatch order
    pub fn selected(&self) -> Vec<SuiteKind> {
        SuiteKind::ALL
            .into_iter()
            .filter(|kind| !self.buckets[kind.index()].is_empty())
            .collect()
    }

    /// Specific selectors for one suite
    pub fn bucket(&self, kind: SuiteKind) -> &[String] {
        &self.buckets[kind.index()]
    }

    /// Arguments passed through to the engine untouched
    pub fn passthrough(&self) -> &[String] {
        &self.passthrough
    }

    pub fn no_capture(&self) -> bool {
        self.no_capture
    }

    /// Full engine argument vector for one suite run
    pub fn suite_args(&self, kind: SuiteKind, xml_path: Option<&Path>) -> Vec<String> {
        let mut argv: Vec<String> = BASE_ENGINE_ARGS.iter().map(|s| s.to_string()).collect();
        if self.no_capture {
            argv.push(NO_CAPTURE_ARG.to_string());
        }
        argv.extend(self.forwarded.iter().cloned());
        argv.extend(self.passthrough.iter().cloned());
        argv.push(kind.flag().to_string());
        if kind == SuiteKind::Stateless {
            argv.push(CONNECTIVITY_SMOKE_TEST.to_string());
        }
        argv.extend(self.buckets[kind.index()].iter().cloned());
        if let Some(xml) = xml_path {
            if !self.collect_only {
                argv.push("--with-xunit".to_string());
                argv.push(format!("--xunit-file={}", xml.display()));
            }
        }
        argv
    }
}

/// Harness options the suites themselves need: where the setup lives and
/// how chatty to be. Lifecycle options stay with the harness.
fn forwarded_options(args: &Args) -> Vec<String> {
    let mut opts = Vec::new();
    if let Some(dir) = &args.config_path {
        opts.push("--cfg".to_string());
        opts.push(dir.display().to_string());
    }
    if args.verbose_mode {
        opts.push("--verbose-mode".to_string());
    }
    if args.server_logs {
        opts.push("--server-logs".to_string());
    }
    if args.collect_only {
        opts.push("--collect-only".to_string());
    }
    opts
}
