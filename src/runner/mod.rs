//! Suite dispatch
//!
//! Runs the selected suites in a fixed order, wrapping each engine
//! invocation with the lifecycle hooks. A failed suite does not stop the
//! later ones; only the aggregate verdict reflects it.

pub mod engine;
pub mod plugin;

use colored::Colorize;

use crate::args::Args;
use crate::common::Result;
use crate::plan::{ExecutionPlan, SuiteKind};
use crate::report;

use engine::{ProcessEngine, TestEngine};
use plugin::RunContext;

/// Printed when the whole regression passes
const PASS_BANNER: &str = r"
   ___  ___   __________
  / _ \/ _ | / __/ __/ /
 / ___/ __ |_\ \_\ \/_/
/_/  /_/ |_/___/___(_)
";

/// Verdict of one suite run
#[derive(Debug, Clone, Copy)]
pub struct SuiteOutcome {
    pub kind: SuiteKind,
    pub passed: bool,
}

/// Run the regression described by the command line
///
/// Returns `Ok(true)` when every selected suite passed.
pub async fn run(args: Args) -> Result<bool> {
    let plan = ExecutionPlan::from_args(&args);
    let mut ctx = RunContext::prepare(args)?;

    if !ctx.args.collect_only {
        report::ensure_report_dir(&ctx.report_dir)?;
    }

    let engine = ProcessEngine::locate(ctx.args.engine.as_deref(), &ctx.scripts_dir)?;

    let result = dispatch(&mut ctx, &plan, &engine).await;

    // report whatever we know even when a suite blew up mid-run
    save_setup_info(&ctx);

    let outcomes = result?;
    let passed = outcomes.iter().all(|outcome| outcome.passed);

    if !ctx.args.collect_only {
        if let Err(e) =
            report::write_harness_summary(&ctx.report_dir, ctx.setup_name.as_deref(), &outcomes)
        {
            tracing::warn!(error = %e, "could not write harness summary");
        }
        if passed {
            println!("{}", PASS_BANNER.green());
        }
    }

    Ok(passed)
}

async fn dispatch(
    ctx: &mut RunContext,
    plan: &ExecutionPlan,
    engine: &dyn TestEngine,
) -> Result<Vec<SuiteOutcome>> {
    let mut outcomes = Vec::new();

    for kind in plan.selected() {
        println!(
            "\n{} {}",
            "Running:".blue().bold(),
            format!("{kind} tests").white().bold()
        );

        ctx.begin(kind).await?;

        let xml_path = report::xml_report_path(&ctx.report_dir, ctx.setup_name.as_deref(), kind);
        let argv = plan.suite_args(kind, Some(&xml_path));

        let run_result = engine.run(&argv).await;
        let finalize_result = ctx.finalize(kind).await;

        let passed = run_result?;
        finalize_result?;

        if passed {
            println!("  {} {kind} suite passed", "✓".green());
        } else {
            println!("  {} {kind} suite failed", "✗".red());
        }
        outcomes.push(SuiteOutcome { kind, passed });
    }

    Ok(outcomes)
}

/// Write the free-text setup summary; failures only cost us the file
fn save_setup_info(ctx: &RunContext) {
    let (Some(name), Some(cfg)) = (ctx.setup_name.as_deref(), ctx.config.as_ref()) else {
        return;
    };
    if ctx.server_version.is_empty() {
        return;
    }
    if let Err(e) = report::write_setup_info(&ctx.report_dir, name, &ctx.server_version, cfg) {
        tracing::warn!(error = %e, "error saving setup info");
    }
}
