//! Run reports
//!
//! The engine writes its own per-suite XML; the harness adds a free-text
//! setup summary and a small JUnit rollup of suite verdicts, so a run that
//! dies between suites still leaves a machine-readable trace.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::common::Result;
use crate::config::SetupConfig;
use crate::plan::SuiteKind;
use crate::runner::SuiteOutcome;

/// Create the report directory on demand
pub fn ensure_report_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Per-suite XML report path handed to the engine
///
/// Named after the setup when one is known (`report_<setup>_stateful.xml`),
/// `unit_test_<suite>.xml` otherwise.
pub fn xml_report_path(report_dir: &Path, setup_name: Option<&str>, kind: SuiteKind) -> PathBuf {
    let base = match setup_name {
        Some(name) => format!("report_{name}"),
        None => "unit_test".to_string(),
    };
    report_dir.join(format!("{base}_{}.xml", kind.xml_suffix()))
}

/// Write the free-text setup summary next to the XML reports
pub fn write_setup_info(
    report_dir: &Path,
    setup_name: &str,
    version: &BTreeMap<String, String>,
    cfg: &SetupConfig,
) -> Result<()> {
    let mut info = String::new();
    for (key, value) in version {
        let _ = writeln!(info, "{key:<8}: {value}");
    }
    let _ = write!(
        info,
        "Server: {}, Modes: [{}]",
        cfg.server.host,
        cfg.server.modes.join(", ")
    );
    if let Some(router) = &cfg.router {
        let _ = write!(
            info,
            "\nRouter: Model: {}, Image: {}",
            router.model.as_deref().unwrap_or("-"),
            router.image.as_deref().unwrap_or("-"),
        );
    }

    fs::write(report_dir.join(format!("report_{setup_name}.info")), info)?;
    Ok(())
}

/// Write the harness-level JUnit rollup: one testcase per executed suite
pub fn write_harness_summary(
    report_dir: &Path,
    setup_name: Option<&str>,
    outcomes: &[SuiteOutcome],
) -> Result<()> {
    let name = setup_name.unwrap_or("unit_test");
    let failures = outcomes.iter().filter(|o| !o.passed).count();

    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        xml,
        "<testsuite name=\"{}\" tests=\"{}\" failures=\"{}\" errors=\"0\">",
        escape_xml(name),
        outcomes.len(),
        failures
    );
    for outcome in outcomes {
        if outcome.passed {
            let _ = writeln!(
                xml,
                "  <testcase name=\"{}\" classname=\"regression\" />",
                outcome.kind
            );
        } else {
            let _ = writeln!(
                xml,
                "  <testcase name=\"{}\" classname=\"regression\">",
                outcome.kind
            );
            let _ = writeln!(
                xml,
                "    <failure message=\"{} suite failed\" />",
                outcome.kind
            );
            xml.push_str("  </testcase>\n");
        }
    }
    xml.push_str("</testsuite>\n");

    fs::write(report_dir.join(format!("report_{name}_harness.xml")), xml)?;
    Ok(())
}

fn escape_xml(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            c => result.push(c),
        }
    }
    result
}
