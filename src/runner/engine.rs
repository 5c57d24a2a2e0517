//! External test-engine invocation
//!
//! The collection/execution framework is an external executable; the
//! harness only builds its argument vector and interprets the exit status.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::common::{Error, Result};

/// Conventional name of the engine executable
pub const ENGINE_BINARY: &str = "tgen-test-runner";

/// Directory under the product tree where the engine lives
const ENGINE_SUBDIR: &str = "automation";

/// Runs one suite to completion
#[async_trait]
pub trait TestEngine {
    /// Run the engine with the given arguments; `Ok(true)` means every
    /// test passed
    async fn run(&self, argv: &[String]) -> Result<bool>;
}

/// Engine implementation spawning the external runner process
#[derive(Debug)]
pub struct ProcessEngine {
    binary: PathBuf,
    workdir: PathBuf,
}

impl ProcessEngine {
    /// Locate the engine: explicit path, then PATH, then the product tree
    pub fn locate(explicit: Option<&Path>, scripts_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            if path.is_file() {
                return Ok(Self {
                    binary: path.to_path_buf(),
                    workdir: scripts_dir.to_path_buf(),
                });
            }
            return Err(Error::engine_not_found(
                &path.display().to_string(),
                &["--engine"],
            ));
        }

        if let Ok(binary) = which::which(ENGINE_BINARY) {
            return Ok(Self {
                binary,
                workdir: scripts_dir.to_path_buf(),
            });
        }

        let candidate = scripts_dir.join(ENGINE_SUBDIR).join(ENGINE_BINARY);
        if candidate.is_file() {
            return Ok(Self {
                binary: candidate,
                workdir: scripts_dir.to_path_buf(),
            });
        }

        Err(Error::engine_not_found(
            ENGINE_BINARY,
            &[
                "PATH".to_string(),
                scripts_dir.join(ENGINE_SUBDIR).display().to_string(),
            ],
        ))
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

#[async_trait]
impl TestEngine for ProcessEngine {
    async fn run(&self, argv: &[String]) -> Result<bool> {
        tracing::debug!(engine = %self.binary.display(), ?argv, "running test engine");

        let status = Command::new(&self.binary)
            .args(argv)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| Error::EngineStartFailed(e.to_string()))?;

        Ok(status.success())
    }
}
