//! SSH-backed remote command execution
//!
//! Commands run on the device under test through the system ssh binary and
//! are rooted at the product scripts directory. Under `--no-ssh` the shell
//! degrades to a no-op that reports success; callers that branch on remote
//! state must check `enabled()` first.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use crate::common::{Error, Result};

/// Captured result of a remote command
#[derive(Debug, Clone, Default)]
pub struct RemoteOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RemoteOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Shell session against the device under test
#[derive(Debug, Clone)]
pub struct RemoteShell {
    host: String,
    scripts_dir: PathBuf,
    enabled: bool,
    verbose: bool,
}

impl RemoteShell {
    pub fn new(host: String, scripts_dir: PathBuf, enabled: bool, verbose: bool) -> Self {
        Self {
            host,
            scripts_dir,
            enabled,
            verbose,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn scripts_dir(&self) -> &Path {
        &self.scripts_dir
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Run a command on the server, rooted at the scripts directory
    pub async fn run(&self, command: &str) -> Result<RemoteOutput> {
        if !self.enabled {
            return Ok(RemoteOutput::default());
        }

        let full = format!("cd {}; {}", self.scripts_dir.display(), command);
        if self.verbose {
            tracing::info!(host = %self.host, command = %full, "remote command");
        } else {
            tracing::debug!(host = %self.host, command = %full, "remote command");
        }

        let output = Command::new(ssh_binary()?)
            .arg("-o")
            .arg("BatchMode=yes")
            .arg(&self.host)
            .arg(&full)
            .stdin(Stdio::null())
            .output()
            .await?;

        Ok(RemoteOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run a command and error on a non-zero exit status
    pub async fn run_checked(&self, command: &str) -> Result<RemoteOutput> {
        let output = self.run(command).await?;
        if !output.success() {
            return Err(Error::RemoteCommandFailed {
                command: command.to_string(),
                status: output.status,
            });
        }
        Ok(output)
    }

    /// Launch a command on the server without waiting for it
    ///
    /// Output is discarded; the process keeps running after the ssh session
    /// is dropped.
    pub async fn run_background(&self, command: &str) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let full = format!(
            "cd {}; nohup {} > /dev/null 2>&1 &",
            self.scripts_dir.display(),
            command
        );
        if self.verbose {
            tracing::info!(host = %self.host, command = %full, "remote background command");
        }

        let mut child = Command::new(ssh_binary()?)
            .arg("-o")
            .arg("BatchMode=yes")
            .arg(&self.host)
            .arg(&full)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        // reap the ssh client itself; the remote command is already detached
        child.wait().await?;
        Ok(())
    }

    /// Copy the product tree to a scratch directory on the server and
    /// re-root subsequent commands there
    ///
    /// The tree is assumed visible from the server (shared filesystem), so
    /// the rsync runs remotely.
    pub async fn sync_product_tree(&mut self, dest: &Path) -> Result<()> {
        let command = format!(
            "mkdir -p {dest}; rsync -L -az {src}/ {dest}",
            dest = dest.display(),
            src = self.scripts_dir.display(),
        );
        let output = self.run(&command).await?;
        if !output.success() {
            return Err(Error::SyncFailed(output.stderr.trim().to_string()));
        }
        self.scripts_dir = dest.to_path_buf();
        Ok(())
    }
}

fn ssh_binary() -> Result<PathBuf> {
    which::which("ssh").map_err(|_| Error::ToolNotFound("ssh".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_shell_reports_success() {
        let shell = RemoteShell::new(
            "nowhere.invalid".to_string(),
            PathBuf::from("/opt/tgen/scripts"),
            false,
            false,
        );
        let output = shell.run("ps -C _tgen-64").await.unwrap();
        assert!(output.success());
        assert!(output.stdout.is_empty());
        shell.run_background("./tgen-64 -i").await.unwrap();
    }

    #[tokio::test]
    async fn test_disabled_sync_still_reroots() {
        let mut shell = RemoteShell::new(
            "nowhere.invalid".to_string(),
            PathBuf::from("/opt/tgen/scripts"),
            false,
            false,
        );
        shell
            .sync_product_tree(Path::new("/tmp/tgen_scripts"))
            .await
            .unwrap();
        assert_eq!(shell.scripts_dir(), Path::new("/tmp/tgen_scripts"));
    }
}
