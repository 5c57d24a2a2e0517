//! Product-tree and setup-directory resolution
//!
//! The harness lives inside the product checkout it is testing. The scripts
//! folder of the build under test comes from `TGEN_UNDER_TEST` (validated by
//! the presence of the daemon launcher), falling back to two levels above
//! the working directory. Setup directories are validated by the presence
//! of `config.yaml`; bare names are retried under `setups/`.

use std::path::{Path, PathBuf};

use super::{Error, Result};

/// Executable that marks the root of the product scripts tree
pub const DAEMON_LAUNCHER: &str = "tgen_daemon";

/// Environment variable pointing at the scripts folder of the build under test
pub const PRODUCT_TREE_ENV: &str = "TGEN_UNDER_TEST";

/// Environment variable naming the setup directory
pub const SETUP_DIR_ENV: &str = "SETUP_DIR";

/// Directory the reports are written to
pub const REPORT_DIR: &str = "reports";

/// Validate a candidate product tree by the daemon launcher's presence
pub fn check_product_tree(dir: &Path) -> Option<PathBuf> {
    if dir.join(DAEMON_LAUNCHER).is_file() {
        dir.canonicalize().ok()
    } else {
        None
    }
}

/// Validate a candidate setup directory by the presence of config.yaml
pub fn check_setup_dir(dir: &Path) -> Option<PathBuf> {
    if dir.join("config.yaml").is_file() {
        dir.canonicalize().ok()
    } else {
        None
    }
}

/// Locate the scripts folder of the build under test
pub fn resolve_product_tree() -> Result<PathBuf> {
    if let Ok(candidate) = std::env::var(PRODUCT_TREE_ENV) {
        if let Some(dir) = check_product_tree(Path::new(&candidate)) {
            return Ok(dir);
        }
    }
    check_product_tree(&Path::new("..").join("..")).ok_or(Error::ProductTreeNotFound)
}

/// Locate the setup directory from `--cfg` or `SETUP_DIR`
///
/// The two sources are mutually exclusive. Returns `None` when neither is
/// given; suites that need a setup fail later with a pointed error.
pub fn resolve_setup_dir(cli_dir: Option<&Path>) -> Result<Option<PathBuf>> {
    let env_candidate = std::env::var(SETUP_DIR_ENV)
        .ok()
        .map(|s| s.trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty());

    let env_dir = env_candidate.as_deref().and_then(|name| {
        let direct = Path::new(name);
        check_setup_dir(direct).or_else(|| check_setup_dir(&Path::new("setups").join(direct)))
    });

    match (cli_dir, env_dir) {
        (Some(_), Some(_)) => Err(Error::AmbiguousSetupDir),
        (Some(dir), None) => {
            let resolved = check_setup_dir(dir).ok_or_else(|| {
                Error::Config(format!(
                    "setup directory '{}' does not contain config.yaml",
                    dir.display()
                ))
            })?;
            Ok(Some(resolved))
        }
        (None, env_dir) => Ok(env_dir),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_check_setup_dir_requires_config() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_setup_dir(dir.path()).is_none());

        fs::write(dir.path().join("config.yaml"), "server:\n  host: localhost\n").unwrap();
        assert!(check_setup_dir(dir.path()).is_some());
    }

    #[test]
    fn test_check_product_tree_requires_launcher() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_product_tree(dir.path()).is_none());

        fs::write(dir.path().join(DAEMON_LAUNCHER), "#!/bin/sh\n").unwrap();
        assert!(check_product_tree(dir.path()).is_some());
    }

    #[test]
    fn test_cli_setup_dir_must_be_valid() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_setup_dir(Some(dir.path())).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
