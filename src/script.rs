// src/script.rs

//! Lifecycle script execution
//!
//! Script bodies are fed to a shell on standard input. The working directory
//! and the sandbox variables are set on the child process only.

use crate::error::{Error, Result};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Shell used when none is configured
pub const DEFAULT_SHELL: &str = "bash";

/// Runs lifecycle scripts with a fixed shell, verbosity and environment
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    shell: String,
    verbose: bool,
    env: Vec<(&'static str, PathBuf)>,
}

impl ScriptRunner {
    pub fn new(shell: impl Into<String>, verbose: bool) -> Self {
        Self {
            shell: shell.into(),
            verbose,
            env: Vec::new(),
        }
    }

    /// Add variables passed to every script this runner starts
    pub fn with_env(mut self, env: Vec<(&'static str, PathBuf)>) -> Self {
        self.env.extend(env);
        self
    }

    /// Run `body` in `working_dir`, failing on spawn error or non-zero exit
    ///
    /// `stage` names the script in logs and errors ("build", "uninstall", ...).
    pub fn run(&self, working_dir: &Path, body: &str, stage: &str) -> Result<()> {
        info!("Running {} script in {}", stage, working_dir.display());

        let (stdout, stderr) = if self.verbose {
            (Stdio::inherit(), Stdio::inherit())
        } else {
            (Stdio::null(), Stdio::null())
        };

        let mut child = Command::new(&self.shell)
            .current_dir(working_dir)
            .envs(self.env.iter().map(|(key, value)| (*key, value.as_os_str())))
            .stdin(Stdio::piped())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|e| Error::ScriptFailed {
                stage: stage.to_string(),
                reason: format!("failed to start {}: {}", self.shell, e),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A script may exit before reading all of its input; the exit
            // status below is what decides success.
            match stdin.write_all(body.as_bytes()) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                    debug!("{} script closed stdin early", stage);
                }
                Err(e) => return Err(Error::Io(e)),
            }
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(Error::ScriptFailed {
                stage: stage.to_string(),
                reason: format!("exited with {}", status),
            });
        }

        debug!("{} script finished", stage);
        Ok(())
    }
}

impl Default for ScriptRunner {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_runs_in_working_dir() {
        let dir = TempDir::new().unwrap();
        ScriptRunner::default()
            .run(dir.path(), "echo hello > out.txt", "build")
            .unwrap();

        let content = fs::read_to_string(dir.path().join("out.txt")).unwrap();
        assert_eq!(content.trim(), "hello");
    }

    #[test]
    fn test_non_zero_exit_is_error() {
        let dir = TempDir::new().unwrap();
        let err = ScriptRunner::default()
            .run(dir.path(), "exit 3", "uninstall")
            .unwrap_err();

        match err {
            Error::ScriptFailed { stage, .. } => assert_eq!(stage, "uninstall"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_env_is_passed_to_script() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptRunner::default()
            .with_env(vec![("GUMSHIELD_FAKE_ROOT_DIR", dir.path().join("root"))]);

        runner
            .run(dir.path(), "echo \"$GUMSHIELD_FAKE_ROOT_DIR\" > env.txt", "build")
            .unwrap();

        let content = fs::read_to_string(dir.path().join("env.txt")).unwrap();
        assert_eq!(content.trim(), dir.path().join("root").to_str().unwrap());
        assert!(std::env::var_os("GUMSHIELD_FAKE_ROOT_DIR").is_none());
    }

    #[test]
    fn test_missing_shell_is_error() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptRunner::new("/nonexistent/shell", false);
        assert!(matches!(
            runner.run(dir.path(), "true", "build"),
            Err(Error::ScriptFailed { .. })
        ));
    }
}
