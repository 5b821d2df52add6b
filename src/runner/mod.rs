//! External command execution.

use crate::error::{Result, ToolError};
use crate::steps::Invocation;
use std::future::Future;
use std::process::Stdio;

/// How an external command finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Exit code; `None` when terminated by a signal
    pub code: Option<i32>,
}

impl CommandOutcome {
    /// Outcome with an explicit exit code
    pub fn exited(code: i32) -> Self {
        Self { code: Some(code) }
    }

    /// Whether the command exited with status zero
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs invocations to completion
///
/// Spawn failures are `Err`; a process that ran and exited non-zero is an
/// `Ok` outcome the caller judges.
pub trait CommandRunner {
    /// Run `invocation` and wait for it to exit
    fn run(&self, invocation: &Invocation) -> impl Future<Output = Result<CommandOutcome>> + Send;
}

/// Runner backed by real child processes
///
/// stdio is inherited so the tools' own diagnostics reach the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner {
    stdout_to_stderr: bool,
}

impl ProcessRunner {
    /// Runner that sends the tools' stdout to stderr, keeping stdout for JSON
    pub fn stdout_to_stderr() -> Self {
        Self {
            stdout_to_stderr: true,
        }
    }
}

impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutcome> {
        log::info!("Running {} (in {})", invocation, invocation.cwd.display());

        let stdout = if self.stdout_to_stderr {
            Stdio::from(std::io::stderr())
        } else {
            Stdio::inherit()
        };

        let status = tokio::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| ToolError::SpawnFailed {
                command: invocation.to_string(),
                reason: e.to_string(),
            })?;

        log::debug!("{} finished with {}", invocation, status);
        Ok(CommandOutcome {
            code: status.code(),
        })
    }
}

/// Resolve the interpreter to an executable path
pub fn resolve_interpreter(python: &str) -> Result<std::path::PathBuf> {
    which::which(python).map_err(|e| {
        log::debug!("which({}) failed: {}", python, e);
        ToolError::InterpreterNotFound {
            python: python.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_codes() {
        assert!(CommandOutcome::exited(0).success());
        assert!(!CommandOutcome::exited(2).success());
        assert!(!CommandOutcome { code: None }.success());
    }

    #[test]
    fn test_resolve_missing_interpreter() {
        let err = resolve_interpreter("definitely-not-a-python-0xdeadbeef").unwrap_err();
        assert!(matches!(
            err,
            crate::error::ReleaseError::Tool(ToolError::InterpreterNotFound { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_reports_exit_code() {
        let dir = tempfile::tempdir().expect("tempdir");
        let invocation = Invocation {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "exit 7".to_string()],
            cwd: dir.path().to_path_buf(),
        };
        let outcome = ProcessRunner::default().run(&invocation).await.expect("spawn sh");
        assert_eq!(outcome.code, Some(7));
    }

    #[tokio::test]
    async fn test_process_runner_spawn_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let invocation = Invocation {
            program: "definitely-not-a-program-0xdeadbeef".to_string(),
            args: Vec::new(),
            cwd: dir.path().to_path_buf(),
        };
        let err = ProcessRunner::default().run(&invocation).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::ReleaseError::Tool(ToolError::SpawnFailed { .. })
        ));
    }
}
