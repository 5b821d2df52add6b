//! Error types for pyrelease operations.
//!
//! Every error carries an actionable message; fatal errors also offer recovery suggestions.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pyrelease operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all pyrelease operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Project discovery and metadata errors
    #[error("Project error: {0}")]
    Project(#[from] ProjectError),

    /// External tool errors
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Distribution artifact errors
    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// Upload credential errors
    #[error("Credentials error: {0}")]
    Credentials(#[from] CredentialsError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Package description errors
#[derive(Error, Debug)]
pub enum ProjectError {
    /// Project directory does not exist
    #[error("Project directory {path} does not exist")]
    DirectoryNotFound {
        /// Path that was given
        path: PathBuf,
    },

    /// Neither setup.py nor pyproject.toml is present
    #[error("No setup.py or pyproject.toml found in {dir}")]
    DescriptionNotFound {
        /// Directory that was searched
        dir: PathBuf,
    },

    /// pyproject.toml could not be parsed
    #[error("Failed to parse {path}: {reason}")]
    InvalidPyproject {
        /// Path to pyproject.toml
        path: PathBuf,
        /// Parser message
        reason: String,
    },
}

/// External tool errors
#[derive(Error, Debug)]
pub enum ToolError {
    /// Python interpreter not found on PATH
    #[error("Python interpreter '{python}' not found on PATH")]
    InterpreterNotFound {
        /// Interpreter name or path
        python: String,
    },

    /// The process could not be started
    #[error("Failed to start '{command}': {reason}")]
    SpawnFailed {
        /// Command line
        command: String,
        /// Reason for the error
        reason: String,
    },

    /// The process exited unsuccessfully
    #[error("'{command}' exited with status {}", describe_status(.code))]
    NonZeroExit {
        /// Command line
        command: String,
        /// Exit code, if the process was not killed by a signal
        code: Option<i32>,
    },
}

/// Distribution artifact errors
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// Dist directory could not be cleaned
    #[error("Failed to remove stale artifact {path}: {reason}")]
    CleanFailed {
        /// Stale artifact
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// Dist directory glob was invalid
    #[error("Invalid dist directory pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// Glob pattern
        pattern: String,
        /// Reason for the error
        reason: String,
    },

    /// Build did not produce exactly one sdist and one wheel
    #[error(
        "Expected exactly one source archive and one wheel in {dir}, found {sdists} source archive(s) and {wheels} wheel(s)"
    )]
    UnexpectedSet {
        /// Dist directory
        dir: PathBuf,
        /// Number of source archives found
        sdists: usize,
        /// Number of wheels found
        wheels: usize,
    },

    /// Upload step reached without a verified build
    #[error("No artifacts from the current build are available for upload")]
    NothingToUpload,
}

/// Upload credential errors
#[derive(Error, Debug)]
pub enum CredentialsError {
    /// No credential source could be found
    #[error("No upload credentials found (TWINE_PASSWORD is unset and no .pypirc exists)")]
    Missing,

    /// TWINE_PASSWORD is set but empty
    #[error("TWINE_PASSWORD is set but empty")]
    EmptyPassword,

    /// --config-file points at a missing file
    #[error("Upload config file {path} does not exist")]
    ConfigFileMissing {
        /// Path given on the command line
        path: PathBuf,
    },
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },
}

fn describe_status(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

impl ReleaseError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReleaseError::Project(ProjectError::DescriptionNotFound { .. }) => vec![
                "Run pyrelease from the directory containing setup.py or pyproject.toml"
                    .to_string(),
                "Or pass --project-dir <path>".to_string(),
            ],
            ReleaseError::Tool(ToolError::InterpreterNotFound { python }) => vec![
                format!("Install '{}' or put it on PATH", python),
                "Select another interpreter with --python or PYRELEASE_PYTHON".to_string(),
            ],
            ReleaseError::Credentials(CredentialsError::Missing)
            | ReleaseError::Credentials(CredentialsError::EmptyPassword) => vec![
                "Export an API token: export TWINE_PASSWORD=pypi-...".to_string(),
                "Or configure ~/.pypirc with a [pypi] section".to_string(),
            ],
            ReleaseError::Artifact(ArtifactError::UnexpectedSet { .. }) => vec![
                "Inspect the dist directory for leftovers from other builds".to_string(),
                "Drop --keep-dist so stale artifacts are removed before building".to_string(),
            ],
            ReleaseError::Tool(ToolError::NonZeroExit { .. }) => vec![
                "See the tool output above for the underlying failure".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Process exit code for this error
    ///
    /// Tool failures propagate the tool's own exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReleaseError::Tool(ToolError::NonZeroExit {
                code: Some(code), ..
            }) if *code != 0 => *code,
            ReleaseError::Cli(CliError::InvalidArguments { .. }) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_propagates_tool_status() {
        let err = ReleaseError::Tool(ToolError::NonZeroExit {
            command: "python3 setup.py sdist bdist_wheel".to_string(),
            code: Some(3),
        });
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_for_signal_is_one() {
        let err = ReleaseError::Tool(ToolError::NonZeroExit {
            command: "python3 -m twine upload".to_string(),
            code: None,
        });
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("signal"));
    }

    #[test]
    fn test_missing_credentials_suggestions() {
        let err = ReleaseError::Credentials(CredentialsError::Missing);
        let suggestions = err.recovery_suggestions();
        assert!(suggestions.iter().any(|s| s.contains("TWINE_PASSWORD")));
        assert_eq!(err.exit_code(), 1);
    }
}
