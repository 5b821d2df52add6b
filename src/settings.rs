//! Runtime configuration for a release run.

use serde::Serialize;
use std::path::PathBuf;

/// Default interpreter used for every tool invocation
pub const DEFAULT_PYTHON: &str = "python3";

/// Default output directory of the build step, relative to the project
pub const DEFAULT_DIST_DIR: &str = "dist";

/// What to do when a step fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop at the first failing step
    #[default]
    FailFast,
    /// Run every step regardless; the last step decides the exit status
    Continue,
}

/// Validated configuration for one release
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    /// Directory containing setup.py or pyproject.toml
    pub project_dir: PathBuf,
    /// Interpreter running pip, the build and twine
    pub python: String,
    /// Build output directory (relative paths resolve against `project_dir`)
    pub dist_dir: PathBuf,
    /// Named repository from .pypirc
    pub repository: Option<String>,
    /// Explicit upload endpoint
    pub repository_url: Option<String>,
    /// .pypirc passed through to twine
    pub config_file: Option<PathBuf>,
    /// Behaviour after a failed step
    pub policy: FailurePolicy,
    /// Leave existing artifacts in the dist directory before building
    pub keep_dist: bool,
    /// Skip the four tooling steps
    pub skip_tooling: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            python: DEFAULT_PYTHON.to_string(),
            dist_dir: PathBuf::from(DEFAULT_DIST_DIR),
            repository: None,
            repository_url: None,
            config_file: None,
            policy: FailurePolicy::FailFast,
            keep_dist: false,
            skip_tooling: false,
        }
    }
}

impl Settings {
    /// Absolute or project-relative location of the dist directory
    pub fn dist_path(&self) -> PathBuf {
        self.project_dir.join(&self.dist_dir)
    }

    /// Dist directory as passed on the build tool's command line
    pub fn dist_dir_arg(&self) -> String {
        self.dist_dir.display().to_string()
    }
}
