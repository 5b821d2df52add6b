//! Command line argument parsing and validation.
//!
//! Every option has an environment variable and a default, so a bare
//! `pyrelease` in a package directory performs the whole release.

use crate::settings::{DEFAULT_DIST_DIR, DEFAULT_PYTHON, FailurePolicy, Settings};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Release a Python package: install tooling, build sdist and wheel, upload
#[derive(Parser, Debug)]
#[command(
    name = "pyrelease",
    version,
    about = "Release a Python package: install tooling, build sdist and wheel, upload",
    long_about = "Runs the six release steps in order, stopping at the first failure:

  1. python -m pip install setuptools wheel
  2. python -m pip install --upgrade setuptools wheel
  3. python -m pip install twine
  4. python -m pip install --upgrade twine
  5. python setup.py sdist bdist_wheel   (or python -m build for pyproject-only projects)
  6. python -m twine upload <the artifacts from step 5>

Usage:
  pyrelease                      # release the package in the current directory
  pyrelease plan                 # show the commands without running them
  pyrelease check                # verify description, interpreter and credentials
  pyrelease --repository testpypi"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub options: ReleaseOptions,
}

/// Subcommands; `release` is the default
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run all six steps (default)
    Release,
    /// Print the commands that would run
    Plan,
    /// Check the project, interpreter and upload credentials without changing anything
    Check,
}

impl Command {
    /// Command name for messages
    pub fn name(&self) -> &'static str {
        match self {
            Command::Release => "release",
            Command::Plan => "plan",
            Command::Check => "check",
        }
    }
}

/// Options shared by all subcommands
#[derive(ClapArgs, Debug, Clone)]
pub struct ReleaseOptions {
    /// Directory containing setup.py or pyproject.toml
    #[arg(
        long,
        short = 'C',
        global = true,
        env = "PYRELEASE_PROJECT_DIR",
        default_value = ".",
        value_name = "DIR"
    )]
    pub project_dir: PathBuf,

    /// Python interpreter used for pip, the build and twine
    #[arg(long, global = true, env = "PYRELEASE_PYTHON", default_value = DEFAULT_PYTHON)]
    pub python: String,

    /// Build output directory, relative to the project directory
    #[arg(
        long,
        global = true,
        env = "PYRELEASE_DIST_DIR",
        default_value = DEFAULT_DIST_DIR,
        value_name = "DIR"
    )]
    pub dist_dir: PathBuf,

    /// Repository name from .pypirc (e.g. testpypi)
    #[arg(long, global = true, env = "PYRELEASE_REPOSITORY", conflicts_with = "repository_url")]
    pub repository: Option<String>,

    /// Repository upload URL
    #[arg(long, global = true, env = "PYRELEASE_REPOSITORY_URL", value_name = "URL")]
    pub repository_url: Option<String>,

    /// .pypirc file passed to twine
    #[arg(long, global = true, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// What to do when a step fails
    #[arg(
        long,
        global = true,
        env = "PYRELEASE_POLICY",
        value_enum,
        default_value = "fail-fast"
    )]
    pub policy: FailurePolicy,

    /// Do not remove existing artifacts from the dist directory before building
    #[arg(long, global = true)]
    pub keep_dist: bool,

    /// Skip installing and upgrading setuptools, wheel and twine
    #[arg(long, global = true)]
    pub skip_tooling: bool,

    /// Print a JSON report on stdout instead of progress output
    #[arg(long, global = true)]
    pub json: bool,

    /// Also write the JSON report to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Selected command, defaulting to `release`
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Release)
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.options.python.trim().is_empty() {
            return Err("--python must not be empty".to_string());
        }

        if let Some(url) = &self.options.repository_url
            && !(url.starts_with("https://") || url.starts_with("http://"))
        {
            return Err(format!(
                "--repository-url must be an http(s) URL, got '{}'",
                url
            ));
        }

        if self.options.dist_dir.as_os_str().is_empty() {
            return Err("--dist-dir must not be empty".to_string());
        }

        Ok(())
    }

    /// Runtime settings derived from the arguments
    pub fn settings(&self) -> Settings {
        let opts = &self.options;
        Settings {
            project_dir: opts.project_dir.clone(),
            python: opts.python.clone(),
            dist_dir: opts.dist_dir.clone(),
            repository: opts.repository.clone(),
            repository_url: opts.repository_url.clone(),
            config_file: opts.config_file.clone(),
            policy: opts.policy,
            keep_dist: opts.keep_dist,
            skip_tooling: opts.skip_tooling,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).expect("valid arguments")
    }

    #[test]
    fn test_no_arguments_means_release() {
        let args = parse(&["pyrelease"]);
        assert_eq!(args.command(), Command::Release);
        assert_eq!(args.options.policy, FailurePolicy::FailFast);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let args = parse(&["pyrelease", "plan", "--python", "python3.12", "--policy", "continue"]);
        assert_eq!(args.command(), Command::Plan);
        let settings = args.settings();
        assert_eq!(settings.python, "python3.12");
        assert_eq!(settings.policy, FailurePolicy::Continue);
    }

    #[test]
    fn test_repository_flags_conflict() {
        let result = Args::try_parse_from([
            "pyrelease",
            "--repository",
            "testpypi",
            "--repository-url",
            "https://test.pypi.org/legacy/",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_repository_url_must_be_http() {
        let args = parse(&["pyrelease", "--repository-url", "ftp://example.com"]);
        assert!(args.validate().is_err());
    }
}
