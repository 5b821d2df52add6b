//! The fixed, ordered release plan.
//!
//! Six external invocations, always in the same order: install and upgrade the
//! build tooling, install and upgrade the upload tool, build, upload.

use crate::project::{DescriptionKind, PackageDescription};
use crate::settings::Settings;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Build tooling installed for every project
pub const BUILD_TOOLS: [&str; 2] = ["setuptools", "wheel"];

/// Extra frontend needed by pyproject-only projects
pub const PEP517_FRONTEND: &str = "build";

/// Upload tool
pub const UPLOAD_TOOL: &str = "twine";

/// One step of the release
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReleaseStep {
    /// `pip install` the build tooling
    InstallBuildTools,
    /// `pip install --upgrade` the build tooling
    UpgradeBuildTools,
    /// `pip install` the upload tool
    InstallUploadTool,
    /// `pip install --upgrade` the upload tool
    UpgradeUploadTool,
    /// Produce the source archive and the wheel
    Build,
    /// Upload the artifacts of the build
    Upload,
}

impl ReleaseStep {
    /// All steps in execution order
    pub const ALL: [ReleaseStep; 6] = [
        ReleaseStep::InstallBuildTools,
        ReleaseStep::UpgradeBuildTools,
        ReleaseStep::InstallUploadTool,
        ReleaseStep::UpgradeUploadTool,
        ReleaseStep::Build,
        ReleaseStep::Upload,
    ];

    /// Stable kebab-case name
    pub fn name(self) -> &'static str {
        match self {
            ReleaseStep::InstallBuildTools => "install-build-tools",
            ReleaseStep::UpgradeBuildTools => "upgrade-build-tools",
            ReleaseStep::InstallUploadTool => "install-upload-tool",
            ReleaseStep::UpgradeUploadTool => "upgrade-upload-tool",
            ReleaseStep::Build => "build",
            ReleaseStep::Upload => "upload",
        }
    }

    /// 1-based position in the plan
    pub fn number(self) -> usize {
        self as usize + 1
    }

    /// Whether this step only touches the tooling environment
    pub fn is_tooling(self) -> bool {
        self < ReleaseStep::Build
    }
}

impl fmt::Display for ReleaseStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single external command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    /// Executable name or path
    pub program: String,
    /// Arguments, unquoted
    pub args: Vec<String>,
    /// Working directory
    pub cwd: PathBuf,
}

impl Invocation {
    fn new<I, S>(program: &str, args: I, cwd: &Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: cwd.to_path_buf(),
        }
    }

    /// Append further arguments
    pub fn with_args<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(extra.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@+,".contains(c))
    {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// The complete, ordered release plan for one project
#[derive(Debug, Clone, Serialize)]
pub struct ReleasePlan {
    steps: Vec<(ReleaseStep, Invocation)>,
}

impl ReleasePlan {
    /// Build the plan for `description` under `settings`
    ///
    /// The upload invocation carries no artifacts yet; they are appended once
    /// the build step has produced and verified them.
    pub fn new(settings: &Settings, description: &PackageDescription) -> Self {
        let python = settings.python.as_str();
        let cwd = settings.project_dir.as_path();

        let mut build_tools: Vec<&str> = BUILD_TOOLS.to_vec();
        if description.kind == DescriptionKind::Pyproject {
            build_tools.push(PEP517_FRONTEND);
        }

        let pip_install = |upgrade: bool, packages: &[&str]| {
            let mut args = vec!["-m", "pip", "install"];
            if upgrade {
                args.push("--upgrade");
            }
            args.extend_from_slice(packages);
            Invocation::new(python, args, cwd)
        };

        let build = match description.kind {
            DescriptionKind::SetupPy => Invocation::new(python, ["setup.py"], cwd)
                .with_args(["sdist"])
                .with_args(dist_dir_override(settings))
                .with_args(["bdist_wheel"])
                .with_args(dist_dir_override(settings)),
            DescriptionKind::Pyproject => Invocation::new(
                python,
                ["-m", "build", "--sdist", "--wheel", "--outdir"],
                cwd,
            )
            .with_args([settings.dist_dir_arg()]),
        };

        let mut upload = Invocation::new(
            python,
            ["-m", UPLOAD_TOOL, "upload", "--non-interactive"],
            cwd,
        );
        if let Some(repository) = &settings.repository {
            upload = upload.with_args(["--repository".to_string(), repository.clone()]);
        }
        if let Some(url) = &settings.repository_url {
            upload = upload.with_args(["--repository-url".to_string(), url.clone()]);
        }
        if let Some(config_file) = &settings.config_file {
            upload = upload.with_args([
                "--config-file".to_string(),
                config_file.display().to_string(),
            ]);
        }

        Self {
            steps: vec![
                (ReleaseStep::InstallBuildTools, pip_install(false, &build_tools)),
                (ReleaseStep::UpgradeBuildTools, pip_install(true, &build_tools)),
                (ReleaseStep::InstallUploadTool, pip_install(false, &[UPLOAD_TOOL])),
                (ReleaseStep::UpgradeUploadTool, pip_install(true, &[UPLOAD_TOOL])),
                (ReleaseStep::Build, build),
                (ReleaseStep::Upload, upload),
            ],
        }
    }

    /// Steps with their invocations, in execution order
    pub fn steps(&self) -> impl Iterator<Item = (ReleaseStep, &Invocation)> {
        self.steps.iter().map(|(step, inv)| (*step, inv))
    }

    /// Invocation for a single step, if the plan contains it
    pub fn invocation(&self, step: ReleaseStep) -> Option<&Invocation> {
        self.steps
            .iter()
            .find(|(planned, _)| *planned == step)
            .map(|(_, invocation)| invocation)
    }
}

/// setuptools writes to `dist/` unless `--dist-dir` follows each command
fn dist_dir_override(settings: &Settings) -> Vec<String> {
    if settings.dist_dir == Path::new(crate::settings::DEFAULT_DIST_DIR) {
        Vec::new()
    } else {
        vec!["--dist-dir".to_string(), settings.dist_dir_arg()]
    }
}
