//! Sequential execution of the release plan.
//!
//! Steps run strictly one after another; each blocks until its process exits.
//! Under [`FailurePolicy::FailFast`] the first failure skips every later step,
//! so a failed build can never be followed by an upload. Under
//! [`FailurePolicy::Continue`] every step is attempted and the last one decides
//! the exit status, but the upload step still refuses to run without a
//! verified artifact set from the current build.

use crate::artifacts::{self, Artifact, ArtifactSelector};
use crate::cli::OutputManager;
use crate::credentials::{self, CredentialSource};
use crate::error::{ArtifactError, ReleaseError, Result, ToolError};
use crate::project::PackageDescription;
use crate::report::RunReport;
use crate::runner::CommandRunner;
use crate::settings::{FailurePolicy, Settings};
use crate::steps::{Invocation, ReleasePlan, ReleaseStep};
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

/// Credential lookup used before the upload step
pub type CredentialCheck = fn(Option<&Path>) -> Result<CredentialSource>;

/// Result of a complete run
#[derive(Debug)]
pub struct RunOutcome {
    /// Full run report
    pub report: RunReport,
    /// Error of the last executed step, when it failed
    pub failure: Option<ReleaseError>,
}

impl RunOutcome {
    /// Process exit code for the run
    pub fn exit_code(&self) -> i32 {
        self.report.exit_code
    }
}

/// Drives the six release steps for one project
pub struct Orchestrator<R> {
    runner: R,
    settings: Settings,
    description: PackageDescription,
    plan: ReleasePlan,
    credential_check: CredentialCheck,
    output: OutputManager,
}

impl<R: CommandRunner> Orchestrator<R> {
    /// Create an orchestrator for `description` under `settings`
    pub fn new(runner: R, settings: Settings, description: PackageDescription) -> Self {
        let plan = ReleasePlan::new(&settings, &description);
        Self {
            runner,
            settings,
            description,
            plan,
            credential_check: credentials::detect,
            output: OutputManager::default(),
        }
    }

    /// Replace the credential lookup
    pub fn with_credential_check(mut self, check: CredentialCheck) -> Self {
        self.credential_check = check;
        self
    }

    /// Replace the output manager
    pub fn with_output(mut self, output: OutputManager) -> Self {
        self.output = output;
        self
    }

    /// The plan this orchestrator executes
    pub fn plan(&self) -> &ReleasePlan {
        &self.plan
    }

    /// The runner, for inspection after a run
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Execute every step in order
    pub async fn run(&self) -> RunOutcome {
        let metadata = &self.description.metadata;
        let mut report = RunReport::new(
            &self.settings,
            self.description.kind,
            metadata.name.clone(),
            metadata.version.clone(),
        );

        let total = ReleaseStep::ALL.len();
        let mut artifacts: Option<Vec<Artifact>> = None;
        let mut halted = false;
        let mut last_failure: Option<ReleaseError> = None;
        let mut exit_code = 0;

        for (step, planned) in self.plan.steps() {
            if halted {
                report.skip(step, planned.to_string(), "previous step failed");
                continue;
            }
            if step.is_tooling() && self.settings.skip_tooling {
                self.output
                    .indent(&format!("[{}/{}] {} skipped", step.number(), total, step));
                report.skip(step, planned.to_string(), "tooling steps disabled");
                continue;
            }

            let invocation = match step {
                ReleaseStep::Upload => self.upload_invocation(planned, artifacts.as_deref()),
                _ => planned.clone(),
            };

            self.output.progress(&format!(
                "[{}/{}] {}: {}",
                step.number(),
                total,
                step,
                invocation
            ));

            let started_at = chrono::Utc::now();
            let timer = Instant::now();
            let result = match step {
                ReleaseStep::Build => match self.build(&invocation, &mut report).await {
                    Ok(produced) => {
                        artifacts = Some(produced);
                        Ok(())
                    }
                    Err(e) => Err(e),
                },
                ReleaseStep::Upload => {
                    self.upload(&invocation, artifacts.as_deref(), &mut report)
                        .await
                }
                _ => self.run_checked(&invocation).await,
            };
            report.record(
                step,
                invocation.to_string(),
                started_at,
                timer.elapsed(),
                result.as_ref().map(|_| ()),
            );

            match result {
                Ok(()) => {
                    self.output.success(&format!("{} finished", step));
                    exit_code = 0;
                    last_failure = None;
                }
                Err(e) => {
                    self.output.error(&format!("{} failed: {}", step, e));
                    log::warn!("Step {} failed: {}", step, e);
                    exit_code = e.exit_code();
                    last_failure = Some(e);
                    if self.settings.policy == FailurePolicy::FailFast {
                        halted = true;
                    }
                }
            }
        }

        if let Some(produced) = artifacts {
            report.artifacts = produced;
        }
        report.finish(exit_code);
        RunOutcome {
            report,
            failure: last_failure,
        }
    }

    /// Run an invocation and turn a non-zero exit into an error
    async fn run_checked(&self, invocation: &Invocation) -> Result<()> {
        let outcome = self.runner.run(invocation).await?;
        if outcome.success() {
            Ok(())
        } else {
            Err(ToolError::NonZeroExit {
                command: invocation.to_string(),
                code: outcome.code,
            }
            .into())
        }
    }

    /// Clean the dist directory, build, then collect and verify this build's artifacts
    async fn build(&self, invocation: &Invocation, report: &mut RunReport) -> Result<Vec<Artifact>> {
        let dist = self.settings.dist_path();

        if self.settings.keep_dist {
            log::debug!("Keeping existing contents of {}", dist.display());
        } else {
            let removed = artifacts::clean_dist_dir(&dist)?;
            if !removed.is_empty() {
                self.output.indent(&format!(
                    "Removed {} stale artifact(s) from {}",
                    removed.len(),
                    dist.display()
                ));
            }
            report.removed_stale = removed;
        }

        let metadata = &self.description.metadata;
        let selector = match (&metadata.name, &metadata.version) {
            (Some(name), Some(version)) => ArtifactSelector::release(name, version),
            _ => None,
        }
        .unwrap_or_else(|| ArtifactSelector::ModifiedSince(SystemTime::now()));

        self.run_checked(invocation).await?;

        let produced = artifacts::collect_artifacts(&dist, &selector)?;
        artifacts::verify_release_set(&dist, &produced)?;
        for artifact in &produced {
            self.output.indent(&format!(
                "{} ({} bytes, sha256 {})",
                artifact.file_name(),
                artifact.size_bytes,
                artifact.sha256
            ));
        }
        Ok(produced)
    }

    /// Upload invocation with the verified artifacts appended
    fn upload_invocation(&self, planned: &Invocation, artifacts: Option<&[Artifact]>) -> Invocation {
        let paths: Vec<String> = artifacts
            .unwrap_or_default()
            .iter()
            .map(|a| self.display_path(&a.path))
            .collect();
        planned.clone().with_args(paths)
    }

    fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.settings.project_dir)
            .map(PathBuf::from)
            .unwrap_or_else(|_| path.to_path_buf())
            .display()
            .to_string()
    }

    /// Check artifacts and credentials, then hand the artifacts to the upload tool
    async fn upload(
        &self,
        invocation: &Invocation,
        artifacts: Option<&[Artifact]>,
        report: &mut RunReport,
    ) -> Result<()> {
        if artifacts.is_none_or(|a| a.is_empty()) {
            return Err(ArtifactError::NothingToUpload.into());
        }

        let source = (self.credential_check)(self.settings.config_file.as_deref())?;
        self.output
            .indent(&format!("Credentials from {}", source.describe()));
        report.credentials = Some(source.describe());

        self.run_checked(invocation).await
    }
}
