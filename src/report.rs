//! Run report: what ran, how it ended, what was uploaded.

use crate::artifacts::Artifact;
use crate::error::{ReleaseError, Result};
use crate::project::DescriptionKind;
use crate::settings::{FailurePolicy, Settings};
use crate::steps::ReleaseStep;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Outcome of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// The step ran and succeeded
    Succeeded,
    /// The step ran, or was attempted, and failed
    Failed,
    /// The step was not run
    Skipped,
}

/// Record of one step of the run
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    /// Which step
    pub step: ReleaseStep,
    /// Command line, as displayed
    pub command: String,
    /// How the step ended
    pub status: StepStatus,
    /// Exit code of the external command, when it ran
    pub exit_code: Option<i32>,
    /// Error or skip reason
    pub note: Option<String>,
    /// When the step started, if it ran
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Wall-clock duration
    pub duration_ms: u64,
}

/// Complete report of one release run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Unique ID for this run
    pub run_id: String,
    /// Project directory of the run
    pub project_dir: PathBuf,
    /// Description file kind that drove the build
    pub description: DescriptionKind,
    /// Package name, when statically known
    pub package_name: Option<String>,
    /// Package version, when statically known
    pub package_version: Option<String>,
    /// Failure policy in effect
    pub policy: FailurePolicy,
    /// When the run started
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// When the run finished
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
    /// One record per step, in plan order
    pub steps: Vec<StepRecord>,
    /// Stale files removed from the dist directory before building
    pub removed_stale: Vec<PathBuf>,
    /// Artifacts produced by the build step
    pub artifacts: Vec<Artifact>,
    /// Description of the credential source used for upload
    pub credentials: Option<String>,
    /// Process exit code of the run
    pub exit_code: i32,
}

impl RunReport {
    /// Start a report for a run
    pub fn new(
        settings: &Settings,
        description: DescriptionKind,
        package_name: Option<String>,
        package_version: Option<String>,
    ) -> Self {
        let now = chrono::Utc::now();
        let run_id = format!(
            "release-{}-{}",
            package_version.as_deref().unwrap_or("unknown"),
            now.timestamp()
        );

        Self {
            run_id,
            project_dir: settings.project_dir.clone(),
            description,
            package_name,
            package_version,
            policy: settings.policy,
            started_at: now,
            finished_at: None,
            steps: Vec::new(),
            removed_stale: Vec::new(),
            artifacts: Vec::new(),
            credentials: None,
            exit_code: 0,
        }
    }

    /// Record a step that ran
    pub fn record(
        &mut self,
        step: ReleaseStep,
        command: String,
        started_at: chrono::DateTime<chrono::Utc>,
        elapsed: Duration,
        outcome: std::result::Result<(), &ReleaseError>,
    ) {
        let (status, exit_code, note) = match outcome {
            Ok(()) => (StepStatus::Succeeded, Some(0), None),
            Err(e) => {
                let exit_code = match e {
                    ReleaseError::Tool(crate::error::ToolError::NonZeroExit { code, .. }) => *code,
                    _ => None,
                };
                (StepStatus::Failed, exit_code, Some(e.to_string()))
            }
        };

        self.steps.push(StepRecord {
            step,
            command,
            status,
            exit_code,
            note,
            started_at: Some(started_at),
            duration_ms: elapsed.as_millis().try_into().unwrap_or(u64::MAX),
        });
    }

    /// Record a step that did not run
    pub fn skip(&mut self, step: ReleaseStep, command: String, reason: &str) {
        self.steps.push(StepRecord {
            step,
            command,
            status: StepStatus::Skipped,
            exit_code: None,
            note: Some(reason.to_string()),
            started_at: None,
            duration_ms: 0,
        });
    }

    /// Close the report with the process exit code
    pub fn finish(&mut self, exit_code: i32) {
        self.exit_code = exit_code;
        self.finished_at = Some(chrono::Utc::now());
    }

    /// Record for a step, if it was reached
    pub fn step(&self, step: ReleaseStep) -> Option<&StepRecord> {
        self.steps.iter().find(|r| r.step == step)
    }

    /// Whether a step ran successfully
    pub fn has_succeeded(&self, step: ReleaseStep) -> bool {
        self.step(step)
            .is_some_and(|r| r.status == StepStatus::Succeeded)
    }

    /// Whether the external command of a step was started
    pub fn was_executed(&self, step: ReleaseStep) -> bool {
        self.step(step)
            .is_some_and(|r| r.status != StepStatus::Skipped)
    }

    /// Whether every step that ran succeeded
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
            && self
                .steps
                .iter()
                .all(|r| r.status != StepStatus::Failed)
    }

    /// Elapsed time from start to finish
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at.unwrap_or_else(chrono::Utc::now) - self.started_at
    }

    /// One-line summary
    pub fn summary(&self) -> String {
        let count = |status: StepStatus| self.steps.iter().filter(|r| r.status == status).count();
        format!(
            "{} steps succeeded, {} failed, {} skipped; {} artifact(s); exit code {}",
            count(StepStatus::Succeeded),
            count(StepStatus::Failed),
            count(StepStatus::Skipped),
            self.artifacts.len(),
            self.exit_code
        )
    }

    /// Pretty JSON rendering
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as JSON, atomically (temp file + rename)
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let serialized = self.to_json()?;
        let temp_path = path.with_extension("tmp");

        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(serialized.as_bytes())?;
            file.sync_all()?;
        }

        fs::rename(&temp_path, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;

    fn report() -> RunReport {
        RunReport::new(
            &Settings::default(),
            DescriptionKind::SetupPy,
            Some("pkg".to_string()),
            Some("1.0".to_string()),
        )
    }

    #[test]
    fn test_record_failure_keeps_exit_code() {
        let mut report = report();
        let err = ReleaseError::Tool(ToolError::NonZeroExit {
            command: "python3 setup.py sdist bdist_wheel".to_string(),
            code: Some(2),
        });
        report.record(
            ReleaseStep::Build,
            "python3 setup.py sdist bdist_wheel".to_string(),
            chrono::Utc::now(),
            Duration::from_millis(5),
            Err(&err),
        );
        report.skip(ReleaseStep::Upload, "python3 -m twine upload".to_string(), "previous step failed");
        report.finish(2);

        let build = report.step(ReleaseStep::Build).expect("build recorded");
        assert_eq!(build.status, StepStatus::Failed);
        assert_eq!(build.exit_code, Some(2));
        assert!(report.was_executed(ReleaseStep::Build));
        assert!(!report.was_executed(ReleaseStep::Upload));
        assert!(!report.succeeded());
        assert!(report.summary().contains("1 failed"));
    }

    #[test]
    fn test_successful_upload_and_elapsed() {
        let mut report = report();
        report.record(
            ReleaseStep::Upload,
            "python3 -m twine upload --non-interactive".to_string(),
            chrono::Utc::now(),
            Duration::from_millis(5),
            Ok(()),
        );
        assert!(report.has_succeeded(ReleaseStep::Upload));
        assert!(!report.has_succeeded(ReleaseStep::Build));

        report.finish(0);
        assert!(report.succeeded());
        assert!(report.elapsed() >= chrono::Duration::zero());
    }

    #[test]
    fn test_write_to_produces_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("report.json");
        let mut report = report();
        report.finish(0);
        report.write_to(&path).expect("write report");

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
        assert_eq!(value["package_name"], "pkg");
        assert_eq!(value["policy"], "fail-fast");
        assert_eq!(value["description"], "setup_py");
        assert!(!dir.path().join("report.tmp").exists());
    }
}
