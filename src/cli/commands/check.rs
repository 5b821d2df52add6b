//! Check command implementation.
//!
//! Reports whether a release could start: package description, interpreter,
//! upload credentials and leftovers in the dist directory. Nothing is changed.

use crate::artifacts::{ArtifactSelector, collect_artifacts};
use crate::cli::{Args, OutputManager};
use crate::credentials;
use crate::error::Result;
use crate::project::PackageDescription;
use crate::runner::resolve_interpreter;
use serde::Serialize;
use std::path::PathBuf;
use std::time::SystemTime;

#[derive(Debug, Serialize)]
struct CheckReport {
    description: PackageDescription,
    interpreter: std::result::Result<PathBuf, String>,
    credentials: std::result::Result<String, String>,
    /// Artifacts currently in the dist directory
    existing_artifacts: Vec<PathBuf>,
    ready: bool,
}

/// Execute check command
pub(super) fn execute_check(args: &Args, output: &OutputManager) -> Result<i32> {
    let settings = args.settings();
    let description = PackageDescription::discover(&settings.project_dir)?;

    let interpreter = resolve_interpreter(&settings.python).map_err(|e| e.to_string());
    let credentials = credentials::detect(settings.config_file.as_deref())
        .map(|source| source.describe())
        .map_err(|e| e.to_string());

    // Every artifact-looking file counts; nothing has been built yet.
    let existing_artifacts = collect_artifacts(
        &settings.dist_path(),
        &ArtifactSelector::ModifiedSince(SystemTime::UNIX_EPOCH),
    )?
    .into_iter()
    .map(|a| a.path)
    .collect();

    let ready = interpreter.is_ok() && credentials.is_ok();
    let report = CheckReport {
        description,
        interpreter,
        credentials,
        existing_artifacts,
        ready,
    };

    if args.options.json {
        super::print_json(&report)?;
    } else {
        print_report(&report, settings.keep_dist, output);
    }

    Ok(if report.ready { 0 } else { 1 })
}

fn print_report(report: &CheckReport, keep_dist: bool, output: &OutputManager) {
    output.section("pyrelease check");

    let meta = &report.description.metadata;
    output.success(&format!(
        "{} found at {}",
        report.description.kind.file_name(),
        report.description.path.display()
    ));
    match (&meta.name, &meta.version) {
        (Some(name), Some(version)) => output.indent(&format!("Package: {} {}", name, version)),
        _ => output.warn(
            "Name or version is computed at build time; artifacts will be selected by build time",
        ),
    }

    match &report.interpreter {
        Ok(path) => output.success(&format!("Interpreter: {}", path.display())),
        Err(reason) => output.error(reason),
    }

    match &report.credentials {
        Ok(source) => output.success(&format!("Upload credentials: {}", source)),
        Err(reason) => output.error(reason),
    }

    if !report.existing_artifacts.is_empty() {
        let action = if keep_dist {
            "kept (--keep-dist); only this build's files will be uploaded"
        } else {
            "removed before the build"
        };
        output.warn(&format!(
            "{} existing artifact(s) in the dist directory will be {}",
            report.existing_artifacts.len(),
            action
        ));
    }

    if report.ready {
        output.success("Ready to release");
    } else {
        output.error("Not ready to release");
    }
}
