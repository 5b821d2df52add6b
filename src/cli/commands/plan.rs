//! Plan command implementation.
//!
//! Shows the six commands a release would run, without running anything.

use crate::cli::{Args, OutputManager};
use crate::error::Result;
use crate::project::PackageDescription;
use crate::steps::{ReleasePlan, ReleaseStep};
use serde::Serialize;

use super::print_json;

#[derive(Serialize)]
struct PlannedStep<'a> {
    number: usize,
    step: ReleaseStep,
    command: String,
    cwd: &'a std::path::Path,
    skipped: bool,
}

/// Execute plan command
pub(super) fn execute_plan(args: &Args, output: &OutputManager) -> Result<i32> {
    let settings = args.settings();
    let description = PackageDescription::discover(&settings.project_dir)?;
    let plan = ReleasePlan::new(&settings, &description);

    let steps: Vec<PlannedStep<'_>> = plan
        .steps()
        .map(|(step, invocation)| PlannedStep {
            number: step.number(),
            step,
            command: match step {
                ReleaseStep::Upload => format!("{} <artifacts from build>", invocation),
                _ => invocation.to_string(),
            },
            cwd: &invocation.cwd,
            skipped: step.is_tooling() && settings.skip_tooling,
        })
        .collect();

    if args.options.json {
        print_json(&steps)?;
        return Ok(0);
    }

    output.section(&format!("Release plan ({})", description.kind.file_name()));
    if !settings.keep_dist {
        output.indent(&format!(
            "Stale artifacts in {} are removed before the build",
            settings.dist_path().display()
        ));
    }
    for planned in &steps {
        let marker = if planned.skipped { " (skipped)" } else { "" };
        output.println(&format!(
            "{}. {}{}\n       {}",
            planned.number, planned.step, marker, planned.command
        ));
    }

    Ok(0)
}
