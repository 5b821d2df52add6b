//! Release command implementation.
//!
//! Discovers the package description, resolves the interpreter, then hands the
//! six steps to the orchestrator.

use crate::cli::{Args, OutputManager};
use crate::error::Result;
use crate::orchestrator::Orchestrator;
use crate::project::PackageDescription;
use crate::runner::{ProcessRunner, resolve_interpreter};
use crate::steps::ReleaseStep;

use super::print_json;

/// Execute release command
pub(super) async fn execute_release(args: &Args, output: &OutputManager) -> Result<i32> {
    let mut settings = args.settings();
    let description = PackageDescription::discover(&settings.project_dir)?;
    let interpreter = resolve_interpreter(&settings.python)?;
    // Steps run inside the project directory; a relative --python must not be
    // looked up again from there.
    settings.python = interpreter.display().to_string();

    output.section("pyrelease");
    output.info(&format!(
        "Package: {} {}",
        description.metadata.name.as_deref().unwrap_or("<dynamic name>"),
        description.metadata.version.as_deref().unwrap_or("<dynamic version>")
    ));
    output.indent(&format!("Description: {}", description.path.display()));
    output.indent(&format!("Interpreter: {}", interpreter.display()));
    output.indent(&format!("Dist directory: {}", settings.dist_path().display()));

    let runner = if args.options.json {
        ProcessRunner::stdout_to_stderr()
    } else {
        ProcessRunner::default()
    };
    let orchestrator =
        Orchestrator::new(runner, settings, description).with_output(output.clone());
    let outcome = orchestrator.run().await;

    if let Some(path) = &args.options.report {
        outcome.report.write_to(path)?;
        log::info!("Wrote run report to {}", path.display());
    }

    let report = &outcome.report;
    let elapsed = report.elapsed().num_milliseconds() as f64 / 1000.0;
    if args.options.json {
        print_json(report)?;
    } else if report.succeeded() && report.has_succeeded(ReleaseStep::Upload) {
        output.success(&format!(
            "Release complete in {:.1}s: {}",
            elapsed,
            report.summary()
        ));
    } else {
        output.warn(&format!("{} ({:.1}s)", report.summary(), elapsed));
        if !report.was_executed(ReleaseStep::Upload) {
            output.warn("Nothing was uploaded");
        }
    }

    if let Some(failure) = &outcome.failure {
        let suggestions = failure.recovery_suggestions();
        if !suggestions.is_empty() && !output.is_quiet() {
            output.println("\n💡 Recovery suggestions:");
            for suggestion in suggestions {
                output.indent(&format!("• {}", suggestion));
            }
        }
    }

    Ok(outcome.exit_code())
}
