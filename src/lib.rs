//! # pyrelease
//!
//! Release orchestration for Python packages.
//!
//! A release is six external commands run strictly in order through one
//! interpreter: install and upgrade `setuptools` and `wheel`, install and
//! upgrade `twine`, build a source archive and a wheel, upload them.
//!
//! ## Guarantees
//!
//! - **Ordering**: the build never starts before the tooling steps finish, and
//!   the upload never starts before the build finishes.
//! - **Fail-fast by default**: the first failing step stops the run.
//! - **No stale uploads**: only the artifacts produced by the current build are
//!   passed to the upload tool.
//! - **No silent credential failure**: missing credentials fail the run before
//!   the upload tool is invoked.
//!
//! ## Usage
//!
//! ```bash
//! pyrelease                         # release the package in the current directory
//! pyrelease plan                    # print the six commands
//! pyrelease check                   # verify readiness without changing anything
//! pyrelease --policy continue       # run every step even after a failure
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod artifacts;
pub mod cli;
pub mod credentials;
pub mod error;
pub mod orchestrator;
pub mod project;
pub mod report;
pub mod runner;
pub mod settings;
pub mod steps;

pub use artifacts::{Artifact, ArtifactKind, ArtifactSelector};
pub use cli::Args;
pub use credentials::CredentialSource;
pub use error::{ReleaseError, Result};
pub use orchestrator::{Orchestrator, RunOutcome};
pub use project::{DescriptionKind, PackageDescription, PackageMetadata};
pub use report::{RunReport, StepRecord, StepStatus};
pub use runner::{CommandOutcome, CommandRunner, ProcessRunner};
pub use settings::{FailurePolicy, Settings};
pub use steps::{Invocation, ReleasePlan, ReleaseStep};
