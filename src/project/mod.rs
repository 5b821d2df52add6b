//! Package description discovery (setup.py or pyproject.toml) and metadata extraction.

use crate::error::{ProjectError, Result};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Kind of package description file driving the build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionKind {
    /// Classic setuptools script
    SetupPy,
    /// PEP 517 project built with `python -m build`
    Pyproject,
}

impl DescriptionKind {
    /// File name of the description
    pub fn file_name(self) -> &'static str {
        match self {
            DescriptionKind::SetupPy => "setup.py",
            DescriptionKind::Pyproject => "pyproject.toml",
        }
    }
}

/// Name and version as far as they can be read statically
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageMetadata {
    /// Distribution name as written in the description
    pub name: Option<String>,
    /// Version string as written in the description
    pub version: Option<String>,
}

impl PackageMetadata {
    /// `name-version` prefix shared by the sdist and wheel file names
    pub fn artifact_stem(&self) -> Option<String> {
        match (&self.name, &self.version) {
            (Some(name), Some(version)) => Some(format!("{}-{}", normalize_name(name), version)),
            _ => None,
        }
    }
}

/// The package description found in a project directory
#[derive(Debug, Clone, Serialize)]
pub struct PackageDescription {
    /// Which file drives the build
    pub kind: DescriptionKind,
    /// Path to that file
    pub path: PathBuf,
    /// Statically known name and version
    pub metadata: PackageMetadata,
}

impl PackageDescription {
    /// Locate the package description in `dir`
    ///
    /// `setup.py` wins when both files are present.
    pub fn discover(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(ProjectError::DirectoryNotFound {
                path: dir.to_path_buf(),
            }
            .into());
        }

        let setup_py = dir.join(DescriptionKind::SetupPy.file_name());
        if setup_py.is_file() {
            let content = std::fs::read_to_string(&setup_py)?;
            let metadata = parse_setup_py(&content);
            log::debug!("Found setup.py at {} ({:?})", setup_py.display(), metadata);
            return Ok(Self {
                kind: DescriptionKind::SetupPy,
                path: setup_py,
                metadata,
            });
        }

        let pyproject = dir.join(DescriptionKind::Pyproject.file_name());
        if pyproject.is_file() {
            let content = std::fs::read_to_string(&pyproject)?;
            let metadata = parse_pyproject(&content).map_err(|reason| {
                ProjectError::InvalidPyproject {
                    path: pyproject.clone(),
                    reason,
                }
            })?;
            log::debug!(
                "Found pyproject.toml at {} ({:?})",
                pyproject.display(),
                metadata
            );
            return Ok(Self {
                kind: DescriptionKind::Pyproject,
                path: pyproject,
                metadata,
            });
        }

        Err(ProjectError::DescriptionNotFound {
            dir: dir.to_path_buf(),
        }
        .into())
    }
}

/// Extract literal `name=` and `version=` keyword arguments from a setup.py
///
/// Computed values (e.g. `version=get_version()`) are left unknown.
pub fn parse_setup_py(content: &str) -> PackageMetadata {
    static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?:^|[(,\s])name\s*=\s*["']([^"']+)["']"#).expect("name regex is valid")
    });
    static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?:^|[(,\s])version\s*=\s*["']([^"']+)["']"#).expect("version regex is valid")
    });

    PackageMetadata {
        name: NAME_RE.captures(content).map(|c| c[1].trim().to_string()),
        version: VERSION_RE.captures(content).map(|c| c[1].trim().to_string()),
    }
}

/// Read `[project].name` and `[project].version` from a pyproject.toml
pub fn parse_pyproject(content: &str) -> std::result::Result<PackageMetadata, String> {
    let doc: toml::Table = toml::from_str(content).map_err(|e| e.to_string())?;
    let project = doc.get("project").and_then(|v| v.as_table());
    let field = |key: &str| {
        project
            .and_then(|p| p.get(key))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };
    Ok(PackageMetadata {
        name: field("name"),
        version: field("version"),
    })
}

/// Normalize a distribution name the way wheel file names spell it
///
/// Lowercases and collapses runs of `-`, `_` and `.` into a single `_`.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_separator = false;
    for ch in name.chars() {
        if matches!(ch, '-' | '_' | '.') {
            if !in_separator {
                out.push('_');
            }
            in_separator = true;
        } else {
            out.extend(ch.to_lowercase());
            in_separator = false;
        }
    }
    out
}
