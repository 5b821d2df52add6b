//! Distribution directory handling: stale artifact cleanup, collection and verification.

use crate::error::{ArtifactError, Result};
use crate::project::normalize_name;
use pep440_rs::Version;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, SystemTime};

/// Slack for filesystems with coarse modification timestamps
const MTIME_TOLERANCE: Duration = Duration::from_secs(2);

/// Kind of distribution artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// `.tar.gz` or `.zip` source distribution
    SourceArchive,
    /// `.whl` built distribution
    Wheel,
}

impl ArtifactKind {
    /// Classify a file by its name
    pub fn classify(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".whl") {
            Some(ArtifactKind::Wheel)
        } else if name.ends_with(".tar.gz") || name.ends_with(".zip") {
            Some(ArtifactKind::SourceArchive)
        } else {
            None
        }
    }
}

/// A distribution file produced by the build step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// Source archive or wheel
    pub kind: ArtifactKind,
    /// Location inside the dist directory
    pub path: PathBuf,
    /// File size
    pub size_bytes: u64,
    /// Lowercase hex SHA-256 digest
    pub sha256: String,
}

impl Artifact {
    fn from_path(path: PathBuf, kind: ArtifactKind) -> Result<Self> {
        let size_bytes = fs::metadata(&path)?.len();
        let sha256 = compute_sha256(&path)?;
        Ok(Self {
            kind,
            path,
            size_bytes,
            sha256,
        })
    }

    /// File name for display
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// How artifacts of the current build are told apart from anything else in the directory
#[derive(Debug, Clone)]
pub enum ArtifactSelector {
    /// File names must carry this normalized name and an equal PEP 440 version
    Release {
        /// Normalized distribution name
        name: String,
        /// Declared version
        version: Version,
    },
    /// Files must have been written at or after this instant
    ModifiedSince(SystemTime),
}

impl ArtifactSelector {
    /// Selector for a known `name` and `version`
    ///
    /// Returns `None` when `version` is not a valid PEP 440 version; build
    /// tools rewrite such versions unpredictably, so the caller has to fall
    /// back to [`ArtifactSelector::ModifiedSince`].
    pub fn release(name: &str, version: &str) -> Option<Self> {
        match Version::from_str(version.trim()) {
            Ok(version) => Some(ArtifactSelector::Release {
                name: normalize_name(name),
                version,
            }),
            Err(e) => {
                log::warn!(
                    "Version '{}' is not PEP 440 ({}); selecting artifacts by build time",
                    version,
                    e
                );
                None
            }
        }
    }

    fn matches(&self, path: &Path, kind: ArtifactKind) -> Result<bool> {
        match self {
            ArtifactSelector::Release { name, version } => {
                Ok(split_file_name(path, kind).is_some_and(|(file_name, file_version)| {
                    normalize_name(&file_name) == *name
                        && Version::from_str(&file_version).is_ok_and(|v| v == *version)
                }))
            }
            ArtifactSelector::ModifiedSince(since) => {
                let modified = fs::metadata(path)?.modified()?;
                let threshold = since.checked_sub(MTIME_TOLERANCE).unwrap_or(*since);
                Ok(modified >= threshold)
            }
        }
    }
}

/// Split an artifact file name into distribution name and version
fn split_file_name(path: &Path, kind: ArtifactKind) -> Option<(String, String)> {
    let file_name = path.file_name()?.to_str()?;
    match kind {
        ArtifactKind::Wheel => {
            let mut parts = file_name.splitn(3, '-');
            let name = parts.next()?;
            let version = parts.next()?;
            parts.next()?;
            Some((name.to_string(), version.to_string()))
        }
        ArtifactKind::SourceArchive => {
            let lower = file_name.to_ascii_lowercase();
            let stem_len = if lower.ends_with(".tar.gz") {
                file_name.len() - ".tar.gz".len()
            } else {
                file_name.len() - ".zip".len()
            };
            let (name, version) = file_name[..stem_len].rsplit_once('-')?;
            Some((name.to_string(), version.to_string()))
        }
    }
}

/// List every artifact-looking file directly inside `dir`
fn artifact_candidates(dir: &Path) -> Result<Vec<(PathBuf, ArtifactKind)>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    // Escape the directory so bracket characters in it stay literal.
    let pattern = format!("{}/*", glob::Pattern::escape(&dir.to_string_lossy()));

    let entries = glob::glob(&pattern).map_err(|e| ArtifactError::InvalidPattern {
        pattern: pattern.clone(),
        reason: e.to_string(),
    })?;

    let mut candidates = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| io::Error::other(e.to_string()))?;
        if !path.is_file() {
            continue;
        }
        if let Some(kind) = ArtifactKind::classify(&path) {
            candidates.push((path, kind));
        }
    }
    candidates.sort();
    Ok(candidates)
}

/// Remove stale distribution files from `dir`
///
/// Only `.tar.gz`, `.zip` and `.whl` files are touched. Returns the removed paths.
pub fn clean_dist_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for (path, _) in artifact_candidates(dir)? {
        fs::remove_file(&path).map_err(|e| ArtifactError::CleanFailed {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        log::debug!("Removed stale artifact {}", path.display());
        removed.push(path);
    }
    Ok(removed)
}

/// Collect the artifacts in `dir` that belong to the current build
pub fn collect_artifacts(dir: &Path, selector: &ArtifactSelector) -> Result<Vec<Artifact>> {
    let mut artifacts = Vec::new();
    for (path, kind) in artifact_candidates(dir)? {
        if selector.matches(&path, kind)? {
            artifacts.push(Artifact::from_path(path, kind)?);
        } else {
            log::info!("Ignoring unrelated artifact {}", path.display());
        }
    }
    Ok(artifacts)
}

/// Require exactly one source archive and exactly one wheel
pub fn verify_release_set(dir: &Path, artifacts: &[Artifact]) -> Result<()> {
    let sdists = artifacts
        .iter()
        .filter(|a| a.kind == ArtifactKind::SourceArchive)
        .count();
    let wheels = artifacts
        .iter()
        .filter(|a| a.kind == ArtifactKind::Wheel)
        .count();

    if sdists != 1 || wheels != 1 {
        return Err(ArtifactError::UnexpectedSet {
            dir: dir.to_path_buf(),
            sdists,
            wheels,
        }
        .into());
    }
    Ok(())
}

/// SHA-256 of a file as lowercase hex
pub fn compute_sha256(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, name.as_bytes()).expect("write artifact");
        path
    }

    fn age(path: &Path, secs: u64) {
        let file = fs::File::options()
            .write(true)
            .open(path)
            .expect("open artifact");
        file.set_modified(SystemTime::now() - Duration::from_secs(secs))
            .expect("set mtime");
    }

    fn release(name: &str, version: &str) -> ArtifactSelector {
        ArtifactSelector::release(name, version).expect("pep 440 version")
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            ArtifactKind::classify(Path::new("pkg-1.0.tar.gz")),
            Some(ArtifactKind::SourceArchive)
        );
        assert_eq!(
            ArtifactKind::classify(Path::new("pkg-1.0.zip")),
            Some(ArtifactKind::SourceArchive)
        );
        assert_eq!(
            ArtifactKind::classify(Path::new("pkg-1.0-py3-none-any.whl")),
            Some(ArtifactKind::Wheel)
        );
        assert_eq!(ArtifactKind::classify(Path::new("README.md")), None);
    }

    #[test]
    fn test_clean_dist_dir_keeps_other_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "old-0.9.tar.gz");
        touch(dir.path(), "old-0.9-py3-none-any.whl");
        let notes = touch(dir.path(), "NOTES.txt");

        let removed = clean_dist_dir(dir.path()).expect("clean");
        assert_eq!(removed.len(), 2);
        assert!(notes.exists());
        assert!(!dir.path().join("old-0.9.tar.gz").exists());
    }

    #[test]
    fn test_clean_missing_dir_is_noop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let removed = clean_dist_dir(&dir.path().join("dist")).expect("clean");
        assert!(removed.is_empty());
    }

    #[test]
    fn test_collect_by_release_ignores_stale_versions() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "tableau_utilities-2.2.13.tar.gz");
        touch(dir.path(), "tableau_utilities-2.2.13-py3-none-any.whl");
        touch(dir.path(), "tableau-utilities-2.2.14.tar.gz");
        touch(dir.path(), "tableau_utilities-2.2.14-py3-none-any.whl");

        let selector = release("tableau_utilities", "2.2.14");
        let artifacts = collect_artifacts(dir.path(), &selector).expect("collect");
        let names: Vec<String> = artifacts.iter().map(Artifact::file_name).collect();
        assert_eq!(
            names,
            vec![
                "tableau-utilities-2.2.14.tar.gz",
                "tableau_utilities-2.2.14-py3-none-any.whl"
            ]
        );
        verify_release_set(dir.path(), &artifacts).expect("one of each");
    }

    #[test]
    fn test_collect_by_mtime_ignores_old_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let stale = touch(dir.path(), "pkg-0.1.tar.gz");
        age(&stale, 3600);
        touch(dir.path(), "pkg-0.2.tar.gz");

        let selector = ArtifactSelector::ModifiedSince(SystemTime::now() - Duration::from_secs(60));
        let artifacts = collect_artifacts(dir.path(), &selector).expect("collect");
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].file_name(), "pkg-0.2.tar.gz");
    }

    #[test]
    fn test_verify_rejects_missing_wheel() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "pkg-1.0.tar.gz");
        let artifacts =
            collect_artifacts(dir.path(), &release("pkg", "1.0")).expect("collect");
        let err = verify_release_set(dir.path(), &artifacts).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ReleaseError::Artifact(ArtifactError::UnexpectedSet {
                sdists: 1,
                wheels: 0,
                ..
            })
        ));
    }

    #[test]
    fn test_collect_matches_normalized_prerelease_version() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "pkg-1.0.0rc1.tar.gz");
        touch(dir.path(), "pkg-1.0.0rc1-py3-none-any.whl");
        touch(dir.path(), "pkg-1.0.0-py3-none-any.whl");

        let artifacts = collect_artifacts(dir.path(), &release("pkg", "1.0.0-rc1")).expect("collect");
        assert_eq!(artifacts.len(), 2);
        verify_release_set(dir.path(), &artifacts).expect("one of each");
    }

    #[test]
    fn test_collect_matches_other_spellings() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "pkg-1.0a0.tar.gz");
        touch(dir.path(), "pkg-1.0a0-py3-none-any.whl");
        let artifacts = collect_artifacts(dir.path(), &release("pkg", "1.0-alpha")).expect("collect");
        assert_eq!(artifacts.len(), 2);

        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "pkg-1.0.tar.gz");
        let artifacts = collect_artifacts(dir.path(), &release("pkg", "v1.0")).expect("collect");
        assert_eq!(artifacts.len(), 1);
    }

    #[test]
    fn test_release_selector_rejects_non_pep440_version() {
        assert!(ArtifactSelector::release("pkg", "not a version").is_none());
    }

    #[test]
    fn test_sha256_digest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("empty.whl");
        fs::write(&path, b"").expect("write");
        assert_eq!(
            compute_sha256(&path).expect("digest"),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
