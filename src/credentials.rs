//! Upload credential detection.
//!
//! twine reads the secrets itself; this module only decides whether any
//! source exists so a release never reaches the upload step without one.

use crate::error::{CredentialsError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Environment variable holding the upload password or API token
pub const PASSWORD_ENV: &str = "TWINE_PASSWORD";

/// Environment variable holding the upload user name
pub const USERNAME_ENV: &str = "TWINE_USERNAME";

/// User name twine expects for API tokens
pub const TOKEN_USERNAME: &str = "__token__";

/// Where the upload credentials come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum CredentialSource {
    /// `TWINE_PASSWORD` (and optionally `TWINE_USERNAME`)
    Environment {
        /// User name twine will send
        username: String,
    },
    /// A .pypirc file
    Pypirc {
        /// Location of the file
        path: PathBuf,
    },
}

impl CredentialSource {
    /// Human-readable description that never includes the secret
    pub fn describe(&self) -> String {
        match self {
            CredentialSource::Environment { username } => {
                format!("{} (user {})", PASSWORD_ENV, username)
            }
            CredentialSource::Pypirc { path } => path.display().to_string(),
        }
    }
}

/// Detect credentials from the process environment and home directory
pub fn detect(config_file: Option<&Path>) -> Result<CredentialSource> {
    detect_from(
        |key| std::env::var(key).ok(),
        config_file,
        dirs::home_dir().as_deref(),
    )
}

/// Detection with injectable environment lookup and home directory
pub fn detect_from<F>(
    env: F,
    config_file: Option<&Path>,
    home: Option<&Path>,
) -> Result<CredentialSource>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(password) = env(PASSWORD_ENV) {
        if password.trim().is_empty() {
            return Err(CredentialsError::EmptyPassword.into());
        }
        let username = env(USERNAME_ENV)
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| TOKEN_USERNAME.to_string());
        return Ok(CredentialSource::Environment { username });
    }

    if let Some(path) = config_file {
        if path.is_file() {
            return Ok(CredentialSource::Pypirc {
                path: path.to_path_buf(),
            });
        }
        return Err(CredentialsError::ConfigFileMissing {
            path: path.to_path_buf(),
        }
        .into());
    }

    if let Some(pypirc) = home.map(|h| h.join(".pypirc")).filter(|p| p.is_file()) {
        return Ok(CredentialSource::Pypirc { path: pypirc });
    }

    Err(CredentialsError::Missing.into())
}
