//! Persisted hub session
//!
//! The connection key and the identity fetched at login live in a small JSON
//! file so later `upload` runs can authenticate and stamp the manifest's
//! author fields without another round trip.
//!
//! The file is written atomically (temp file + rename) and, on Unix, with
//! 0600 permissions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::error::{HubError, Result};

const SESSION_FILENAME: &str = "session.json";

/// Identity of the logged-in hub user, as returned by `/v1/me`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub author_url: Option<String>,
}

/// Stored session state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub connection_key: Option<String>,
    #[serde(default)]
    pub user_info: Option<UserIdentity>,
}

impl Session {
    #[must_use]
    pub fn new(connection_key: impl Into<String>, user_info: Option<UserIdentity>) -> Self {
        Self {
            connection_key: Some(connection_key.into()),
            user_info,
        }
    }

    /// Connection key, or [`HubError::NotLoggedIn`] when there is none.
    pub fn require_key(&self) -> Result<&str> {
        self.connection_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(HubError::NotLoggedIn)
    }

    /// Identity used to fill the manifest's author fields.
    #[must_use]
    pub fn identity(&self) -> UserIdentity {
        self.user_info.clone().unwrap_or_default()
    }
}

/// File-backed session storage.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the configured path, or `<config_dir>/skillhub/session.json`.
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        if let Some(path) = &config.file {
            return Ok(Self::new(path));
        }
        let dir = dirs::config_dir()
            .ok_or_else(|| HubError::Config("Could not find config directory".to_string()))?;
        Ok(Self::new(dir.join("skillhub").join(SESSION_FILENAME)))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the session; a missing file is an empty session.
    pub fn load(&self) -> Result<Session> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No session file");
            return Ok(Session::default());
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            let mode = fs::metadata(&self.path)?.mode() & 0o777;
            if mode != 0o600 {
                warn!(
                    path = %self.path.display(),
                    mode = format!("{:o}", mode),
                    "Session file has insecure permissions"
                );
            }
        }

        let json = fs::read_to_string(&self.path)?;
        serde_json::from_str(&json)
            .map_err(|e| HubError::Config(format!("Invalid session file {}: {e}", self.path.display())))
    }

    /// Raw JSON contents, for display.
    pub fn load_raw(&self) -> Result<Option<serde_json::Value>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string_pretty(session)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| HubError::Config(format!("Failed to create config dir: {e}")))?;
        }

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600))?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            HubError::Config(format!("Failed to save session: {e}"))
        })?;

        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    /// Remove the session file. Missing file is fine.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            debug!(path = %self.path.display(), "Session cleared");
        }
        Ok(())
    }
}
