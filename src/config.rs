use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HubError, Result};

pub const PROD_API_URL: &str = "https://hub.external.anythingllm.com";
pub const DEV_API_URL: &str = "http://127.0.0.1:5001/anythingllm-hub/us-central1/external";
pub const WEB_URL: &str = "https://hub.anythingllm.com";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub hub: HubConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("SKILLHUB_CONFIG").ok().map(PathBuf::from));

        let patch = match explicit {
            Some(path) => Self::load_patch(&path)?,
            None => Self::load_global()?,
        };
        if let Some(patch) = patch {
            config.merge_patch(patch);
        }

        config.apply_env_overrides()?;

        Ok(config)
    }

    /// Base URL for API calls, selected by the debug switch.
    #[must_use]
    pub fn api_base(&self, debug: bool) -> &str {
        if debug {
            &self.hub.dev_api_url
        } else {
            &self.hub.api_url
        }
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("skillhub/config.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| HubError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| HubError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.hub {
            self.hub.merge(patch);
        }
        if let Some(patch) = patch.upload {
            self.upload.merge(patch);
        }
        if let Some(patch) = patch.session {
            self.session.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = env_string("SKILLHUB_API_URL") {
            self.hub.api_url = value;
        }
        if let Some(value) = env_string("SKILLHUB_DEV_API_URL") {
            self.hub.dev_api_url = value;
        }
        if let Some(value) = env_string("SKILLHUB_WEB_URL") {
            self.hub.web_url = value;
        }
        if let Some(value) = env_u64("SKILLHUB_CONNECT_TIMEOUT_SECS")? {
            self.hub.connect_timeout_secs = value;
        }
        if let Some(value) = env_string("SKILLHUB_STAGING_DIR") {
            self.upload.staging_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = env_string("SKILLHUB_SESSION_FILE") {
            self.session.file = Some(PathBuf::from(value));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub dev_api_url: String,
    #[serde(default)]
    pub web_url: String,
    #[serde(default)]
    pub connect_timeout_secs: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            api_url: PROD_API_URL.to_string(),
            dev_api_url: DEV_API_URL.to_string(),
            web_url: WEB_URL.to_string(),
            connect_timeout_secs: 30,
        }
    }
}

impl HubConfig {
    fn merge(&mut self, patch: HubPatch) {
        if let Some(value) = patch.api_url {
            self.api_url = value;
        }
        if let Some(value) = patch.dev_api_url {
            self.dev_api_url = value;
        }
        if let Some(value) = patch.web_url {
            self.web_url = value;
        }
        if let Some(value) = patch.connect_timeout_secs {
            self.connect_timeout_secs = value;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Parent of the per-upload build directory and archive.
    /// Defaults to the system temp directory.
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,
}

impl UploadConfig {
    #[must_use]
    pub fn staging_root(&self) -> PathBuf {
        self.staging_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    fn merge(&mut self, patch: UploadPatch) {
        if let Some(value) = patch.staging_dir {
            self.staging_dir = Some(value);
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl SessionConfig {
    fn merge(&mut self, patch: SessionPatch) {
        if let Some(value) = patch.file {
            self.file = Some(value);
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    hub: Option<HubPatch>,
    upload: Option<UploadPatch>,
    session: Option<SessionPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct HubPatch {
    api_url: Option<String>,
    dev_api_url: Option<String>,
    web_url: Option<String>,
    connect_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct UploadPatch {
    staging_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionPatch {
    file: Option<PathBuf>,
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_u64(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(value) => value.parse::<u64>().map(Some).map_err(|err| {
            HubError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        Err(_) => Ok(None),
    }
}
