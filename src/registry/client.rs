//! Blocking HTTP client for the hub API.

use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{EntityType, FinalizePayload, PrepareOutcome, Registry, UploadSession, Visibility};
use crate::config::Config;
use crate::error::{HubError, Result};
use crate::session::UserIdentity;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrepareResponse {
    signed_url: String,
    #[serde(default)]
    uri: String,
    entity_id: String,
}

/// Hub API client bound to one base URL and connection key.
#[derive(Debug, Clone)]
pub struct HubClient {
    http: Client,
    base_url: String,
    connection_key: Option<String>,
    debug: bool,
}

impl HubClient {
    pub fn new(
        base_url: impl Into<String>,
        connection_key: Option<String>,
        debug: bool,
        connect_timeout: Duration,
    ) -> Result<Self> {
        // Archives can be large, so only connecting is bounded.
        let http = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(None::<Duration>)
            .user_agent(concat!("skillhub/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HubError::Config(format!("HTTP client error: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            connection_key,
            debug,
        })
    }

    /// Client for the API selected by `debug`, per the loaded config.
    pub fn from_config(config: &Config, connection_key: Option<String>, debug: bool) -> Result<Self> {
        Self::new(
            config.api_base(debug),
            connection_key,
            debug,
            Duration::from_secs(config.hub.connect_timeout_secs),
        )
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.connection_key.as_deref().unwrap_or_default())
    }

    fn transfer_url(&self, session: &UploadSession) -> std::result::Result<Url, String> {
        let mut url = Url::parse(&session.signed_url)
            .map_err(|e| format!("invalid signed URL {}: {e}", session.signed_url))?;
        if self.debug {
            let kept: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(key, _)| key != "uri")
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect();
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            for (key, value) in &kept {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("uri", &session.upload_uri);
        }
        Ok(url)
    }
}

impl Registry for HubClient {
    fn auth_check(&self, connection_key: &str) -> bool {
        let url = self.url("/auth");
        info!(url = %url, "Checking connection key");

        match self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {connection_key}"))
            .send()
        {
            Ok(response) => {
                let status = response.status();
                debug!(status = %status, "Auth check response");
                status.is_success()
            }
            Err(e) => {
                warn!(error = %e, "Auth check failed");
                false
            }
        }
    }

    fn user_info(&self) -> Option<UserIdentity> {
        let url = self.url("/v1/me");
        let response = match self.http.get(&url).header("Authorization", self.bearer()).send() {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "User info request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "User info request rejected");
            return None;
        }

        match response.json::<UserIdentity>() {
            Ok(identity) => {
                debug!(username = ?identity.username, "User info received");
                Some(identity)
            }
            Err(e) => {
                warn!(error = %e, "Invalid user info response");
                None
            }
        }
    }

    fn prepare(&self, entity: EntityType, visibility: Visibility) -> PrepareOutcome {
        let url = self.url(&format!("/v1/{entity}/prepare"));
        info!(url = %url, visibility = %visibility, "Preparing upload");

        let response = match self
            .http
            .post(&url)
            .header("Authorization", self.bearer())
            .json(&serde_json::json!({ "visibility": visibility }))
            .send()
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Prepare request failed");
                return PrepareOutcome::Rejected {
                    error: e.to_string(),
                };
            }
        };

        let outcome = prepare_outcome(response, visibility);
        if let PrepareOutcome::Rejected { error } = &outcome {
            warn!(error = %error, "Prepare rejected");
        }
        outcome
    }

    fn transfer(&self, session: &UploadSession, archive: &Path) -> bool {
        let url = match self.transfer_url(session) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "Cannot build transfer URL");
                return false;
            }
        };
        let bytes = match std::fs::read(archive) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %archive.display(), error = %e, "Cannot read archive");
                return false;
            }
        };

        info!(entity_id = %session.entity_id, bytes = bytes.len(), "Uploading archive");
        match self
            .http
            .put(url)
            .header("Content-Type", "application/zip")
            .body(bytes)
            .send()
        {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    warn!(status = %status, "Archive upload rejected");
                }
                status.is_success()
            }
            Err(e) => {
                warn!(error = %e, "Archive upload failed");
                false
            }
        }
    }

    fn finalize(&self, entity: EntityType, entity_id: &str, payload: &FinalizePayload<'_>) -> bool {
        let url = self.url(&format!("/v1/{entity}/finalize/{entity_id}"));
        info!(url = %url, files = payload.files.len(), "Finalizing upload");

        match self
            .http
            .post(&url)
            .header("Authorization", self.bearer())
            .json(payload)
            .send()
        {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    warn!(status = %status, "Finalize rejected");
                }
                status.is_success()
            }
            Err(e) => {
                warn!(error = %e, "Finalize request failed");
                false
            }
        }
    }
}

fn prepare_outcome(response: Response, visibility: Visibility) -> PrepareOutcome {
    let status = response.status();
    let body = response.text().unwrap_or_default();
    let parsed: Option<Value> = serde_json::from_str(&body).ok();
    let server_message = parsed.as_ref().and_then(|value| {
        value
            .get("error")
            .or_else(|| value.get("message"))
            .and_then(Value::as_str)
            .map(ToString::to_string)
    });

    if !status.is_success() {
        let mut error = format!(
            "{} - {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        );
        if let Some(message) = server_message {
            error.push_str(": ");
            error.push_str(&message);
        }
        return PrepareOutcome::Rejected { error };
    }

    if let Some(error) = parsed
        .as_ref()
        .and_then(|value| value.get("error"))
        .and_then(Value::as_str)
    {
        return PrepareOutcome::Rejected {
            error: error.to_string(),
        };
    }

    match serde_json::from_str::<PrepareResponse>(&body) {
        Ok(prepared) => {
            debug!(entity_id = %prepared.entity_id, "Upload registered");
            PrepareOutcome::Ready(UploadSession {
                entity_id: prepared.entity_id,
                signed_url: prepared.signed_url,
                upload_uri: prepared.uri,
                visibility,
            })
        }
        Err(e) => PrepareOutcome::Rejected {
            error: format!("Invalid prepare response: {e}"),
        },
    }
}
