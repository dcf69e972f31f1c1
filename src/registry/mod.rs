//! Hub registry protocol
//!
//! Uploads go through three calls: `prepare` registers the entity and hands
//! back a signed URL, `transfer` PUTs the archive to that URL, and `finalize`
//! publishes the file metadata. Each phase reports success as a plain
//! outcome; failures are logged here and turned into errors by the caller.

mod client;

use std::fmt;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::session::UserIdentity;
use crate::skill::FileRecord;

pub use client::HubClient;

/// Kinds of entity the hub accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityType {
    AgentSkill,
}

impl EntityType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AgentSkill => "agent-skill",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible to every hub user.
    Public,
    /// Visible to you and the teams you share it with.
    Private,
}

impl Visibility {
    pub const CHOICES: &'static [&'static str] = &["public", "private"];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }

    #[must_use]
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice {
            "public" => Some(Self::Public),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle returned by `prepare`, valid for one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    pub entity_id: String,
    pub signed_url: String,
    pub upload_uri: String,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrepareOutcome {
    Ready(UploadSession),
    Rejected { error: String },
}

/// Body of the finalize call.
#[derive(Debug, Clone, Serialize)]
pub struct FinalizePayload<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub files: &'a [FileRecord],
}

/// Operations the upload flow needs from the hub.
pub trait Registry {
    /// Whether `connection_key` is accepted by the hub.
    fn auth_check(&self, connection_key: &str) -> bool;

    /// Identity behind the client's connection key.
    fn user_info(&self) -> Option<UserIdentity>;

    fn prepare(&self, entity: EntityType, visibility: Visibility) -> PrepareOutcome;

    /// Upload the archive to the session's signed URL.
    fn transfer(&self, session: &UploadSession, archive: &Path) -> bool;

    fn finalize(&self, entity: EntityType, entity_id: &str, payload: &FinalizePayload<'_>) -> bool;
}
