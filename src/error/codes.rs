//! Machine-readable error codes for `--robot` output.
//!
//! The hundreds digit names the area: 1 skill folder, 3 local config and
//! session, 5 hub calls, 6 local storage, 8 validation and user input,
//! 9 local I/O.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Required files missing or manifest unusable.
    SkillInvalid,
    /// `handler.js` or `plugin.json` failed to parse.
    SkillParseError,

    ConfigInvalid,
    /// No stored connection key.
    SessionMissing,

    NetworkAuthFailed,
    /// `prepare` refused the upload.
    RegistryRejected,
    /// Archive PUT or `finalize` failed.
    TransferFailed,

    StorageWriteError,
    SerializationError,
    ArchiveError,

    ValidationFailed,
    /// A prompt was declined or interrupted.
    UserAborted,

    IoError,
}

impl ErrorCode {
    pub const ALL: [Self; 13] = [
        Self::SkillInvalid,
        Self::SkillParseError,
        Self::ConfigInvalid,
        Self::SessionMissing,
        Self::NetworkAuthFailed,
        Self::RegistryRejected,
        Self::TransferFailed,
        Self::StorageWriteError,
        Self::SerializationError,
        Self::ArchiveError,
        Self::ValidationFailed,
        Self::UserAborted,
        Self::IoError,
    ];

    #[must_use]
    pub const fn numeric(&self) -> u16 {
        match self {
            Self::SkillInvalid => 102,
            Self::SkillParseError => 103,
            Self::ConfigInvalid => 302,
            Self::SessionMissing => 305,
            Self::NetworkAuthFailed => 503,
            Self::RegistryRejected => 504,
            Self::TransferFailed => 505,
            Self::StorageWriteError => 602,
            Self::SerializationError => 605,
            Self::ArchiveError => 606,
            Self::ValidationFailed => 801,
            Self::UserAborted => 806,
            Self::IoError => 906,
        }
    }

    /// What the user can do about it.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::SkillInvalid => {
                "Make sure the folder contains handler.js and plugin.json. Run `skillhub init` for a working template"
            }
            Self::SkillParseError => "Fix the syntax error reported above and run the upload again",
            Self::ConfigInvalid => {
                "Check TOML syntax in the config file, or unset SKILLHUB_* environment overrides"
            }
            Self::SessionMissing => "Run `skillhub login` with a hub connection key first",
            Self::NetworkAuthFailed => {
                "Your connection key may have been revoked. Run `skillhub login` again"
            }
            Self::RegistryRejected => {
                "The hub refused the registration. Check your account limits and try again"
            }
            Self::TransferFailed => {
                "The upload did not complete. Nothing was published; retry the upload"
            }
            Self::StorageWriteError | Self::ArchiveError => {
                "Check disk space and write permissions on the staging directory"
            }
            Self::SerializationError => "A hub response or local file was not valid JSON",
            Self::ValidationFailed => {
                "Review the validation message and fix plugin.json or the skill folder"
            }
            Self::UserAborted => "Run the command again when you are ready to continue",
            Self::IoError => "Check file permissions and that the paths involved exist",
        }
    }

    /// A malformed hub response or local file needs a code change, not a retry.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::SerializationError)
    }

    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::SkillInvalid | Self::SkillParseError => "skill",
            Self::ConfigInvalid | Self::SessionMissing => "config",
            Self::NetworkAuthFailed | Self::RegistryRejected | Self::TransferFailed => "network",
            Self::StorageWriteError | Self::SerializationError | Self::ArchiveError => "storage",
            Self::ValidationFailed | Self::UserAborted => "validation",
            Self::IoError => "internal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.numeric())
    }
}
