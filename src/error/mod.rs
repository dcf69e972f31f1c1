//! Errors for every skillhub operation.
//!
//! [`HubError`] is what functions return; [`StructuredError`] is the robot
//! mode rendering with an [`ErrorCode`], suggestion and context.

mod codes;

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use codes::ErrorCode;

/// Main error type for skillhub operations.
#[derive(Error, Debug)]
pub enum HubError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("{0}")]
    SkillInvalid(String),

    #[error("{0}")]
    ValidationFailed(String),

    #[error("Error parsing {file}: {message}")]
    Parse { file: String, message: String },

    #[error("{0}")]
    UserAbort(String),

    #[error("{0}")]
    Auth(String),

    #[error("No connection key found - you will need to login first to push to the hub")]
    NotLoggedIn,

    #[error("{0}")]
    Registry(String),

    #[error("{0}")]
    Transfer(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{context}: {source}")]
    Phase {
        context: String,
        #[source]
        source: Box<HubError>,
    },
}

impl HubError {
    /// Wrap this error with orchestrator phase context.
    #[must_use]
    pub fn in_phase(self, context: impl Into<String>) -> Self {
        Self::Phase {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping phase wrappers.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Phase { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether this error is a deliberate stop by the user.
    #[must_use]
    pub fn is_user_abort(&self) -> bool {
        matches!(self.root(), Self::UserAbort(_))
    }

    /// Code of the innermost error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Io(err) if err.kind() == io::ErrorKind::StorageFull => {
                ErrorCode::StorageWriteError
            }
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::SerializationError,
            Self::Archive(_) => ErrorCode::ArchiveError,
            Self::SkillInvalid(_) => ErrorCode::SkillInvalid,
            Self::ValidationFailed(_) => ErrorCode::ValidationFailed,
            Self::Parse { .. } => ErrorCode::SkillParseError,
            Self::UserAbort(_) => ErrorCode::UserAborted,
            Self::Auth(_) => ErrorCode::NetworkAuthFailed,
            Self::NotLoggedIn => ErrorCode::SessionMissing,
            Self::Registry(_) => ErrorCode::RegistryRejected,
            Self::Transfer(_) => ErrorCode::TransferFailed,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::Phase { source, .. } => source.code(),
        }
    }

    /// Extra robot-mode detail for parse and phase errors.
    #[must_use]
    pub fn context(&self) -> Option<Value> {
        match self {
            Self::Parse { file, message } => {
                Some(serde_json::json!({ "file": file, "parser_message": message }))
            }
            Self::Phase { context, source } => Some(serde_json::json!({
                "phase": context,
                "cause": source.to_string(),
            })),
            _ => None,
        }
    }

    /// Convert this error to a structured error.
    #[must_use]
    pub fn to_structured(&self) -> StructuredError {
        StructuredError::from_hub_error(self)
    }
}

/// Emitted on stdout in robot mode so scripts can react to failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    pub code: ErrorCode,
    pub numeric_code: u16,
    pub message: String,
    pub suggestion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    pub recoverable: bool,
    /// "skill", "config", "network", ...
    pub category: String,
}

impl StructuredError {
    #[must_use]
    pub fn from_hub_error(err: &HubError) -> Self {
        let code = err.code();
        Self {
            code,
            numeric_code: code.numeric(),
            message: err.to_string(),
            suggestion: code.suggestion().to_string(),
            context: err.context(),
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
        }
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<&HubError> for StructuredError {
    fn from(err: &HubError) -> Self {
        Self::from_hub_error(err)
    }
}

pub type Result<T> = std::result::Result<T, HubError>;
