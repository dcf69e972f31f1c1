//! `plugin.json` normalization
//!
//! The manifest is rebuilt field by field from [`MANIFEST_SCHEMA`], in order.
//! Each field has a rule that decides its value from the raw file, the
//! logged-in identity, or an interactive prompt. Keys not in the schema are
//! dropped; the author fields always come from the session.

use semver::Version;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{HubError, Result};
use crate::prompt::{Prompter, CANCELLED};
use crate::session::UserIdentity;

use super::{ENTRYPOINT_FILE, LICENSE_CHOICES};

const EXAMPLES_PROMPT: &str = "No examples provided - providing examples is highly recommended \
and will help LLMs understand how to use the skill. Continue without examples?";

/// Normalized skill manifest, serialized in this field order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "hubId")]
    pub hub_id: Option<String>,
    pub active: bool,
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: Option<String>,
    pub author_url: Option<String>,
    pub license: String,
    pub examples: Vec<Value>,
    pub entrypoint: Entrypoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entrypoint {
    pub file: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl Default for Entrypoint {
    fn default() -> Self {
        Self {
            file: ENTRYPOINT_FILE.to_string(),
            params: Map::new(),
        }
    }
}

impl Manifest {
    /// Stamp the registry id. A freshly registered skill is never active.
    pub fn assign_hub_id(&mut self, entity_id: impl Into<String>) {
        self.hub_id = Some(entity_id.into());
        self.active = false;
    }

    /// Two-space indented JSON, as written into the archive.
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Handle shown in the upload summary.
    #[must_use]
    pub fn author_handle(&self) -> &str {
        self.author.as_deref().unwrap_or("unknown")
    }
}

/// Literal values for fields the file cannot influence.
#[derive(Debug, Clone, Copy)]
pub enum Literal {
    Null,
    Bool(bool),
}

impl Literal {
    fn to_value(self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(flag) => Value::Bool(flag),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum SessionField {
    Username,
    AuthorUrl,
}

/// How a manifest field gets its value.
#[derive(Debug, Clone, Copy)]
pub enum FieldRule {
    /// Always this literal.
    Fixed(Literal),
    /// The file's string value, or this default. Never prompted.
    Defaulted(&'static str),
    /// The file's string value, or a text prompt; an empty answer fails with `missing`.
    Prompted {
        prompt: &'static str,
        missing: &'static str,
    },
    /// Taken from the logged-in identity.
    FromSession(SessionField),
    /// The file's string value, or a pick from [`LICENSE_CHOICES`].
    License { prompt: &'static str },
    /// A non-empty array, or confirmation to continue with none.
    Examples,
    /// `{file, params}` with `file` pinned to the entrypoint name.
    Entrypoint,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: &'static str,
    pub rule: FieldRule,
}

pub const MANIFEST_SCHEMA: &[FieldSpec] = &[
    FieldSpec {
        key: "hubId",
        rule: FieldRule::Fixed(Literal::Null),
    },
    FieldSpec {
        key: "active",
        rule: FieldRule::Fixed(Literal::Bool(false)),
    },
    FieldSpec {
        key: "name",
        rule: FieldRule::Prompted {
            prompt: "Please enter a name for the skill:",
            missing: "Name is required",
        },
    },
    FieldSpec {
        key: "version",
        rule: FieldRule::Defaulted("0.0.1"),
    },
    FieldSpec {
        key: "description",
        rule: FieldRule::Prompted {
            prompt: "Please enter a description for the skill:",
            missing: "Description is required",
        },
    },
    FieldSpec {
        key: "author",
        rule: FieldRule::FromSession(SessionField::Username),
    },
    FieldSpec {
        key: "author_url",
        rule: FieldRule::FromSession(SessionField::AuthorUrl),
    },
    FieldSpec {
        key: "license",
        rule: FieldRule::License {
            prompt: "Please select a license for the skill:",
        },
    },
    FieldSpec {
        key: "examples",
        rule: FieldRule::Examples,
    },
    FieldSpec {
        key: "entrypoint",
        rule: FieldRule::Entrypoint,
    },
];

/// Resolve every schema field in order and build the normalized manifest.
pub fn resolve(
    raw: &Map<String, Value>,
    identity: &UserIdentity,
    prompter: &mut dyn Prompter,
) -> Result<Manifest> {
    let mut resolved = Map::new();
    for field in MANIFEST_SCHEMA {
        let value = field.resolve(raw, identity, &resolved, prompter)?;
        resolved.insert(field.key.to_string(), value);
    }
    Ok(serde_json::from_value(Value::Object(resolved))?)
}

/// Parse `plugin.json` text and resolve it. Anything but a JSON object fails.
pub fn parse_and_resolve(
    text: &str,
    identity: &UserIdentity,
    prompter: &mut dyn Prompter,
) -> Result<Manifest> {
    let value: Value = serde_json::from_str(text)
        .map_err(|err| HubError::ValidationFailed(err.to_string()))?;
    let Value::Object(raw) = value else {
        return Err(HubError::ValidationFailed(
            "Manifest must be a JSON object".to_string(),
        ));
    };
    resolve(&raw, identity, prompter)
}

impl FieldSpec {
    fn resolve(
        &self,
        raw: &Map<String, Value>,
        identity: &UserIdentity,
        resolved: &Map<String, Value>,
        prompter: &mut dyn Prompter,
    ) -> Result<Value> {
        match self.rule {
            FieldRule::Fixed(literal) => Ok(literal.to_value()),
            FieldRule::Defaulted(default) => {
                let value = string_field(raw, self.key).unwrap_or_else(|| default.to_string());
                if self.key == "version" && Version::parse(&value).is_err() {
                    warn!(
                        name = resolved.get("name").and_then(serde_json::Value::as_str).unwrap_or_default(),
                        version = %value,
                        "Skill version is not semver"
                    );
                }
                Ok(Value::String(value))
            }
            FieldRule::Prompted { prompt, missing } => {
                if let Some(value) = string_field(raw, self.key) {
                    return Ok(Value::String(value));
                }
                debug!(field = self.key, "Prompting for missing manifest field");
                let answer = prompter.text(prompt)?;
                let answer = answer.trim();
                if answer.is_empty() {
                    return Err(HubError::ValidationFailed(missing.to_string()));
                }
                Ok(Value::String(answer.to_string()))
            }
            FieldRule::FromSession(field) => {
                let value = match field {
                    SessionField::Username => identity.username.clone(),
                    SessionField::AuthorUrl => identity.author_url.clone(),
                };
                Ok(value
                    .filter(|value| !value.is_empty())
                    .map_or(Value::Null, Value::String))
            }
            FieldRule::License { prompt } => {
                if let Some(value) = string_field(raw, self.key) {
                    return Ok(Value::String(value));
                }
                prompter
                    .select(prompt, LICENSE_CHOICES)?
                    .map(Value::String)
                    .ok_or_else(|| HubError::UserAbort(CANCELLED.to_string()))
            }
            FieldRule::Examples => match raw.get(self.key) {
                Some(Value::Array(examples)) if !examples.is_empty() => {
                    Ok(Value::Array(examples.clone()))
                }
                _ => {
                    if prompter.confirm(EXAMPLES_PROMPT)? {
                        Ok(Value::Array(Vec::new()))
                    } else {
                        Err(HubError::UserAbort(CANCELLED.to_string()))
                    }
                }
            },
            FieldRule::Entrypoint => resolve_entrypoint(raw.get(self.key)),
        }
    }
}

fn resolve_entrypoint(raw: Option<&Value>) -> Result<Value> {
    let entrypoint = match raw {
        None | Some(Value::Null) => Entrypoint::default(),
        Some(Value::Object(object)) => {
            if object.get("file").and_then(Value::as_str) != Some(ENTRYPOINT_FILE) {
                return Err(HubError::ValidationFailed(format!(
                    "Entrypoint file must be {ENTRYPOINT_FILE}"
                )));
            }
            let params = match object.get("params") {
                None | Some(Value::Null) => Map::new(),
                Some(Value::Object(params)) => params.clone(),
                Some(_) => {
                    return Err(HubError::ValidationFailed(
                        "Entrypoint params must be an object".to_string(),
                    ));
                }
            };
            Entrypoint {
                file: ENTRYPOINT_FILE.to_string(),
                params,
            }
        }
        Some(_) => {
            return Err(HubError::ValidationFailed(format!(
                "Entrypoint file must be {ENTRYPOINT_FILE}"
            )));
        }
    };
    Ok(serde_json::to_value(entrypoint)?)
}

/// A non-empty string value, kept as written. Anything else counts as absent.
fn string_field(raw: &Map<String, Value>, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(value) if !value.is_empty() => Some(value.clone()),
        Value::String(_) | Value::Null => None,
        other => {
            warn!(field = key, value = %other, "Ignoring non-string manifest value");
            None
        }
    }
}
