//! Skill folder scanning
//!
//! Produces one [`FileRecord`] per accepted top-level file, plus a listing
//! record for `node_modules`. The entrypoint and manifest always come first.

use std::fs;
use std::path::Path;

use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

use super::manifest::{self, Manifest};
use super::{
    entrypoint, ALLOWED_EXTENSIONS, DEPENDENCY_DIR, ENTRYPOINT_FILE, IGNORED_FILES,
    MANIFEST_FILE, REQUIRED_FILES,
};
use crate::cli::progress::ProgressReporter;
use crate::error::{HubError, Result};
use crate::prompt::Prompter;
use crate::session::UserIdentity;

const LISTING_HEADER: &str = "# Node modules imported by this skill:\n";

#[derive(Debug, Clone, PartialEq)]
pub enum FileContent {
    /// UTF-8 source or text file.
    Text(String),
    /// The normalized manifest.
    Manifest(Manifest),
    /// Listing of the dependency directory's immediate children.
    Listing(String),
}

impl FileContent {
    /// Text written to the staging directory and sent to the hub.
    pub fn render(&self) -> Result<String> {
        match self {
            Self::Text(text) | Self::Listing(text) => Ok(text.clone()),
            Self::Manifest(manifest) => manifest.to_pretty_json(),
        }
    }
}

impl Serialize for FileContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Text(text) | Self::Listing(text) => serializer.serialize_str(text),
            Self::Manifest(manifest) => {
                let json = manifest.to_pretty_json().map_err(serde::ser::Error::custom)?;
                serializer.serialize_str(&json)
            }
        }
    }
}

/// One entry of a skill folder, as staged and as reported to the hub.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRecord {
    pub path: String,
    pub name: String,
    pub size: u64,
    pub content: FileContent,
}

impl FileRecord {
    #[must_use]
    pub fn is_dependency_dir(&self) -> bool {
        matches!(self.content, FileContent::Listing(_))
    }

    #[must_use]
    pub fn manifest(&self) -> Option<&Manifest> {
        match &self.content {
            FileContent::Manifest(manifest) => Some(manifest),
            _ => None,
        }
    }

    pub fn manifest_mut(&mut self) -> Option<&mut Manifest> {
        match &mut self.content {
            FileContent::Manifest(manifest) => Some(manifest),
            _ => None,
        }
    }
}

/// Validate a skill folder and collect its files.
pub fn collect(
    folder: &Path,
    identity: &UserIdentity,
    prompter: &mut dyn Prompter,
    progress: &ProgressReporter,
) -> Result<Vec<FileRecord>> {
    let folder_name = folder
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let missing: Vec<&str> = REQUIRED_FILES
        .iter()
        .copied()
        .filter(|name| !folder.join(name).exists())
        .collect();
    if !missing.is_empty() {
        return Err(HubError::SkillInvalid(format!(
            "The following required files are missing from the agent skill folder: {}",
            missing.join(", ")
        )));
    }

    let mut records = Vec::new();

    let entry_path = folder.join(ENTRYPOINT_FILE);
    let source = fs::read_to_string(&entry_path)?;
    entrypoint::check_syntax(&source).map_err(|message| HubError::Parse {
        file: ENTRYPOINT_FILE.to_string(),
        message,
    })?;
    records.push(FileRecord {
        path: display_path(&folder_name, ENTRYPOINT_FILE),
        name: ENTRYPOINT_FILE.to_string(),
        size: fs::metadata(&entry_path)?.len(),
        content: FileContent::Text(source),
    });
    progress.step(&format!("{ENTRYPOINT_FILE} is valid."));

    let manifest_path = folder.join(MANIFEST_FILE);
    let text = fs::read_to_string(&manifest_path)?;
    let manifest = manifest::parse_and_resolve(&text, identity, prompter).map_err(|err| match err {
        HubError::ValidationFailed(message) => HubError::Parse {
            file: MANIFEST_FILE.to_string(),
            message,
        },
        other => other,
    })?;
    records.push(FileRecord {
        path: display_path(&folder_name, MANIFEST_FILE),
        name: MANIFEST_FILE.to_string(),
        size: fs::metadata(&manifest_path)?.len(),
        content: FileContent::Manifest(manifest),
    });
    progress.step(&format!("{MANIFEST_FILE} is valid."));

    let mut entries: Vec<_> = fs::read_dir(folder)?.collect::<std::io::Result<_>>()?;
    entries.sort_by_key(fs::DirEntry::file_name);

    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        if REQUIRED_FILES.contains(&name.as_str()) || IGNORED_FILES.contains(&name.as_str()) {
            continue;
        }

        let path = entry.path();
        let metadata = fs::symlink_metadata(&path)?;

        if metadata.is_dir() {
            if name != DEPENDENCY_DIR {
                debug!(dir = %name, "Skipping subdirectory");
                continue;
            }
            records.push(FileRecord {
                path: display_path(&folder_name, &name),
                name,
                size: metadata.len(),
                content: FileContent::Listing(dependency_listing(&path)?),
            });
            progress.step("Found node_modules directory - it will be bundled with the skill");
            continue;
        }

        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            warn!(file = %name, extension = %extension, "Unsupported file extension, skipping");
            progress.warn(&format!(
                "{name} has an unsupported file extension: {extension} - it will be ignored"
            ));
            continue;
        }

        let content = fs::read_to_string(&path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::InvalidData {
                HubError::ValidationFailed(format!("{name} is not valid UTF-8 text"))
            } else {
                HubError::Io(err)
            }
        })?;
        progress.step(&format!("{name} is valid."));
        records.push(FileRecord {
            path: display_path(&folder_name, &name),
            size: fs::metadata(&path)?.len(),
            content: FileContent::Text(content),
            name,
        });
    }

    info!(folder = %folder.display(), files = records.len(), "Collected skill files");
    Ok(records)
}

fn dependency_listing(dir: &Path) -> Result<String> {
    let mut names = fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<Vec<_>>>()?;
    names.sort();
    Ok(format!("{LISTING_HEADER}{}", names.join("\n")))
}

fn display_path(folder_name: &str, file_name: &str) -> String {
    if folder_name.is_empty() {
        file_name.to_string()
    } else {
        format!("{folder_name}/{file_name}")
    }
}
