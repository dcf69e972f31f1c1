//! Starter templates for `skillhub init`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{HubError, Result};
use crate::registry::EntityType;

#[derive(Debug, Clone, Copy)]
pub struct TemplateFile {
    pub name: &'static str,
    pub contents: &'static str,
}

const AGENT_SKILL: &[TemplateFile] = &[
    TemplateFile {
        name: "handler.js",
        contents: include_str!("../templates/agent-skill/handler.js"),
    },
    TemplateFile {
        name: "plugin.json",
        contents: include_str!("../templates/agent-skill/plugin.json"),
    },
];

#[must_use]
pub const fn template_files(entity: EntityType) -> &'static [TemplateFile] {
    match entity {
        EntityType::AgentSkill => AGENT_SKILL,
    }
}

/// Folder name used when the output is `.`: `my-<type>-<last three ms digits>`.
#[must_use]
pub fn default_folder_name(entity: EntityType, millis: i64) -> String {
    format!("my-{entity}-{:03}", millis.rem_euclid(1000))
}

/// Write the template for `entity` into `target`, creating it if needed.
///
/// Existing files are never overwritten; nothing is written if any
/// template file is already present.
pub fn write_template(entity: EntityType, target: &Path) -> Result<Vec<PathBuf>> {
    let files = template_files(entity);

    if let Some(existing) = files
        .iter()
        .map(|file| target.join(file.name))
        .find(|path| path.exists())
    {
        return Err(HubError::ValidationFailed(format!(
            "{} already exists, refusing to overwrite",
            existing.display()
        )));
    }

    fs::create_dir_all(target)?;
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let path = target.join(file.name);
        fs::write(&path, file.contents)?;
        debug!(path = %path.display(), "Template file written");
        written.push(path);
    }
    Ok(written)
}
