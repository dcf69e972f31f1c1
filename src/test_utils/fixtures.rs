use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub const VALID_HANDLER: &str = r#"module.exports.runtime = {
  handler: async function (args = {}) {
    return "Agent skill executed successfully.";
  }
};
"#;

pub const VALID_MANIFEST: &str = r#"{
  "name": "weather-lookup",
  "version": "1.0.0",
  "description": "Looks up the current weather for a city",
  "license": "MIT",
  "examples": [
    { "prompt": "What is the weather in Paris?", "call": "{\"city\": \"Paris\"}" }
  ],
  "entrypoint": {
    "file": "handler.js",
    "params": { "city": { "description": "City name", "type": "string" } }
  }
}
"#;

/// A skill folder inside its own temp directory.
///
/// The folder is `<temp>/<name>`, so display paths start with `name/`.
pub struct SkillFixture {
    pub temp_dir: TempDir,
    pub skill_path: PathBuf,
}

impl SkillFixture {
    pub fn new(name: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let skill_path = temp_dir.path().join(name);
        std::fs::create_dir_all(&skill_path).expect("Failed to create skill dir");
        Self {
            temp_dir,
            skill_path,
        }
    }

    /// Add a `handler.js` and a complete `plugin.json`.
    #[must_use]
    pub fn with_valid_skill(self) -> Self {
        self.file("handler.js", VALID_HANDLER)
            .file("plugin.json", VALID_MANIFEST)
    }

    /// Write a file relative to the skill folder, creating parents.
    #[must_use]
    pub fn file(self, relative_path: &str, content: &str) -> Self {
        self.create_file(relative_path, content);
        self
    }

    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.skill_path.join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        full_path
    }

    pub fn path(&self) -> &Path {
        &self.skill_path
    }

    /// Scratch directory next to the skill, for staging roots and sessions.
    pub fn scratch_dir(&self, name: &str) -> PathBuf {
        let dir = self.temp_dir.path().join(name);
        std::fs::create_dir_all(&dir).expect("Failed to create scratch dir");
        dir
    }
}
