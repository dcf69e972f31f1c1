//! Agent skill folders
//!
//! An agent skill is a directory holding a JavaScript entrypoint
//! (`handler.js`), a JSON manifest (`plugin.json`), optional supporting
//! text files and an optional `node_modules` directory.

pub mod collector;
pub mod entrypoint;
pub mod manifest;

pub use collector::{collect, FileContent, FileRecord};
pub use manifest::{Entrypoint, Manifest};

pub const ENTRYPOINT_FILE: &str = "handler.js";
pub const MANIFEST_FILE: &str = "plugin.json";
pub const DEPENDENCY_DIR: &str = "node_modules";

/// Files every skill folder must contain, in the order they are checked.
pub const REQUIRED_FILES: &[&str] = &[ENTRYPOINT_FILE, MANIFEST_FILE];

/// Extensions accepted for the remaining top-level files.
pub const ALLOWED_EXTENSIONS: &[&str] = &["js", "json", "txt", "md"];

/// Top-level names skipped without a warning.
pub const IGNORED_FILES: &[&str] = &["package-lock.json", "yarn.lock", "package.json"];

pub const LICENSE_CHOICES: &[&str] = &["MIT", "Apache-2.0", "GPL-3.0", "BSD-3-Clause", "Other"];
