//! Per-upload build directory and archive path.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{HubError, Result};

/// `<root>/<entity_id>` plus the sibling `<root>/<entity_id>.zip`.
///
/// Both paths are removed when the area is dropped. The directory is created
/// here, never adopted, so an existing directory is never deleted.
#[derive(Debug)]
pub struct StagingArea {
    dir: PathBuf,
    archive: PathBuf,
}

impl StagingArea {
    pub fn create(root: &Path, entity_id: &str) -> Result<Self> {
        let mut components = Path::new(entity_id).components();
        let single_normal = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_normal {
            return Err(HubError::ValidationFailed(format!(
                "Registry returned an unusable entity id: {entity_id:?}"
            )));
        }

        fs::create_dir_all(root)?;
        let dir = root.join(entity_id);
        let archive = root.join(format!("{entity_id}.zip"));
        if archive.exists() {
            return Err(HubError::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", archive.display()),
            )));
        }
        fs::create_dir(&dir)?;
        debug!(dir = %dir.display(), "Created staging directory");

        Ok(Self { dir, archive })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn archive_path(&self) -> &Path {
        &self.archive
    }

    /// Write `content` as `<dir>/<name>`.
    pub fn write_file(&self, name: &str, content: &str) -> Result<()> {
        fs::write(self.dir.join(name), content)?;
        Ok(())
    }

    /// Recursively copy `source` into `<dir>/<name>`, following symlinks.
    pub fn copy_tree(&self, source: &Path, name: &str) -> Result<u64> {
        let target_root = self.dir.join(name);
        let mut copied = 0;

        for entry in WalkDir::new(source).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.io_error().is_some_and(|e| e.kind() == io::ErrorKind::NotFound) => {
                    warn!(path = ?err.path(), "Skipping broken link");
                    continue;
                }
                Err(err) => {
                    return Err(HubError::Io(err.into_io_error().unwrap_or_else(|| {
                        io::Error::other("filesystem loop while copying")
                    })));
                }
            };

            let relative = entry
                .path()
                .strip_prefix(source)
                .map_err(|e| HubError::Io(io::Error::other(e.to_string())))?;
            let target = target_root.join(relative);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&target)?;
            } else {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                copied += fs::copy(entry.path(), &target)?;
            }
        }

        Ok(copied)
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if self.dir.exists() {
            if let Err(err) = fs::remove_dir_all(&self.dir) {
                warn!(path = %self.dir.display(), error = %err, "Failed to remove staging directory");
            }
        }
        if self.archive.exists() {
            if let Err(err) = fs::remove_file(&self.archive) {
                warn!(path = %self.archive.display(), error = %err, "Failed to remove archive");
            }
        }
        debug!(dir = %self.dir.display(), "Staging area cleaned up");
    }
}
