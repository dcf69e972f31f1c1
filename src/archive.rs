//! Zip archive construction for staged skills.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{HubError, Result};

/// Result of a finished archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    /// Files and directories written.
    pub entries: usize,
    /// Size of the archive on disk.
    pub bytes: u64,
}

fn file_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9))
}

/// Zip the contents of `source_dir` into `out_path`.
///
/// Entry names are relative to `source_dir` with `/` separators. Returns once
/// the archive is finished and synced to disk.
pub fn create_archive(source_dir: &Path, out_path: &Path) -> Result<ArchiveSummary> {
    if !source_dir.is_dir() {
        return Err(HubError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("archive source is not a directory: {}", source_dir.display()),
        )));
    }

    let mut zip = ZipWriter::new(BufWriter::new(File::create(out_path)?));
    let mut entries = 0;

    for entry in WalkDir::new(source_dir)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| {
            HubError::Io(err.into_io_error().unwrap_or_else(|| {
                io::Error::other("filesystem loop while archiving")
            }))
        })?;
        let Some(name) = entry_name(source_dir, entry.path()) else {
            continue;
        };

        if entry.file_type().is_dir() {
            zip.add_directory(format!("{name}/"), file_options())?;
        } else {
            zip.start_file(name.as_str(), file_options())?;
            let mut file = File::open(entry.path())?;
            io::copy(&mut file, &mut zip)?;
        }
        debug!(entry = %name, "Archived");
        entries += 1;
    }

    let writer = zip.finish()?;
    let file = writer.into_inner().map_err(io::IntoInnerError::into_error)?;
    file.sync_all()?;

    let bytes = fs::metadata(out_path)?.len();
    Ok(ArchiveSummary {
        path: out_path.to_path_buf(),
        entries,
        bytes,
    })
}

fn entry_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|part| part.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
