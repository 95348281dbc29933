//! Deployment archive of the build tree

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use assetline_core::{BuildContext, TaskError};

/// What went into an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReport {
    /// Archive location
    pub path: PathBuf,
    /// Number of files stored
    pub entries: usize,
    /// Uncompressed size of all stored files
    pub bytes: u64,
}

fn zip_error(path: &Path, err: zip::result::ZipError) -> TaskError {
    TaskError::Write {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Zip every file under `source_root` into `archive`.
///
/// Entries are stored in path order with a fixed timestamp so the same tree
/// always yields the same archive.
#[instrument(skip_all, fields(source = %source_root.display()))]
pub fn write_archive(source_root: &Path, archive: &Path) -> Result<ArchiveReport, TaskError> {
    let dir = archive
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| TaskError::write(dir, &e))?;

    let tmp = NamedTempFile::new_in(dir).map_err(|e| TaskError::write(archive, &e))?;
    let mut zip = ZipWriter::new(tmp);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);

    let mut entries = 0;
    let mut bytes = 0u64;

    if source_root.is_dir() {
        for entry in WalkDir::new(source_root).sort_by_file_name() {
            let entry = entry.map_err(|e| TaskError::Io {
                path: source_root.to_path_buf(),
                message: e.to_string(),
            })?;
            if !entry.file_type().is_file() || entry.path() == archive {
                continue;
            }

            let relative = entry.path().strip_prefix(source_root).unwrap_or(entry.path());
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let contents = fs::read(entry.path()).map_err(|e| TaskError::io(entry.path(), &e))?;

            zip.start_file(name.as_str(), options)
                .map_err(|e| zip_error(archive, e))?;
            zip.write_all(&contents)
                .map_err(|e| TaskError::write(archive, &e))?;

            debug!(entry = %name, size = contents.len(), "archived");
            entries += 1;
            bytes += contents.len() as u64;
        }
    }

    let tmp = zip.finish().map_err(|e| zip_error(archive, e))?;
    tmp.persist(archive)
        .map_err(|e| TaskError::write(archive, &e.error))?;

    Ok(ArchiveReport {
        path: archive.to_path_buf(),
        entries,
        bytes,
    })
}

/// Archive the output tree of `ctx` into the artefacts directory
pub fn build_archive(ctx: &BuildContext) -> Result<ArchiveReport, TaskError> {
    let archive = ctx.artefacts_dir().join(&ctx.config().artefacts.archive);
    let report = write_archive(&ctx.paths().output_root, &archive)?;
    info!(
        entries = report.entries,
        bytes = report.bytes,
        path = %report.path.display(),
        "wrote build archive"
    );
    Ok(report)
}
