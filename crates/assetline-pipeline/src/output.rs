//! All-or-nothing output writer

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, TempPath};
use tracing::{debug, warn};

use assetline_core::TaskError;

/// Outputs of one task, held in memory until every input has transformed.
///
/// Nothing touches the destination tree until [`StagedOutput::commit`]; each
/// file is then written to a temporary file beside its target and renamed
/// into place, so readers never observe a partial file.
#[derive(Debug, Default)]
pub struct StagedOutput {
    files: Vec<(PathBuf, Vec<u8>)>,
}

impl StagedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `contents` for `path`
    pub fn stage(&mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.files.push((path.into(), contents.into()));
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Staged destination paths
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|(p, _)| p.as_path())
    }

    /// Write every staged file, returning the paths written.
    ///
    /// Every temporary file is written before any target is replaced; a
    /// failure while renaming removes the targets already renamed.
    pub fn commit(self) -> Result<Vec<PathBuf>, TaskError> {
        let mut prepared = Vec::with_capacity(self.files.len());
        for (path, contents) in self.files {
            let tmp = prepare(&path, &contents)?;
            prepared.push((path, tmp, contents.len()));
        }

        let mut written = Vec::with_capacity(prepared.len());
        for (path, tmp, bytes) in prepared {
            if let Err(e) = tmp.persist(&path) {
                remove_written(&written);
                return Err(TaskError::write(&path, &e.error));
            }
            debug!(path = %path.display(), bytes, "wrote");
            written.push(path);
        }
        Ok(written)
    }
}

/// Write `contents` to a closed temporary file beside `path`
fn prepare(path: &Path, contents: &[u8]) -> Result<TempPath, TaskError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| TaskError::write(dir, &e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| TaskError::write(path, &e))?;
    tmp.write_all(contents)
        .map_err(|e| TaskError::write(path, &e))?;
    Ok(tmp.into_temp_path())
}

fn remove_written(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "could not remove partial output");
        }
    }
}
