//! Subresource integrity manifest

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha384};
use tracing::{info, instrument};
use walkdir::WalkDir;

use assetline_core::{BuildContext, TaskError};

use crate::output::StagedOutput;

/// `sha384-<base64>` integrity value for `data`
pub fn sri_hash(data: &[u8]) -> String {
    let mut hasher = Sha384::new();
    hasher.update(data);
    format!("sha384-{}", STANDARD.encode(hasher.finalize()))
}

/// Map of asset path (relative to the build root, `/` separated) to its
/// integrity value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntegrityManifest {
    entries: BTreeMap<String, String>,
}

impl IntegrityManifest {
    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Hash every file under `dirs`, keyed relative to `build_root`
    pub fn collect(build_root: &Path, dirs: &[&Path]) -> Result<Self, TaskError> {
        let mut entries = BTreeMap::new();
        for dir in dirs {
            if !dir.is_dir() {
                continue;
            }
            for entry in WalkDir::new(dir).sort_by_file_name() {
                let entry = entry.map_err(|e| TaskError::Io {
                    path: dir.to_path_buf(),
                    message: e.to_string(),
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let bytes = fs::read(entry.path()).map_err(|e| TaskError::io(entry.path(), &e))?;
                entries.insert(manifest_key(entry.path(), build_root), sri_hash(&bytes));
            }
        }
        Ok(Self { entries })
    }

    /// Pretty JSON, one entry per line
    pub fn to_json(&self) -> Result<String, TaskError> {
        serde_json::to_string_pretty(self)
            .map(|s| s + "\n")
            .map_err(|e| TaskError::Aborted(e.to_string()))
    }
}

fn manifest_key(path: &Path, build_root: &Path) -> String {
    path.strip_prefix(build_root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Hash the script and stylesheet trees of `ctx` and write the manifest into
/// the artefacts directory
#[instrument(skip_all, fields(mode = %ctx.mode()))]
pub fn generate_manifest(ctx: &BuildContext) -> Result<(IntegrityManifest, PathBuf), TaskError> {
    let paths = ctx.paths();
    let manifest = IntegrityManifest::collect(
        &paths.output_root,
        &[paths.js.destination.as_path(), paths.css.destination.as_path()],
    )?;

    let target = ctx.artefacts_dir().join(&ctx.config().artefacts.manifest);
    let mut staged = StagedOutput::new();
    staged.stage(&target, manifest.to_json()?);
    staged.commit()?;

    info!(entries = manifest.len(), path = %target.display(), "wrote integrity manifest");
    Ok((manifest, target))
}
