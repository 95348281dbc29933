//! Per-run build context

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::mode::BuildMode;
use crate::paths::{PathResolver, ResolvedPaths};

/// Everything a unit of work needs to know about the current run.
///
/// Created once per invocation and shared by reference with every task, so the
/// build mode and the resolved paths cannot change mid-run.
#[derive(Debug, Clone)]
pub struct BuildContext {
    mode: BuildMode,
    root: PathBuf,
    paths: ResolvedPaths,
    config: Arc<Config>,
}

impl BuildContext {
    /// Create a context for the project at `root`
    pub fn new(root: impl Into<PathBuf>, config: Config, mode: BuildMode) -> Self {
        let root = root.into();
        let resolver = PathResolver::new(root.clone(), &config.paths);
        let paths = resolver.resolve_all(mode);
        Self {
            mode,
            root,
            paths,
            config: Arc::new(config),
        }
    }

    /// Active build mode
    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    /// Project root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Mappings resolved for the active mode
    pub fn paths(&self) -> &ResolvedPaths {
        &self.paths
    }

    /// Loaded configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Directory deployment artefacts are written to
    pub fn artefacts_dir(&self) -> PathBuf {
        self.root.join(&self.config.artefacts.dir)
    }
}
