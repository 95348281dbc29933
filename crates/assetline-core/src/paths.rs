//! Path resolution - maps (asset category, build mode) to source and destination
//!
//! Resolution is a pure lookup against the configured layout: nothing here
//! touches the filesystem.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::PathsConfig;
use crate::mode::{AssetCategory, BuildMode};

/// Source and destination directory for one asset category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathMapping {
    /// Directory the task reads from
    pub source: PathBuf,
    /// Directory the task writes to
    pub destination: PathBuf,
}

/// Static resolution table derived from configuration
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    paths: PathsConfig,
}

impl PathResolver {
    /// Create a resolver for the project rooted at `root`
    pub fn new(root: impl Into<PathBuf>, paths: &PathsConfig) -> Self {
        Self {
            root: root.into(),
            paths: paths.clone(),
        }
    }

    /// Project root all relative paths are anchored to
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Output root for a mode; the asset tree lives below it
    pub fn output_root(&self, mode: BuildMode) -> PathBuf {
        let root = match mode {
            BuildMode::Development => &self.paths.development_root,
            BuildMode::Production => &self.paths.production_root,
        };
        self.root.join(root)
    }

    /// Destination of pages and service workers.
    ///
    /// Production pages stay in the served webroot unless
    /// `production_html_root` says otherwise.
    pub fn html_root(&self, mode: BuildMode) -> PathBuf {
        match (mode, &self.paths.production_html_root) {
            (BuildMode::Production, Some(root)) => self.root.join(root),
            _ => self.output_root(BuildMode::Development),
        }
    }

    /// Directory holding every non-html category for a mode
    pub fn asset_root(&self, mode: BuildMode) -> PathBuf {
        self.output_root(mode)
            .join(self.paths.asset_path.trim_start_matches('/'))
    }

    /// Resolve the mapping for one category
    pub fn resolve(&self, category: AssetCategory, mode: BuildMode) -> PathMapping {
        let source = match category {
            AssetCategory::Css => &self.paths.source.css,
            AssetCategory::Js => &self.paths.source.js,
            AssetCategory::Html => &self.paths.source.html,
            AssetCategory::Img => &self.paths.source.img,
            AssetCategory::Fonts => &self.paths.source.fonts,
        };

        let destination = match category.asset_dir() {
            Some(dir) => self.asset_root(mode).join(dir),
            None => self.html_root(mode),
        };

        PathMapping {
            source: self.root.join(source),
            destination,
        }
    }

    /// Resolve every category for a mode at once
    pub fn resolve_all(&self, mode: BuildMode) -> ResolvedPaths {
        ResolvedPaths {
            mode,
            output_root: self.output_root(mode),
            css: self.resolve(AssetCategory::Css, mode),
            js: self.resolve(AssetCategory::Js, mode),
            html: self.resolve(AssetCategory::Html, mode),
            img: self.resolve(AssetCategory::Img, mode),
            fonts: self.resolve(AssetCategory::Fonts, mode),
        }
    }
}

/// The five mappings active for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPaths {
    /// Mode the mappings were resolved for
    pub mode: BuildMode,
    /// Output root for this mode
    pub output_root: PathBuf,
    pub css: PathMapping,
    pub js: PathMapping,
    pub html: PathMapping,
    pub img: PathMapping,
    pub fonts: PathMapping,
}

impl ResolvedPaths {
    /// Get the mapping for a category
    pub fn get(&self, category: AssetCategory) -> &PathMapping {
        match category {
            AssetCategory::Css => &self.css,
            AssetCategory::Js => &self.js,
            AssetCategory::Html => &self.html,
            AssetCategory::Img => &self.img,
            AssetCategory::Fonts => &self.fonts,
        }
    }
}
