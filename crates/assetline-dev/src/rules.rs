//! Watch rules: which source changes re-run which tasks

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};

use assetline_core::config::SourcePaths;
use assetline_tasks::{TaskGraph, TaskId};

use crate::error::WatchError;

/// A source glob (relative to the project root) and the tasks it owns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRule {
    pub glob: String,
    pub tasks: Vec<String>,
}

impl WatchRule {
    pub fn new(glob: impl Into<String>, tasks: &[&str]) -> Self {
        Self {
            glob: glob.into(),
            tasks: tasks.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// The standard rules for the configured source layout
pub fn default_rules(source: &SourcePaths) -> Vec<WatchRule> {
    let dir = |d: &str| d.trim_end_matches('/').to_string();
    vec![
        WatchRule::new(format!("{}/**/*.html", dir(&source.html)), &["html"]),
        WatchRule::new(format!("{}/**/*.scss", dir(&source.css)), &["css"]),
        WatchRule::new(format!("{}/**/*.css", dir(&source.css)), &["css"]),
        WatchRule::new(format!("{}/**/*", dir(&source.img)), &["img"]),
        WatchRule::new(format!("{}/**/*", dir(&source.js)), &["js"]),
        WatchRule::new(format!("{}/**/*", dir(&source.fonts)), &["fonts"]),
    ]
}

/// Rules with globs compiled and task names resolved against a graph
#[derive(Debug, Clone)]
pub struct CompiledRules {
    roots: Vec<PathBuf>,
    set: GlobSet,
    targets: Vec<Vec<TaskId>>,
}

impl CompiledRules {
    /// Compile `rules` for the project at `root`.
    ///
    /// Unknown task names are rejected here, before any watching starts.
    pub fn compile(rules: &[WatchRule], graph: &TaskGraph, root: &Path) -> Result<Self, WatchError> {
        let mut builder = GlobSetBuilder::new();
        let mut targets = Vec::with_capacity(rules.len());

        for rule in rules {
            let glob = Glob::new(&rule.glob).map_err(|e| WatchError::InvalidRule {
                glob: rule.glob.clone(),
                message: e.to_string(),
            })?;
            builder.add(glob);

            let ids = rule
                .tasks
                .iter()
                .map(|name| graph.require(name))
                .collect::<Result<Vec<_>, _>>()?;
            targets.push(ids);
        }

        let set = builder.build().map_err(|e| WatchError::InvalidRule {
            glob: String::new(),
            message: e.to_string(),
        })?;

        // Watchers may report canonical paths (e.g. through symlinked temp dirs)
        let mut roots = vec![root.to_path_buf()];
        if let Ok(canonical) = root.canonicalize() {
            if canonical != root {
                roots.push(canonical);
            }
        }

        Ok(Self {
            roots,
            set,
            targets,
        })
    }

    fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        self.roots
            .iter()
            .find_map(|root| path.strip_prefix(root).ok())
            .unwrap_or(path)
    }

    /// Indices of the rules matching `path`
    pub fn matching(&self, path: &Path) -> Vec<usize> {
        self.set.matches(self.relative(path))
    }

    /// Task sets to rebuild for a batch of changed paths, one per matched
    /// rule, without duplicates
    pub fn targets_for(&self, paths: &[PathBuf]) -> Vec<Vec<TaskId>> {
        let mut rules: Vec<usize> = paths.iter().flat_map(|p| self.matching(p)).collect();
        rules.sort_unstable();
        rules.dedup();

        let mut sets: Vec<Vec<TaskId>> = Vec::new();
        for rule in rules {
            let set = &self.targets[rule];
            if !sets.contains(set) {
                sets.push(set.clone());
            }
        }
        sets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
