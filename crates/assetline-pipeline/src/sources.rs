//! Input discovery

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;

use assetline_core::{AssetCategory, TaskError};

/// Files under `base` matching `pattern`, minus anything matching `exclude`.
///
/// Exclusion globs are matched against the path relative to `base`. The result
/// is sorted so runs are deterministic.
pub fn discover(base: &Path, pattern: &str, exclude: &[String]) -> Result<Vec<PathBuf>, TaskError> {
    // The base is literal; only `pattern` carries glob syntax
    let full = format!(
        "{}/{}",
        glob::Pattern::escape(base.to_string_lossy().trim_end_matches('/')),
        pattern
    );
    let excluded = exclusion_set(exclude)?;

    let entries = glob::glob(&full).map_err(|e| TaskError::Io {
        path: base.to_path_buf(),
        message: format!("invalid pattern '{}': {}", pattern, e),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| TaskError::io(e.path().to_path_buf(), e.error()))?;
        if !path.is_file() {
            continue;
        }
        let relative = path.strip_prefix(base).unwrap_or(&path);
        if excluded.is_match(relative) {
            debug!(path = %relative.display(), "excluded");
            continue;
        }
        files.push(path);
    }

    files.sort();
    Ok(files)
}

/// Fail with `MissingAsset` when nothing matched
pub fn require_inputs(
    files: Vec<PathBuf>,
    category: AssetCategory,
    base: &Path,
    pattern: &str,
) -> Result<Vec<PathBuf>, TaskError> {
    if files.is_empty() {
        return Err(TaskError::missing(
            category.as_str(),
            base.join(pattern).display().to_string(),
        ));
    }
    Ok(files)
}

/// `path` relative to `base`, for mirroring a source tree into a destination
pub fn relative_to<'a>(path: &'a Path, base: &Path) -> &'a Path {
    path.strip_prefix(base).unwrap_or(path)
}

fn exclusion_set(patterns: &[String]) -> Result<GlobSet, TaskError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| TaskError::Io {
            path: PathBuf::from(pattern),
            message: format!("invalid exclude pattern: {}", e),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| TaskError::Io {
        path: PathBuf::new(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_discover_excludes_partials_and_vendor_dirs() {
        let temp = TempDir::new().unwrap();
        for rel in [
            "main.scss",
            "_variables.scss",
            "pages/home.scss",
            "pages/_mixins.scss",
            "fonts/icons.scss",
            "kss/styleguide.scss",
        ] {
            touch(temp.path(), rel);
        }
        let exclude = vec![
            "**/_*".to_string(),
            "fonts/**".to_string(),
            "kss/**".to_string(),
        ];

        let files = discover(temp.path(), "**/*.scss", &exclude).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| relative_to(f, temp.path()).to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["main.scss", "pages/home.scss"]);
    }

    #[test]
    fn test_discover_skips_directories() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "logo.png");
        fs::create_dir_all(temp.path().join("icons")).unwrap();

        let files = discover(temp.path(), "**/*", &[]).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_require_inputs_on_empty_match() {
        let err = require_inputs(Vec::new(), AssetCategory::Img, Path::new("/site/src/img"), "**/*")
            .unwrap_err();
        assert!(err.is_missing_asset());
        assert!(err.to_string().contains("img"));
    }

    #[test]
    fn test_discover_under_base_with_glob_characters() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("site[v2]").join("src").join("img");
        touch(&base, "logo.png");
        touch(&base, "icons/arrow.svg");

        let files = discover(&base, "**/*", &[]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| relative_to(f, &base).to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["icons/arrow.svg", "logo.png"]);
    }

    #[test]
    fn test_discover_missing_base_is_empty() {
        let temp = TempDir::new().unwrap();
        let files = discover(&temp.path().join("nope"), "**/*", &[]).unwrap();
        assert!(files.is_empty());
    }
}
