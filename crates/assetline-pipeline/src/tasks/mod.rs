//! Individual asset tasks
//!
//! Each task implements [`Work`](assetline_tasks::Work): it reads the inputs
//! for its category from the resolved source directory, transforms all of
//! them in memory and only then writes the results.

mod clean;
mod css;
mod fonts;
mod html;
mod img;
mod js;

use std::path::{Path, PathBuf};

pub use clean::CleanTask;
pub use css::CssTask;
pub use fonts::FontsTask;
pub use html::HtmlTask;
pub use img::ImgTask;
pub use js::{JsAsyncTask, JsCoreTask, JsPolyfillsTask, ServiceWorkerTask};

use assetline_core::TaskError;

use crate::output::StagedOutput;
use crate::sources::relative_to;

async fn read(path: &Path) -> Result<Vec<u8>, TaskError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| TaskError::io(path, &e))
}

async fn read_string(path: &Path) -> Result<String, TaskError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| TaskError::io(path, &e))
}

/// Stage verbatim copies of `files`, mirroring their layout under `base`
async fn stage_copies(
    files: &[PathBuf],
    base: &Path,
    destination: &Path,
) -> Result<StagedOutput, TaskError> {
    let mut staged = StagedOutput::new();
    for file in files {
        let bytes = read(file).await?;
        staged.stage(destination.join(relative_to(file, base)), bytes);
    }
    Ok(staged)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::fs;
    use std::path::Path;

    use assetline_core::{BuildContext, BuildMode, Config};

    /// Write `contents` to `root/rel`, creating parents
    pub fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    /// Config with no external collaborators, so tests only need the built-ins
    pub fn offline_config() -> Config {
        let mut config = Config::default();
        config.styles.compiler = None;
        config.styles.extension = "css".to_string();
        config.styles.banner = false;
        config.scripts.minifier = None;
        config
    }

    pub fn context(root: &Path, config: Config, mode: BuildMode) -> BuildContext {
        BuildContext::new(root, config, mode)
    }
}
