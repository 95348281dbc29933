use std::io::ErrorKind;

use async_trait::async_trait;
use tracing::{debug, instrument};

use assetline_core::{AssetCategory, BuildContext, TaskError};
use assetline_tasks::{Work, WorkReport};

/// Remove the generated asset directories of the active mode.
///
/// Pages in the site root are left alone; they are overwritten by `html`.
#[derive(Debug, Default)]
pub struct CleanTask;

const CLEANED: [AssetCategory; 4] = [
    AssetCategory::Css,
    AssetCategory::Js,
    AssetCategory::Img,
    AssetCategory::Fonts,
];

#[async_trait]
impl Work for CleanTask {
    #[instrument(skip_all, fields(task = "clean", mode = %ctx.mode()))]
    async fn run(&self, ctx: &BuildContext) -> Result<WorkReport, TaskError> {
        for category in CLEANED {
            let dir = &ctx.paths().get(category).destination;
            match tokio::fs::remove_dir_all(dir).await {
                Ok(()) => debug!(dir = %dir.display(), "removed"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(TaskError::write(dir, &e)),
            }
        }
        Ok(WorkReport::default())
    }
}
