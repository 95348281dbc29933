use async_trait::async_trait;
use tracing::instrument;

use assetline_core::{AssetCategory, BuildContext, TaskError};
use assetline_tasks::{Work, WorkReport};

use super::stage_copies;
use crate::sources::{discover, require_inputs};

const FONTS_PATTERN: &str = "**/*.*";

/// Copy font files verbatim
#[derive(Debug, Default)]
pub struct FontsTask;

#[async_trait]
impl Work for FontsTask {
    #[instrument(skip_all, fields(task = "fonts"))]
    async fn run(&self, ctx: &BuildContext) -> Result<WorkReport, TaskError> {
        let mapping = &ctx.paths().fonts;
        let files = discover(&mapping.source, FONTS_PATTERN, &[])?;
        let files = require_inputs(files, AssetCategory::Fonts, &mapping.source, FONTS_PATTERN)?;

        let staged = stage_copies(&files, &mapping.source, &mapping.destination).await?;
        Ok(WorkReport::with_outputs(staged.commit()?))
    }
}
