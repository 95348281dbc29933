use async_trait::async_trait;
use tracing::instrument;

use assetline_core::{AssetCategory, BuildContext, TaskError};
use assetline_tasks::{Work, WorkReport};

use super::read;
use crate::output::StagedOutput;
use crate::sources::{discover, relative_to, require_inputs};
use crate::transform::image;

/// Optimize images into the static image directory
#[derive(Debug, Default)]
pub struct ImgTask;

#[async_trait]
impl Work for ImgTask {
    #[instrument(skip_all, fields(task = "img"))]
    async fn run(&self, ctx: &BuildContext) -> Result<WorkReport, TaskError> {
        let mapping = &ctx.paths().img;
        let files = discover(&mapping.source, "**/*", &[])?;
        let files = require_inputs(files, AssetCategory::Img, &mapping.source, "**/*")?;
        let optimize = ctx.config().images.optimize;
        let jpeg_quality = ctx.config().images.jpeg_quality;

        let mut inputs = Vec::with_capacity(files.len());
        for file in files {
            let bytes = read(&file).await?;
            inputs.push((file, bytes));
        }

        // Recompression is CPU bound; keep it off the runtime thread
        let outputs = tokio::task::spawn_blocking(move || {
            inputs
                .into_iter()
                .map(|(file, bytes)| {
                    let bytes = if optimize {
                        image::optimize(&bytes, &file, jpeg_quality)
                    } else {
                        bytes
                    };
                    (file, bytes)
                })
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|e| TaskError::Aborted(e.to_string()))?;

        let mut staged = StagedOutput::new();
        for (file, bytes) in outputs {
            staged.stage(
                mapping.destination.join(relative_to(&file, &mapping.source)),
                bytes,
            );
        }
        Ok(WorkReport::with_outputs(staged.commit()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    use assetline_core::BuildMode;

    use crate::tasks::testing::{context, offline_config, write};

    #[tokio::test]
    async fn test_images_mirrored_into_static_img() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "src/img/icons/menu.svg", "<svg/>");
        write(temp.path(), "src/img/hero.jpg", "not really a jpeg");
        let ctx = context(temp.path(), offline_config(), BuildMode::Development);

        let report = ImgTask.run(&ctx).await.unwrap();
        assert_eq!(report.outputs.len(), 2);
        assert_eq!(
            fs::read_to_string(temp.path().join("build/static/img/icons/menu.svg")).unwrap(),
            "<svg/>"
        );
        assert_eq!(
            fs::read(temp.path().join("build/static/img/hero.jpg")).unwrap(),
            b"not really a jpeg"
        );
    }

    #[tokio::test]
    async fn test_svg_minified_unless_optimization_disabled() {
        let temp = TempDir::new().unwrap();
        let svg = "<!-- exported -->\n<svg>\n  <path/>\n</svg>\n";
        write(temp.path(), "src/img/menu.svg", svg);
        let out = temp.path().join("build/static/img/menu.svg");

        let ctx = context(temp.path(), offline_config(), BuildMode::Development);
        ImgTask.run(&ctx).await.unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "<svg><path/></svg>");

        let mut config = offline_config();
        config.images.optimize = false;
        let ctx = context(temp.path(), config, BuildMode::Development);
        ImgTask.run(&ctx).await.unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), svg);
    }

    #[tokio::test]
    async fn test_empty_image_dir_is_missing_asset() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src/img")).unwrap();
        let ctx = context(temp.path(), offline_config(), BuildMode::Development);

        assert!(ImgTask.run(&ctx).await.unwrap_err().is_missing_asset());
    }
}
