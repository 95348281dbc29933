use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::instrument;

use assetline_core::{AssetCategory, BuildContext, TaskError};
use assetline_tasks::{Work, WorkReport};

use super::read_string;
use crate::output::StagedOutput;
use crate::sources::{discover, relative_to, require_inputs};
use crate::transform::{split_front_matter, BuiltinRenderer, TemplateRenderer};

const VIEWS_PATTERN: &str = "**/*.html";

/// Render page templates into the site root
#[derive(Default)]
pub struct HtmlTask {
    renderer: Option<Arc<dyn TemplateRenderer>>,
}

impl HtmlTask {
    /// Render with a custom template engine instead of the built-in one
    pub fn with_renderer(renderer: Arc<dyn TemplateRenderer>) -> Self {
        Self {
            renderer: Some(renderer),
        }
    }
}

/// Values every page sees; page front matter overrides them
fn base_data(ctx: &BuildContext) -> Map<String, Value> {
    let config = ctx.config();
    let mut data: Map<String, Value> = config
        .templates
        .data
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    data.insert("asset_path".to_string(), json!(config.paths.asset_path));
    data.insert("mode".to_string(), json!(ctx.mode().as_str()));
    data.insert(
        "project".to_string(),
        json!({
            "name": config.project.name,
            "description": config.project.description,
            "version": config.project.version,
            "author": config.project.author,
        }),
    );
    data
}

#[async_trait]
impl Work for HtmlTask {
    #[instrument(skip_all, fields(task = "html"))]
    async fn run(&self, ctx: &BuildContext) -> Result<WorkReport, TaskError> {
        let mapping = &ctx.paths().html;
        let views = mapping.source.join(&ctx.config().templates.views);

        let files = discover(&views, VIEWS_PATTERN, &[])?;
        let files = require_inputs(files, AssetCategory::Html, &views, VIEWS_PATTERN)?;

        let builtin;
        let renderer: &dyn TemplateRenderer = match &self.renderer {
            Some(r) => r.as_ref(),
            None => {
                builtin = BuiltinRenderer::new(&mapping.source);
                &builtin
            }
        };

        let shared = base_data(ctx);
        let mut staged = StagedOutput::new();
        for file in &files {
            let source = read_string(file).await?;
            let page = split_front_matter(&source, file)?;

            let mut data = shared.clone();
            data.extend(page.data);
            let html = renderer.render(page.body, file, &Value::Object(data))?;

            staged.stage(mapping.destination.join(relative_to(file, &views)), html);
        }

        Ok(WorkReport::with_outputs(staged.commit()?))
    }
}
