use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use assetline_core::config::CommandSpec;
use assetline_core::{AssetCategory, BuildContext, TaskError};
use assetline_tasks::{Work, WorkReport};

use super::{read, stage_copies};
use crate::command::{run_command, Invocation};
use crate::output::StagedOutput;
use crate::sources::{discover, relative_to, require_inputs};
use crate::transform::strip_source_map;

/// Bundle an entry point with the configured bundler
async fn bundle(ctx: &BuildContext, entry: &Path) -> Result<String, TaskError> {
    let source_dir = &ctx.paths().js.source;
    let spec = &ctx.config().scripts.bundler;
    let input = if spec.takes_path_argument() {
        None
    } else {
        Some(read(entry).await?)
    };
    let invocation = Invocation::new(source_dir, ctx.root()).entry(entry);
    let out = run_command(spec, &invocation, input.as_deref(), entry).await?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Minify `code`, or pass it through when no minifier is configured
async fn minify(
    ctx: &BuildContext,
    spec: Option<&CommandSpec>,
    code: String,
    file: &Path,
) -> Result<String, TaskError> {
    let Some(spec) = spec else {
        return Ok(code);
    };
    let source_dir = &ctx.paths().js.source;
    if !spec.takes_path_argument() {
        let invocation = Invocation::new(source_dir, ctx.root()).file(file);
        let out = run_command(spec, &invocation, Some(code.as_bytes()), file).await?;
        return Ok(String::from_utf8_lossy(&out).into_owned());
    }

    // A path-taking minifier reads the in-memory code from a scratch file
    let scratch = scratch_file(&code, file)?;
    let invocation = Invocation::new(source_dir, ctx.root())
        .entry(scratch.path())
        .file(scratch.path());
    let out = run_command(spec, &invocation, None, file).await?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

fn scratch_file(code: &str, file: &Path) -> Result<NamedTempFile, TaskError> {
    let suffix = file
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_else(|| ".js".to_string());
    let mut scratch = tempfile::Builder::new()
        .prefix("assetline-")
        .suffix(&suffix)
        .tempfile()
        .map_err(|e| TaskError::io(file.to_path_buf(), &e))?;
    scratch
        .write_all(code.as_bytes())
        .and_then(|()| scratch.flush())
        .map_err(|e| TaskError::io(file.to_path_buf(), &e))?;
    Ok(scratch)
}

fn require_entry(entry: &Path) -> Result<(), TaskError> {
    if entry.is_file() {
        Ok(())
    } else {
        Err(TaskError::missing(
            AssetCategory::Js.as_str(),
            entry.display().to_string(),
        ))
    }
}

/// `name.js` becomes `name.min.js`
fn min_name(path: &Path) -> PathBuf {
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => path.with_file_name(format!(
            "{}.min.{}",
            stem.to_string_lossy(),
            ext.to_string_lossy()
        )),
        _ => path.with_file_name(format!(
            "{}.min",
            path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()
        )),
    }
}

/// Bundle the main entry; production strips the source map and minifies
#[derive(Debug, Default)]
pub struct JsCoreTask;

#[async_trait]
impl Work for JsCoreTask {
    #[instrument(skip_all, fields(task = "js-core"))]
    async fn run(&self, ctx: &BuildContext) -> Result<WorkReport, TaskError> {
        let scripts = &ctx.config().scripts;
        let mapping = &ctx.paths().js;
        let entry = mapping.source.join(&scripts.entry);
        require_entry(&entry)?;

        let mut code = bundle(ctx, &entry).await?;
        if ctx.mode().is_production() {
            code = strip_source_map(&code);
            code = minify(ctx, scripts.minifier.as_ref(), code, &entry).await?;
        }

        let mut staged = StagedOutput::new();
        staged.stage(mapping.destination.join(relative_to(&entry, &mapping.source)), code);
        Ok(WorkReport::with_outputs(staged.commit()?))
    }
}

/// Minify every async script into `<name>.min.js`
#[derive(Debug, Default)]
pub struct JsAsyncTask;

#[async_trait]
impl Work for JsAsyncTask {
    #[instrument(skip_all, fields(task = "js-async"))]
    async fn run(&self, ctx: &BuildContext) -> Result<WorkReport, TaskError> {
        let scripts = &ctx.config().scripts;
        let mapping = &ctx.paths().js;
        let base = mapping.source.join(&scripts.async_dir);

        let files = discover(&base, "**/*", &[])?;
        let files = require_inputs(files, AssetCategory::Js, &base, "**/*")?;

        let mut staged = StagedOutput::new();
        for file in &files {
            let code = String::from_utf8_lossy(&read(file).await?).into_owned();
            let code = minify(ctx, scripts.minifier.as_ref(), code, file).await?;
            let target = mapping
                .destination
                .join(&scripts.async_dir)
                .join(min_name(relative_to(file, &base)));
            staged.stage(target, code);
        }
        Ok(WorkReport::with_outputs(staged.commit()?))
    }
}

/// Bundle and minify the polyfill entry into `async/polyfills.min.js`
#[derive(Debug, Default)]
pub struct JsPolyfillsTask;

#[async_trait]
impl Work for JsPolyfillsTask {
    #[instrument(skip_all, fields(task = "js-polyfills"))]
    async fn run(&self, ctx: &BuildContext) -> Result<WorkReport, TaskError> {
        let scripts = &ctx.config().scripts;
        let mapping = &ctx.paths().js;
        let entry = mapping.source.join(&scripts.polyfills_entry);
        require_entry(&entry)?;

        let code = strip_source_map(&bundle(ctx, &entry).await?);
        let code = minify(ctx, scripts.minifier.as_ref(), code, &entry).await?;

        let target = mapping
            .destination
            .join(&scripts.async_dir)
            .join("polyfills.min.js");
        debug!(target = %target.display(), "bundled polyfills");

        let mut staged = StagedOutput::new();
        staged.stage(target, code);
        Ok(WorkReport::with_outputs(staged.commit()?))
    }
}

/// Copy service worker scripts to the site root so their scope covers it
#[derive(Debug, Default)]
pub struct ServiceWorkerTask;

#[async_trait]
impl Work for ServiceWorkerTask {
    #[instrument(skip_all, fields(task = "sw"))]
    async fn run(&self, ctx: &BuildContext) -> Result<WorkReport, TaskError> {
        let base = ctx
            .paths()
            .js
            .source
            .join(&ctx.config().scripts.service_worker_dir);
        let files = discover(&base, "*.*", &[])?;
        let files = require_inputs(files, AssetCategory::Js, &base, "*.*")?;

        let staged = stage_copies(&files, &base, &ctx.paths().html.destination).await?;
        Ok(WorkReport::with_outputs(staged.commit()?))
    }
}
