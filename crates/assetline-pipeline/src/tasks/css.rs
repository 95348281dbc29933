use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, instrument};

use assetline_core::config::StylesConfig;
use assetline_core::{AssetCategory, BuildContext, TaskError};
use assetline_tasks::{Work, WorkReport};

use super::read_string;
use crate::command::{run_command, Invocation};
use crate::output::StagedOutput;
use crate::sources::{discover, relative_to, require_inputs};
use crate::transform::{banner, css, split_source_map};

/// Compile stylesheets: compiler, vendor prefixes (minified in production),
/// rem fallbacks, then the banner
#[derive(Debug, Default)]
pub struct CssTask;

#[async_trait]
impl Work for CssTask {
    #[instrument(skip_all, fields(task = "css"))]
    async fn run(&self, ctx: &BuildContext) -> Result<WorkReport, TaskError> {
        let styles = &ctx.config().styles;
        let mapping = &ctx.paths().css;
        let pattern = format!("**/*.{}", styles.extension);

        let files = discover(&mapping.source, &pattern, &styles.exclude)?;
        let files = require_inputs(files, AssetCategory::Css, &mapping.source, &pattern)?;

        let targets = css::parse_targets(&styles.browsers)?;
        let header = styles
            .banner
            .then(|| banner(&ctx.config().project, Utc::now()));

        let mut staged = StagedOutput::new();
        for file in &files {
            let source = read_string(file).await?;

            let compiled = match &styles.compiler {
                Some(spec) => {
                    let invocation = Invocation::new(&mapping.source, ctx.root()).file(file);
                    let out = run_command(spec, &invocation, Some(source.as_bytes()), file).await?;
                    String::from_utf8_lossy(&out).into_owned()
                }
                None => source,
            };

            let output = if ctx.mode().is_production() {
                finish(css::minify(&compiled, file, targets)?, styles, header.as_deref())
            } else if split_source_map(&compiled).1.is_some() {
                // Line positions must match the compiler's map
                debug!(source = %file.display(), "keeping mapped output as compiled");
                compiled
            } else {
                finish(css::prefix(&compiled, file, targets)?, styles, header.as_deref())
            };

            let target = mapping
                .destination
                .join(relative_to(file, &mapping.source))
                .with_extension("css");
            debug!(source = %file.display(), target = %target.display(), "compiled");
            staged.stage(target, output);
        }

        Ok(WorkReport::with_outputs(staged.commit()?))
    }
}

/// rem fallbacks, then the banner
fn finish(output: String, styles: &StylesConfig, header: Option<&str>) -> String {
    let mut output = if styles.rem_fallback {
        css::rem_fallback(&output, styles.root_font_size)
    } else {
        output
    };
    if let Some(header) = header {
        output.insert_str(0, header);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    use assetline_core::BuildMode;
    use assetline_core::config::CommandSpec;

    use crate::tasks::testing::{context, offline_config, write};

    fn site() -> TempDir {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "src/scss/main.css",
            ".nav {\n  user-select: none;\n  color: #ff0000;\n}\n",
        );
        write(temp.path(), "src/scss/_partial.css", "a { color: blue; }");
        write(temp.path(), "src/scss/kss/guide.css", "a { color: blue; }");
        temp
    }

    #[tokio::test]
    async fn test_plain_css_compiles_to_destination() {
        let temp = site();
        let ctx = context(temp.path(), offline_config(), BuildMode::Development);

        let report = CssTask.run(&ctx).await.unwrap();

        let out = temp.path().join("build/static/css/main.css");
        assert_eq!(report.outputs, vec![out.clone()]);
        let css = fs::read_to_string(out).unwrap();
        assert!(css.contains("-webkit-user-select"));
        assert!(!temp.path().join("build/static/css/_partial.css").exists());
        assert!(!temp.path().join("build/static/css/kss").exists());
    }

    #[tokio::test]
    async fn test_compile_is_idempotent() {
        let temp = site();
        let ctx = context(temp.path(), offline_config(), BuildMode::Development);
        let out = temp.path().join("build/static/css/main.css");

        CssTask.run(&ctx).await.unwrap();
        let first = fs::read(&out).unwrap();
        CssTask.run(&ctx).await.unwrap();
        assert_eq!(first, fs::read(&out).unwrap());
    }

    #[tokio::test]
    async fn test_production_is_smaller_and_has_no_source_map() {
        let temp = site();
        write(
            temp.path(),
            "src/scss/main.css",
            ".nav {\n  color: #ff0000;\n}\n/*# sourceMappingURL=data:application/json;base64,e30= */\n",
        );

        let dev = context(temp.path(), offline_config(), BuildMode::Development);
        CssTask.run(&dev).await.unwrap();
        let prod = context(temp.path(), offline_config(), BuildMode::Production);
        CssTask.run(&prod).await.unwrap();

        let dev_css = fs::read_to_string(temp.path().join("build/static/css/main.css")).unwrap();
        let prod_css = fs::read_to_string(temp.path().join("deploy/static/css/main.css")).unwrap();
        assert!(dev_css.contains("sourceMappingURL"));
        assert!(!prod_css.contains("sourceMappingURL"));
        assert!(prod_css.len() <= dev_css.len());
    }

    #[tokio::test]
    async fn test_development_keeps_mapped_output_lines() {
        let temp = site();
        let compiled = "/* header */\n\n\na { color: red }\na { background: blue }\n/*# sourceMappingURL=data:application/json;base64,e30= */\n";
        write(temp.path(), "src/scss/main.css", compiled);
        let mut config = offline_config();
        config.styles.banner = true;
        let ctx = context(temp.path(), config, BuildMode::Development);

        CssTask.run(&ctx).await.unwrap();
        let css = fs::read_to_string(temp.path().join("build/static/css/main.css")).unwrap();
        assert_eq!(css, compiled);
    }

    #[tokio::test]
    async fn test_rem_fallback_in_both_modes() {
        let temp = site();
        write(temp.path(), "src/scss/main.css", ".nav {\n  padding: 1rem;\n}\n");

        for mode in [BuildMode::Development, BuildMode::Production] {
            let ctx = context(temp.path(), offline_config(), mode);
            CssTask.run(&ctx).await.unwrap();
        }

        let dev = fs::read_to_string(temp.path().join("build/static/css/main.css")).unwrap();
        assert!(dev.contains("padding: 16px;\n  padding: 1rem;"));
        let prod = fs::read_to_string(temp.path().join("deploy/static/css/main.css")).unwrap();
        assert!(prod.contains("padding:16px;padding:1rem"));
    }

    #[tokio::test]
    async fn test_rem_fallback_can_be_disabled() {
        let temp = site();
        write(temp.path(), "src/scss/main.css", ".nav { padding: 1rem; }");
        let mut config = offline_config();
        config.styles.rem_fallback = false;
        let ctx = context(temp.path(), config, BuildMode::Development);

        CssTask.run(&ctx).await.unwrap();
        let css = fs::read_to_string(temp.path().join("build/static/css/main.css")).unwrap();
        assert!(!css.contains("px"));
    }

    #[tokio::test]
    async fn test_banner_prepended() {
        let temp = site();
        let mut config = offline_config();
        config.styles.banner = true;
        config.project.name = "conventions".to_string();
        let ctx = context(temp.path(), config, BuildMode::Development);

        CssTask.run(&ctx).await.unwrap();
        let css = fs::read_to_string(temp.path().join("build/static/css/main.css")).unwrap();
        assert!(css.starts_with("/*!\n * @name conventions"));
    }

    #[tokio::test]
    async fn test_no_sources_is_missing_asset() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path(), offline_config(), BuildMode::Development);

        let err = CssTask.run(&ctx).await.unwrap_err();
        assert!(err.is_missing_asset());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_rejected_source_is_syntax_error_and_writes_nothing() {
        let temp = site();
        write(temp.path(), "src/scss/other.css", "b { color: green; }");
        let mut config = offline_config();
        config.styles.compiler = Some(CommandSpec::new(
            "sh",
            &["-c", "case {file} in *main*) echo 'Undefined variable' >&2; exit 1;; *) cat;; esac"],
        ));
        let ctx = context(temp.path(), config, BuildMode::Development);

        let err = CssTask.run(&ctx).await.unwrap_err();
        assert_eq!(err.kind(), "source-syntax");
        assert!(err.to_string().contains("Undefined variable"));
        // other.css compiled fine but the task is all-or-nothing
        assert!(!temp.path().join("build/static/css/other.css").exists());
    }
}
