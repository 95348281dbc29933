//! Artefacts command

use clap::Args;

use assetline_pipeline::build_archive;

use crate::cli::{output, Cli, OutputFormat};

/// Zip the build output tree of the active mode
#[derive(Debug, Args)]
pub struct ArtefactsCommand {}

impl ArtefactsCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = cli.context()?;
        let report = build_archive(&ctx)?;

        if cli.format == OutputFormat::Json {
            let json = serde_json::json!({
                "path": report.path,
                "entries": report.entries,
                "bytes": report.bytes,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
            return Ok(());
        }
        if cli.quiet {
            return Ok(());
        }

        if report.entries == 0 {
            output::warning(&format!(
                "Nothing under {}; the archive is empty",
                ctx.paths().output_root.display()
            ));
        }
        output::success(&format!(
            "Archived {} files ({} bytes) to {}",
            report.entries,
            report.bytes,
            output::path_style().apply_to(report.path.display())
        ));
        Ok(())
    }
}
