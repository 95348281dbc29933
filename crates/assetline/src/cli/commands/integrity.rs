//! Integrity command

use clap::Args;

use assetline_core::BuildMode;
use assetline_pipeline::generate_manifest;

use crate::cli::{output, Cli, OutputFormat};

/// Hash the development script and stylesheet trees into the SRI manifest
#[derive(Debug, Args)]
pub struct IntegrityCommand {}

impl IntegrityCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        // Always the development tree, whatever --mode says
        let ctx = cli.context_for(BuildMode::Development)?;
        let (manifest, path) = generate_manifest(&ctx)?;

        if cli.format == OutputFormat::Json {
            print!("{}", manifest.to_json()?);
            return Ok(());
        }
        if cli.quiet {
            return Ok(());
        }

        if cli.verbose {
            for (asset, hash) in manifest.iter() {
                println!("{}", output::key_value(asset, hash));
            }
        }
        if manifest.is_empty() {
            output::warning("No scripts or stylesheets found; run `assetline compile` first");
        }
        output::success(&format!(
            "Wrote {} integrity hashes to {}",
            manifest.len(),
            output::path_style().apply_to(path.display())
        ));
        Ok(())
    }
}
