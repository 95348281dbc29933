//! Compile command

use clap::Args;
use console::style;

use assetline_pipeline::{compile_steps, site_graph};

use super::run_steps;
use crate::cli::output;
use crate::cli::{runtime, Cli};

/// Clean, then build every asset category
#[derive(Debug, Args)]
pub struct CompileCommand {
    /// Show what would run without running it
    #[arg(long)]
    pub dry_run: bool,
}

impl CompileCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        runtime()?.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = cli.context()?;
        let (graph, tasks) = site_graph()?;

        if cli.is_text() {
            output::info(&format!(
                "Compiling {} ({})",
                style(&ctx.config().project.name).bold(),
                ctx.mode()
            ));
            println!(
                "{}",
                output::key_value(
                    "output",
                    &output::path_style()
                        .apply_to(ctx.paths().output_root.display())
                        .to_string()
                )
            );
            println!();
        }

        let scheduler = cli.scheduler(self.dry_run);
        run_steps(cli, &scheduler, &graph, &compile_steps(&tasks), &ctx).await?;
        Ok(())
    }
}
