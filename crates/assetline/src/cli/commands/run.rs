//! Run command

use clap::Args;
use console::style;

use assetline_pipeline::site_graph;

use super::run_steps;
use crate::cli::output;
use crate::cli::{runtime, Cli};

/// Run one task and its prerequisites
#[derive(Debug, Args)]
pub struct RunCommand {
    /// Task to run (e.g. css, js, html, compile)
    pub task: String,

    /// Show what would run without running it
    #[arg(long)]
    pub dry_run: bool,
}

impl RunCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        runtime()?.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = cli.context()?;
        let (graph, tasks) = site_graph()?;
        let target = graph.require(&self.task)?;

        if cli.is_text() {
            output::info(&format!("Running {} ({})", style(&self.task).bold(), ctx.mode()));
            println!();
        }

        let scheduler = cli.scheduler(self.dry_run);
        run_steps(cli, &scheduler, &graph, &tasks.steps_for(target), &ctx).await?;
        Ok(())
    }
}
