//! Watch command

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use console::style;
use tracing::{info, warn};

use assetline_core::BuildContext;
use assetline_dev::{default_rules, shutdown_signal, CompiledRules, Rebuilder, ReloadHub, WatchLoop};
use assetline_pipeline::{compile_steps, site_graph};
use assetline_tasks::{TaskGraph, TaskScheduler};

use super::run_steps;
use crate::cli::{output, runtime, Cli, CliError};

/// Build and rebuild on changes without serving
#[derive(Debug, Default, Args)]
pub struct WatchCommand {
    /// Skip the initial compile
    #[arg(long)]
    pub no_compile: bool,
}

impl WatchCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        runtime()?.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let session = WatchSession::start(cli, !self.no_compile).await?;
        let watch = session.watch_loop(cli, ReloadHub::default())?;

        if cli.is_text() {
            output::info(&format!(
                "Watching {} (Ctrl-C to stop)",
                output::path_style().apply_to(session.ctx.root().display())
            ));
        }

        tokio::select! {
            result = watch.run(std::future::pending::<()>()) => result?,
            _ = shutdown_signal() => info!("watch stopped"),
        }
        Ok(())
    }
}

/// What `watch` and `serve` share: the graph, one scheduler and the context
pub(super) struct WatchSession {
    pub ctx: BuildContext,
    pub graph: Arc<TaskGraph>,
    pub scheduler: Arc<TaskScheduler>,
}

impl WatchSession {
    /// Load the project and optionally run the initial compile.
    ///
    /// A failed compile is reported but does not stop the session.
    pub async fn start(cli: &Cli, compile: bool) -> anyhow::Result<Self> {
        let ctx = cli.context()?;
        let (graph, tasks) = site_graph()?;
        let scheduler = Arc::new(cli.scheduler(false));

        if compile {
            match run_steps(cli, &scheduler, &graph, &compile_steps(&tasks), &ctx).await {
                Ok(_) => {}
                Err(e) if e.downcast_ref::<CliError>().is_some() => {
                    warn!("initial compile failed: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Self {
            ctx,
            graph: Arc::new(graph),
            scheduler,
        })
    }

    /// Watch loop over the default rules, broadcasting reloads on `hub`
    pub fn watch_loop(&self, cli: &Cli, hub: ReloadHub) -> anyhow::Result<WatchLoop> {
        let config = self.ctx.config();
        let rules = CompiledRules::compile(
            &default_rules(&config.paths.source),
            &self.graph,
            self.ctx.root(),
        )?;
        if cli.verbose && cli.is_text() {
            println!("  {} {} watch rules", style("─").dim(), rules.len());
        }

        let rebuilder = Rebuilder::new(
            self.graph.clone(),
            self.scheduler.clone(),
            self.ctx.clone(),
            hub,
        );
        Ok(WatchLoop::new(
            rules,
            rebuilder,
            Duration::from_millis(config.serve.debounce_ms),
        ))
    }
}
