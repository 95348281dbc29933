//! Serve command (also the default)

use clap::Args;
use console::style;
use tracing::info;

use assetline_dev::{shutdown_signal, DevServer, ReloadHub};

use super::watch::WatchSession;
use crate::cli::{runtime, Cli};

/// Build, serve the site and rebuild on changes
#[derive(Debug, Default, Args)]
pub struct ServeCommand {
    /// Host to bind (overrides `serve.host`)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (overrides `serve.port`)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Do not inject the live-reload script
    #[arg(long)]
    pub no_reload: bool,

    /// Skip the initial compile
    #[arg(long)]
    pub no_compile: bool,
}

impl ServeCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        runtime()?.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let session = WatchSession::start(cli, !self.no_compile).await?;
        let serve = &session.ctx.config().serve;

        let hub = ReloadHub::default();
        let watch = session.watch_loop(cli, hub.clone())?;

        let host = self.host.as_deref().unwrap_or(&serve.host);
        let port = self.port.unwrap_or(serve.port);
        let server = DevServer::new(&session.ctx.paths().html.destination, host, port, hub)
            .live_reload(serve.live_reload && !self.no_reload);
        let listener = server.bind().await?;

        if cli.is_text() {
            let addr = listener
                .local_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| server.addr().to_string());
            println!();
            println!(
                "{} Serving {} at {}",
                style("✓").green().bold(),
                style(session.ctx.paths().html.destination.display()).cyan(),
                style(format!("http://{}", addr)).bold()
            );
            println!("  {}", style("Ctrl-C to stop").dim());
        }

        // Open event streams keep graceful shutdown waiting, so the signal
        // drops both futures instead
        tokio::select! {
            result = server.serve_on(listener, std::future::pending::<()>()) => result?,
            result = watch.run(std::future::pending::<()>()) => result?,
            _ = shutdown_signal() => info!("dev server stopped"),
        }
        Ok(())
    }
}
