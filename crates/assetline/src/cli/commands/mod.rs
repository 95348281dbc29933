//! CLI commands

mod artefacts;
mod compile;
mod init;
mod integrity;
mod plan;
mod run;
mod serve;
mod watch;

pub use artefacts::ArtefactsCommand;
pub use compile::CompileCommand;
pub use init::InitCommand;
pub use integrity::IntegrityCommand;
pub use plan::PlanCommand;
pub use run::RunCommand;
pub use serve::ServeCommand;
pub use watch::WatchCommand;

use console::style;

use assetline_core::BuildContext;
use assetline_tasks::{RunSummary, Step, TaskGraph, TaskScheduler, TaskStatus};

use crate::cli::{CliError, Cli, OutputFormat};

/// Run `steps` and report the outcome; failed tasks become [`CliError::TasksFailed`]
pub(crate) async fn run_steps(
    cli: &Cli,
    scheduler: &TaskScheduler,
    graph: &TaskGraph,
    steps: &[Step],
    ctx: &BuildContext,
) -> anyhow::Result<RunSummary> {
    let summary = scheduler.run_sequence(graph, steps, ctx).await;
    report_summary(cli, &summary)?;

    let failed = summary.failed().len();
    if failed > 0 {
        return Err(CliError::TasksFailed {
            failed,
            total: summary.results.len(),
        }
        .into());
    }
    Ok(summary)
}

fn report_summary(cli: &Cli, summary: &RunSummary) -> anyhow::Result<()> {
    if cli.format == OutputFormat::Json {
        let json = serde_json::json!({
            "total": summary.results.len(),
            "succeeded": summary.results.iter().filter(|r| r.status.is_success()).count(),
            "failed": summary.failed().len(),
            "duration_ms": summary.duration.as_millis(),
            "tasks": summary.results.iter().map(|r| {
                serde_json::json!({
                    "name": r.name,
                    "status": r.status.label(),
                    "duration_ms": r.duration.as_millis(),
                    "outputs": r.outputs,
                })
            }).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    let failed = summary.failed();
    if !failed.is_empty() && !cli.quiet {
        println!();
        println!(
            "  {} {}/{} tasks failed:",
            style("✗").red().bold(),
            failed.len(),
            summary.results.len()
        );
        for r in &failed {
            if let TaskStatus::Failed(ref err) = r.status {
                println!("    {} {}: {}", style("✗").red(), r.name, err);
            }
        }
    }
    Ok(())
}
