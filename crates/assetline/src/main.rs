//! Assetline CLI - Front-end build orchestrator

use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

mod cli;
mod exit_codes;

use assetline_core::AssetlineError;
use assetline_dev::ServeError;
use cli::{output, Cli, CliError};

fn main() {
    let cli = Cli::parse();
    let guard = init_tracing(cli.verbose);

    let code = match cli.execute() {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            output::error(&format!("{:#}", e));
            exit_code(&e)
        }
    };

    // Flush buffered file logs before exiting
    drop(guard);
    std::process::exit(code);
}

fn exit_code(error: &anyhow::Error) -> i32 {
    if error.downcast_ref::<CliError>().is_some() {
        exit_codes::TASK_FAILED
    } else if let Some(AssetlineError::Config(_)) = error.downcast_ref::<AssetlineError>() {
        exit_codes::CONFIG_ERROR
    } else if error.downcast_ref::<ServeError>().is_some() {
        exit_codes::SERVE_ERROR
    } else {
        exit_codes::ERROR
    }
}

/// Initialize tracing with console output and a JSON file log.
///
/// Console is filtered by `RUST_LOG` (or `warn`, `info` with `-v`); the file
/// always records debug and above.
fn init_tracing(verbose: bool) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let default_level = if verbose { "info" } else { "warn" };
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let console_layer = fmt::layer()
        .with_target(false)
        .with_filter(console_filter);

    let log_dir = log_directory();

    match log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(&dir, "assetline.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let file_layer = fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_target(true)
                .with_filter(EnvFilter::new("debug"));

            tracing_subscriber::registry()
                .with(console_layer)
                .with(file_layer)
                .init();

            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(console_layer).init();
            None
        }
    }
}

/// `~/.assetline/logs`, created on demand
fn log_directory() -> Option<std::path::PathBuf> {
    let dir = dirs::home_dir()?.join(".assetline").join("logs");
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}
