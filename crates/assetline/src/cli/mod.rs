//! CLI definition and command handling

pub mod commands;
pub mod output;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::debug;

use assetline_core::config::{load_config, load_config_or_default};
use assetline_core::{BuildContext, BuildMode, Config};
use assetline_tasks::{
    LogSink, NotificationSink, NotifyingReporter, SchedulerOptions, TaskReporter,
    TaskReporterRegistry, TaskScheduler, TracingReporter,
};

use commands::{
    ArtefactsCommand, CompileCommand, InitCommand, IntegrityCommand, PlanCommand, RunCommand,
    ServeCommand, WatchCommand,
};
use output::{ConsoleNotifier, ConsoleReporter};

/// Assetline - Front-end build orchestrator
#[derive(Debug, Parser)]
#[command(name = "assetline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    /// Configuration file (default: search upwards from the working directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Build mode
    #[arg(long, global = true, env = "ASSETLINE_MODE", default_value = "development")]
    pub mode: BuildMode,

    /// Shorthand for `--mode production`
    #[arg(long, global = true)]
    pub production: bool,

    /// Stop at the first failed task
    #[arg(long, global = true)]
    pub fail_fast: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Clean, then build every asset category
    Compile(CompileCommand),

    /// Build, serve the site and rebuild on changes
    Serve(ServeCommand),

    /// Build and rebuild on changes without serving
    Watch(WatchCommand),

    /// Same as `serve`
    Default(ServeCommand),

    /// Run one task and its prerequisites
    Run(RunCommand),

    /// Show the execution plan for a task
    Plan(PlanCommand),

    /// Write the subresource integrity manifest
    Integrity(IntegrityCommand),

    /// Zip the build output for deployment
    Artefacts(ArtefactsCommand),

    /// Write a starter configuration file
    Init(InitCommand),
}

/// Failures that map to a dedicated exit code
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{failed} of {total} tasks failed")]
    TasksFailed { failed: usize, total: usize },
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> anyhow::Result<()> {
        // Change to specified directory if provided
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        match self.command {
            Some(Commands::Compile(ref cmd)) => cmd.execute(&self),
            Some(Commands::Serve(ref cmd)) | Some(Commands::Default(ref cmd)) => cmd.execute(&self),
            Some(Commands::Watch(ref cmd)) => cmd.execute(&self),
            Some(Commands::Run(ref cmd)) => cmd.execute(&self),
            Some(Commands::Plan(ref cmd)) => cmd.execute(&self),
            Some(Commands::Integrity(ref cmd)) => cmd.execute(&self),
            Some(Commands::Artefacts(ref cmd)) => cmd.execute(&self),
            Some(Commands::Init(ref cmd)) => cmd.execute(&self),
            None => ServeCommand::default().execute(&self),
        }
    }

    /// The build mode for this invocation
    pub fn build_mode(&self) -> BuildMode {
        if self.production {
            BuildMode::Production
        } else {
            self.mode
        }
    }

    /// Load the configuration and the project root it applies to.
    ///
    /// An explicit `--config` must exist; otherwise a missing file falls back
    /// to defaults rooted at the working directory.
    pub fn load_config(&self) -> anyhow::Result<(Config, PathBuf)> {
        let cwd = std::env::current_dir()?;

        if let Some(path) = &self.config {
            let path = if path.is_absolute() {
                path.clone()
            } else {
                cwd.join(path)
            };
            let config = load_config(&path)?;
            return Ok((config, project_root(&path, &cwd)));
        }

        let (config, path) = load_config_or_default(&cwd)?;
        if path.is_none() && self.is_text() {
            output::warning("No assetline config found, using defaults");
        }
        let root = path
            .as_deref()
            .map(|p| project_root(p, &cwd))
            .unwrap_or(cwd);
        Ok((config, root))
    }

    /// Build context for `mode`
    pub fn context_for(&self, mode: BuildMode) -> anyhow::Result<BuildContext> {
        let (config, root) = self.load_config()?;
        debug!(root = %root.display(), mode = %mode, "build context");
        Ok(BuildContext::new(root, config, mode))
    }

    /// Build context for the active mode
    pub fn context(&self) -> anyhow::Result<BuildContext> {
        self.context_for(self.build_mode())
    }

    /// Scheduler wired to the console (or tracing when quiet) and a
    /// notification sink for failures
    pub fn scheduler(&self, dry_run: bool) -> TaskScheduler {
        let options = SchedulerOptions {
            continue_on_error: !self.fail_fast,
            dry_run,
        };
        TaskScheduler::new(options, self.reporter())
    }

    fn reporter(&self) -> Arc<dyn TaskReporter> {
        let mut registry = TaskReporterRegistry::empty();
        let sink: Arc<dyn NotificationSink> = if self.quiet || self.format == OutputFormat::Json {
            registry.register(TracingReporter);
            Arc::new(LogSink)
        } else {
            registry.register(ConsoleReporter::new(self.verbose));
            Arc::new(ConsoleNotifier)
        };
        registry.register(NotifyingReporter::new(sink));
        Arc::new(registry)
    }

    /// Whether human-readable progress should be printed
    pub fn is_text(&self) -> bool {
        !self.quiet && self.format == OutputFormat::Text
    }
}

fn project_root(config_path: &Path, fallback: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| fallback.to_path_buf())
}

/// Single-threaded runtime the commands block on
pub fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_defaults_to_serve() {
        let cli = Cli::try_parse_from(["assetline"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.build_mode(), BuildMode::Development);
    }

    #[test]
    fn test_production_flag_overrides_mode() {
        let cli = Cli::try_parse_from(["assetline", "compile", "--production"]).unwrap();
        assert_eq!(cli.build_mode(), BuildMode::Production);

        let cli = Cli::try_parse_from(["assetline", "--mode", "prod", "compile"]).unwrap();
        assert_eq!(cli.build_mode(), BuildMode::Production);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(Cli::try_parse_from(["assetline", "--mode", "staging", "compile"]).is_err());
    }

    #[test]
    fn test_run_and_plan_arguments() {
        let cli = Cli::try_parse_from(["assetline", "run", "css", "--fail-fast"]).unwrap();
        assert!(cli.fail_fast);
        match cli.command {
            Some(Commands::Run(ref cmd)) => assert_eq!(cmd.task, "css"),
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from(["assetline", "plan", "--format", "json"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Some(Commands::Plan(ref cmd)) => assert_eq!(cmd.task, "compile"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_config_root_is_config_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("assetline.toml");
        std::fs::write(&path, "[project]\nname = \"site\"\n").unwrap();

        let args: Vec<std::ffi::OsString> = vec![
            "assetline".into(),
            "--config".into(),
            path.clone().into_os_string(),
            "compile".into(),
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let (config, root) = cli.load_config().unwrap();
        assert_eq!(config.project.name, "site");
        assert_eq!(root, temp.path());
    }
}
