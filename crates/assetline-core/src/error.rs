//! Error types for Assetline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using AssetlineError
pub type Result<T> = std::result::Result<T, AssetlineError>;

/// Main error type for Assetline operations
#[derive(Debug, Error)]
pub enum AssetlineError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Task-related errors
    #[error(transparent)]
    Task(#[from] TaskError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AssetlineError {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced by a single unit of build work.
///
/// Every variant carries owned strings so results can be cloned into reporter
/// events and collected across a run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskError {
    /// A style, script or template source could not be processed
    #[error("Syntax error in {}: {message}", file.display())]
    SourceSyntax { file: PathBuf, message: String },

    /// A glob matched no files, or a required entry point is absent
    #[error("No {category} sources matched {pattern}")]
    MissingAsset { category: String, pattern: String },

    /// The destination could not be written
    #[error("Failed to write {}: {message}", path.display())]
    Write { path: PathBuf, message: String },

    /// An external tool could not be started
    #[error("Could not run {tool}: {message}")]
    Collaborator { tool: String, message: String },

    /// Any other filesystem failure
    #[error("IO error on {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    /// The unit of work panicked or was cancelled
    #[error("Task aborted: {0}")]
    Aborted(String),
}

impl TaskError {
    /// Build a syntax error for a source file
    pub fn syntax(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::SourceSyntax {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Build a missing-asset error
    pub fn missing(category: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::MissingAsset {
            category: category.into(),
            pattern: pattern.into(),
        }
    }

    /// Build a write error from an IO failure
    pub fn write(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Build a read/IO error from an IO failure
    pub fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Short machine-readable kind, used in reports and JSON output
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceSyntax { .. } => "source-syntax",
            Self::MissingAsset { .. } => "missing-asset",
            Self::Write { .. } => "write",
            Self::Collaborator { .. } => "collaborator",
            Self::Io { .. } => "io",
            Self::Aborted(_) => "aborted",
        }
    }

    /// Whether this error means "nothing to build" rather than a failure
    pub fn is_missing_asset(&self) -> bool {
        matches!(self, Self::MissingAsset { .. })
    }
}
