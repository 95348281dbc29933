//! Assetline Core - Core library for the front-end build pipeline
//!
//! This crate provides the foundational types, error taxonomy, configuration
//! and path resolution shared by the task runner, the asset tasks and the
//! development server.

pub mod config;
pub mod context;
pub mod error;
pub mod mode;
pub mod paths;

pub use config::Config;
pub use context::BuildContext;
pub use error::{AssetlineError, ConfigError, Result, TaskError};
pub use mode::{AssetCategory, BuildMode};
pub use paths::{PathMapping, PathResolver, ResolvedPaths};
