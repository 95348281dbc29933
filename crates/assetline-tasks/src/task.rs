//! Task types and definitions

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use assetline_core::{BuildContext, TaskError};

/// Typed handle to a registered task.
///
/// Handles are only produced by the graph builder, so a `TaskId` always refers
/// to a task that exists in the graph it came from.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct TaskId(pub(crate) usize);

impl TaskId {
    /// Position of the task in its graph
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a unit of work produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkReport {
    /// Files written to the destination tree
    pub outputs: Vec<PathBuf>,
    /// Non-fatal problems worth surfacing
    pub warnings: Vec<String>,
}

impl WorkReport {
    /// Report for a set of written files
    pub fn with_outputs(outputs: Vec<PathBuf>) -> Self {
        Self {
            outputs,
            warnings: Vec::new(),
        }
    }

    /// Add a warning
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// A unit of build work
#[async_trait]
pub trait Work: Send + Sync {
    /// Execute the work for the given run
    async fn run(&self, ctx: &BuildContext) -> Result<WorkReport, TaskError>;
}

/// Adapter turning an async closure into [`Work`]
pub struct FnWork<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Work for FnWork<F>
where
    F: Fn(BuildContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<WorkReport, TaskError>> + Send + 'static,
{
    async fn run(&self, ctx: &BuildContext) -> Result<WorkReport, TaskError> {
        (self.f)(ctx.clone()).await
    }
}

/// Wrap an async closure as shareable work
pub fn work_fn<F, Fut>(f: F) -> Arc<dyn Work>
where
    F: Fn(BuildContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<WorkReport, TaskError>> + Send + 'static,
{
    Arc::new(FnWork { f })
}
