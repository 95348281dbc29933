//! Assetline Tasks - Task graph runner
//!
//! This crate registers named units of build work, validates their
//! prerequisite graph, and executes targets or sequences of targets with
//! deduplication, concurrency within a set, and non-fatal error reporting.

pub mod dag;
pub mod notify;
pub mod reporter;
pub mod scheduler;
pub mod task;

pub use dag::{GraphError, TaskGraph, TaskGraphBuilder, TaskNode};
pub use notify::{CollectingSink, LogSink, Notification, NotificationSink};
pub use reporter::{
    CollectingReporter, NotifyingReporter, TaskEvent, TaskReporter, TaskReporterRegistry,
    TracingReporter,
};
pub use scheduler::{RunSummary, SchedulerOptions, Step, TaskResult, TaskScheduler, TaskStatus};
pub use task::{work_fn, TaskId, Work, WorkReport};
