//! Task execution reporting

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::notify::{Notification, NotificationSink};

/// Events emitted during task execution
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    /// A task is starting execution
    Started {
        task: String,
    },
    /// A task completed successfully
    Completed {
        task: String,
        duration: Duration,
        outputs: usize,
    },
    /// A task failed
    Failed {
        task: String,
        duration: Duration,
        kind: &'static str,
        error: String,
    },
    /// A task was not started (failed prerequisite, dry run, halted sequence)
    Skipped {
        task: String,
        reason: String,
    },
    /// A task finished but has something worth flagging
    Warning {
        task: String,
        message: String,
    },
    /// An execution wave is starting
    WaveStarted {
        wave: usize,
        task_count: usize,
    },
    /// All tasks of an invocation completed
    AllCompleted {
        total: usize,
        succeeded: usize,
        failed: usize,
        skipped: usize,
        duration: Duration,
    },
}

/// Trait for reporting task execution progress
pub trait TaskReporter: Send + Sync {
    /// Handle a task event
    fn report(&self, event: &TaskEvent);
}

/// Simple reporter that logs to tracing
#[derive(Debug, Default)]
pub struct TracingReporter;

impl TaskReporter for TracingReporter {
    fn report(&self, event: &TaskEvent) {
        match event {
            TaskEvent::Started { task } => {
                tracing::info!("Starting {}", task);
            }
            TaskEvent::Completed {
                task,
                duration,
                outputs,
            } => {
                tracing::info!(
                    "{} completed in {:.1}s ({} files)",
                    task,
                    duration.as_secs_f64(),
                    outputs
                );
            }
            TaskEvent::Failed {
                task,
                duration,
                kind,
                error,
            } => {
                tracing::error!(
                    kind,
                    "{} failed after {:.1}s: {}",
                    task,
                    duration.as_secs_f64(),
                    error
                );
            }
            TaskEvent::Skipped { task, reason } => {
                tracing::info!("{} skipped: {}", task, reason);
            }
            TaskEvent::Warning { task, message } => {
                tracing::warn!("{}: {}", task, message);
            }
            TaskEvent::WaveStarted { wave, task_count } => {
                tracing::debug!("Starting wave {} ({} tasks)", wave, task_count);
            }
            TaskEvent::AllCompleted {
                total,
                succeeded,
                failed,
                skipped,
                duration,
            } => {
                tracing::info!(
                    "All tasks complete: {}/{} succeeded, {} failed, {} skipped ({:.1}s)",
                    succeeded,
                    total,
                    failed,
                    skipped,
                    duration.as_secs_f64()
                );
            }
        }
    }
}

/// Reporter that collects events for later inspection (useful for testing)
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<TaskEvent>>,
}

impl CollectingReporter {
    /// Get all collected events
    pub fn events(&self) -> Vec<TaskEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Names of tasks that emitted a `Started` event, in order
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                TaskEvent::Started { task } => Some(task),
                _ => None,
            })
            .collect()
    }
}

impl TaskReporter for CollectingReporter {
    fn report(&self, event: &TaskEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Reporter forwarding every failure to a notification sink
pub struct NotifyingReporter {
    sink: Arc<dyn NotificationSink>,
}

impl NotifyingReporter {
    /// Create a reporter for a sink
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }
}

impl TaskReporter for NotifyingReporter {
    fn report(&self, event: &TaskEvent) {
        if let TaskEvent::Failed { task, error, .. } = event {
            self.sink.notify(&Notification::failure(task, error.clone()));
        }
    }
}

/// Registry of task reporters
pub struct TaskReporterRegistry {
    reporters: Vec<Arc<dyn TaskReporter>>,
}

impl TaskReporterRegistry {
    pub fn new() -> Self {
        Self {
            reporters: vec![Arc::new(TracingReporter)],
        }
    }

    pub fn empty() -> Self {
        Self {
            reporters: Vec::new(),
        }
    }

    pub fn register<R: TaskReporter + 'static>(&mut self, reporter: R) {
        self.reporters.push(Arc::new(reporter));
    }

    /// Register an already shared reporter
    pub fn register_shared(&mut self, reporter: Arc<dyn TaskReporter>) {
        self.reporters.push(reporter);
    }

    pub fn all(&self) -> &[Arc<dyn TaskReporter>] {
        &self.reporters
    }

    /// Broadcast an event to all registered reporters
    pub fn broadcast(&self, event: &TaskEvent) {
        for reporter in &self.reporters {
            reporter.report(event);
        }
    }
}

impl Default for TaskReporterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskReporter for TaskReporterRegistry {
    fn report(&self, event: &TaskEvent) {
        self.broadcast(event);
    }
}
