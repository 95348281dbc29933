//! Task scheduler: runs targets and sequences of targets over a task graph

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, instrument};

use assetline_core::{BuildContext, TaskError};

use crate::dag::TaskGraph;
use crate::reporter::{TaskEvent, TaskReporter};
use crate::task::{TaskId, Work};

/// Task execution status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Task completed and wrote its outputs
    Success,
    /// Task had no inputs; treated as success
    NothingToDo(String),
    /// Task failed
    Failed(TaskError),
    /// Task was never started
    Skipped(String),
}

impl TaskStatus {
    /// Check if this status is a terminal success state
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success | Self::NothingToDo(_))
    }

    /// Short label for summaries
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NothingToDo(_) => "nothing-to-do",
            Self::Failed(_) => "failed",
            Self::Skipped(_) => "skipped",
        }
    }
}

/// Result of a single task execution
#[derive(Debug, Clone)]
pub struct TaskResult {
    /// Task that was executed
    pub id: TaskId,
    /// Task name
    pub name: String,
    /// Final status
    pub status: TaskStatus,
    /// How long the task took
    pub duration: Duration,
    /// Number of files written
    pub outputs: usize,
}

impl TaskResult {
    fn skipped(id: TaskId, name: &str, reason: impl Into<String>) -> Self {
        Self {
            id,
            name: name.to_string(),
            status: TaskStatus::Skipped(reason.into()),
            duration: Duration::ZERO,
            outputs: 0,
        }
    }
}

/// One element of a sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A sequential barrier: this task (and its prerequisites) completes
    /// before the next step starts
    Task(TaskId),
    /// A concurrent set: members run with no ordering among them, and the
    /// step completes when every member has completed
    Parallel(Vec<TaskId>),
}

impl Step {
    /// Tasks this step asks for
    pub fn targets(&self) -> Vec<TaskId> {
        match self {
            Self::Task(id) => vec![*id],
            Self::Parallel(ids) => ids.clone(),
        }
    }
}

/// Options for the task scheduler
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// Keep running later waves and steps after a failure
    pub continue_on_error: bool,
    /// Report the plan without executing any work
    pub dry_run: bool,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            continue_on_error: true,
            dry_run: false,
        }
    }
}

/// Outcome of one scheduler invocation
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Results in completion order
    pub results: Vec<TaskResult>,
    /// Wall time of the invocation
    pub duration: Duration,
}

impl RunSummary {
    /// Whether every task reached a terminal success state
    pub fn is_success(&self) -> bool {
        self.results.iter().all(|r| r.status.is_success())
    }

    /// Results of failed tasks
    pub fn failed(&self) -> Vec<&TaskResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.status, TaskStatus::Failed(_)))
            .collect()
    }

    /// Look up a result by task name
    pub fn get(&self, name: &str) -> Option<&TaskResult> {
        self.results.iter().find(|r| r.name == name)
    }
}

/// Bookkeeping for one invocation; a task runs at most once per state
#[derive(Default)]
struct RunState {
    results: HashMap<TaskId, TaskResult>,
    order: Vec<TaskId>,
    failed: bool,
}

impl RunState {
    fn record(&mut self, result: TaskResult) {
        if matches!(result.status, TaskStatus::Failed(_)) {
            self.failed = true;
        }
        self.order.push(result.id);
        self.results.insert(result.id, result);
    }

    fn done(&self) -> HashSet<TaskId> {
        self.results.keys().copied().collect()
    }

    fn into_summary(mut self, duration: Duration) -> RunSummary {
        let results = self
            .order
            .iter()
            .filter_map(|id| self.results.remove(id))
            .collect();
        RunSummary { results, duration }
    }
}

/// Task scheduler: executes graph targets with prerequisite ordering
pub struct TaskScheduler {
    options: SchedulerOptions,
    reporter: Arc<dyn TaskReporter>,
}

impl TaskScheduler {
    /// Create a new scheduler
    pub fn new(options: SchedulerOptions, reporter: Arc<dyn TaskReporter>) -> Self {
        Self { options, reporter }
    }

    /// Run one target, after its prerequisites
    pub async fn run(&self, graph: &TaskGraph, target: TaskId, ctx: &BuildContext) -> RunSummary {
        self.run_sequence(graph, &[Step::Task(target)], ctx).await
    }

    /// Run a set of targets concurrently, after their prerequisites
    pub async fn run_many(
        &self,
        graph: &TaskGraph,
        targets: &[TaskId],
        ctx: &BuildContext,
    ) -> RunSummary {
        self.run_sequence(graph, &[Step::Parallel(targets.to_vec())], ctx)
            .await
    }

    /// Run a sequence of barriers and concurrent sets.
    ///
    /// A shared prerequisite runs at most once across the whole sequence.
    #[instrument(skip_all, fields(steps = steps.len(), mode = %ctx.mode()))]
    pub async fn run_sequence(
        &self,
        graph: &TaskGraph,
        steps: &[Step],
        ctx: &BuildContext,
    ) -> RunSummary {
        let start = Instant::now();
        let mut state = RunState::default();

        for step in steps {
            if state.failed && !self.options.continue_on_error {
                for id in graph.closure(&step.targets()) {
                    if !state.results.contains_key(&id) {
                        let result =
                            TaskResult::skipped(id, graph.name(id), "an earlier step failed");
                        self.report_skipped(&result);
                        state.record(result);
                    }
                }
                continue;
            }

            self.execute_step(graph, &step.targets(), ctx, &mut state)
                .await;
        }

        let summary = state.into_summary(start.elapsed());
        self.report_summary(&summary);
        summary
    }

    async fn execute_step(
        &self,
        graph: &TaskGraph,
        targets: &[TaskId],
        ctx: &BuildContext,
        state: &mut RunState,
    ) {
        let waves = graph.waves(targets, &state.done());

        for (wave_idx, wave) in waves.iter().enumerate() {
            if state.failed && !self.options.continue_on_error {
                for id in wave {
                    let result = TaskResult::skipped(*id, graph.name(*id), "an earlier task failed");
                    self.report_skipped(&result);
                    state.record(result);
                }
                continue;
            }

            self.reporter.report(&TaskEvent::WaveStarted {
                wave: wave_idx,
                task_count: wave.len(),
            });

            let mut handles = Vec::new();

            for id in wave {
                let node = graph.get(*id);

                let blocker = node.prerequisites.iter().find(|dep| {
                    state
                        .results
                        .get(dep)
                        .map_or(true, |r| !r.status.is_success())
                });
                if let Some(dep) = blocker {
                    let result = TaskResult::skipped(
                        *id,
                        &node.name,
                        format!("prerequisite '{}' did not succeed", graph.name(*dep)),
                    );
                    self.report_skipped(&result);
                    state.record(result);
                    continue;
                }

                if self.options.dry_run {
                    let result = TaskResult::skipped(*id, &node.name, "dry run");
                    self.report_skipped(&result);
                    state.record(result);
                    continue;
                }

                let Some(work) = node.work.clone() else {
                    // Groups complete as soon as their members have
                    self.reporter.report(&TaskEvent::Completed {
                        task: node.name.clone(),
                        duration: Duration::ZERO,
                        outputs: 0,
                    });
                    state.record(TaskResult {
                        id: *id,
                        name: node.name.clone(),
                        status: TaskStatus::Success,
                        duration: Duration::ZERO,
                        outputs: 0,
                    });
                    continue;
                };

                let task_id = *id;
                let name = node.name.clone();
                let ctx = ctx.clone();
                let reporter = self.reporter.clone();

                let handle = tokio::spawn(async move {
                    execute_task(task_id, name, work, &ctx, &*reporter).await
                });
                handles.push((*id, node.name.clone(), handle));
            }

            // Collect results from this wave
            for (id, name, handle) in handles {
                match handle.await {
                    Ok(result) => state.record(result),
                    Err(e) => {
                        let error = TaskError::Aborted(e.to_string());
                        self.reporter.report(&TaskEvent::Failed {
                            task: name.clone(),
                            duration: Duration::ZERO,
                            kind: error.kind(),
                            error: error.to_string(),
                        });
                        state.record(TaskResult {
                            id,
                            name,
                            status: TaskStatus::Failed(error),
                            duration: Duration::ZERO,
                            outputs: 0,
                        });
                    }
                }
            }
        }
    }

    fn report_skipped(&self, result: &TaskResult) {
        if let TaskStatus::Skipped(reason) = &result.status {
            self.reporter.report(&TaskEvent::Skipped {
                task: result.name.clone(),
                reason: reason.clone(),
            });
        }
    }

    fn report_summary(&self, summary: &RunSummary) {
        let total = summary.results.len();
        let succeeded = summary
            .results
            .iter()
            .filter(|r| r.status.is_success())
            .count();
        let failed = summary.failed().len();
        let skipped = summary
            .results
            .iter()
            .filter(|r| matches!(r.status, TaskStatus::Skipped(_)))
            .count();

        self.reporter.report(&TaskEvent::AllCompleted {
            total,
            succeeded,
            failed,
            skipped,
            duration: summary.duration,
        });
    }
}

/// Execute a single task
async fn execute_task(
    id: TaskId,
    name: String,
    work: Arc<dyn Work>,
    ctx: &BuildContext,
    reporter: &dyn TaskReporter,
) -> TaskResult {
    let start = Instant::now();
    reporter.report(&TaskEvent::Started { task: name.clone() });

    let outcome = work.run(ctx).await;
    let duration = start.elapsed();

    match outcome {
        Ok(report) => {
            for message in &report.warnings {
                reporter.report(&TaskEvent::Warning {
                    task: name.clone(),
                    message: message.clone(),
                });
            }
            reporter.report(&TaskEvent::Completed {
                task: name.clone(),
                duration,
                outputs: report.outputs.len(),
            });
            TaskResult {
                id,
                name,
                status: TaskStatus::Success,
                duration,
                outputs: report.outputs.len(),
            }
        }
        Err(err) if err.is_missing_asset() => {
            debug!(task = %name, "no inputs, nothing to do");
            reporter.report(&TaskEvent::Warning {
                task: name.clone(),
                message: err.to_string(),
            });
            reporter.report(&TaskEvent::Completed {
                task: name.clone(),
                duration,
                outputs: 0,
            });
            TaskResult {
                id,
                name,
                status: TaskStatus::NothingToDo(err.to_string()),
                duration,
                outputs: 0,
            }
        }
        Err(err) => {
            reporter.report(&TaskEvent::Failed {
                task: name.clone(),
                duration,
                kind: err.kind(),
                error: err.to_string(),
            });
            TaskResult {
                id,
                name,
                status: TaskStatus::Failed(err),
                duration,
                outputs: 0,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use assetline_core::{BuildMode, Config};

    use crate::dag::TaskGraphBuilder;
    use crate::notify::CollectingSink;
    use crate::reporter::{CollectingReporter, NotifyingReporter, TaskReporterRegistry};
    use crate::task::{work_fn, WorkReport};

    fn ctx() -> BuildContext {
        BuildContext::new("/site", Config::default(), BuildMode::Development)
    }

    /// Work that appends `label` to a shared log when it starts and finishes
    fn logged(log: &Arc<Mutex<Vec<String>>>, label: &'static str, delay_ms: u64) -> Arc<dyn Work> {
        let log = log.clone();
        work_fn(move |_ctx| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(format!("start:{}", label));
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                log.lock().unwrap().push(format!("end:{}", label));
                Ok(WorkReport::with_outputs(vec![label.into()]))
            }
        })
    }

    fn failing(message: &'static str) -> Arc<dyn Work> {
        work_fn(move |_ctx| async move { Err(TaskError::syntax("src/scss/main.scss", message)) })
    }

    fn position(log: &[String], entry: &str) -> usize {
        log.iter().position(|e| e == entry).unwrap()
    }

    #[test]
    fn test_task_status_is_success() {
        assert!(TaskStatus::Success.is_success());
        assert!(TaskStatus::NothingToDo("empty".to_string()).is_success());
        assert!(!TaskStatus::Failed(TaskError::Aborted("x".into())).is_success());
        assert!(!TaskStatus::Skipped("dry run".to_string()).is_success());
    }

    #[test]
    fn test_scheduler_options_default() {
        let opts = SchedulerOptions::default();
        assert!(opts.continue_on_error);
        assert!(!opts.dry_run);
    }

    #[tokio::test]
    async fn test_prerequisites_complete_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut builder = TaskGraphBuilder::new();
        builder.register("clean", logged(&log, "clean", 20), &[]).unwrap();
        let css = builder.register("css", logged(&log, "css", 0), &["clean"]).unwrap();
        let graph = builder.build().unwrap();

        let scheduler = TaskScheduler::new(
            SchedulerOptions::default(),
            Arc::new(CollectingReporter::default()),
        );
        let summary = scheduler.run(&graph, css, &ctx()).await;

        assert!(summary.is_success());
        let log = log.lock().unwrap();
        assert!(position(&log, "end:clean") < position(&log, "start:css"));
    }

    #[tokio::test]
    async fn test_shared_prerequisite_runs_once() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let mut builder = TaskGraphBuilder::new();
        builder
            .register(
                "clean",
                work_fn(move |_ctx| {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(WorkReport::default())
                    }
                }),
                &[],
            )
            .unwrap();
        let noop = || work_fn(|_ctx| async { Ok(WorkReport::default()) });
        let css = builder.register("css", noop(), &["clean"]).unwrap();
        let js = builder.register("js", noop(), &["clean"]).unwrap();
        let graph = builder.build().unwrap();

        let scheduler = TaskScheduler::new(
            SchedulerOptions::default(),
            Arc::new(CollectingReporter::default()),
        );
        let summary = scheduler
            .run_sequence(&graph, &[Step::Task(css), Step::Task(js)], &ctx())
            .await;

        assert!(summary.is_success());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(summary.results.len(), 3);
    }

    #[tokio::test]
    async fn test_sequence_barrier_and_concurrent_set() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut builder = TaskGraphBuilder::new();
        let clean = builder.register("clean", logged(&log, "clean", 10), &[]).unwrap();
        let js = builder.register("js", logged(&log, "js", 30), &[]).unwrap();
        let css = builder.register("css", logged(&log, "css", 5), &[]).unwrap();
        let img = builder.register("img", logged(&log, "img", 15), &[]).unwrap();
        let graph = builder.build().unwrap();

        let scheduler = TaskScheduler::new(
            SchedulerOptions::default(),
            Arc::new(CollectingReporter::default()),
        );
        let summary = scheduler
            .run_sequence(
                &graph,
                &[Step::Task(clean), Step::Parallel(vec![js, css, img])],
                &ctx(),
            )
            .await;

        assert!(summary.is_success());
        let log = log.lock().unwrap();
        let clean_end = position(&log, "end:clean");
        for member in ["js", "css", "img"] {
            assert!(clean_end < position(&log, &format!("start:{}", member)));
        }
        // Members of the set overlap: every one starts before the slowest ends
        let js_end = position(&log, "end:js");
        assert!(position(&log, "start:css") < js_end);
        assert!(position(&log, "start:img") < js_end);
    }

    #[tokio::test]
    async fn test_group_completes_after_every_member() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut builder = TaskGraphBuilder::new();
        for (name, delay) in [("js", 25), ("css", 5), ("img", 15), ("html", 0), ("fonts", 10)] {
            builder.register(name, logged(&log, name, delay), &[]).unwrap();
        }
        let compile = builder
            .group("compile", &["js", "css", "img", "html", "fonts"])
            .unwrap();
        let graph = builder.build().unwrap();

        let reporter = Arc::new(CollectingReporter::default());
        let scheduler = TaskScheduler::new(SchedulerOptions::default(), reporter.clone());
        let summary = scheduler.run(&graph, compile, &ctx()).await;

        assert!(summary.is_success());
        assert_eq!(log.lock().unwrap().len(), 10);

        let events = reporter.events();
        let compile_done = events
            .iter()
            .position(|e| matches!(e, TaskEvent::Completed { task, .. } if task == "compile"))
            .unwrap();
        for member in ["js", "css", "img", "html", "fonts"] {
            let member_done = events
                .iter()
                .position(|e| matches!(e, TaskEvent::Completed { task, .. } if task == member))
                .unwrap();
            assert!(member_done < compile_done, "{} finished after compile", member);
        }
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_siblings() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut builder = TaskGraphBuilder::new();
        builder.register("css", failing("Undefined variable: $brand"), &[]).unwrap();
        builder.register("img", logged(&log, "img", 10), &[]).unwrap();
        builder.register("fonts", logged(&log, "fonts", 0), &[]).unwrap();
        let compile = builder.group("compile", &["css", "img", "fonts"]).unwrap();
        let graph = builder.build().unwrap();

        let sink = Arc::new(CollectingSink::default());
        let mut registry = TaskReporterRegistry::empty();
        registry.register(NotifyingReporter::new(sink.clone()));
        let scheduler = TaskScheduler::new(SchedulerOptions::default(), Arc::new(registry));
        let summary = scheduler.run(&graph, compile, &ctx()).await;

        assert!(!summary.is_success());
        assert!(summary.get("img").unwrap().status.is_success());
        assert!(summary.get("fonts").unwrap().status.is_success());
        assert!(matches!(
            summary.get("css").unwrap().status,
            TaskStatus::Failed(TaskError::SourceSyntax { .. })
        ));
        assert!(matches!(
            summary.get("compile").unwrap().status,
            TaskStatus::Skipped(_)
        ));

        let notes = sink.notifications();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].message.contains("Undefined variable"));
    }

    #[tokio::test]
    async fn test_missing_asset_is_nothing_to_do() {
        let mut builder = TaskGraphBuilder::new();
        builder
            .register(
                "js-async",
                work_fn(|_ctx| async { Err(TaskError::missing("js", "js/async/**/*")) }),
                &[],
            )
            .unwrap();
        let js = builder.group("js", &["js-async"]).unwrap();
        let graph = builder.build().unwrap();

        let reporter = Arc::new(CollectingReporter::default());
        let scheduler = TaskScheduler::new(SchedulerOptions::default(), reporter.clone());
        let summary = scheduler.run(&graph, js, &ctx()).await;

        assert!(summary.is_success());
        assert!(matches!(
            summary.get("js-async").unwrap().status,
            TaskStatus::NothingToDo(_)
        ));
        assert_eq!(summary.get("js").unwrap().status, TaskStatus::Success);
        assert!(reporter
            .events()
            .iter()
            .any(|e| matches!(e, TaskEvent::Warning { task, .. } if task == "js-async")));
    }

    #[tokio::test]
    async fn test_fail_fast_skips_later_steps() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut builder = TaskGraphBuilder::new();
        let css = builder.register("css", failing("bad"), &[]).unwrap();
        let serve = builder.register("serve", logged(&log, "serve", 0), &[]).unwrap();
        let graph = builder.build().unwrap();

        let scheduler = TaskScheduler::new(
            SchedulerOptions {
                continue_on_error: false,
                ..Default::default()
            },
            Arc::new(CollectingReporter::default()),
        );
        let summary = scheduler
            .run_sequence(&graph, &[Step::Task(css), Step::Task(serve)], &ctx())
            .await;

        assert!(log.lock().unwrap().is_empty());
        assert!(matches!(
            summary.get("serve").unwrap().status,
            TaskStatus::Skipped(_)
        ));
    }

    #[tokio::test]
    async fn test_continue_on_error_runs_later_steps() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut builder = TaskGraphBuilder::new();
        let css = builder.register("css", failing("bad"), &[]).unwrap();
        let watch = builder.register("watch", logged(&log, "watch", 0), &[]).unwrap();
        let graph = builder.build().unwrap();

        let scheduler = TaskScheduler::new(
            SchedulerOptions::default(),
            Arc::new(CollectingReporter::default()),
        );
        let summary = scheduler
            .run_sequence(&graph, &[Step::Task(css), Step::Task(watch)], &ctx())
            .await;

        assert_eq!(summary.get("watch").unwrap().status, TaskStatus::Success);
        assert_eq!(summary.failed().len(), 1);
    }

    #[tokio::test]
    async fn test_panicking_work_is_reported() {
        let mut builder = TaskGraphBuilder::new();
        let boom = builder
            .register(
                "boom",
                work_fn(|_ctx| async {
                    if true {
                        panic!("transform exploded");
                    }
                    Ok(WorkReport::default())
                }),
                &[],
            )
            .unwrap();
        let graph = builder.build().unwrap();

        let scheduler = TaskScheduler::new(
            SchedulerOptions::default(),
            Arc::new(CollectingReporter::default()),
        );
        let summary = scheduler.run(&graph, boom, &ctx()).await;

        assert!(matches!(
            summary.get("boom").unwrap().status,
            TaskStatus::Failed(TaskError::Aborted(_))
        ));
    }

    #[tokio::test]
    async fn test_dry_run_executes_nothing() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut builder = TaskGraphBuilder::new();
        let css = builder.register("css", logged(&log, "css", 0), &[]).unwrap();
        let graph = builder.build().unwrap();

        let scheduler = TaskScheduler::new(
            SchedulerOptions {
                dry_run: true,
                ..Default::default()
            },
            Arc::new(CollectingReporter::default()),
        );
        let results = scheduler.run(&graph, css, &ctx()).await;

        assert_eq!(results.results.len(), 1);
        assert_eq!(
            results.results[0].status,
            TaskStatus::Skipped("dry run".to_string())
        );
        assert!(log.lock().unwrap().is_empty());
    }
}
