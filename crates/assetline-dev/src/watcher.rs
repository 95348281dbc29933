//! Watch loop: debounced file changes to rebuilds to reloads

use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEventKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use assetline_core::{AssetCategory, BuildContext};
use assetline_tasks::{RunSummary, TaskGraph, TaskId, TaskScheduler};

use crate::error::WatchError;
use crate::reload::ReloadHub;
use crate::rules::CompiledRules;

/// Whether any rebuild is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Building,
}

/// Runs rebuilds for the watch loop; cheap to clone into spawned tasks
#[derive(Clone)]
pub struct Rebuilder {
    graph: Arc<TaskGraph>,
    scheduler: Arc<TaskScheduler>,
    ctx: BuildContext,
    reload: ReloadHub,
    in_flight: Arc<AtomicUsize>,
}

impl Rebuilder {
    pub fn new(
        graph: Arc<TaskGraph>,
        scheduler: Arc<TaskScheduler>,
        ctx: BuildContext,
        reload: ReloadHub,
    ) -> Self {
        Self {
            graph,
            scheduler,
            ctx,
            reload,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn state(&self) -> WatchState {
        if self.in_flight.load(Ordering::SeqCst) == 0 {
            WatchState::Idle
        } else {
            WatchState::Building
        }
    }

    /// Rebuild `targets` and broadcast a reload if every task succeeded.
    ///
    /// Failures have already reached the scheduler's reporters; the loop
    /// just goes back to waiting for changes.
    pub async fn rebuild(&self, targets: Vec<TaskId>) -> RunSummary {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let summary = self.scheduler.run_many(&self.graph, &targets, &self.ctx).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let names: Vec<String> = targets
            .iter()
            .map(|id| self.graph.name(*id).to_string())
            .collect();
        if summary.is_success() {
            let viewers = self.reload.reload(names.clone());
            info!(tasks = ?names, viewers, "rebuilt");
        } else {
            warn!(
                tasks = ?names,
                failed = summary.failed().len(),
                "rebuild failed, waiting for changes"
            );
        }
        summary
    }

    /// Start one rebuild per task set; rebuilds of the same set may overlap
    pub fn dispatch(&self, sets: Vec<Vec<TaskId>>) -> Vec<JoinHandle<RunSummary>> {
        sets.into_iter()
            .map(|targets| {
                let rebuilder = self.clone();
                tokio::spawn(async move { rebuilder.rebuild(targets).await })
            })
            .collect()
    }
}

/// Source watcher bound to a set of rules
pub struct WatchLoop {
    rules: CompiledRules,
    rebuilder: Rebuilder,
    debounce: Duration,
}

impl WatchLoop {
    pub fn new(rules: CompiledRules, rebuilder: Rebuilder, debounce: Duration) -> Self {
        Self {
            rules,
            rebuilder,
            debounce,
        }
    }

    pub fn rebuilder(&self) -> &Rebuilder {
        &self.rebuilder
    }

    /// Watch the category source directories until `shutdown` resolves
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<(), WatchError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<DebounceEventResult>();

        let mut debouncer = new_debouncer(self.debounce, move |result: DebounceEventResult| {
            // The receiver is gone once the loop stops
            let _ = tx.send(result);
        })
        .map_err(WatchError::WatcherInit)?;

        let ctx = &self.rebuilder.ctx;
        let sources: Vec<PathBuf> = AssetCategory::all()
            .iter()
            .map(|category| ctx.paths().get(*category).source.clone())
            .collect();
        let (watched, missing) = watch_roots(&sources);
        for dir in &missing {
            warn!(dir = %dir.display(), "source directory does not exist, not watching it");
        }
        for dir in &watched {
            debouncer
                .watcher()
                .watch(dir, RecursiveMode::Recursive)
                .map_err(|e| WatchError::WatchPath {
                    path: dir.clone(),
                    source: e,
                })?;
        }
        info!(dirs = watched.len(), rules = self.rules.len(), "watching for changes");

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                event = rx.recv() => match event {
                    Some(Ok(events)) => {
                        let changed: Vec<PathBuf> = events
                            .into_iter()
                            .filter(|e| matches!(e.kind, DebouncedEventKind::Any))
                            .map(|e| e.path)
                            .collect();
                        let sets = self.rules.targets_for(&changed);
                        if sets.is_empty() {
                            debug!(changed = changed.len(), "no rule matched");
                            continue;
                        }
                        debug!(changed = ?changed, "rebuilding");
                        // Rebuilds run in the background; the loop keeps listening
                        drop(self.rebuilder.dispatch(sets));
                    }
                    Some(Err(error)) => {
                        warn!("Watch error: {:?}", error);
                    }
                    None => return Err(WatchError::ChannelClosed),
                },
            }
        }

        info!("watch loop stopped");
        Ok(())
    }
}

/// Existing source directories with nested ones folded into their parent,
/// and the sources that do not exist
fn watch_roots(sources: &[PathBuf]) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut ordered: Vec<&PathBuf> = sources.iter().collect();
    ordered.sort_by_key(|p| p.components().count());

    let mut watched: Vec<PathBuf> = Vec::new();
    let mut missing: Vec<PathBuf> = Vec::new();
    for source in ordered {
        if !source.is_dir() {
            if !missing.contains(source) {
                missing.push(source.clone());
            }
        } else if !watched.iter().any(|w| source.starts_with(w)) {
            watched.push(source.clone());
        }
    }
    (watched, missing)
}
