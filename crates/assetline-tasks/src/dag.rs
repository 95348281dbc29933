//! Task graph construction and validation

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use tracing::{info, instrument};

use crate::task::{TaskId, Work};

/// A registered task in a built graph
#[derive(Clone)]
pub struct TaskNode {
    /// Task handle
    pub id: TaskId,
    /// Task name
    pub name: String,
    /// Optional one-line description
    pub description: Option<String>,
    /// Unit of work; `None` for a group that only aggregates prerequisites
    pub work: Option<Arc<dyn Work>>,
    /// Tasks that must complete successfully before this one
    pub prerequisites: Vec<TaskId>,
    /// Tasks waiting on this one
    pub dependents: Vec<TaskId>,
}

impl TaskNode {
    /// Whether this node is a group with no work of its own
    pub fn is_group(&self) -> bool {
        self.work.is_none()
    }
}

impl fmt::Debug for TaskNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("group", &self.is_group())
            .field("prerequisites", &self.prerequisites)
            .finish()
    }
}

struct PendingTask {
    name: String,
    description: Option<String>,
    work: Option<Arc<dyn Work>>,
    prerequisites: Vec<String>,
}

/// Collects task registrations and validates them into a [`TaskGraph`]
#[derive(Default)]
pub struct TaskGraphBuilder {
    pending: Vec<PendingTask>,
    index: HashMap<String, TaskId>,
}

impl TaskGraphBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task with a unit of work.
    ///
    /// Prerequisites are task names; they may be registered later and are
    /// resolved when the graph is built.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        work: Arc<dyn Work>,
        prerequisites: &[&str],
    ) -> Result<TaskId, GraphError> {
        self.insert(name.into(), Some(work), prerequisites)
    }

    /// Register a group: a task with no work whose prerequisites are its members
    pub fn group(&mut self, name: impl Into<String>, members: &[&str]) -> Result<TaskId, GraphError> {
        self.insert(name.into(), None, members)
    }

    /// Attach a description to a registered task
    pub fn describe(&mut self, id: TaskId, description: impl Into<String>) {
        if let Some(task) = self.pending.get_mut(id.0) {
            task.description = Some(description.into());
        }
    }

    fn insert(
        &mut self,
        name: String,
        work: Option<Arc<dyn Work>>,
        prerequisites: &[&str],
    ) -> Result<TaskId, GraphError> {
        if name.trim().is_empty() {
            return Err(GraphError::InvalidName(name));
        }
        if self.index.contains_key(&name) {
            return Err(GraphError::DuplicateTask(name));
        }

        let id = TaskId(self.pending.len());
        self.index.insert(name.clone(), id);
        self.pending.push(PendingTask {
            name,
            description: None,
            work,
            prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
        });
        Ok(id)
    }

    /// Resolve every prerequisite name and reject unknown names and cycles
    #[instrument(skip_all, fields(tasks = self.pending.len()))]
    pub fn build(self) -> Result<TaskGraph, GraphError> {
        let mut nodes: Vec<TaskNode> = Vec::with_capacity(self.pending.len());

        for (i, task) in self.pending.into_iter().enumerate() {
            let mut prerequisites = Vec::with_capacity(task.prerequisites.len());
            for dep in &task.prerequisites {
                let dep_id = self.index.get(dep).copied().ok_or_else(|| {
                    GraphError::UnknownPrerequisite {
                        task: task.name.clone(),
                        prerequisite: dep.clone(),
                    }
                })?;
                if !prerequisites.contains(&dep_id) {
                    prerequisites.push(dep_id);
                }
            }

            nodes.push(TaskNode {
                id: TaskId(i),
                name: task.name,
                description: task.description,
                work: task.work,
                prerequisites,
                dependents: Vec::new(),
            });
        }

        // Build reverse dependency map (dependents)
        let edges: Vec<(TaskId, Vec<TaskId>)> = nodes
            .iter()
            .map(|n| (n.id, n.prerequisites.clone()))
            .collect();
        for (id, deps) in &edges {
            for dep in deps {
                nodes[dep.0].dependents.push(*id);
            }
        }

        let sorted = topological_sort(&nodes)?;

        info!(task_count = nodes.len(), "task graph built");

        Ok(TaskGraph {
            nodes,
            index: self.index,
            sorted,
        })
    }
}

/// Topological sort using Kahn's algorithm
fn topological_sort(nodes: &[TaskNode]) -> Result<Vec<TaskId>, GraphError> {
    let mut in_degree: Vec<usize> = nodes.iter().map(|n| n.prerequisites.len()).collect();
    let mut queue: VecDeque<TaskId> = nodes
        .iter()
        .filter(|n| n.prerequisites.is_empty())
        .map(|n| n.id)
        .collect();
    let mut sorted = Vec::with_capacity(nodes.len());

    while let Some(id) = queue.pop_front() {
        sorted.push(id);
        for dependent in &nodes[id.0].dependents {
            let degree = &mut in_degree[dependent.0];
            *degree = degree.saturating_sub(1);
            if *degree == 0 {
                queue.push_back(*dependent);
            }
        }
    }

    if sorted.len() != nodes.len() {
        let in_sorted: HashSet<_> = sorted.iter().collect();
        let cyclic: Vec<&str> = nodes
            .iter()
            .filter(|n| !in_sorted.contains(&n.id))
            .map(|n| n.name.as_str())
            .collect();
        return Err(GraphError::CyclicDependency(cyclic.join(", ")));
    }

    Ok(sorted)
}

/// A validated, acyclic graph of tasks
#[derive(Debug, Clone)]
pub struct TaskGraph {
    nodes: Vec<TaskNode>,
    index: HashMap<String, TaskId>,
    sorted: Vec<TaskId>,
}

impl TaskGraph {
    /// Look up a task by name
    pub fn lookup(&self, name: &str) -> Option<TaskId> {
        self.index.get(name).copied()
    }

    /// Look up a task by name, failing if it is not registered
    pub fn require(&self, name: &str) -> Result<TaskId, GraphError> {
        self.lookup(name)
            .ok_or_else(|| GraphError::TaskNotFound(name.to_string()))
    }

    /// Get a task node
    pub fn get(&self, id: TaskId) -> &TaskNode {
        &self.nodes[id.0]
    }

    /// Get a task's name
    pub fn name(&self, id: TaskId) -> &str {
        &self.nodes[id.0].name
    }

    /// All task nodes, in registration order
    pub fn nodes(&self) -> &[TaskNode] {
        &self.nodes
    }

    /// Get the total number of tasks
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All tasks in topological order
    pub fn sorted(&self) -> &[TaskId] {
        &self.sorted
    }

    /// The targets plus all their transitive prerequisites, topologically sorted
    pub fn closure(&self, targets: &[TaskId]) -> Vec<TaskId> {
        let mut included: HashSet<TaskId> = HashSet::new();
        let mut stack: Vec<TaskId> = targets.to_vec();
        while let Some(id) = stack.pop() {
            if included.insert(id) {
                stack.extend(self.nodes[id.0].prerequisites.iter().copied());
            }
        }

        self.sorted
            .iter()
            .filter(|id| included.contains(id))
            .copied()
            .collect()
    }

    /// Group the closure of `targets` into execution waves.
    ///
    /// Tasks in `done` are treated as already complete and left out; every
    /// task in wave `n` only depends on tasks in earlier waves or in `done`.
    pub fn waves(&self, targets: &[TaskId], done: &HashSet<TaskId>) -> Vec<Vec<TaskId>> {
        let mut wave_map: HashMap<TaskId, usize> = HashMap::new();
        let mut waves: Vec<Vec<TaskId>> = Vec::new();

        for id in self.closure(targets) {
            if done.contains(&id) {
                continue;
            }
            let wave = self.nodes[id.0]
                .prerequisites
                .iter()
                .filter_map(|dep| wave_map.get(dep))
                .max()
                .map(|w| w + 1)
                .unwrap_or(0);
            wave_map.insert(id, wave);
            if waves.len() <= wave {
                waves.resize_with(wave + 1, Vec::new);
            }
            waves[wave].push(id);
        }

        waves
    }

    /// Get a human-readable summary of the execution plan for `targets`
    pub fn execution_plan(&self, targets: &[TaskId]) -> String {
        let mut plan = String::new();
        for (i, wave) in self.waves(targets, &HashSet::new()).iter().enumerate() {
            plan.push_str(&format!("Wave {} ({} tasks):\n", i, wave.len()));
            for id in wave {
                let node = &self.nodes[id.0];
                let label = match (&node.description, node.is_group()) {
                    (Some(desc), _) => desc.clone(),
                    (None, true) => "<group>".to_string(),
                    (None, false) => "<work>".to_string(),
                };
                if node.prerequisites.is_empty() {
                    plan.push_str(&format!("  {} -> {}\n", node.name, label));
                } else {
                    let deps: Vec<&str> = node
                        .prerequisites
                        .iter()
                        .map(|d| self.name(*d))
                        .collect();
                    plan.push_str(&format!(
                        "  {} -> {} (after: {})\n",
                        node.name,
                        label,
                        deps.join(", ")
                    ));
                }
            }
        }
        plan
    }
}

/// Errors during graph construction and lookup
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Cyclic dependency detected
    #[error("Cyclic dependency detected among tasks: {0}")]
    CyclicDependency(String),

    /// A prerequisite name was never registered
    #[error("Task '{task}' depends on unknown task '{prerequisite}'")]
    UnknownPrerequisite { task: String, prerequisite: String },

    /// A task name was registered twice
    #[error("Task '{0}' is already registered")]
    DuplicateTask(String),

    /// A task name is empty
    #[error("Invalid task name '{0}'")]
    InvalidName(String),

    /// Task not found in the graph
    #[error("Task '{0}' not found")]
    TaskNotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{work_fn, WorkReport};

    fn noop() -> Arc<dyn Work> {
        work_fn(|_ctx| async { Ok(WorkReport::default()) })
    }

    fn site_graph() -> TaskGraph {
        let mut builder = TaskGraphBuilder::new();
        builder.register("clean", noop(), &[]).unwrap();
        builder.register("sw", noop(), &[]).unwrap();
        builder.register("js-core", noop(), &[]).unwrap();
        builder.group("js", &["sw", "js-core"]).unwrap();
        builder.register("css", noop(), &[]).unwrap();
        builder.register("html", noop(), &[]).unwrap();
        builder.group("build", &["js", "css", "html"]).unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_build_graph() {
        let graph = site_graph();
        assert_eq!(graph.len(), 7);
        assert!(graph.get(graph.require("js").unwrap()).is_group());
        assert!(!graph.get(graph.require("css").unwrap()).is_group());
    }

    #[test]
    fn test_rejects_cycle() {
        let mut builder = TaskGraphBuilder::new();
        builder.register("a", noop(), &["c"]).unwrap();
        builder.register("b", noop(), &["a"]).unwrap();
        builder.register("c", noop(), &["b"]).unwrap();
        builder.register("d", noop(), &[]).unwrap();

        match builder.build() {
            Err(GraphError::CyclicDependency(names)) => {
                assert!(names.contains('a') && names.contains('b') && names.contains('c'));
                assert!(!names.contains('d'));
            }
            other => panic!("expected cycle error, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_self_dependency() {
        let mut builder = TaskGraphBuilder::new();
        builder.register("a", noop(), &["a"]).unwrap();
        assert!(matches!(
            builder.build(),
            Err(GraphError::CyclicDependency(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_prerequisite() {
        let mut builder = TaskGraphBuilder::new();
        builder.register("html", noop(), &["templates"]).unwrap();
        assert_eq!(
            builder.build().unwrap_err(),
            GraphError::UnknownPrerequisite {
                task: "html".to_string(),
                prerequisite: "templates".to_string(),
            }
        );
    }

    #[test]
    fn test_rejects_duplicate_name() {
        let mut builder = TaskGraphBuilder::new();
        builder.register("css", noop(), &[]).unwrap();
        assert!(matches!(
            builder.register("css", noop(), &[]),
            Err(GraphError::DuplicateTask(_))
        ));
    }

    #[test]
    fn test_closure_includes_prerequisites() {
        let graph = site_graph();
        let js = graph.require("js").unwrap();
        let names: Vec<&str> = graph.closure(&[js]).iter().map(|id| graph.name(*id)).collect();

        assert_eq!(names.len(), 3);
        assert!(names.contains(&"sw"));
        assert!(names.contains(&"js-core"));
        assert_eq!(names.last(), Some(&"js"));
    }

    #[test]
    fn test_waves() {
        let graph = site_graph();
        let build = graph.require("build").unwrap();
        let waves = graph.waves(&[build], &HashSet::new());

        assert_eq!(waves.len(), 3);
        assert_eq!(waves[0].len(), 4); // sw, js-core, css, html
        assert_eq!(waves[1], vec![graph.require("js").unwrap()]);
        assert_eq!(waves[2], vec![build]);
    }

    #[test]
    fn test_waves_skip_done_tasks() {
        let graph = site_graph();
        let js = graph.require("js").unwrap();
        let mut done = HashSet::new();
        done.insert(graph.require("sw").unwrap());
        done.insert(graph.require("js-core").unwrap());

        let waves = graph.waves(&[js], &done);
        assert_eq!(waves, vec![vec![js]]);
    }

    #[test]
    fn test_execution_plan_output() {
        let graph = site_graph();
        let plan = graph.execution_plan(&[graph.require("build").unwrap()]);

        assert!(plan.contains("Wave 0"));
        assert!(plan.contains("js -> <group> (after: sw, js-core)"));
        assert!(!plan.contains("clean"));
    }
}
