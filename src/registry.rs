//! The task registry and its prerequisite graph.
//!
//! Tasks are declared once with [`Registry::register`] and wired into a
//! dependency graph as they arrive. A [`Registry::run`] call validates the
//! whole graph, resolves the prerequisite closure of the requested names
//! and executes it strictly one task at a time.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use petgraph::Graph;
use petgraph::graph::NodeIndex;
use petgraph::visit::{Dfs, Reversed};
use tracing::Level;
use tracing_indicatif::span_ext::IndicatifSpanExt;

use crate::error::{DispatchError, RegistryError, RunError};
use crate::invoke::{Dispatcher, Invocation};
use crate::output::{Artifact, Scheme};
use crate::workspace::Workspace;

/// Result from a single executed task body.
pub type TaskResult = anyhow::Result<()>;

type TaskFn = Box<dyn Fn(&BuildContext) -> TaskResult + Send + Sync>;

/// Everything a task body may touch while it runs.
pub struct BuildContext<'a> {
    /// Path-derivation settings for this build.
    pub scheme: &'a Scheme,
    /// The shared build directory.
    pub workspace: &'a Workspace,
    /// Carries out external invocations.
    pub dispatcher: &'a dyn Dispatcher,
}

impl BuildContext<'_> {
    /// Full output path for an artifact under the current scheme.
    pub fn resolve(&self, artifact: &Artifact) -> Utf8PathBuf {
        self.scheme.resolve(artifact)
    }

    /// Carries out one generator invocation.
    pub fn generate(&self, invocation: &Invocation) -> Result<(), DispatchError> {
        self.dispatcher.dispatch(invocation)
    }
}

struct TaskNode {
    name: String,
    prerequisites: Vec<String>,
    body: TaskFn,
}

/// Timing record for one executed task.
#[derive(Debug, Clone)]
pub struct TaskExecution {
    pub name: String,
    pub duration: Duration,
}

/// Summary of one [`Registry::run`] call.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Executed tasks in execution order.
    pub executed: Vec<TaskExecution>,
}

/// Named build targets wired into a prerequisite graph.
///
/// Prerequisites are referenced by name and may be registered later;
/// the edge is completed once the missing task arrives. Execution order
/// is a topological order of the graph, so it is stable across runs with
/// the same registrations.
pub struct Registry {
    graph: Graph<TaskNode, ()>,
    index: HashMap<String, NodeIndex>,
    pending: HashMap<String, Vec<NodeIndex>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            index: HashMap::new(),
            pending: HashMap::new(),
        }
    }

    /// Adds a named task with its prerequisites.
    pub fn register<F>(
        &mut self,
        name: impl Into<String>,
        prerequisites: &[&str],
        body: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&BuildContext) -> TaskResult + Send + Sync + 'static,
    {
        let name = name.into();

        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateTask(name));
        }

        let prerequisites: Vec<String> =
            prerequisites.iter().map(|name| name.to_string()).collect();

        let index = self.graph.add_node(TaskNode {
            name: name.clone(),
            prerequisites: prerequisites.clone(),
            body: Box::new(body),
        });
        self.index.insert(name.clone(), index);

        // Edges run from a prerequisite to its dependent. A prerequisite
        // that is not registered yet stays pending until it arrives.
        for prerequisite in &prerequisites {
            match self.index.get(prerequisite) {
                Some(&dependency) => {
                    self.graph.add_edge(dependency, index, ());
                }
                None => {
                    self.pending
                        .entry(prerequisite.clone())
                        .or_default()
                        .push(index);
                }
            }
        }

        if let Some(dependents) = self.pending.remove(&name) {
            for dependent in dependents {
                self.graph.add_edge(index, dependent, ());
            }
        }

        Ok(())
    }

    /// Declared tasks with their prerequisites, in declaration order.
    pub fn tasks(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.graph.node_indices().map(|index| {
            let node = &self.graph[index];
            (node.name.as_str(), node.prerequisites.as_slice())
        })
    }

    /// Runs the requested tasks and their prerequisite closure.
    ///
    /// The whole graph is checked for cycles up front; nothing executes
    /// when one exists. Every prerequisite runs strictly before its
    /// dependents and a prerequisite shared by several requested tasks
    /// runs exactly once. The first failing task aborts the rest.
    pub fn run(&self, names: &[&str], context: &BuildContext) -> Result<RunReport, RunError> {
        let order = petgraph::algo::toposort(&self.graph, None)
            .map_err(|cycle| RegistryError::Cycle(self.graph[cycle.node_id()].name.clone()))?;

        let mut selected = HashSet::new();

        for &name in names {
            let start = *self
                .index
                .get(name)
                .ok_or_else(|| RegistryError::UnknownTask(name.to_string()))?;

            let reversed = Reversed(&self.graph);
            let mut dfs = Dfs::new(reversed, start);
            while let Some(node) = dfs.next(reversed) {
                selected.insert(node);
            }
        }

        let plan: Vec<NodeIndex> = order
            .into_iter()
            .filter(|node| selected.contains(node))
            .collect();

        // A task whose prerequisite never got registered cannot run.
        for &node in &plan {
            for prerequisite in &self.graph[node].prerequisites {
                if !self.index.contains_key(prerequisite) {
                    return Err(RegistryError::UnknownTask(prerequisite.clone()).into());
                }
            }
        }

        let root_span = tracing::span!(Level::INFO, "running_tasks");
        root_span.pb_set_length(plan.len() as u64);
        root_span.pb_set_style(&crate::utils::get_style_bar());
        root_span.pb_set_message("Running tasks...");
        let _enter = root_span.enter();

        let mut report = RunReport::default();

        for node in plan {
            let task = &self.graph[node];
            let start = Instant::now();

            {
                let span = tracing::span!(Level::INFO, "task", name = task.name.as_str());
                span.pb_set_style(&crate::utils::get_style_task());
                span.pb_set_message(&format!("Running {}", task.name));
                let _guard = span.enter();

                (task.body)(context).map_err(|err| RunError::Task(task.name.clone(), err))?;
            }

            report.executed.push(TaskExecution {
                name: task.name.clone(),
                duration: start.elapsed(),
            });
            root_span.pb_inc(1);
        }

        Ok(report)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
