//! Pipeline engine: named modules, static dependency edges, routed execution
//!
//! Modules are registered with the names of the modules they run after.
//! Edges are resolved when a run starts, so registration order is free.
//!
//! # Execution model
//!
//! Every module tracks how many of its static predecessors have *settled*
//! and whether any of them *activated* it:
//!
//! - A predecessor settles when it finishes or when it is pruned.
//! - A finishing predecessor activates a successor when it returned
//!   [`Routing::Static`], or [`Routing::Explicit`] naming that successor.
//! - Once all predecessors have settled, an activated module is queued; a
//!   module nobody activated is pruned and settles its own successors in turn.
//!
//! Roots are activated up front and queued in registration order. The queue is
//! FIFO and modules run one at a time against the same state.
//!
//! ```text
//!          ┌──────────┐ Explicit(["Identified"]) ┌────────────┐
//!          │  Router  │─────────────────────────▶│ Identified │  runs
//!          └──────────┘                          └────────────┘
//!                │ (not named)                   ┌──────────────┐
//!                └──────────────────────────────▶│ Unidentified │  pruned
//!                                                └──────────────┘
//! ```

use indexmap::IndexMap;
use std::collections::{HashSet, VecDeque};
use std::time::Instant;
use tracing::{debug, info};

use crate::error::{ClassifyError, Result};
use crate::module::{Module, Routing};
use crate::state::ClassificationState;

/// How a run treats modules that never executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Completion {
    /// Pruned branches are a normal outcome
    #[default]
    Permissive,
    /// Any module left unexecuted fails the run with [`ClassifyError::IncompleteRun`]
    Strict,
}

/// What happened during one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Modules in execution order
    pub executed: Vec<String>,
    /// Modules that were never activated, in the order they were pruned
    pub pruned: Vec<String>,
}

impl RunReport {
    pub fn was_executed(&self, name: &str) -> bool {
        self.executed.iter().any(|n| n == name)
    }
}

struct Node {
    module: Box<dyn Module>,
    predecessors: Vec<String>,
}

/// Resolved static graph, indexed by registration order
struct Graph {
    successors: Vec<Vec<usize>>,
    predecessor_count: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeStatus {
    Waiting,
    Queued,
    Finished,
    Pruned,
}

/// Bookkeeping for one run
struct RunState {
    status: Vec<NodeStatus>,
    activated: Vec<bool>,
    settled: Vec<usize>,
    queue: VecDeque<usize>,
    report: RunReport,
}

/// A graph of classification modules
#[derive(Default)]
pub struct Pipeline {
    nodes: IndexMap<String, Node>,
    completion: Completion,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the completion policy
    pub fn with_completion(mut self, completion: Completion) -> Self {
        self.completion = completion;
        self
    }

    pub fn completion(&self) -> Completion {
        self.completion
    }

    /// Register `module` to run after the modules named in `after`.
    ///
    /// An empty `after` makes the module a root.
    pub fn register<M: Module + 'static>(&mut self, module: M, after: &[&str]) -> Result<()> {
        self.register_boxed(Box::new(module), after)
    }

    /// Register an already boxed module
    pub fn register_boxed(&mut self, module: Box<dyn Module>, after: &[&str]) -> Result<()> {
        let name = module.name().to_string();
        if self.nodes.contains_key(&name) {
            return Err(ClassifyError::DuplicateModule(name));
        }

        let mut predecessors: Vec<String> = Vec::with_capacity(after.len());
        for pred in after {
            if *pred == name {
                return Err(ClassifyError::RoutingCycle(format!(
                    "module '{}' lists itself as a predecessor",
                    name
                )));
            }
            if self.reaches(pred, &name) {
                return Err(ClassifyError::RoutingCycle(format!(
                    "module '{}' would run after '{}', which already runs after it",
                    name, pred
                )));
            }
            if !predecessors.iter().any(|p| p == pred) {
                predecessors.push((*pred).to_string());
            }
        }

        debug!(module = %name, after = ?predecessors, "registered module");
        self.nodes.insert(name, Node { module, predecessors });
        Ok(())
    }

    /// Whether `target` is `from` or one of its (registered) ancestors
    fn reaches(&self, from: &str, target: &str) -> bool {
        let mut stack = vec![from];
        let mut seen: HashSet<&str> = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(node) = self.nodes.get(current) {
                stack.extend(node.predecessors.iter().map(String::as_str));
            }
        }
        false
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Module names in registration order
    pub fn module_names(&self) -> Vec<&str> {
        self.nodes.keys().map(String::as_str).collect()
    }

    /// Statically declared predecessors of `name`
    pub fn predecessors(&self, name: &str) -> Option<&[String]> {
        self.nodes.get(name).map(|node| node.predecessors.as_slice())
    }

    /// Check that every predecessor exists and the static edges are acyclic
    pub fn validate(&self) -> Result<()> {
        self.resolve().map(|_| ())
    }

    fn resolve(&self) -> Result<Graph> {
        let count = self.nodes.len();
        let mut successors = vec![Vec::new(); count];
        let mut predecessor_count = vec![0; count];

        for (idx, (name, node)) in self.nodes.iter().enumerate() {
            for pred in &node.predecessors {
                let pred_idx =
                    self.nodes
                        .get_index_of(pred)
                        .ok_or_else(|| ClassifyError::UnknownModule {
                            name: pred.clone(),
                            referenced_by: name.clone(),
                        })?;
                successors[pred_idx].push(idx);
                predecessor_count[idx] += 1;
            }
        }

        // Kahn's algorithm over the static edges
        let mut remaining = predecessor_count.clone();
        let mut ready: VecDeque<usize> = (0..count).filter(|&i| remaining[i] == 0).collect();
        let mut visited = 0;
        while let Some(idx) = ready.pop_front() {
            visited += 1;
            for &succ in &successors[idx] {
                remaining[succ] -= 1;
                if remaining[succ] == 0 {
                    ready.push_back(succ);
                }
            }
        }
        if visited < count {
            let stuck: Vec<&str> = (0..count)
                .filter(|&i| remaining[i] > 0)
                .map(|i| self.name_at(i))
                .collect();
            return Err(ClassifyError::RoutingCycle(format!(
                "static edges form a cycle through: {}",
                stuck.join(", ")
            )));
        }

        Ok(Graph {
            successors,
            predecessor_count,
        })
    }

    fn name_at(&self, idx: usize) -> &str {
        self.nodes
            .get_index(idx)
            .map(|(name, _)| name.as_str())
            .unwrap_or("<unknown>")
    }

    /// Run the graph over `state` and hand it back
    pub fn run(&self, mut state: ClassificationState) -> Result<ClassificationState> {
        self.run_with_report(&mut state)?;
        Ok(state)
    }

    /// Run the graph over `state` in place, reporting what executed
    pub fn run_with_report(&self, state: &mut ClassificationState) -> Result<RunReport> {
        let started = Instant::now();
        let graph = self.resolve()?;
        let count = self.nodes.len();

        let mut run = RunState {
            status: vec![NodeStatus::Waiting; count],
            activated: vec![false; count],
            settled: vec![0; count],
            queue: VecDeque::new(),
            report: RunReport::default(),
        };

        for idx in 0..count {
            if graph.predecessor_count[idx] == 0 {
                run.activated[idx] = true;
                run.status[idx] = NodeStatus::Queued;
                run.queue.push_back(idx);
            }
        }

        while let Some(idx) = run.queue.pop_front() {
            let node = &self.nodes[idx];
            let name = self.name_at(idx);

            debug!(module = %name, "running module");
            let routing = node.module.run(state);
            run.status[idx] = NodeStatus::Finished;
            run.report.executed.push(name.to_string());

            let targets = match routing {
                Routing::Static => None,
                Routing::Explicit(names) => {
                    Some(self.resolve_targets(name, &names, &graph.successors[idx], &run.status)?)
                }
            };
            debug!(module = %name, targets = ?targets.as_ref().map(|t| self.names_of(t)), "module finished");

            let fired: VecDeque<(usize, bool)> = graph.successors[idx]
                .iter()
                .map(|&succ| {
                    let activate = targets.as_ref().map_or(true, |t| t.contains(&succ));
                    (succ, activate)
                })
                .collect();
            self.settle(fired, &graph, &mut run);
        }

        let report = run.report;
        info!(
            executed = report.executed.len(),
            pruned = report.pruned.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pipeline run complete"
        );

        if self.completion == Completion::Strict && !report.pruned.is_empty() {
            return Err(ClassifyError::IncompleteRun(report.pruned));
        }
        Ok(report)
    }

    /// Validate an explicit routing list against the current run
    fn resolve_targets(
        &self,
        from: &str,
        names: &[String],
        successors: &[usize],
        status: &[NodeStatus],
    ) -> Result<HashSet<usize>> {
        let mut targets = HashSet::with_capacity(names.len());
        for target in names {
            let idx = self
                .nodes
                .get_index_of(target)
                .ok_or_else(|| ClassifyError::UnknownModule {
                    name: target.clone(),
                    referenced_by: from.to_string(),
                })?;
            if status[idx] == NodeStatus::Finished {
                return Err(ClassifyError::RoutingCycle(format!(
                    "module '{}' routed to '{}', which already finished in this run",
                    from, target
                )));
            }
            if !successors.contains(&idx) {
                return Err(ClassifyError::UndeclaredRoute {
                    from: from.to_string(),
                    to: target.clone(),
                });
            }
            targets.insert(idx);
        }
        Ok(targets)
    }

    /// Settle successors; prune the ones nobody activated and propagate
    fn settle(&self, mut work: VecDeque<(usize, bool)>, graph: &Graph, run: &mut RunState) {
        while let Some((idx, activate)) = work.pop_front() {
            run.settled[idx] += 1;
            if activate {
                run.activated[idx] = true;
            }
            if run.settled[idx] < graph.predecessor_count[idx] {
                continue;
            }

            if run.activated[idx] {
                run.status[idx] = NodeStatus::Queued;
                run.queue.push_back(idx);
            } else {
                let name = self.name_at(idx);
                debug!(module = %name, "module pruned");
                run.status[idx] = NodeStatus::Pruned;
                run.report.pruned.push(name.to_string());
                work.extend(graph.successors[idx].iter().map(|&succ| (succ, false)));
            }
        }
    }

    fn names_of(&self, indices: &HashSet<usize>) -> Vec<&str> {
        let mut sorted: Vec<usize> = indices.iter().copied().collect();
        sorted.sort_unstable();
        sorted.into_iter().map(|i| self.name_at(i)).collect()
    }
}
