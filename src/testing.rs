//! Testing infrastructure for fest.
//!
//! Provides a controllable test double for the dependency-graph
//! collaborator so selector behavior can be exercised without a real
//! graph builder.

use std::path::Path;

use crate::error::Result;
use crate::layout::TaskOrdinal;
use crate::selector::{TaskGraph, TaskNode};

/// Test double for the graph collaborator.
///
/// Holds a fixed node set; `resolve` is a no-op so tests control exactly
/// what the selector sees.
///
/// # Example
///
/// ```
/// use fest::testing::MockTaskGraph;
/// use fest::selector::TaskGraph;
///
/// let graph = MockTaskGraph::new()
///     .with_task("010-p/01-s/01-t.md", "010-p", "010-p/01-s", 1);
/// assert_eq!(graph.nodes().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockTaskGraph {
    nodes: Vec<TaskNode>,
}

impl MockTaskGraph {
    /// Empty mock graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock graph over a prebuilt node set.
    #[must_use]
    pub fn with_nodes(nodes: Vec<TaskNode>) -> Self {
        Self { nodes }
    }

    /// Add a pending task with no dependencies.
    #[must_use]
    pub fn with_task(mut self, id: &str, phase: &str, sequence: &str, ordinal: u32) -> Self {
        self.nodes.push(TaskNode {
            id: id.to_string(),
            phase_path: phase.to_string(),
            sequence_path: sequence.to_string(),
            ordinal: TaskOrdinal::new(ordinal, None),
            parallel_group: None,
            depends_on: Vec::new(),
            status: "pending".to_string(),
        });
        self
    }

    /// Add dependencies to the most recently added task.
    ///
    /// # Panics
    ///
    /// Panics when no task has been added yet (test setup error).
    #[must_use]
    pub fn depending_on(mut self, deps: &[&str]) -> Self {
        let node = self
            .nodes
            .last_mut()
            .expect("depending_on requires a prior with_task");
        node.depends_on = deps.iter().map(ToString::to_string).collect();
        self
    }

    /// Set the parallel group of the most recently added task.
    ///
    /// # Panics
    ///
    /// Panics when no task has been added yet (test setup error).
    #[must_use]
    pub fn in_group(mut self, group: &str) -> Self {
        let node = self
            .nodes
            .last_mut()
            .expect("in_group requires a prior with_task");
        node.parallel_group = Some(group.to_string());
        self
    }
}

impl TaskGraph for MockTaskGraph {
    fn resolve(&mut self, _festival_root: &Path) -> Result<()> {
        Ok(())
    }

    fn nodes(&self) -> &[TaskNode] {
        &self.nodes
    }

    fn nodes_mut(&mut self) -> &mut [TaskNode] {
        &mut self.nodes
    }
}
