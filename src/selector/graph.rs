//! The dependency-graph collaborator seam.
//!
//! How dependencies are declared and resolved topologically is someone
//! else's problem: a [`TaskGraph`] implementation is handed a festival
//! root, builds task nodes, and answers which of them are ready. This
//! crate only overwrites node statuses with reconciled ones and consumes
//! the ready set.
//!
//! # Status vocabulary
//!
//! Graph collaborators use the literal `"complete"` to mean finished,
//! while the progress store says `"completed"`. The mismatch is bridged
//! exactly here - [`to_graph_status`] / [`from_graph_status`] - so neither
//! vocabulary leaks into the other side.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::layout::TaskOrdinal;
use crate::progress::TaskStatus;

/// Literal status value meaning "finished" in the graph vocabulary.
pub const GRAPH_STATUS_COMPLETE: &str = "complete";

// ============================================================================
// Task Node
// ============================================================================

/// One task as the graph collaborator sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskNode {
    /// Stable identifier: the festival-relative task path
    pub id: String,
    /// Festival-relative phase directory
    pub phase_path: String,
    /// Festival-relative sequence directory
    pub sequence_path: String,
    /// Position within the sequence
    pub ordinal: TaskOrdinal,
    /// Tag shared by tasks meant to run concurrently
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_group: Option<String>,
    /// Ids of tasks that must be complete first
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Mutable status in the graph vocabulary
    pub status: String,
}

impl TaskNode {
    /// Whether this node is finished, in graph terms.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == GRAPH_STATUS_COMPLETE
    }
}

// ============================================================================
// Vocabulary Bridge
// ============================================================================

/// Translate a store status into the graph vocabulary.
#[must_use]
pub fn to_graph_status(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Completed => GRAPH_STATUS_COMPLETE,
        other => other.as_str(),
    }
}

/// Translate a graph status string back into the store vocabulary.
/// Unknown values read as pending, the safe default.
#[must_use]
pub fn from_graph_status(status: &str) -> TaskStatus {
    match status {
        GRAPH_STATUS_COMPLETE | "completed" => TaskStatus::Completed,
        "in_progress" => TaskStatus::InProgress,
        "blocked" => TaskStatus::Blocked,
        _ => TaskStatus::Pending,
    }
}

// ============================================================================
// Collaborator Trait
// ============================================================================

/// External dependency-graph collaborator.
///
/// Implementations own dependency declaration and topology; the selector
/// owns status reconciliation and prioritization.
pub trait TaskGraph {
    /// Build (or rebuild) the node set for a festival root.
    ///
    /// # Errors
    ///
    /// Implementation-defined; the selector propagates failures as-is.
    fn resolve(&mut self, festival_root: &Path) -> Result<()>;

    /// All nodes, in no particular order.
    fn nodes(&self) -> &[TaskNode];

    /// All nodes, mutably - the selector overwrites statuses here.
    fn nodes_mut(&mut self) -> &mut [TaskNode];

    /// Tasks whose dependencies are all satisfied and which are not yet
    /// complete.
    fn ready_tasks(&self) -> Vec<&TaskNode> {
        let complete: HashSet<&str> = self
            .nodes()
            .iter()
            .filter(|n| n.is_complete())
            .map(|n| n.id.as_str())
            .collect();
        self.nodes()
            .iter()
            .filter(|n| !n.is_complete())
            .filter(|n| n.depends_on.iter().all(|d| complete.contains(d.as_str())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTaskGraph;

    fn node(id: &str, deps: &[&str], status: &str) -> TaskNode {
        TaskNode {
            id: id.to_string(),
            phase_path: "010-p".to_string(),
            sequence_path: "010-p/01-s".to_string(),
            ordinal: TaskOrdinal::new(1, None),
            parallel_group: None,
            depends_on: deps.iter().map(ToString::to_string).collect(),
            status: status.to_string(),
        }
    }

    // ========================================================================
    // Vocabulary Bridge Tests
    // ========================================================================

    #[test]
    fn test_to_graph_status_bridges_completed() {
        assert_eq!(to_graph_status(TaskStatus::Completed), "complete");
        assert_eq!(to_graph_status(TaskStatus::Blocked), "blocked");
        assert_eq!(to_graph_status(TaskStatus::Pending), "pending");
        assert_eq!(to_graph_status(TaskStatus::InProgress), "in_progress");
    }

    #[test]
    fn test_from_graph_status_accepts_both_spellings() {
        assert_eq!(from_graph_status("complete"), TaskStatus::Completed);
        assert_eq!(from_graph_status("completed"), TaskStatus::Completed);
        assert_eq!(from_graph_status("blocked"), TaskStatus::Blocked);
        assert_eq!(from_graph_status("gibberish"), TaskStatus::Pending);
    }

    #[test]
    fn test_bridge_roundtrip() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::InProgress,
            TaskStatus::Blocked,
            TaskStatus::Completed,
        ] {
            assert_eq!(from_graph_status(to_graph_status(status)), status);
        }
    }

    // ========================================================================
    // Ready Set Tests
    // ========================================================================

    #[test]
    fn test_ready_tasks_excludes_complete_nodes() {
        let graph = MockTaskGraph::with_nodes(vec![
            node("a", &[], GRAPH_STATUS_COMPLETE),
            node("b", &[], "pending"),
        ]);
        let ready = graph.ready_tasks();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].id, "b");
    }

    #[test]
    fn test_ready_tasks_waits_on_dependencies() {
        let graph = MockTaskGraph::with_nodes(vec![
            node("a", &[], "pending"),
            node("b", &["a"], "pending"),
        ]);
        let ready = graph.ready_tasks();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].id, "a");
    }

    #[test]
    fn test_ready_tasks_unlocked_by_completion() {
        let graph = MockTaskGraph::with_nodes(vec![
            node("a", &[], GRAPH_STATUS_COMPLETE),
            node("b", &["a"], "pending"),
        ]);
        let ready = graph.ready_tasks();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].id, "b");
    }

    #[test]
    fn test_ready_tasks_empty_when_all_complete() {
        let graph = MockTaskGraph::with_nodes(vec![
            node("a", &[], GRAPH_STATUS_COMPLETE),
            node("b", &["a"], GRAPH_STATUS_COMPLETE),
        ]);
        assert!(graph.ready_tasks().is_empty());
    }
}
