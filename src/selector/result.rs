//! View objects produced by a selector query.
//!
//! Everything here is transient and derived: built for a single query,
//! handed to presentation code as one JSON-serializable tagged object,
//! never persisted.

use serde::Serialize;

use crate::planning::PlanningReport;

use super::graph::TaskNode;

// ============================================================================
// Component Views
// ============================================================================

/// A task as surfaced in a recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskInfo {
    /// Festival-relative task path
    pub id: String,
    /// Festival-relative phase directory
    pub phase_path: String,
    /// Festival-relative sequence directory
    pub sequence_path: String,
    /// Position within the sequence, rendered (`"01"`, `"01.5"`)
    pub ordinal: String,
    /// Parallel-group tag, when the task has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_group: Option<String>,
    /// Reconciled status at query time, graph vocabulary
    pub status: String,
}

impl From<&TaskNode> for TaskInfo {
    fn from(node: &TaskNode) -> Self {
        Self {
            id: node.id.clone(),
            phase_path: node.phase_path.clone(),
            sequence_path: node.sequence_path.clone(),
            ordinal: node.ordinal.to_string(),
            parallel_group: node.parallel_group.clone(),
            status: node.status.clone(),
        }
    }
}

/// A quality gate blocking phase progression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateInfo {
    /// The fully-complete phase whose gate is unresolved
    pub phase_path: String,
    /// The marker filename found in that phase directory
    pub marker: String,
}

/// Where the query was made from, classified against the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationInfo {
    /// Festival name (root directory name)
    pub festival: String,
    /// Festival-relative phase the location falls in, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// Festival-relative sequence the location falls in, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<String>,
}

// ============================================================================
// Selector Result
// ============================================================================

/// The one answer a selector query produces.
///
/// Exactly one variant applies per query; `reason` and `location`
/// accompany all of them. Serializes with a `kind` tag for presentation
/// layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NextTaskResult {
    /// Work on this task next
    Task {
        task: TaskInfo,
        /// Ready siblings sharing the task's sequence and parallel group -
        /// concurrent alternatives, not ordering violations
        parallel: Vec<TaskInfo>,
        reason: String,
        location: LocationInfo,
        /// Overall festival completion, when aggregation had data
        #[serde(skip_serializing_if = "Option::is_none")]
        progress_percent: Option<u8>,
    },
    /// A completed phase is waiting on its quality gate
    Gate {
        gate: GateInfo,
        reason: String,
        location: LocationInfo,
    },
    /// The current phase is exploratory; report objectives instead
    Planning {
        report: PlanningReport,
        reason: String,
        location: LocationInfo,
    },
    /// Every task in the festival is complete
    FestivalComplete {
        reason: String,
        location: LocationInfo,
    },
    /// Nothing is ready: dependencies unsatisfied
    NoTasksReady {
        reason: String,
        location: LocationInfo,
    },
}

impl NextTaskResult {
    /// The reason attached to whichever variant this is.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::Task { reason, .. }
            | Self::Gate { reason, .. }
            | Self::Planning { reason, .. }
            | Self::FestivalComplete { reason, .. }
            | Self::NoTasksReady { reason, .. } => reason,
        }
    }

    /// The location attached to whichever variant this is.
    #[must_use]
    pub fn location(&self) -> &LocationInfo {
        match self {
            Self::Task { location, .. }
            | Self::Gate { location, .. }
            | Self::Planning { location, .. }
            | Self::FestivalComplete { location, .. }
            | Self::NoTasksReady { location, .. } => location,
        }
    }
}
