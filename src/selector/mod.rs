//! Next-task selection.
//!
//! The selector answers the one question this crate exists for: which
//! unit of work should be done next? It leans on the external dependency
//! graph for readiness, on the resolver for truthful statuses, and on a
//! fixed priority policy for ordering:
//!
//! ```text
//! find_next
//!   1. graph.resolve(root)
//!   2. overwrite node statuses via checklist + store reconciliation
//!   3. classify the caller's location (phase / sequence context)
//!   4. planning phase?  -> objectives report, no task selection
//!   5. ready set empty? -> festival complete | blocking gate | nothing ready
//!   6. prioritize:  current sequence > current phase
//!                   > earlier phase > earlier sequence > lower ordinal
//!   7. surface parallel siblings of the winner
//! ```

pub mod fs_graph;
pub mod graph;
pub mod result;

pub use fs_graph::OrdinalGraph;
pub use graph::{from_graph_status, to_graph_status, TaskGraph, TaskNode, GRAPH_STATUS_COMPLETE};
pub use result::{GateInfo, LocationInfo, NextTaskResult, TaskInfo};

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::aggregate;
use crate::cancel::CancelToken;
use crate::config::FestConfig;
use crate::error::Result;
use crate::planning;
use crate::progress::{store::ProgressStore, FestivalProgressData};
use crate::resolver;

// ============================================================================
// Selector
// ============================================================================

/// Next-task selection over one festival and a graph collaborator.
pub struct Selector<'g> {
    festival_root: PathBuf,
    config: FestConfig,
    graph: &'g mut dyn TaskGraph,
}

impl<'g> Selector<'g> {
    /// Create a selector, loading the festival's configuration.
    pub fn new(festival_root: impl Into<PathBuf>, graph: &'g mut dyn TaskGraph) -> Self {
        let festival_root = festival_root.into();
        let config = FestConfig::load(&festival_root);
        Self {
            festival_root,
            config,
            graph,
        }
    }

    /// Create a selector with an explicit configuration.
    pub fn with_config(
        festival_root: impl Into<PathBuf>,
        config: FestConfig,
        graph: &'g mut dyn TaskGraph,
    ) -> Self {
        Self {
            festival_root: festival_root.into(),
            config,
            graph,
        }
    }

    /// Recommend the next unit of work, seen from `current_location`.
    ///
    /// # Errors
    ///
    /// Fails on cancellation, graph resolution failure, or an unreadable
    /// progress record. Task documents themselves are read fail-safe.
    pub fn find_next(
        &mut self,
        current_location: &Path,
        cancel: &CancelToken,
    ) -> Result<NextTaskResult> {
        cancel.check("find next task")?;

        let data = self.refresh_statuses(cancel)?;
        let location = self.classify_location(current_location);

        // Exploratory phases graduate instead of selecting tasks
        if let Some(phase) = &location.phase {
            if let Some(declared) = planning::phase_type(&self.festival_root, phase, &self.config) {
                if self.config.is_planning_type(&declared) {
                    let report = planning::report_for_phase(
                        &self.festival_root,
                        phase,
                        &declared,
                        &self.config,
                        cancel,
                    )?;
                    let reason = format!(
                        "phase {phase} is a {declared} phase: {}/{} objectives resolved",
                        report.resolved, report.total
                    );
                    return Ok(NextTaskResult::Planning {
                        report,
                        reason,
                        location,
                    });
                }
            }
        }

        let ready_ids: Vec<String> = self
            .graph
            .ready_tasks()
            .into_iter()
            .map(|n| n.id.clone())
            .collect();

        if ready_ids.is_empty() {
            return self.explain_empty_ready_set(location, cancel);
        }

        let percent = aggregate::festival_rollup(&self.festival_root, &data, cancel)?.percent();
        self.recommend(&ready_ids, &location, Some(percent), cancel)
    }

    /// Recommend the next task within one sequence, ordered purely by
    /// ordinal. The same readiness and parallel-sibling logic applies.
    ///
    /// # Errors
    ///
    /// As for [`find_next`](Self::find_next).
    pub fn find_next_in_sequence(
        &mut self,
        sequence_path: &str,
        cancel: &CancelToken,
    ) -> Result<NextTaskResult> {
        cancel.check("find next in sequence")?;

        self.refresh_statuses(cancel)?;
        let location = self.classify_location(&self.festival_root.join(sequence_path));

        let mut ready: Vec<&TaskNode> = self
            .graph
            .ready_tasks()
            .into_iter()
            .filter(|n| n.sequence_path == sequence_path)
            .collect();
        ready.sort_by(|a, b| a.ordinal.cmp(&b.ordinal));

        let Some(primary) = ready.first().copied() else {
            return Ok(NextTaskResult::NoTasksReady {
                reason: format!("no ready tasks in sequence {sequence_path}"),
                location,
            });
        };
        let parallel = parallel_siblings(&ready, primary);
        Ok(NextTaskResult::Task {
            task: TaskInfo::from(primary),
            parallel,
            reason: format!("next task by ordinal in sequence {sequence_path}"),
            location,
            progress_percent: None,
        })
    }

    // ========================================================================
    // Status Refresh
    // ========================================================================

    /// Resolve the graph and overwrite every node's status with the
    /// reconciled one, so readiness sees checklist-accurate state.
    fn refresh_statuses(&mut self, cancel: &CancelToken) -> Result<FestivalProgressData> {
        self.graph.resolve(&self.festival_root)?;
        let store = ProgressStore::load(&self.festival_root, &self.config, cancel)?;
        let data = store.data().clone();

        for node in self.graph.nodes_mut() {
            cancel.check("status refresh")?;
            let resolved = resolver::resolve_status_for_file(&self.festival_root, &node.id, &data);
            let graph_status = to_graph_status(resolved);
            if node.status != graph_status {
                debug!("status of {} refreshed to {graph_status}", node.id);
                node.status = graph_status.to_string();
            }
        }
        Ok(data)
    }

    // ========================================================================
    // Location Classification
    // ========================================================================

    /// Classify a location into festival/phase/sequence context by its
    /// numeric-prefixed path segments under the festival root.
    fn classify_location(&self, current: &Path) -> LocationInfo {
        let festival = self
            .festival_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.festival_root.display().to_string());

        let Ok(relative) = current.strip_prefix(&self.festival_root) else {
            return LocationInfo {
                festival,
                phase: None,
                sequence: None,
            };
        };

        let mut phase: Option<String> = None;
        let mut sequence: Option<String> = None;
        for component in relative.components() {
            let name = component.as_os_str().to_string_lossy();
            if phase.is_none() {
                if crate::layout::parse_phase_dir(&name).is_some() {
                    phase = Some(name.into_owned());
                }
            } else if sequence.is_none() {
                if crate::layout::parse_sequence_dir(&name).is_some() {
                    if let Some(p) = &phase {
                        sequence = Some(format!("{p}/{name}"));
                    }
                }
            } else {
                break;
            }
        }
        LocationInfo {
            festival,
            phase,
            sequence,
        }
    }

    // ========================================================================
    // Empty Ready Set
    // ========================================================================

    fn explain_empty_ready_set(
        &self,
        location: LocationInfo,
        cancel: &CancelToken,
    ) -> Result<NextTaskResult> {
        cancel.check("empty ready set")?;
        let nodes = self.graph.nodes();

        if !nodes.is_empty() && nodes.iter().all(TaskNode::is_complete) {
            return Ok(NextTaskResult::FestivalComplete {
                reason: "every task in the festival is complete".to_string(),
                location,
            });
        }

        if let Some(gate) = self.find_blocking_gate(cancel)? {
            let reason = format!(
                "phase {} is complete but its quality gate is unresolved",
                gate.phase_path
            );
            return Ok(NextTaskResult::Gate {
                gate,
                reason,
                location,
            });
        }

        Ok(NextTaskResult::NoTasksReady {
            reason: "no tasks ready: dependencies not satisfied".to_string(),
            location,
        })
    }

    /// Find a fully-complete, non-final phase with a gate marker present.
    fn find_blocking_gate(&self, cancel: &CancelToken) -> Result<Option<GateInfo>> {
        let phases: BTreeSet<&str> = self
            .graph
            .nodes()
            .iter()
            .map(|n| n.phase_path.as_str())
            .collect();
        let Some(last_phase) = phases.iter().next_back().copied() else {
            return Ok(None);
        };

        for phase in &phases {
            cancel.check("gate scan")?;
            if *phase == last_phase {
                continue;
            }
            let phase_complete = self
                .graph
                .nodes()
                .iter()
                .filter(|n| n.phase_path == *phase)
                .all(TaskNode::is_complete);
            if !phase_complete {
                continue;
            }
            let marker = self
                .festival_root
                .join(phase)
                .join(&self.config.gate_marker);
            if marker.exists() {
                return Ok(Some(GateInfo {
                    phase_path: (*phase).to_string(),
                    marker: self.config.gate_marker.clone(),
                }));
            }
        }
        Ok(None)
    }

    // ========================================================================
    // Prioritization
    // ========================================================================

    fn recommend(
        &self,
        ready_ids: &[String],
        location: &LocationInfo,
        progress_percent: Option<u8>,
        cancel: &CancelToken,
    ) -> Result<NextTaskResult> {
        cancel.check("prioritize ready tasks")?;

        let nodes = self.graph.nodes();
        let mut ready: Vec<&TaskNode> = nodes
            .iter()
            .filter(|n| ready_ids.contains(&n.id))
            .collect();

        let current_sequence = location.sequence.as_deref();
        let current_phase = location.phase.as_deref();
        ready.sort_by(|a, b| {
            let key = |n: &TaskNode| {
                (
                    Some(n.sequence_path.as_str()) != current_sequence,
                    Some(n.phase_path.as_str()) != current_phase,
                )
            };
            key(a)
                .cmp(&key(b))
                .then_with(|| a.phase_path.cmp(&b.phase_path))
                .then_with(|| a.sequence_path.cmp(&b.sequence_path))
                .then_with(|| a.ordinal.cmp(&b.ordinal))
        });

        let primary = ready[0];
        let parallel = parallel_siblings(&ready, primary);
        let reason = if Some(primary.sequence_path.as_str()) == current_sequence {
            "next task in the current sequence".to_string()
        } else if Some(primary.phase_path.as_str()) == current_phase {
            format!(
                "next task in the current phase, sequence {}",
                primary.sequence_path
            )
        } else {
            format!("next ready task is in phase {}", primary.phase_path)
        };

        Ok(NextTaskResult::Task {
            task: TaskInfo::from(primary),
            parallel,
            reason,
            location: location.clone(),
            progress_percent,
        })
    }
}

/// Ready tasks sharing the primary's sequence and parallel-group tag,
/// excluding the primary itself.
fn parallel_siblings(ready: &[&TaskNode], primary: &TaskNode) -> Vec<TaskInfo> {
    let Some(group) = &primary.parallel_group else {
        return Vec::new();
    };
    ready
        .iter()
        .filter(|n| {
            n.id != primary.id
                && n.sequence_path == primary.sequence_path
                && n.parallel_group.as_ref() == Some(group)
        })
        .map(|n| TaskInfo::from(*n))
        .collect()
}
