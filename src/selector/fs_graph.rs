//! Filesystem-convention task graph.
//!
//! A minimal [`TaskGraph`] used by the CLI when no external graph builder
//! is wired in. It scans the hierarchy and derives dependencies from
//! ordinal order within each sequence: every task depends on the tasks of
//! the previous distinct ordinal, and tasks sharing an ordinal form a
//! parallel group. Festivals with richer dependency declarations should
//! supply their own collaborator; the trait seam is the same.

use std::collections::BTreeMap;
use std::path::Path;

use walkdir::WalkDir;

use super::graph::{TaskGraph, TaskNode};
use crate::error::Result;
use crate::layout::{self, TaskOrdinal};

/// Task graph derived purely from the directory convention.
#[derive(Debug, Default)]
pub struct OrdinalGraph {
    nodes: Vec<TaskNode>,
}

impl OrdinalGraph {
    /// Create an empty graph; call [`TaskGraph::resolve`] to populate it.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskGraph for OrdinalGraph {
    fn resolve(&mut self, festival_root: &Path) -> Result<()> {
        // sequence path -> ordered tasks (ordinal, id)
        let mut sequences: BTreeMap<String, Vec<(TaskOrdinal, String)>> = BTreeMap::new();

        let walker = WalkDir::new(festival_root)
            .min_depth(1)
            .max_depth(3)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let name = entry.file_name().to_string_lossy();
                !layout::is_hidden(&name)
            });

        for entry in walker {
            let Ok(entry) = entry else { continue };
            if !entry.file_type().is_file() || entry.depth() != 3 {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(festival_root) else {
                continue;
            };
            let segments: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            let [phase, sequence, file] = segments.as_slice() else {
                continue;
            };
            if layout::parse_phase_dir(phase).is_none()
                || layout::parse_sequence_dir(sequence).is_none()
            {
                continue;
            }
            let Some(ordinal) = layout::parse_task_file(file) else {
                continue;
            };
            sequences
                .entry(format!("{phase}/{sequence}"))
                .or_default()
                .push((ordinal, format!("{phase}/{sequence}/{file}")));
        }

        self.nodes = Vec::new();
        for (sequence_path, mut tasks) in sequences {
            tasks.sort();
            let phase_path = sequence_path
                .split('/')
                .next()
                .unwrap_or(&sequence_path)
                .to_string();

            for (ordinal, id) in &tasks {
                let shares_ordinal = tasks
                    .iter()
                    .filter(|(other, _)| other == ordinal)
                    .count()
                    > 1;
                let depends_on: Vec<String> = match tasks
                    .iter()
                    .filter(|(other, _)| other < ordinal)
                    .map(|(other, _)| *other)
                    .max()
                {
                    Some(previous) => tasks
                        .iter()
                        .filter(|(other, _)| *other == previous)
                        .map(|(_, dep_id)| dep_id.clone())
                        .collect(),
                    None => Vec::new(),
                };

                self.nodes.push(TaskNode {
                    id: id.clone(),
                    phase_path: phase_path.clone(),
                    sequence_path: sequence_path.clone(),
                    ordinal: *ordinal,
                    parallel_group: shares_ordinal.then(|| ordinal.to_string()),
                    depends_on,
                    status: "pending".to_string(),
                });
            }
        }
        Ok(())
    }

    fn nodes(&self) -> &[TaskNode] {
        &self.nodes
    }

    fn nodes_mut(&mut self) -> &mut [TaskNode] {
        &mut self.nodes
    }
}
