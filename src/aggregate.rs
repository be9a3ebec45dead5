//! Rolling per-task status up the festival hierarchy.
//!
//! Aggregation walks directory entries level by level - festival to
//! phases to sequences to task files - recognizing each level by its
//! numeric-prefix naming convention and resolving every task's status
//! through the reconciliation rule before counting it. Each level's
//! aggregate is the sum of its children plus a flattened list of blocked
//! task details, so a festival-level rollup can name every blocker in one
//! pass.
//!
//! A directory that fails to enumerate (permissions, deletion race) is
//! skipped with a warning rather than aborting the whole rollup.

use std::path::Path;

use serde::Serialize;
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::cancel::CancelToken;
use crate::layout;
use crate::progress::{FestivalProgressData, TaskStatus};
use crate::resolver;
use crate::error::Result;

// ============================================================================
// Rollup Types
// ============================================================================

/// Detail record for one blocked task, surfaced in every ancestor's
/// rollup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockedTaskDetail {
    /// Festival-relative task path
    pub task_id: String,
    /// Blocker message from the stored record, when present
    pub blocker: Option<String>,
    /// When the task became blocked, when recorded
    pub blocked_at: Option<DateTime<Utc>>,
}

/// Completion counts for one level of the hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressRollup {
    /// Tasks seen
    pub total: usize,
    /// Tasks resolved completed
    pub completed: usize,
    /// Tasks resolved in progress
    pub in_progress: usize,
    /// Tasks resolved blocked
    pub blocked: usize,
    /// Tasks resolved pending
    pub pending: usize,
    /// Recorded work minutes summed from the store
    pub minutes_spent: u64,
    /// Every blocked task under this level
    pub blocked_tasks: Vec<BlockedTaskDetail>,
}

impl ProgressRollup {
    /// Completion percentage, truncated. Zero when nothing is tracked.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (self.completed * 100 / self.total) as u8
    }

    /// Fold a child aggregate into this one.
    pub fn absorb(&mut self, child: ProgressRollup) {
        self.total += child.total;
        self.completed += child.completed;
        self.in_progress += child.in_progress;
        self.blocked += child.blocked;
        self.pending += child.pending;
        self.minutes_spent += child.minutes_spent;
        self.blocked_tasks.extend(child.blocked_tasks);
    }

    fn record(&mut self, task_id: &str, status: TaskStatus, data: &FestivalProgressData) {
        self.total += 1;
        match status {
            TaskStatus::Completed => self.completed += 1,
            TaskStatus::InProgress => self.in_progress += 1,
            TaskStatus::Blocked => self.blocked += 1,
            TaskStatus::Pending => self.pending += 1,
        }

        let stored = resolver::resolve_task_progress(data, task_id);
        if let Some(record) = stored {
            self.minutes_spent += record.time_spent_minutes;
        }
        if status == TaskStatus::Blocked {
            self.blocked_tasks.push(BlockedTaskDetail {
                task_id: task_id.to_string(),
                blocker: stored.and_then(|r| r.blocker.clone()),
                blocked_at: stored.and_then(|r| r.blocked_at),
            });
        }
    }
}

// ============================================================================
// Level Walks
// ============================================================================

/// Roll up one sequence directory.
///
/// # Errors
///
/// Fails only on cancellation; unreadable directories contribute nothing.
pub fn sequence_rollup(
    festival_root: &Path,
    sequence_dir: &Path,
    data: &FestivalProgressData,
    cancel: &CancelToken,
) -> Result<ProgressRollup> {
    cancel.check("sequence rollup")?;
    let mut rollup = ProgressRollup::default();

    for name in sorted_entries(sequence_dir) {
        cancel.check("sequence rollup")?;
        if layout::parse_task_file(&name).is_none() {
            continue;
        }
        let path = sequence_dir.join(&name);
        let Ok(task_id) = resolver::normalize_task_id(festival_root, &path) else {
            warn!("task outside festival root skipped: {}", path.display());
            continue;
        };
        let status = resolver::resolve_status_for_file(festival_root, &task_id, data);
        rollup.record(&task_id, status, data);
    }
    Ok(rollup)
}

/// Roll up one phase directory from its sequences.
///
/// # Errors
///
/// Fails only on cancellation.
pub fn phase_rollup(
    festival_root: &Path,
    phase_dir: &Path,
    data: &FestivalProgressData,
    cancel: &CancelToken,
) -> Result<ProgressRollup> {
    cancel.check("phase rollup")?;
    let mut rollup = ProgressRollup::default();

    for name in sorted_entries(phase_dir) {
        cancel.check("phase rollup")?;
        if layout::parse_sequence_dir(&name).is_none() {
            continue;
        }
        let child = sequence_rollup(festival_root, &phase_dir.join(&name), data, cancel)?;
        rollup.absorb(child);
    }
    Ok(rollup)
}

/// Roll up a whole festival from its phases.
///
/// # Errors
///
/// Fails only on cancellation.
pub fn festival_rollup(
    festival_root: &Path,
    data: &FestivalProgressData,
    cancel: &CancelToken,
) -> Result<ProgressRollup> {
    cancel.check("festival rollup")?;
    let mut rollup = ProgressRollup::default();

    for name in sorted_entries(festival_root) {
        cancel.check("festival rollup")?;
        if layout::parse_phase_dir(&name).is_none() {
            continue;
        }
        let child = phase_rollup(festival_root, &festival_root.join(&name), data, cancel)?;
        rollup.absorb(child);
    }
    Ok(rollup)
}

/// Directory entry names in lexicographic order. An unreadable directory
/// yields nothing, matching the skip-don't-abort policy.
fn sorted_entries(dir: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("cannot enumerate {}: {e}", dir.display());
            return Vec::new();
        }
    };
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
