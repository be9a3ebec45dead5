//! Reconciling checklist state with the stored progress record.
//!
//! A task's status lives in two places that can drift apart: the checklist
//! markers inside its document, and the structured record in the progress
//! store. This module resolves the two into one authoritative status, and
//! locates a task's stored record robustly across renames and legacy key
//! formats.
//!
//! # Precedence
//!
//! The rule is a small decision table, not a pile of conditionals:
//!
//! | checklist   | store            | resolved    |
//! |-------------|------------------|-------------|
//! | completed   | anything         | completed   |
//! | in_progress | anything         | in_progress |
//! | pending     | blocked          | blocked     |
//! | pending     | anything else    | pending     |
//!
//! Checklist text is the ground truth for completion: a store that says
//! "completed" over an unchecked document is stale, and the task reports
//! pending. The store only ever elevates a pending checklist to blocked.
//! Callers that need time or blocker metadata should read the stored
//! record directly; this resolver decides status, nothing more.

use std::path::{Component, Path};

use tracing::debug;

use crate::checklist::{self, ChecklistStatus};
use crate::error::{FestError, Result};
use crate::progress::{FestivalProgressData, TaskProgress, TaskStatus};

// ============================================================================
// Task Identification
// ============================================================================

/// Normalize a task path into the festival-relative, forward-slash key
/// used by the progress store.
///
/// Absolute paths and separator-containing relative paths are rebased
/// against the festival root; bare filenames pass through unchanged for
/// records that predate path-based keys.
///
/// # Errors
///
/// Rejects absolute paths outside the festival root and paths that climb
/// out of it.
pub fn normalize_task_id(festival_root: &Path, task_path: &Path) -> Result<String> {
    let relative = if task_path.is_absolute() {
        task_path
            .strip_prefix(festival_root)
            .map_err(|_| FestError::TaskOutsideFestival {
                path: task_path.to_path_buf(),
            })?
    } else {
        task_path
    };

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(seg) => segments.push(seg.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => {
                return Err(FestError::TaskOutsideFestival {
                    path: task_path.to_path_buf(),
                })
            }
        }
    }
    if segments.is_empty() {
        return Err(FestError::validation("task_path", "resolves to nothing"));
    }
    Ok(segments.join("/"))
}

/// Look up a task's stored record, trying the normalized path key first
/// and falling back to a bare base-filename key for festivals whose
/// records predate path-based identification.
#[must_use]
pub fn resolve_task_progress<'a>(
    data: &'a FestivalProgressData,
    task_id: &str,
) -> Option<&'a TaskProgress> {
    if let Some(record) = data.tasks.get(task_id) {
        return Some(record);
    }
    let base = task_id.rsplit('/').next()?;
    if base == task_id {
        return None;
    }
    let legacy = data.tasks.get(base);
    if legacy.is_some() {
        debug!("task {task_id} found under legacy key {base}");
    }
    legacy
}

// ============================================================================
// Status Resolution
// ============================================================================

/// Merge a checklist classification with the stored record into the one
/// authoritative status. See the module docs for the decision table.
#[must_use]
pub fn resolve_task_status(
    checklist: ChecklistStatus,
    stored: Option<&TaskProgress>,
) -> TaskStatus {
    match (checklist, stored.map(|t| t.status)) {
        (ChecklistStatus::Completed, _) => TaskStatus::Completed,
        (ChecklistStatus::InProgress, _) => TaskStatus::InProgress,
        (ChecklistStatus::Pending, Some(TaskStatus::Blocked)) => TaskStatus::Blocked,
        (ChecklistStatus::Pending, _) => TaskStatus::Pending,
    }
}

/// Resolve a task's authoritative status straight from its document and
/// the loaded record. The document read is fail-safe (missing file reads
/// as pending).
#[must_use]
pub fn resolve_status_for_file(
    festival_root: &Path,
    task_id: &str,
    data: &FestivalProgressData,
) -> TaskStatus {
    let checklist = checklist::classify_file(&festival_root.join(task_id));
    let stored = resolve_task_progress(data, task_id);
    resolve_task_status(checklist, stored)
}
