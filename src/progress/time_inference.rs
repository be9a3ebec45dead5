//! Backfilling time tracking from file modification times.
//!
//! Tasks finished without explicit time tracking still deserve rough
//! numbers. When a record carries no explicit minutes, the task file's
//! mtime stands in for the completion timestamp, and the missing start is
//! admitted to be unknown by setting it equal to completion - a zero
//! inferred duration rather than a fabricated one. Elapsed minutes are
//! reported as-is; a task that sat for three days reports three days.
//!
//! Explicit data always wins: any record with `time_spent_minutes > 0` is
//! left untouched.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{TaskProgress, TaskStatus};
use crate::error::Result;

// ============================================================================
// Modification-Time Cache
// ============================================================================

/// Opt-in cache of file modification times.
///
/// The only caching layer in the crate, used by the inference path so a
/// festival-wide pass doesn't stat every task file repeatedly. Callers
/// that write task files must [`invalidate`](MtimeCache::invalidate) the
/// entry themselves; nothing here watches the filesystem.
#[derive(Debug, Default)]
pub struct MtimeCache {
    entries: HashMap<PathBuf, DateTime<Utc>>,
}

impl MtimeCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a file's modification time, consulting the cache first.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be stat'ed.
    pub fn mtime(&mut self, path: &Path) -> Result<DateTime<Utc>> {
        if let Some(cached) = self.entries.get(path) {
            return Ok(*cached);
        }
        let modified = std::fs::metadata(path)?.modified()?;
        let stamp: DateTime<Utc> = modified.into();
        self.entries.insert(path.to_path_buf(), stamp);
        Ok(stamp)
    }

    /// Drop a cached entry after writing to the file.
    pub fn invalidate(&mut self, path: &Path) {
        self.entries.remove(path);
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Inference
// ============================================================================

/// Check whether a task record is a candidate for time inference.
///
/// True only for completed tasks lacking both explicit time and a
/// completion timestamp; everything else either has real data or isn't
/// finished yet.
#[must_use]
pub fn needs_time_inference(task: &TaskProgress) -> bool {
    task.status == TaskStatus::Completed
        && !task.has_explicit_time()
        && task.completed_at.is_none()
}

/// Fill in missing timestamps and elapsed minutes for one task record,
/// using the task file's modification time as a completion proxy.
///
/// Applies only when `time_spent_minutes == 0`; explicit data is never
/// overwritten. Returns whether the record changed.
///
/// # Errors
///
/// Fails when the task file's mtime is needed but cannot be read.
pub fn infer_task_times(
    task: &mut TaskProgress,
    task_file: &Path,
    cache: &mut MtimeCache,
) -> Result<bool> {
    if task.has_explicit_time() {
        return Ok(false);
    }
    let mut changed = false;

    if task.status == TaskStatus::Completed && task.completed_at.is_none() {
        let mtime = cache.mtime(task_file)?;
        debug!(
            "inferred completion of {} from mtime {mtime}",
            task_file.display()
        );
        task.completed_at = Some(mtime);
        changed = true;
    }

    if let (Some(completed), None) = (task.completed_at, task.started_at) {
        // Start time is unknown; admit it rather than invent a duration
        task.started_at = Some(completed);
        changed = true;
    }

    if let (Some(started), Some(completed)) = (task.started_at, task.completed_at) {
        if task.time_spent_minutes == 0 {
            let minutes = (completed - started).num_minutes().max(0) as u64;
            if minutes > 0 {
                task.time_spent_minutes = minutes;
                changed = true;
            }
        }
    }

    Ok(changed)
}
