//! Persistence for festival progress records.
//!
//! The store owns the load/mutate/save cycle for one festival's
//! [`FestivalProgressData`], persisted as pretty JSON at a fixed relative
//! path under the festival root (`.fest/progress.json` by default).
//!
//! Reads are lenient: a missing file initializes an empty record, and a
//! legacy payload without time metrics gets them synthesized from its
//! `updated_at` stamp. Writes are strict: serialization and I/O errors
//! surface directly, with no retry.
//!
//! Because each call is a full read-modify-write with no versioning,
//! concurrent writers would silently lose updates. [`ProgressStore::with_lock`]
//! wraps the whole cycle in an exclusive file lock that is released on all
//! exit paths; multi-process callers should prefer it over bare
//! load/save.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use tracing::{debug, warn};

use super::{FestivalProgressData, FestivalTimeMetrics, TaskProgress, TaskStatus};
use crate::cancel::CancelToken;
use crate::config::FestConfig;
use crate::error::{FestError, Result};

// ============================================================================
// Progress Store
// ============================================================================

/// Durable per-festival record of task status, time, and blockers.
#[derive(Debug)]
pub struct ProgressStore {
    festival_root: PathBuf,
    path: PathBuf,
    data: FestivalProgressData,
}

impl ProgressStore {
    /// Load the record for a festival, initializing an empty one when no
    /// backing file exists.
    ///
    /// Legacy payloads without `time_metrics` have `created_at`
    /// synthesized from the record's `updated_at`; loading never fails on
    /// an old record.
    ///
    /// # Errors
    ///
    /// Fails on cancellation, unreadable (but present) files, or a payload
    /// that does not parse at all.
    pub fn load(festival_root: &Path, config: &FestConfig, cancel: &CancelToken) -> Result<Self> {
        cancel.check("progress store load")?;

        let path = config.progress_path(festival_root);
        let data = if path.exists() {
            let payload = std::fs::read_to_string(&path)?;
            let mut data: FestivalProgressData = serde_json::from_str(&payload)
                .map_err(|e| FestError::parse(&path, e.to_string()))?;
            if data.time_metrics.is_none() {
                debug!(
                    "record {} predates time metrics; synthesizing from updated_at",
                    path.display()
                );
                data.time_metrics = Some(FestivalTimeMetrics::new(data.updated_at));
            }
            data
        } else {
            FestivalProgressData::new(festival_name(festival_root), Utc::now())
        };

        Ok(Self {
            festival_root: festival_root.to_path_buf(),
            path,
            data,
        })
    }

    /// Persist the record, stamping `updated_at` and creating the
    /// containing directory if missing.
    ///
    /// # Errors
    ///
    /// Fails on cancellation, serialization errors, or I/O errors; write
    /// failures are never swallowed.
    pub fn save(&mut self, cancel: &CancelToken) -> Result<()> {
        cancel.check("progress store save")?;

        self.data.updated_at = Utc::now();
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(&self.path, json)
            .map_err(|e| FestError::store_with_path(e.to_string(), &self.path))?;
        Ok(())
    }

    /// Run `mutate` on this festival's record inside an exclusive file
    /// lock, saving on success.
    ///
    /// The lock lives beside the record and is released when the guard
    /// drops, on every exit path including errors. Nothing is saved if
    /// `mutate` fails.
    ///
    /// # Errors
    ///
    /// Propagates lock acquisition, load, mutation, and save errors.
    pub fn with_lock<T>(
        festival_root: &Path,
        config: &FestConfig,
        cancel: &CancelToken,
        mutate: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let _guard = ProgressLock::acquire(festival_root, config)?;
        let mut store = Self::load(festival_root, config, cancel)?;
        let value = mutate(&mut store)?;
        store.save(cancel)?;
        Ok(value)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The festival root this store belongs to.
    #[must_use]
    pub fn festival_root(&self) -> &Path {
        &self.festival_root
    }

    /// The loaded record.
    #[must_use]
    pub fn data(&self) -> &FestivalProgressData {
        &self.data
    }

    /// Look up one task's record.
    #[must_use]
    pub fn get_task(&self, task_id: &str) -> Option<&TaskProgress> {
        self.data.tasks.get(task_id)
    }

    /// Insert or replace one task's record.
    ///
    /// # Errors
    ///
    /// Rejects task ids that escape the festival root.
    pub fn set_task(&mut self, task_id: impl Into<String>, progress: TaskProgress) -> Result<()> {
        let task_id = task_id.into();
        validate_task_id(&task_id)?;
        self.data.tasks.insert(task_id, progress);
        Ok(())
    }

    /// All task records.
    #[must_use]
    pub fn all_tasks(&self) -> &BTreeMap<String, TaskProgress> {
        &self.data.tasks
    }

    /// Apply a mutation to one task's record, creating it lazily.
    ///
    /// # Errors
    ///
    /// Rejects invalid task ids before creating anything; propagates
    /// mutation errors (the lazily-created record is kept only on
    /// success).
    pub fn update_task(
        &mut self,
        task_id: &str,
        mutate: impl FnOnce(&mut TaskProgress) -> Result<()>,
    ) -> Result<()> {
        validate_task_id(task_id)?;
        let mut entry = self.data.tasks.get(task_id).cloned().unwrap_or_default();
        mutate(&mut entry)?;
        self.data.tasks.insert(task_id.to_string(), entry);
        Ok(())
    }

    /// Drop a task's record, e.g. after the task file was deleted by the
    /// renumbering tooling. Returns the removed record, if any.
    pub fn remove_task(&mut self, task_id: &str) -> Option<TaskProgress> {
        self.data.tasks.remove(task_id)
    }

    /// Move a task's record to a new id, e.g. after a rename. A no-op
    /// when no record exists under `from`.
    ///
    /// # Errors
    ///
    /// Rejects an invalid destination id before mutating.
    pub fn rename_task(&mut self, from: &str, to: &str) -> Result<()> {
        validate_task_id(to)?;
        if let Some(record) = self.data.tasks.remove(from) {
            self.data.tasks.insert(to.to_string(), record);
        }
        Ok(())
    }

    // ========================================================================
    // Festival-Level Operations
    // ========================================================================

    /// Record the festival as completed now, computing the lifecycle
    /// duration as whole days since creation. No upper bound applies.
    pub fn mark_festival_completed(&mut self, now: DateTime<Utc>) {
        let metrics = self
            .data
            .time_metrics
            .get_or_insert_with(|| FestivalTimeMetrics::new(now));
        metrics.completed_at = Some(now);
        metrics.lifecycle_duration_days = (now - metrics.created_at).num_days();
    }

    /// Transition the festival into "completed" once all tracked tasks are
    /// completed and no completion timestamp exists yet.
    ///
    /// Idempotent: repeated calls after completion are no-ops and never
    /// reset the timestamp. Returns whether this call performed the
    /// transition.
    ///
    /// # Errors
    ///
    /// Fails only on cancellation.
    pub fn check_and_set_completion(
        &mut self,
        now: DateTime<Utc>,
        cancel: &CancelToken,
    ) -> Result<bool> {
        cancel.check("festival completion check")?;

        let already_completed = self
            .data
            .time_metrics
            .as_ref()
            .is_some_and(FestivalTimeMetrics::is_completed);
        if already_completed || !self.data.all_tasks_completed() {
            return Ok(false);
        }
        self.mark_festival_completed(now);
        Ok(true)
    }

    /// Recompute `total_work_minutes` from all task records.
    ///
    /// The total is not kept in sync automatically; call this after
    /// mutating task times.
    pub fn update_total_work_minutes(&mut self) {
        let total = self.data.summed_work_minutes();
        let metrics = self
            .data
            .time_metrics
            .get_or_insert_with(|| FestivalTimeMetrics::new(self.data.updated_at));
        metrics.total_work_minutes = total;
    }

    /// Count of tracked tasks by status.
    #[must_use]
    pub fn status_counts(&self) -> BTreeMap<TaskStatus, usize> {
        let mut counts = BTreeMap::new();
        for task in self.data.tasks.values() {
            *counts.entry(task.status).or_insert(0) += 1;
        }
        counts
    }
}

/// Reject task ids that are absolute or climb out of the festival root.
/// Runs before any mutation.
fn validate_task_id(task_id: &str) -> Result<()> {
    if task_id.is_empty() {
        return Err(FestError::validation("task_id", "must not be empty"));
    }
    let path = Path::new(task_id);
    if path.is_absolute() || task_id.split('/').any(|seg| seg == "..") {
        return Err(FestError::TaskOutsideFestival { path: path.into() });
    }
    Ok(())
}

fn festival_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string())
}

// ============================================================================
// Exclusive Lock
// ============================================================================

/// Scoped exclusive lock over a festival's progress record.
///
/// Backed by an advisory `flock` on a lockfile beside the record, so two
/// processes running the load-mutate-save cycle serialize instead of
/// silently losing updates. Released on drop.
pub struct ProgressLock {
    file: File,
    path: PathBuf,
}

impl ProgressLock {
    /// Acquire the lock, blocking until it is available.
    ///
    /// # Errors
    ///
    /// Fails when the lockfile cannot be created or locked.
    pub fn acquire(festival_root: &Path, config: &FestConfig) -> Result<Self> {
        let record = config.progress_path(festival_root);
        let path = record.with_extension("lock");
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        file.lock_exclusive()
            .map_err(|_| FestError::LockFailed { path: path.clone() })?;
        Ok(Self { file, path })
    }
}

impl Drop for ProgressLock {
    fn drop(&mut self) {
        if let Err(e) = fs2::FileExt::unlock(&self.file) {
            warn!("failed to unlock {}: {e}", self.path.display());
        }
    }
}
