//! Durable progress records for a festival.
//!
//! # Architecture
//!
//! One [`FestivalProgressData`] record exists per festival, persisted as a
//! single JSON file by the [`store`]:
//!
//! ```text
//! FestivalProgressData
//!   ├── festival: String
//!   ├── updated_at: DateTime<Utc>
//!   ├── time_metrics: FestivalTimeMetrics (synthesized for legacy records)
//!   └── tasks: BTreeMap<task_id, TaskProgress>
//! ```
//!
//! The record is the secondary source of truth for task status - checklist
//! markers in the task documents themselves win on completion state - but
//! it is the only home of time tracking and blocker metadata.

pub mod store;
pub mod time_inference;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FestError, Result};

// ============================================================================
// Task Status
// ============================================================================

/// Stored status of a single task.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not yet started
    #[default]
    Pending,
    /// Work underway
    InProgress,
    /// Waiting on something external; see the blocker message
    Blocked,
    /// All done
    Completed,
}

impl TaskStatus {
    /// Stable string form, matching the wire format.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Task Progress
// ============================================================================

/// Stored progress record for one task, keyed by its festival-relative
/// path.
///
/// Created lazily on first update; mutated only through the store's update
/// operations so the invariants below hold:
///
/// - `progress == 100` implies `status == Completed` with `completed_at`
///   set.
/// - A non-zero `time_spent_minutes` is explicit data and is never
///   recalculated by inference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TaskProgress {
    /// Current status
    #[serde(default)]
    pub status: TaskStatus,
    /// Completion percentage, 0-100
    #[serde(default)]
    pub progress: u8,
    /// When work started
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When work finished
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// When the task became blocked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_at: Option<DateTime<Utc>>,
    /// Minutes of recorded work; 0 means "not tracked yet"
    #[serde(default)]
    pub time_spent_minutes: u64,
    /// Why the task is blocked, when it is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocker: Option<String>,
}

impl TaskProgress {
    /// Fresh pending record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the completion percentage, upholding the completion invariant.
    ///
    /// # Errors
    ///
    /// Returns a validation error for values above 100.
    pub fn set_progress(&mut self, progress: u8, now: DateTime<Utc>) -> Result<()> {
        if progress > 100 {
            return Err(FestError::validation(
                "progress",
                format!("must be between 0 and 100, got {progress}"),
            ));
        }
        self.progress = progress;
        if progress == 100 {
            self.mark_completed(now);
        }
        Ok(())
    }

    /// Mark the task started, stamping `started_at` once.
    pub fn mark_started(&mut self, now: DateTime<Utc>) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        if self.status == TaskStatus::Pending {
            self.status = TaskStatus::InProgress;
        }
    }

    /// Mark the task completed, stamping `completed_at` once.
    pub fn mark_completed(&mut self, now: DateTime<Utc>) {
        self.status = TaskStatus::Completed;
        self.progress = 100;
        if self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
        self.blocker = None;
    }

    /// Mark the task blocked with a reason.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty blocker message.
    pub fn mark_blocked(&mut self, blocker: impl Into<String>, now: DateTime<Utc>) -> Result<()> {
        let blocker = blocker.into();
        if blocker.trim().is_empty() {
            return Err(FestError::validation("blocker", "message must not be empty"));
        }
        self.status = TaskStatus::Blocked;
        self.blocked_at = Some(now);
        self.blocker = Some(blocker);
        Ok(())
    }

    /// Check whether this record carries explicit time tracking.
    #[must_use]
    pub fn has_explicit_time(&self) -> bool {
        self.time_spent_minutes > 0
    }
}

// ============================================================================
// Festival Time Metrics
// ============================================================================

/// Festival-level time bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FestivalTimeMetrics {
    /// When the festival record was first created
    pub created_at: DateTime<Utc>,
    /// When every tracked task was observed complete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Whole days from creation to completion; meaningful only once
    /// `completed_at` is set
    #[serde(default)]
    pub lifecycle_duration_days: i64,
    /// Sum of `time_spent_minutes` across all task records
    #[serde(default)]
    pub total_work_minutes: u64,
}

impl FestivalTimeMetrics {
    /// Metrics for a festival created now.
    #[must_use]
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            created_at,
            completed_at: None,
            lifecycle_duration_days: 0,
            total_work_minutes: 0,
        }
    }

    /// Whole days the festival has lived, as of `now` for an ongoing
    /// festival or as stored once completed. The stored duration is only
    /// trusted after completion.
    #[must_use]
    pub fn lifecycle_days(&self, now: DateTime<Utc>) -> i64 {
        match self.completed_at {
            Some(_) => self.lifecycle_duration_days,
            None => (now - self.created_at).num_days(),
        }
    }

    /// Whether the festival has a recorded completion.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

// ============================================================================
// Festival Progress Data
// ============================================================================

/// The persisted root record for one festival.
///
/// `time_metrics` is optional on the wire so records predating the field
/// still load; the store synthesizes it from `updated_at` on load, so in
/// memory it is always present after [`store::ProgressStore::load`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FestivalProgressData {
    /// Festival name
    pub festival: String,
    /// Stamped on every save
    pub updated_at: DateTime<Utc>,
    /// Festival-level time metrics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_metrics: Option<FestivalTimeMetrics>,
    /// Per-task records, keyed by festival-relative path
    #[serde(default)]
    pub tasks: BTreeMap<String, TaskProgress>,
}

impl FestivalProgressData {
    /// Fresh, empty record for a festival created now.
    #[must_use]
    pub fn new(festival: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            festival: festival.into(),
            updated_at: now,
            time_metrics: Some(FestivalTimeMetrics::new(now)),
            tasks: BTreeMap::new(),
        }
    }

    /// Check whether every tracked task is completed. Vacuously false for
    /// an empty record - a festival with nothing tracked is not done.
    #[must_use]
    pub fn all_tasks_completed(&self) -> bool {
        !self.tasks.is_empty()
            && self
                .tasks
                .values()
                .all(|t| t.status == TaskStatus::Completed)
    }

    /// Sum of recorded work minutes across all tasks.
    #[must_use]
    pub fn summed_work_minutes(&self) -> u64 {
        self.tasks.values().map(|t| t.time_spent_minutes).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    // ========================================================================
    // TaskStatus Tests
    // ========================================================================

    #[test]
    fn test_status_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        let status: TaskStatus = serde_json::from_str("\"blocked\"").unwrap();
        assert_eq!(status, TaskStatus::Blocked);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(TaskStatus::Pending.to_string(), "pending");
        assert_eq!(TaskStatus::Completed.to_string(), "completed");
    }

    // ========================================================================
    // TaskProgress Tests
    // ========================================================================

    #[test]
    fn test_progress_hundred_implies_completed() {
        let mut task = TaskProgress::new();
        task.set_progress(100, at(1_000)).unwrap();

        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.completed_at, Some(at(1_000)));
        assert_eq!(task.progress, 100);
    }

    #[test]
    fn test_progress_out_of_range_rejected_before_mutation() {
        let mut task = TaskProgress::new();
        let err = task.set_progress(101, at(0)).unwrap_err();
        assert!(err.to_string().contains("progress"));
        assert_eq!(task.progress, 0);
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn test_mark_completed_keeps_first_timestamp() {
        let mut task = TaskProgress::new();
        task.mark_completed(at(100));
        task.mark_completed(at(200));
        assert_eq!(task.completed_at, Some(at(100)));
    }

    #[test]
    fn test_mark_completed_clears_blocker() {
        let mut task = TaskProgress::new();
        task.mark_blocked("waiting on vendor", at(50)).unwrap();
        task.mark_completed(at(100));
        assert!(task.blocker.is_none());
        assert_eq!(task.status, TaskStatus::Completed);
    }

    #[test]
    fn test_mark_blocked_rejects_empty_message() {
        let mut task = TaskProgress::new();
        assert!(task.mark_blocked("  ", at(0)).is_err());
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn test_mark_started_stamps_once() {
        let mut task = TaskProgress::new();
        task.mark_started(at(10));
        task.mark_started(at(20));
        assert_eq!(task.started_at, Some(at(10)));
        assert_eq!(task.status, TaskStatus::InProgress);
    }

    #[test]
    fn test_mark_started_does_not_demote() {
        let mut task = TaskProgress::new();
        task.mark_completed(at(10));
        task.mark_started(at(20));
        assert_eq!(task.status, TaskStatus::Completed);
    }

    // ========================================================================
    // FestivalTimeMetrics Tests
    // ========================================================================

    #[test]
    fn test_lifecycle_days_live_until_completed() {
        let metrics = FestivalTimeMetrics::new(at(0));
        let three_days = at(3 * 86_400 + 7_200);
        assert_eq!(metrics.lifecycle_days(three_days), 3);
    }

    #[test]
    fn test_lifecycle_days_stored_once_completed() {
        let mut metrics = FestivalTimeMetrics::new(at(0));
        metrics.completed_at = Some(at(5 * 86_400));
        metrics.lifecycle_duration_days = 5;
        // "now" no longer matters
        assert_eq!(metrics.lifecycle_days(at(100 * 86_400)), 5);
    }

    // ========================================================================
    // FestivalProgressData Tests
    // ========================================================================

    #[test]
    fn test_empty_record_not_all_completed() {
        let data = FestivalProgressData::new("summer", at(0));
        assert!(!data.all_tasks_completed());
    }

    #[test]
    fn test_all_tasks_completed() {
        let mut data = FestivalProgressData::new("summer", at(0));
        let mut done = TaskProgress::new();
        done.mark_completed(at(10));
        data.tasks.insert("010-p/01-s/01-t.md".into(), done.clone());
        assert!(data.all_tasks_completed());

        data.tasks.insert("010-p/01-s/02-t.md".into(), TaskProgress::new());
        assert!(!data.all_tasks_completed());
    }

    #[test]
    fn test_summed_work_minutes() {
        let mut data = FestivalProgressData::new("summer", at(0));
        let mut a = TaskProgress::new();
        a.time_spent_minutes = 90;
        let mut b = TaskProgress::new();
        b.time_spent_minutes = 30;
        data.tasks.insert("a".into(), a);
        data.tasks.insert("b".into(), b);
        assert_eq!(data.summed_work_minutes(), 120);
    }

    #[test]
    fn test_legacy_record_without_time_metrics_deserializes() {
        let json = r#"{
            "festival": "old-festival",
            "updated_at": "2024-01-15T10:00:00Z",
            "tasks": {
                "010-p/01-s/01-t.md": {"status": "completed", "progress": 100}
            }
        }"#;
        let data: FestivalProgressData = serde_json::from_str(json).unwrap();
        assert!(data.time_metrics.is_none());
        assert_eq!(data.tasks.len(), 1);
    }

    #[test]
    fn test_record_roundtrip() {
        let mut data = FestivalProgressData::new("summer", at(1_000));
        let mut task = TaskProgress::new();
        task.mark_started(at(1_100));
        task.time_spent_minutes = 45;
        data.tasks.insert("010-p/01-s/01-t.md".into(), task);

        let json = serde_json::to_string_pretty(&data).unwrap();
        let back: FestivalProgressData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
    }
}
