//! Fest - festival work-hierarchy core.
//!
//! Manages a hierarchical project structure (festival -> phase ->
//! sequence -> task, each a numbered directory or file) and answers one
//! question repeatedly: which unit of work should be done next, and what
//! is truly complete?
//!
//! # Architecture
//!
//! The crate is organized into several modules, leaves first:
//!
//! - [`checklist`] - Derives task status from inline checklist markers
//! - [`progress`] - Durable per-festival progress record and time metrics
//! - [`resolver`] - Reconciles checklist state with the stored record
//! - [`aggregate`] - Rolls status into completion percentages per level
//! - [`planning`] - Objectives and graduation for exploratory phases
//! - [`selector`] - Next-task selection over an external dependency graph
//! - [`error`] - Categorized error types
//! - [`cancel`] - Cooperative cancellation token
//!
//! # Example
//!
//! ```rust,ignore
//! use fest::cancel::CancelToken;
//! use fest::selector::{OrdinalGraph, Selector};
//!
//! let mut graph = OrdinalGraph::new();
//! let mut selector = Selector::new("/festivals/summer", &mut graph);
//! let result = selector.find_next(std::path::Path::new("."), &CancelToken::new())?;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! ```

pub mod aggregate;
pub mod cancel;
pub mod checklist;
pub mod config;
pub mod document;
pub mod error;
pub mod layout;
pub mod planning;
pub mod progress;
pub mod resolver;
pub mod selector;
pub mod testing;

// Re-export commonly used types
pub use error::{ErrorCategory, FestError, Result};

pub use cancel::CancelToken;
pub use checklist::{classify, classify_file, ChecklistStatus};
pub use config::FestConfig;
pub use layout::TaskOrdinal;

// Re-export progress types
pub use progress::{
    store::{ProgressLock, ProgressStore},
    time_inference::{infer_task_times, needs_time_inference, MtimeCache},
    FestivalProgressData, FestivalTimeMetrics, TaskProgress, TaskStatus,
};

// Re-export aggregation types
pub use aggregate::{festival_rollup, phase_rollup, sequence_rollup, BlockedTaskDetail, ProgressRollup};

// Re-export selector types
pub use selector::{
    GateInfo, LocationInfo, NextTaskResult, OrdinalGraph, Selector, TaskGraph, TaskInfo, TaskNode,
};

// Re-export planning types
pub use planning::{ObjectiveCategory, PlanningObjective, PlanningReport};
