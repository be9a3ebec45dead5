//! Checklist marker parsing for task documents.
//!
//! A task document's checklist markers are the ground truth for its
//! completion state. This module reads raw text and derives a status
//! independent of any stored progress record; reconciling the two is the
//! resolver's job.
//!
//! # Algorithm
//!
//! The scan is line-by-line, tracking the nearest preceding section
//! heading. Markers found under a recognized priority heading (such as
//! "Definition of Done") are counted in a priority tally; every marker in
//! the document is also counted in a fallback tally. If the priority tally
//! saw any markers it is authoritative, otherwise the fallback tally is
//! used. That way a task whose body sketches future work in checkbox form
//! is still judged by its actual acceptance section.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Section headings whose markers take precedence, matched
/// case-insensitively by substring.
pub const PRIORITY_HEADINGS: [&str; 5] = [
    "definition of done",
    "requirements",
    "acceptance criteria",
    "deliverables",
    "checklist",
];

/// Marker meaning "done" in emoji form.
const DONE_EMOJI: char = '\u{2705}'; // ✅
/// Marker meaning "not done / blocked" in emoji form.
const NOT_DONE_EMOJI: char = '\u{274C}'; // ❌

/// Status derived purely from a document's checklist markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistStatus {
    /// No markers, or none checked
    Pending,
    /// Some but not all markers checked
    InProgress,
    /// Every marker checked (and at least one present)
    Completed,
}

impl std::fmt::Display for ChecklistStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Running count of checklist markers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChecklistTally {
    /// Markers in the checked state
    pub checked: usize,
    /// All markers seen
    pub total: usize,
}

impl ChecklistTally {
    fn record(&mut self, checked: bool) {
        self.total += 1;
        if checked {
            self.checked += 1;
        }
    }

    /// Derive a status from this tally.
    #[must_use]
    pub fn status(&self) -> ChecklistStatus {
        if self.total == 0 || self.checked == 0 {
            ChecklistStatus::Pending
        } else if self.checked == self.total {
            ChecklistStatus::Completed
        } else {
            ChecklistStatus::InProgress
        }
    }
}

fn bracket_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-*]\s+\[([ xX])\]").expect("checkbox regex is valid"))
}

// ============================================================================
// Classification
// ============================================================================

/// Count a document's checklist markers into (priority, fallback) tallies.
#[must_use]
pub fn tally(content: &str) -> (ChecklistTally, ChecklistTally) {
    let mut priority = ChecklistTally::default();
    let mut fallback = ChecklistTally::default();
    let mut under_priority_heading = false;

    for line in content.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with('#') {
            let heading = trimmed.trim_start_matches('#').trim().to_lowercase();
            under_priority_heading = PRIORITY_HEADINGS.iter().any(|h| heading.contains(h));
            continue;
        }

        let Some(checked) = parse_marker(trimmed) else {
            continue;
        };
        fallback.record(checked);
        if under_priority_heading {
            priority.record(checked);
        }
    }

    (priority, fallback)
}

/// Parse a single line as a checklist marker.
///
/// Recognizes `- [ ]` / `- [x]` / `- [X]`, the `*` bullet variants, and
/// the emoji forms on bulleted lines. Indentation was already stripped by
/// the caller. Returns the checked state, or `None` for non-marker lines.
#[must_use]
pub fn parse_marker(line: &str) -> Option<bool> {
    if let Some(caps) = bracket_marker_re().captures(line) {
        return Some(&caps[1] != " ");
    }
    if line.starts_with('-') || line.starts_with('*') {
        if line.contains(DONE_EMOJI) {
            return Some(true);
        }
        if line.contains(NOT_DONE_EMOJI) {
            return Some(false);
        }
    }
    None
}

/// Derive a status from a document's raw text.
///
/// # Example
///
/// ```
/// use fest::checklist::{classify, ChecklistStatus};
///
/// let doc = "## Checklist\n- [x] write it\n- [ ] review it\n";
/// assert_eq!(classify(doc), ChecklistStatus::InProgress);
/// ```
#[must_use]
pub fn classify(content: &str) -> ChecklistStatus {
    let (priority, fallback) = tally(content);
    let authoritative = if priority.total > 0 { priority } else { fallback };
    authoritative.status()
}

/// Derive a status from a task file on disk.
///
/// A missing or unreadable file yields `Pending` rather than an error;
/// checklist reads are fail-safe.
#[must_use]
pub fn classify_file(path: &Path) -> ChecklistStatus {
    match std::fs::read_to_string(path) {
        Ok(content) => classify(&content),
        Err(e) => {
            debug!("unreadable task document {}: {e}", path.display());
            ChecklistStatus::Pending
        }
    }
}
