//! Directory naming conventions for the festival hierarchy.
//!
//! A festival is a directory of numbered phases, each phase a directory of
//! numbered sequences, each sequence a directory of numbered task files:
//!
//! ```text
//! my-festival/
//!   010-planning/
//!     01-research/
//!       01-survey-options.md
//!       01.5-followup.md
//!       02-write-summary.md
//! ```
//!
//! Phases carry a three-digit prefix, sequences a two-digit prefix, and
//! task files a two-digit (optionally decimal) prefix with a markdown
//! extension. Dotfiles, underscore-prefixed names, and `SEQUENCE*` files
//! are never part of the hierarchy. The creation/renumbering tooling that
//! maintains this convention lives outside this crate; everything here
//! only reads it.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Filename prefix reserved for sequence-level documents, excluded from
/// task recognition.
pub const SEQUENCE_DOC_PREFIX: &str = "SEQUENCE";

// ============================================================================
// Task Ordinal
// ============================================================================

/// Position of a task within its sequence, parsed from the filename prefix.
///
/// Ordinals are two-digit numbers with an optional decimal insertion point
/// (`01.5` sorts between `01` and `02`), which is how tasks are slotted in
/// between existing ones without renumbering the whole sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskOrdinal {
    major: u32,
    minor: Option<u32>,
}

impl TaskOrdinal {
    /// Create an ordinal from its components.
    #[must_use]
    pub fn new(major: u32, minor: Option<u32>) -> Self {
        Self { major, minor }
    }

    /// The whole-number part of the ordinal.
    #[must_use]
    pub fn major(&self) -> u32 {
        self.major
    }

    /// The decimal insertion part, if any.
    #[must_use]
    pub fn minor(&self) -> Option<u32> {
        self.minor
    }
}

impl Ord for TaskOrdinal {
    fn cmp(&self, other: &Self) -> Ordering {
        // A bare ordinal sorts before its decimal insertions: 01 < 01.5 < 02
        self.major
            .cmp(&other.major)
            .then_with(|| self.minor.unwrap_or(0).cmp(&other.minor.unwrap_or(0)))
    }
}

impl PartialOrd for TaskOrdinal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TaskOrdinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minor {
            Some(minor) => write!(f, "{:02}.{}", self.major, minor),
            None => write!(f, "{:02}", self.major),
        }
    }
}

// ============================================================================
// Name Recognition
// ============================================================================

/// Check whether a directory entry is hidden from hierarchy walks.
///
/// Dotfiles and underscore-prefixed names are scaffolding, not hierarchy.
#[must_use]
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('_')
}

/// Parse a phase directory name. Phases use a three-digit prefix followed
/// by a separator (`010-planning`). Returns the phase number.
#[must_use]
pub fn parse_phase_dir(name: &str) -> Option<u32> {
    parse_numeric_prefix(name, 3)
}

/// Parse a sequence directory name. Sequences use a two-digit prefix
/// followed by a separator (`01-research`). Returns the sequence number.
#[must_use]
pub fn parse_sequence_dir(name: &str) -> Option<u32> {
    parse_numeric_prefix(name, 2)
}

/// Parse a task filename. Tasks use a two-digit (optionally decimal)
/// prefix, a separator, and a markdown extension (`01-survey.md`,
/// `01.5-followup.md`). Files named `SEQUENCE*` are sequence documents,
/// not tasks.
#[must_use]
pub fn parse_task_file(name: &str) -> Option<TaskOrdinal> {
    if is_hidden(name) || name.starts_with(SEQUENCE_DOC_PREFIX) {
        return None;
    }
    let stem = name.strip_suffix(".md").or_else(|| name.strip_suffix(".markdown"))?;

    let bytes = stem.as_bytes();
    if bytes.len() < 2 || !bytes[0].is_ascii_digit() || !bytes[1].is_ascii_digit() {
        return None;
    }
    let major: u32 = stem[..2].parse().ok()?;
    let rest = &stem[2..];

    if let Some(after_dot) = rest.strip_prefix('.') {
        // Decimal insertion: digits up to the separator
        let digits: String = after_dot
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if digits.is_empty() || !is_separator_or_empty(&after_dot[digits.len()..]) {
            return None;
        }
        let minor: u32 = digits.parse().ok()?;
        return Some(TaskOrdinal::new(major, Some(minor)));
    }

    if is_separator_or_empty(rest) {
        return Some(TaskOrdinal::new(major, None));
    }
    None
}

/// Parse an exact-width numeric prefix followed by a separator.
fn parse_numeric_prefix(name: &str, width: usize) -> Option<u32> {
    if is_hidden(name) {
        return None;
    }
    let bytes = name.as_bytes();
    if bytes.len() <= width {
        return None;
    }
    if !bytes[..width].iter().all(u8::is_ascii_digit) {
        return None;
    }
    // A longer digit run means a different level (e.g. a 3-digit phase
    // prefix must not parse as a 2-digit sequence)
    if bytes[width].is_ascii_digit() {
        return None;
    }
    if !matches!(bytes[width], b'-' | b'_') {
        return None;
    }
    name[..width].parse().ok()
}

fn is_separator_or_empty(rest: &str) -> bool {
    rest.is_empty() || rest.starts_with('-') || rest.starts_with('_')
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Ordinal Tests
    // ========================================================================

    #[test]
    fn test_ordinal_display() {
        assert_eq!(TaskOrdinal::new(1, None).to_string(), "01");
        assert_eq!(TaskOrdinal::new(1, Some(5)).to_string(), "01.5");
        assert_eq!(TaskOrdinal::new(12, None).to_string(), "12");
    }

    #[test]
    fn test_ordinal_ordering() {
        let one = TaskOrdinal::new(1, None);
        let one_five = TaskOrdinal::new(1, Some(5));
        let two = TaskOrdinal::new(2, None);

        assert!(one < one_five);
        assert!(one_five < two);
        assert!(one < two);
    }

    #[test]
    fn test_ordinal_equality() {
        assert_eq!(TaskOrdinal::new(3, None), TaskOrdinal::new(3, None));
        assert_ne!(TaskOrdinal::new(3, None), TaskOrdinal::new(3, Some(1)));
    }

    // ========================================================================
    // Phase Directory Tests
    // ========================================================================

    #[test]
    fn test_parse_phase_dir_valid() {
        assert_eq!(parse_phase_dir("010-planning"), Some(10));
        assert_eq!(parse_phase_dir("020_implementation"), Some(20));
        assert_eq!(parse_phase_dir("999-final"), Some(999));
    }

    #[test]
    fn test_parse_phase_dir_rejects_wrong_width() {
        assert_eq!(parse_phase_dir("01-too-short"), None);
        assert_eq!(parse_phase_dir("0100-too-long"), None);
    }

    #[test]
    fn test_parse_phase_dir_rejects_hidden() {
        assert_eq!(parse_phase_dir(".010-hidden"), None);
        assert_eq!(parse_phase_dir("_010-scaffold"), None);
    }

    #[test]
    fn test_parse_phase_dir_requires_separator() {
        assert_eq!(parse_phase_dir("010"), None);
        assert_eq!(parse_phase_dir("010planning"), None);
    }

    // ========================================================================
    // Sequence Directory Tests
    // ========================================================================

    #[test]
    fn test_parse_sequence_dir_valid() {
        assert_eq!(parse_sequence_dir("01-research"), Some(1));
        assert_eq!(parse_sequence_dir("15_cleanup"), Some(15));
    }

    #[test]
    fn test_parse_sequence_dir_rejects_phase_prefix() {
        // A three-digit phase name must not be mistaken for a sequence
        assert_eq!(parse_sequence_dir("010-planning"), None);
    }

    #[test]
    fn test_parse_sequence_dir_rejects_hidden() {
        assert_eq!(parse_sequence_dir(".01-hidden"), None);
        assert_eq!(parse_sequence_dir("_01-notes"), None);
    }

    // ========================================================================
    // Task File Tests
    // ========================================================================

    #[test]
    fn test_parse_task_file_valid() {
        assert_eq!(
            parse_task_file("01-survey-options.md"),
            Some(TaskOrdinal::new(1, None))
        );
        assert_eq!(
            parse_task_file("02_write-summary.md"),
            Some(TaskOrdinal::new(2, None))
        );
    }

    #[test]
    fn test_parse_task_file_decimal() {
        assert_eq!(
            parse_task_file("01.5-followup.md"),
            Some(TaskOrdinal::new(1, Some(5)))
        );
        assert_eq!(
            parse_task_file("03.10-insertion.md"),
            Some(TaskOrdinal::new(3, Some(10)))
        );
    }

    #[test]
    fn test_parse_task_file_bare_prefix() {
        assert_eq!(parse_task_file("01.md"), Some(TaskOrdinal::new(1, None)));
    }

    #[test]
    fn test_parse_task_file_rejects_sequence_doc() {
        assert_eq!(parse_task_file("SEQUENCE.md"), None);
        assert_eq!(parse_task_file("SEQUENCE_GOAL.md"), None);
    }

    #[test]
    fn test_parse_task_file_rejects_non_markdown() {
        assert_eq!(parse_task_file("01-notes.txt"), None);
        assert_eq!(parse_task_file("01-data.json"), None);
    }

    #[test]
    fn test_parse_task_file_rejects_hidden() {
        assert_eq!(parse_task_file(".01-hidden.md"), None);
        assert_eq!(parse_task_file("_01-template.md"), None);
    }

    #[test]
    fn test_parse_task_file_rejects_unprefixed() {
        assert_eq!(parse_task_file("README.md"), None);
        assert_eq!(parse_task_file("notes.md"), None);
    }

    #[test]
    fn test_parse_task_file_rejects_malformed_decimal() {
        assert_eq!(parse_task_file("01.-bad.md"), None);
        assert_eq!(parse_task_file("01.x-bad.md"), None);
    }

    #[test]
    fn test_is_hidden() {
        assert!(is_hidden(".git"));
        assert!(is_hidden("_drafts"));
        assert!(!is_hidden("010-planning"));
    }
}
