//! Objectives for planning and research phases.
//!
//! Exploratory phases don't select tasks; they graduate. Their goal
//! document carries checklist-style objectives grouped under headings, and
//! the phase is ready to graduate once every objective is resolved. The
//! parse is fresh on every query - objectives are derived view data and
//! are never persisted.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::config::FestConfig;
use crate::document;
use crate::error::Result;

// ============================================================================
// Objective Types
// ============================================================================

/// What kind of outcome an objective represents, inferred from its
/// section heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveCategory {
    /// Something to answer
    Question,
    /// Something to decide
    Decision,
    /// Something to produce
    Artifact,
    /// Anything else
    Objective,
}

impl ObjectiveCategory {
    /// Categorize a heading by keyword.
    #[must_use]
    pub fn from_heading(heading: &str) -> Self {
        let lowered = heading.to_lowercase();
        if lowered.contains("question") {
            Self::Question
        } else if lowered.contains("decision") {
            Self::Decision
        } else if lowered.contains("artifact") || lowered.contains("deliverable") {
            Self::Artifact
        } else {
            Self::Objective
        }
    }
}

/// One checklist objective from a goal document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanningObjective {
    /// Kind of outcome
    pub category: ObjectiveCategory,
    /// The objective text, marker stripped
    pub text: String,
    /// Whether its marker is checked
    pub resolved: bool,
}

/// Resolved/total counts for one planning phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanningReport {
    /// Festival-relative phase path
    pub phase_path: String,
    /// The phase type that triggered planning mode
    pub phase_type: String,
    /// Every parsed objective, in document order
    pub objectives: Vec<PlanningObjective>,
    /// Objectives resolved
    pub resolved: usize,
    /// Objectives in total
    pub total: usize,
    /// True iff there is at least one objective and all are resolved
    pub graduation_ready: bool,
}

impl PlanningReport {
    /// Build a report over a set of objectives.
    #[must_use]
    pub fn new(
        phase_path: impl Into<String>,
        phase_type: impl Into<String>,
        objectives: Vec<PlanningObjective>,
    ) -> Self {
        let total = objectives.len();
        let resolved = objectives.iter().filter(|o| o.resolved).count();
        Self {
            phase_path: phase_path.into(),
            phase_type: phase_type.into(),
            objectives,
            resolved,
            total,
            graduation_ready: total > 0 && resolved == total,
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

fn objective_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[-*]\s+\[([ xX])\]\s*(.+)$").expect("objective regex is valid")
    })
}

/// Parse one line as an objective, returning its text and resolved flag.
#[must_use]
fn parse_objective_line(line: &str) -> Option<(String, bool)> {
    if let Some(caps) = objective_re().captures(line) {
        return Some((caps[2].trim().to_string(), &caps[1] != " "));
    }
    if line.starts_with('-') || line.starts_with('*') {
        let body = line[1..].trim();
        if let Some(text) = body.strip_prefix('\u{2705}') {
            return Some((text.trim().to_string(), true));
        }
        if let Some(text) = body.strip_prefix('\u{274C}') {
            return Some((text.trim().to_string(), false));
        }
    }
    None
}

/// Parse all objectives from a goal document body, categorized by their
/// nearest preceding heading.
#[must_use]
pub fn parse_objectives(content: &str) -> Vec<PlanningObjective> {
    let body = document::strip_metadata_block(content);
    let mut category = ObjectiveCategory::Objective;
    let mut objectives = Vec::new();

    for line in body.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('#') {
            category = ObjectiveCategory::from_heading(trimmed.trim_start_matches('#').trim());
            continue;
        }
        if let Some((text, resolved)) = parse_objective_line(trimmed) {
            objectives.push(PlanningObjective {
                category,
                text,
                resolved,
            });
        }
    }
    objectives
}

/// Read a phase's declared type from its goal document metadata.
///
/// Absent or unreadable goal documents yield `None` - a phase without a
/// type is a regular task phase.
#[must_use]
pub fn phase_type(festival_root: &Path, phase_path: &str, config: &FestConfig) -> Option<String> {
    let goal = festival_root.join(phase_path).join(&config.goal_file);
    document::read_metadata(&goal)
        .remove(document::TYPE_KEY)
        .map(|t| t.to_lowercase())
}

/// Build the planning report for a phase from its goal document.
///
/// A missing goal document yields an empty report (zero objectives, not
/// graduation-ready) rather than an error.
///
/// # Errors
///
/// Fails only on cancellation.
pub fn report_for_phase(
    festival_root: &Path,
    phase_path: &str,
    declared_type: &str,
    config: &FestConfig,
    cancel: &CancelToken,
) -> Result<PlanningReport> {
    cancel.check("planning report")?;

    let goal = festival_root.join(phase_path).join(&config.goal_file);
    let objectives = match std::fs::read_to_string(&goal) {
        Ok(content) => parse_objectives(&content),
        Err(e) => {
            debug!("no goal document at {}: {e}", goal.display());
            Vec::new()
        }
    };
    Ok(PlanningReport::new(phase_path, declared_type, objectives))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOAL_DOC: &str = "\
---
type: planning
---

# Phase Goal

## Open Questions
- [x] Which storage backend?
- [ ] What latency budget?

## Decisions
- [x] Single-crate layout

## Deliverables
- [ ] Architecture sketch

## Other
- [x] Kickoff held
";

    // ========================================================================
    // Categorization Tests
    // ========================================================================

    #[test]
    fn test_category_from_heading() {
        assert_eq!(
            ObjectiveCategory::from_heading("Open Questions"),
            ObjectiveCategory::Question
        );
        assert_eq!(
            ObjectiveCategory::from_heading("Key Decisions"),
            ObjectiveCategory::Decision
        );
        assert_eq!(
            ObjectiveCategory::from_heading("Artifacts"),
            ObjectiveCategory::Artifact
        );
        assert_eq!(
            ObjectiveCategory::from_heading("Deliverables"),
            ObjectiveCategory::Artifact
        );
        assert_eq!(
            ObjectiveCategory::from_heading("Misc"),
            ObjectiveCategory::Objective
        );
    }

    // ========================================================================
    // Parsing Tests
    // ========================================================================

    #[test]
    fn test_parse_objectives_groups_by_heading() {
        let objectives = parse_objectives(GOAL_DOC);
        assert_eq!(objectives.len(), 5);

        assert_eq!(objectives[0].category, ObjectiveCategory::Question);
        assert_eq!(objectives[0].text, "Which storage backend?");
        assert!(objectives[0].resolved);

        assert_eq!(objectives[1].category, ObjectiveCategory::Question);
        assert!(!objectives[1].resolved);

        assert_eq!(objectives[2].category, ObjectiveCategory::Decision);
        assert_eq!(objectives[3].category, ObjectiveCategory::Artifact);
        assert_eq!(objectives[4].category, ObjectiveCategory::Objective);
    }

    #[test]
    fn test_parse_objectives_emoji_markers() {
        let doc = "## Questions\n- \u{2705} answered one\n- \u{274C} still open\n";
        let objectives = parse_objectives(doc);
        assert_eq!(objectives.len(), 2);
        assert!(objectives[0].resolved);
        assert_eq!(objectives[0].text, "answered one");
        assert!(!objectives[1].resolved);
    }

    #[test]
    fn test_parse_objectives_empty_document() {
        assert!(parse_objectives("").is_empty());
        assert!(parse_objectives("# Goal\nprose only\n").is_empty());
    }

    #[test]
    fn test_metadata_block_not_parsed_as_objectives() {
        let doc = "---\ntype: planning\n---\n- [ ] real objective\n";
        let objectives = parse_objectives(doc);
        assert_eq!(objectives.len(), 1);
    }

    // ========================================================================
    // Report Tests
    // ========================================================================

    #[test]
    fn test_report_counts() {
        let report =
            PlanningReport::new("010-plan", "planning", parse_objectives(GOAL_DOC));
        assert_eq!(report.total, 5);
        assert_eq!(report.resolved, 3);
        assert!(!report.graduation_ready);
    }

    #[test]
    fn test_graduation_requires_objectives() {
        let report = PlanningReport::new("010-plan", "planning", Vec::new());
        assert_eq!(report.total, 0);
        assert!(!report.graduation_ready);
    }

    #[test]
    fn test_graduation_when_all_resolved() {
        let doc = "## Questions\n- [x] a\n- [x] b\n";
        let report = PlanningReport::new("010-plan", "research", parse_objectives(doc));
        assert!(report.graduation_ready);
    }

    #[test]
    fn test_checking_last_objective_flips_graduation() {
        let two_of_three = "## Questions\n- [x] a\n- [x] b\n- [ ] c\n";
        let report = PlanningReport::new("010-plan", "planning", parse_objectives(two_of_three));
        assert_eq!((report.resolved, report.total), (2, 3));
        assert!(!report.graduation_ready);

        let all_three = two_of_three.replace("- [ ] c", "- [x] c");
        let report = PlanningReport::new("010-plan", "planning", parse_objectives(&all_three));
        assert_eq!((report.resolved, report.total), (3, 3));
        assert!(report.graduation_ready);
    }

    // ========================================================================
    // Phase Type Tests
    // ========================================================================

    #[test]
    fn test_phase_type_from_goal_metadata() {
        let dir = tempfile::TempDir::new().unwrap();
        let phase = dir.path().join("010-explore");
        std::fs::create_dir_all(&phase).unwrap();
        std::fs::write(phase.join("GOAL.md"), "---\ntype: Research\n---\n").unwrap();

        let config = FestConfig::default();
        assert_eq!(
            phase_type(dir.path(), "010-explore", &config).as_deref(),
            Some("research")
        );
    }

    #[test]
    fn test_phase_type_missing_goal_is_none() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = FestConfig::default();
        assert_eq!(phase_type(dir.path(), "010-explore", &config), None);
    }

    #[test]
    fn test_report_for_missing_goal_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let report = report_for_phase(
            dir.path(),
            "010-explore",
            "planning",
            &FestConfig::default(),
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(report.total, 0);
        assert!(!report.graduation_ready);
    }
}
