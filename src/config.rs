//! Festival-level configuration.
//!
//! Every knob has a sensible default so a festival needs no configuration
//! at all; a `.fest/config.json` at the festival root can override the
//! conventional filenames and the phase types that trigger planning-mode
//! selection. Loading is tolerant: a missing or malformed file falls back
//! to defaults with a debug log rather than failing the caller.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Directory under the festival root holding fest's own files.
pub const FEST_DIR: &str = ".fest";

/// Configuration for one festival.
///
/// # Example
///
/// ```
/// use fest::config::FestConfig;
///
/// let config = FestConfig::default();
/// assert_eq!(config.gate_marker, "QUALITY_GATE.md");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FestConfig {
    /// Relative path of the progress record under the festival root
    #[serde(default = "default_progress_file")]
    pub progress_file: PathBuf,

    /// Filename whose presence in a phase directory marks a quality gate
    #[serde(default = "default_gate_marker")]
    pub gate_marker: String,

    /// Filename of the per-phase goal document
    #[serde(default = "default_goal_file")]
    pub goal_file: String,

    /// Phase types (from the goal document metadata) that switch the
    /// selector into planning mode
    #[serde(default = "default_planning_types")]
    pub planning_types: Vec<String>,
}

fn default_progress_file() -> PathBuf {
    PathBuf::from(FEST_DIR).join("progress.json")
}

fn default_gate_marker() -> String {
    "QUALITY_GATE.md".to_string()
}

fn default_goal_file() -> String {
    "GOAL.md".to_string()
}

fn default_planning_types() -> Vec<String> {
    vec!["planning".to_string(), "research".to_string()]
}

impl Default for FestConfig {
    fn default() -> Self {
        Self {
            progress_file: default_progress_file(),
            gate_marker: default_gate_marker(),
            goal_file: default_goal_file(),
            planning_types: default_planning_types(),
        }
    }
}

impl FestConfig {
    /// Load configuration for a festival, falling back to defaults when
    /// `.fest/config.json` is absent or malformed.
    #[must_use]
    pub fn load(festival_root: &Path) -> Self {
        let path = festival_root.join(FEST_DIR).join("config.json");
        match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    debug!("malformed config {}: {e}; using defaults", path.display());
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Absolute path of the progress record for a festival root.
    #[must_use]
    pub fn progress_path(&self, festival_root: &Path) -> PathBuf {
        festival_root.join(&self.progress_file)
    }

    /// Check whether a phase type string selects planning mode.
    #[must_use]
    pub fn is_planning_type(&self, phase_type: &str) -> bool {
        let lowered = phase_type.to_lowercase();
        self.planning_types.iter().any(|t| t == &lowered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FestConfig::default();
        assert_eq!(config.progress_file, PathBuf::from(".fest/progress.json"));
        assert_eq!(config.gate_marker, "QUALITY_GATE.md");
        assert_eq!(config.goal_file, "GOAL.md");
        assert!(config.is_planning_type("planning"));
        assert!(config.is_planning_type("Research"));
        assert!(!config.is_planning_type("implementation"));
    }

    #[test]
    fn test_load_missing_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = FestConfig::load(dir.path());
        assert_eq!(config.gate_marker, "QUALITY_GATE.md");
    }

    #[test]
    fn test_load_malformed_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(FEST_DIR)).unwrap();
        std::fs::write(dir.path().join(FEST_DIR).join("config.json"), "{ nope").unwrap();
        let config = FestConfig::load(dir.path());
        assert_eq!(config.goal_file, "GOAL.md");
    }

    #[test]
    fn test_load_partial_override() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(FEST_DIR)).unwrap();
        std::fs::write(
            dir.path().join(FEST_DIR).join("config.json"),
            r#"{"gate_marker": "GATE.md"}"#,
        )
        .unwrap();

        let config = FestConfig::load(dir.path());
        assert_eq!(config.gate_marker, "GATE.md");
        // Unspecified fields keep their defaults
        assert_eq!(config.goal_file, "GOAL.md");
        assert!(config.is_planning_type("planning"));
    }

    #[test]
    fn test_progress_path() {
        let config = FestConfig::default();
        let path = config.progress_path(Path::new("/festivals/summer"));
        assert_eq!(
            path.to_string_lossy(),
            "/festivals/summer/.fest/progress.json"
        );
    }

    #[test]
    fn test_config_roundtrip() {
        let config = FestConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: FestConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.gate_marker, config.gate_marker);
        assert_eq!(back.planning_types, config.planning_types);
    }
}
