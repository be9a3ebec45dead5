//! Metadata blocks in task and goal documents.
//!
//! Documents may open with a metadata block of `key: value` lines, either
//! fenced by `---` lines or simply leading the file until the first line
//! that doesn't fit the shape. The block is how a phase declares its type
//! (`type: planning`) and how documents carry small annotations without a
//! separate sidecar file.
//!
//! Reads are fail-safe: a malformed block yields whatever pairs were
//! parseable, and an unreadable file yields an empty map.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

/// Metadata key that declares a phase's type in its goal document.
pub const TYPE_KEY: &str = "type";

/// Parse the leading metadata block of a document into key/value pairs.
///
/// Keys are lowercased; values keep their surrounding whitespace trimmed.
/// A fenced block (`---` ... `---`) is preferred; otherwise leading
/// `key: value` lines are consumed until the first blank or non-matching
/// line.
///
/// # Example
///
/// ```
/// use fest::document::parse_metadata_block;
///
/// let doc = "---\ntype: planning\nowner: ana\n---\n\n# Goal\n";
/// let meta = parse_metadata_block(doc);
/// assert_eq!(meta.get("type").map(String::as_str), Some("planning"));
/// ```
#[must_use]
pub fn parse_metadata_block(content: &str) -> HashMap<String, String> {
    let mut lines = content.lines().peekable();

    // Skip leading blank lines
    while lines.peek().is_some_and(|l| l.trim().is_empty()) {
        lines.next();
    }

    let fenced = lines.peek().is_some_and(|l| l.trim() == "---");
    if fenced {
        lines.next();
    }

    let mut meta = HashMap::new();
    for line in lines {
        let trimmed = line.trim();
        if fenced && trimmed == "---" {
            break;
        }
        if trimmed.is_empty() {
            if fenced {
                continue;
            }
            break;
        }
        match trimmed.split_once(':') {
            Some((key, value)) if !key.trim().is_empty() && !key.trim().contains(' ') => {
                meta.insert(key.trim().to_lowercase(), value.trim().to_string());
            }
            // Inside a fence, skip lines that aren't pairs; outside, the
            // block ends at the first non-pair line
            _ if fenced => continue,
            _ => break,
        }
    }
    meta
}

/// Return the document body with any leading metadata block removed.
#[must_use]
pub fn strip_metadata_block(content: &str) -> &str {
    let trimmed = content.trim_start_matches(['\n', '\r']);
    if let Some(rest) = trimmed.strip_prefix("---") {
        if let Some(end) = rest.find("\n---") {
            let after = &rest[end + 4..];
            return after.strip_prefix('\n').unwrap_or(after);
        }
        return content;
    }

    // Unfenced: drop leading `key: value` lines
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let t = line.trim();
        let is_pair = t
            .split_once(':')
            .is_some_and(|(k, _)| !k.trim().is_empty() && !k.trim().contains(' '));
        if t.is_empty() || !is_pair {
            break;
        }
        offset += line.len();
    }
    &content[offset..]
}

/// Read a document's metadata, yielding an empty map if the file is
/// missing or unreadable.
#[must_use]
pub fn read_metadata(path: &Path) -> HashMap<String, String> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_metadata_block(&content),
        Err(e) => {
            debug!("no metadata from {}: {e}", path.display());
            HashMap::new()
        }
    }
}
