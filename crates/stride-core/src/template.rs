//! Canonical command templates.
//!
//! A canonical template is a `---` delimited metadata block followed by a
//! body enclosed in a single pair of managed-region markers:
//!
//! ```text
//! ---
//! description: Plan the next sprint
//! ---
//!
//! $ARGUMENTS
//!
//! <!-- STRIDE:START -->
//! ...instructions...
//! <!-- STRIDE:END -->
//! ```
//!
//! Metadata values are kept literally; no YAML typing is applied, so
//! `tags: [a, b]` stays the string `[a, b]`.

use crate::error::{Result, StrideError};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

pub const STRIDE_START: &str = "<!-- STRIDE:START -->";
pub const STRIDE_END: &str = "<!-- STRIDE:END -->";
pub const DEFAULT_PLACEHOLDER: &str = "$ARGUMENTS";

const FRONT_MATTER_DELIMITER: &str = "---";

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Insertion-ordered string map. Re-inserting a key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut metadata = Metadata::new();
        for (k, v) in iter {
            metadata.insert(k, v);
        }
        metadata
    }
}

// ---------------------------------------------------------------------------
// CommandTemplate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandTemplate {
    /// Command name (`plan`, `implement`, ...). Empty when unknown.
    pub command: String,
    pub metadata: Metadata,
    pub placeholder: String,
    pub body: String,
}

impl CommandTemplate {
    pub fn parse(raw: &str) -> Result<Self> {
        Self::parse_with_placeholder(raw, DEFAULT_PLACEHOLDER)
    }

    pub fn parse_with_placeholder(raw: &str, placeholder: &str) -> Result<Self> {
        let content = normalize_content(raw);
        let (metadata, body_offset) = parse_front_matter(&content)?;
        let body = extract_marked_body(&content, body_offset)?;
        Ok(Self {
            command: String::new(),
            metadata,
            placeholder: placeholder.to_string(),
            body,
        })
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.metadata.get("description")
    }

    pub fn references_placeholder(&self) -> bool {
        !self.placeholder.is_empty() && self.body.contains(&self.placeholder)
    }
}

/// Strip a UTF-8 BOM and normalize CRLF / CR line endings to LF.
pub fn normalize_content(content: &str) -> String {
    let content = content.strip_prefix('\u{FEFF}').unwrap_or(content);
    content.replace("\r\n", "\n").replace('\r', "\n")
}

// ---------------------------------------------------------------------------
// Front matter
// ---------------------------------------------------------------------------

/// Returns the parsed metadata and the byte offset just past the closing
/// delimiter line.
fn parse_front_matter(content: &str) -> Result<(Metadata, usize)> {
    let mut offset = 0;
    let mut lines = content.split_inclusive('\n').enumerate();

    // Leading blank lines are tolerated; the first real line must open the block.
    let opened = loop {
        match lines.next() {
            Some((_, line)) if line.trim().is_empty() => offset += line.len(),
            Some((_, line)) => {
                offset += line.len();
                break line.trim_end() == FRONT_MATTER_DELIMITER;
            }
            None => break false,
        }
    };
    if !opened {
        return Err(StrideError::parse("missing front matter", 1));
    }

    let mut metadata = Metadata::new();
    for (idx, line) in lines {
        offset += line.len();
        let trimmed = line.trim();
        if line.trim_end() == FRONT_MATTER_DELIMITER {
            return Ok((metadata, offset));
        }
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let position = idx + 1;
        let (key, value) = trimmed
            .split_once(':')
            .ok_or_else(|| StrideError::parse("malformed metadata line", position))?;
        let key = key.trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            return Err(StrideError::parse("malformed metadata line", position));
        }
        metadata.insert(key, value.trim());
    }

    Err(StrideError::parse("missing front matter", 1))
}

// ---------------------------------------------------------------------------
// Markers
// ---------------------------------------------------------------------------

fn line_of(content: &str, byte_offset: usize) -> usize {
    content[..byte_offset].matches('\n').count() + 1
}

fn extract_marked_body(content: &str, from: usize) -> Result<String> {
    let rest = &content[from..];
    let starts: Vec<usize> = rest.match_indices(STRIDE_START).map(|(i, _)| from + i).collect();
    let ends: Vec<usize> = rest.match_indices(STRIDE_END).map(|(i, _)| from + i).collect();

    match (starts.as_slice(), ends.as_slice()) {
        ([], []) => Err(StrideError::parse("missing marker", line_of(content, content.len()))),
        ([start], [end]) if start < end => {
            let body = &content[start + STRIDE_START.len()..*end];
            Ok(body.trim().to_string())
        }
        ([start], []) => Err(StrideError::parse("unmatched marker", line_of(content, *start))),
        ([], [end]) => Err(StrideError::parse("unmatched marker", line_of(content, *end))),
        ([start], [end]) => {
            // End marker precedes start marker.
            Err(StrideError::parse("unmatched marker", line_of(content, (*start).min(*end))))
        }
        _ => {
            // Nested or duplicated markers: report the second occurrence of either.
            let dup = starts
                .get(1)
                .into_iter()
                .chain(ends.get(1))
                .copied()
                .min()
                .unwrap_or(from);
            Err(StrideError::parse("unmatched marker", line_of(content, dup)))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = "---\ndescription: Create a detailed sprint plan\nowner: stride\n---\n\n$ARGUMENTS\n\n<!-- STRIDE:START -->\nRead the proposal.\n\nUse $ARGUMENTS as the sprint id.\n<!-- STRIDE:END -->\n";

    #[test]
    fn parses_metadata_and_body() {
        let t = CommandTemplate::parse(PLAN).unwrap();
        assert_eq!(t.description(), Some("Create a detailed sprint plan"));
        assert_eq!(t.metadata.get("owner"), Some("stride"));
        assert_eq!(t.metadata.len(), 2);
        assert_eq!(t.placeholder, "$ARGUMENTS");
        assert_eq!(t.body, "Read the proposal.\n\nUse $ARGUMENTS as the sprint id.");
        assert!(t.references_placeholder());
        assert!(t.command.is_empty());
    }

    #[test]
    fn metadata_values_are_literal() {
        let raw = "---\ntags: [stride, plan]\nauto: 3\nurl: http://x.io/a:b\n---\n<!-- STRIDE:START -->\nx\n<!-- STRIDE:END -->";
        let t = CommandTemplate::parse(raw).unwrap();
        assert_eq!(t.metadata.get("tags"), Some("[stride, plan]"));
        assert_eq!(t.metadata.get("auto"), Some("3"));
        assert_eq!(t.metadata.get("url"), Some("http://x.io/a:b"));
    }

    #[test]
    fn metadata_preserves_order_and_replaces_duplicates() {
        let raw = "---\nb: 1\na: 2\nb: 3\n---\n<!-- STRIDE:START -->\nx\n<!-- STRIDE:END -->";
        let t = CommandTemplate::parse(raw).unwrap();
        let keys: Vec<&str> = t.metadata.keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(t.metadata.get("b"), Some("3"));
    }

    #[test]
    fn normalizes_bom_and_crlf() {
        let raw = "\u{FEFF}---\r\ndescription: hi\r\n---\r\n<!-- STRIDE:START -->\r\nbody\r\n<!-- STRIDE:END -->\r\n";
        let t = CommandTemplate::parse(raw).unwrap();
        assert_eq!(t.description(), Some("hi"));
        assert_eq!(t.body, "body");
    }

    #[test]
    fn missing_front_matter() {
        let err = CommandTemplate::parse("# Plan\n<!-- STRIDE:START -->\nx\n<!-- STRIDE:END -->")
            .unwrap_err();
        assert_eq!(err.reason(), Some("missing front matter"));

        let unclosed = "---\ndescription: x\n<!-- STRIDE:START -->\nx\n<!-- STRIDE:END -->";
        let err = CommandTemplate::parse(unclosed).unwrap_err();
        assert!(matches!(err, StrideError::Parse { .. }));
    }

    #[test]
    fn malformed_metadata_line_reports_position() {
        let raw = "---\ndescription: ok\nthis is not a pair\n---\n<!-- STRIDE:START -->\nx\n<!-- STRIDE:END -->";
        match CommandTemplate::parse(raw).unwrap_err() {
            StrideError::Parse { reason, position } => {
                assert_eq!(reason, "malformed metadata line");
                assert_eq!(position, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_end_marker_fails() {
        let raw = "---\ndescription: x\n---\n<!-- STRIDE:START -->\nbody\n";
        match CommandTemplate::parse(raw).unwrap_err() {
            StrideError::Parse { reason, position } => {
                assert_eq!(reason, "unmatched marker");
                assert_eq!(position, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn reversed_or_duplicated_markers_fail() {
        let reversed = "---\nd: x\n---\n<!-- STRIDE:END -->\nbody\n<!-- STRIDE:START -->\n";
        assert_eq!(
            CommandTemplate::parse(reversed).unwrap_err().reason(),
            Some("unmatched marker")
        );

        let nested = "---\nd: x\n---\n<!-- STRIDE:START -->\n<!-- STRIDE:START -->\nx\n<!-- STRIDE:END -->\n<!-- STRIDE:END -->\n";
        match CommandTemplate::parse(nested).unwrap_err() {
            StrideError::Parse { reason, position } => {
                assert_eq!(reason, "unmatched marker");
                assert_eq!(position, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_markers_fail() {
        let raw = "---\ndescription: x\n---\njust text\n";
        assert_eq!(
            CommandTemplate::parse(raw).unwrap_err().reason(),
            Some("missing marker")
        );
    }

    #[test]
    fn custom_placeholder_and_command() {
        let raw = "---\ndescription: x\n---\n<!-- STRIDE:START -->\nUse {input}\n<!-- STRIDE:END -->";
        let t = CommandTemplate::parse_with_placeholder(raw, "{input}")
            .unwrap()
            .with_command("derive");
        assert_eq!(t.command, "derive");
        assert!(t.references_placeholder());
    }

    #[test]
    fn metadata_serializes_as_ordered_map() {
        let m: Metadata = [("z", "1"), ("a", "2")].into_iter().collect();
        assert_eq!(serde_json::to_string(&m).unwrap(), r#"{"z":"1","a":"2"}"#);
    }
}
