//! Structural extraction from sprint markdown.
//!
//! Every function here is total: a document that is missing the expected
//! structure (or is only half written) yields an empty result, never an error.
//! Headings inside fenced code blocks are ignored.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Value types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckboxItem {
    pub text: String,
    pub checked: bool,
    /// 1-based line number in the source document.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrideBlock {
    pub number: u32,
    pub name: String,
    pub purpose: String,
    pub tasks: Vec<CheckboxItem>,
    pub completion_definition: String,
}

impl StrideBlock {
    pub fn completed_tasks(&self) -> usize {
        self.tasks.iter().filter(|t| t.checked).count()
    }

    pub fn total_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Every task checked. A stride with no tasks is never complete.
    pub fn is_complete(&self) -> bool {
        !self.tasks.is_empty() && self.tasks.iter().all(|t| t.checked)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementationLogEntry {
    pub timestamp: String,
    pub stride_name: String,
    pub tasks_addressed: Vec<String>,
    pub decisions: Vec<String>,
    pub notes: Vec<String>,
    pub changes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletionStats {
    pub completed: usize,
    pub total: usize,
    pub percent: f64,
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

static CHECKBOX_RE: OnceLock<Regex> = OnceLock::new();
static HEADING_RE: OnceLock<Regex> = OnceLock::new();
static STRIDE_HEADING_RE: OnceLock<Regex> = OnceLock::new();
static STRIDE_LABEL_RE: OnceLock<Regex> = OnceLock::new();
static LOG_HEADING_RE: OnceLock<Regex> = OnceLock::new();
static TITLE_PREFIX_RE: OnceLock<Regex> = OnceLock::new();

fn checkbox_re() -> &'static Regex {
    CHECKBOX_RE.get_or_init(|| Regex::new(r"^\s*[-*]\s+\[([ xX])\]\s+(\S.*?)\s*$").unwrap())
}

fn heading_re() -> &'static Regex {
    HEADING_RE.get_or_init(|| Regex::new(r"^(#{1,6})\s+(.*?)\s*$").unwrap())
}

fn stride_heading_re() -> &'static Regex {
    STRIDE_HEADING_RE.get_or_init(|| {
        Regex::new(r"(?i)^###\s+(?:\*\*)?Stride\s+(\d+)\s*[:.\-]\s*(.+?)(?:\*\*)?\s*$").unwrap()
    })
}

fn stride_label_re() -> &'static Regex {
    STRIDE_LABEL_RE.get_or_init(|| {
        Regex::new(r"(?i)^\*\*(purpose|tasks|completion definition)\s*(?::\*\*|\*\*:)\s*(.*)$")
            .unwrap()
    })
}

fn log_heading_re() -> &'static Regex {
    LOG_HEADING_RE.get_or_init(|| {
        Regex::new(r"^##\s+\[Timestamp:\s*([^\]]+?)\s*\]\s*Stride:\s*(.+?)\s*$").unwrap()
    })
}

fn title_prefix_re() -> &'static Regex {
    TITLE_PREFIX_RE.get_or_init(|| {
        Regex::new(r"^(Proposal|Plan|Implementation|Design|Retrospective):\s*").unwrap()
    })
}

// ---------------------------------------------------------------------------
// Line scanning
// ---------------------------------------------------------------------------

pub(crate) struct Line<'a> {
    /// 1-based
    pub(crate) number: usize,
    pub(crate) text: &'a str,
    /// Heading level and title, when the line is a heading outside a fence.
    pub(crate) heading: Option<(usize, &'a str)>,
}

pub(crate) fn scan(text: &str) -> Vec<Line<'_>> {
    let mut in_fence = false;
    text.lines()
        .enumerate()
        .map(|(idx, line)| {
            let trimmed = line.trim_start();
            let is_fence = trimmed.starts_with("```") || trimmed.starts_with("~~~");
            if is_fence {
                in_fence = !in_fence;
            }
            let heading = if in_fence || is_fence {
                None
            } else {
                heading_re().captures(line).map(|c| {
                    let level = c.get(1).map_or(0, |m| m.as_str().len());
                    let title = c.get(2).map_or("", |m| m.as_str());
                    (level, title)
                })
            };
            Line {
                number: idx + 1,
                text: line,
                heading,
            }
        })
        .collect()
}

/// Index range (into `lines`) of the body under the first heading titled
/// `title`, ending before the next heading of equal or lower depth.
fn section_range(lines: &[Line<'_>], title: &str) -> Option<(usize, usize)> {
    let wanted = title.trim();
    let (start, level) = lines.iter().enumerate().find_map(|(i, l)| match l.heading {
        Some((level, t)) if t.trim().eq_ignore_ascii_case(wanted) => Some((i, level)),
        _ => None,
    })?;
    let end = lines[start + 1..]
        .iter()
        .position(|l| matches!(l.heading, Some((lvl, _)) if lvl <= level))
        .map_or(lines.len(), |p| start + 1 + p);
    Some((start + 1, end))
}

/// `(timestamp, stride name)` of an implementation log heading.
pub(crate) fn log_heading(line: &str) -> Option<(String, String)> {
    let caps = log_heading_re().captures(line)?;
    Some((
        caps.get(1)?.as_str().to_string(),
        caps.get(2)?.as_str().to_string(),
    ))
}

fn parse_checkbox_line(line: &str, number: usize) -> Option<CheckboxItem> {
    let caps = checkbox_re().captures(line)?;
    let mark = caps.get(1)?.as_str();
    Some(CheckboxItem {
        text: caps.get(2).map_or("", |m| m.as_str()).to_string(),
        checked: mark.eq_ignore_ascii_case("x"),
        line: number,
    })
}

// ---------------------------------------------------------------------------
// Public parsers
// ---------------------------------------------------------------------------

/// All `- [ ]` / `- [x]` items in document order.
pub fn parse_checkboxes(text: &str) -> Vec<CheckboxItem> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, line)| parse_checkbox_line(line, idx + 1))
        .collect()
}

/// Body strictly between the heading titled `heading_title` and the next
/// heading of equal or lower depth. `None` when no such heading exists.
pub fn extract_section(text: &str, heading_title: &str) -> Option<String> {
    let lines = scan(text);
    let (start, end) = section_range(&lines, heading_title)?;
    let body: Vec<&str> = lines[start..end].iter().map(|l| l.text).collect();
    Some(body.join("\n").trim().to_string())
}

/// Text of the first level-1 heading, or an empty string.
pub fn extract_title(text: &str) -> String {
    scan(text)
        .iter()
        .find_map(|l| match l.heading {
            Some((1, title)) => Some(title.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}

/// [`extract_title`] without a leading `Proposal:` / `Plan:` / ... prefix.
pub fn sprint_title(text: &str) -> String {
    let title = extract_title(text);
    title_prefix_re().replace(&title, "").into_owned()
}

/// Titles of every heading at `level`, in document order.
pub fn section_titles(text: &str, level: usize) -> Vec<String> {
    scan(text)
        .iter()
        .filter_map(|l| match l.heading {
            Some((lvl, title)) if lvl == level => Some(title.to_string()),
            _ => None,
        })
        .collect()
}

#[derive(Clone, Copy)]
enum StrideField {
    Purpose,
    Tasks,
    Completion,
}

/// Stride milestones from a plan. Scoped to the `Strides` section when one
/// exists, otherwise the whole document is scanned.
pub fn parse_strides(text: &str) -> Vec<StrideBlock> {
    let lines = scan(text);
    let (start, end) = section_range(&lines, "Strides").unwrap_or((0, lines.len()));

    let mut strides = Vec::new();
    let mut current: Option<StrideBlock> = None;
    let mut field: Option<StrideField> = None;

    for line in &lines[start..end] {
        if line.heading.is_some() {
            if let Some(caps) = stride_heading_re().captures(line.text) {
                strides.extend(current.take());
                current = Some(StrideBlock {
                    number: caps.get(1).and_then(|m| m.as_str().parse().ok()).unwrap_or(0),
                    name: caps.get(2).map_or("", |m| m.as_str()).trim().to_string(),
                    purpose: String::new(),
                    tasks: Vec::new(),
                    completion_definition: String::new(),
                });
                field = None;
                continue;
            }
            if matches!(line.heading, Some((lvl, _)) if lvl <= 3) {
                strides.extend(current.take());
                field = None;
            }
            continue;
        }

        let Some(stride) = current.as_mut() else {
            continue;
        };
        let trimmed = line.text.trim();

        if let Some(caps) = stride_label_re().captures(trimmed) {
            let label = caps.get(1).map_or("", |m| m.as_str()).to_ascii_lowercase();
            field = match label.as_str() {
                "purpose" => Some(StrideField::Purpose),
                "tasks" => Some(StrideField::Tasks),
                _ => Some(StrideField::Completion),
            };
            let inline = caps.get(2).map_or("", |m| m.as_str()).trim();
            if !inline.is_empty() {
                append_text(stride, field, inline);
            }
            continue;
        }
        if trimmed.starts_with("---") {
            field = None;
            continue;
        }
        if let Some(item) = parse_checkbox_line(line.text, line.number) {
            stride.tasks.push(item);
            continue;
        }
        if !trimmed.is_empty() && !trimmed.starts_with('[') {
            append_text(stride, field, trimmed);
        }
    }
    strides.extend(current);
    strides
}

fn append_text(stride: &mut StrideBlock, field: Option<StrideField>, text: &str) {
    let target = match field {
        Some(StrideField::Purpose) => &mut stride.purpose,
        Some(StrideField::Completion) => &mut stride.completion_definition,
        _ => return,
    };
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(text);
}

#[derive(Clone, Copy)]
enum LogField {
    Tasks,
    Decisions,
    Notes,
    Changes,
}

fn log_field(title: &str) -> Option<LogField> {
    let t = title.trim().to_ascii_lowercase();
    if t.starts_with("tasks addressed") {
        Some(LogField::Tasks)
    } else if t.starts_with("decisions") {
        Some(LogField::Decisions)
    } else if t.starts_with("notes") {
        Some(LogField::Notes)
    } else if t.starts_with("changes made") {
        Some(LogField::Changes)
    } else {
        None
    }
}

/// Bullet text, or `None` for non-bullets and `[placeholder]` bullets.
fn bullet_item(line: &str, number: usize) -> Option<String> {
    if let Some(item) = parse_checkbox_line(line, number) {
        return (!item.text.is_empty()).then_some(item.text);
    }
    let trimmed = line.trim();
    let item = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))?
        .trim();
    if item.is_empty() || (item.starts_with('[') && item.ends_with(']')) {
        return None;
    }
    Some(item.to_string())
}

/// Timestamped entries (`## [Timestamp: ...] Stride: ...`) in document order.
pub fn parse_log_entries(text: &str) -> Vec<ImplementationLogEntry> {
    let mut entries = Vec::new();
    let mut current: Option<ImplementationLogEntry> = None;
    let mut field: Option<LogField> = None;

    for line in scan(text) {
        if let Some((level, title)) = line.heading {
            if let Some((timestamp, stride_name)) = log_heading(line.text) {
                entries.extend(current.take());
                current = Some(ImplementationLogEntry {
                    timestamp,
                    stride_name,
                    ..Default::default()
                });
                field = None;
            } else if level <= 2 {
                entries.extend(current.take());
                field = None;
            } else if level == 3 {
                field = log_field(title);
            }
            continue;
        }

        let Some(entry) = current.as_mut() else {
            continue;
        };
        if line.text.trim().starts_with("---") {
            field = None;
            continue;
        }
        let (Some(f), Some(item)) = (field, bullet_item(line.text, line.number)) else {
            continue;
        };
        match f {
            LogField::Tasks => entry.tasks_addressed.push(item),
            LogField::Decisions => entry.decisions.push(item),
            LogField::Notes => entry.notes.push(item),
            LogField::Changes => entry.changes.push(item),
        }
    }
    entries.extend(current);
    entries
}

/// Most recent `limit` entries, newest first.
pub fn recent_log_entries(
    entries: &[ImplementationLogEntry],
    limit: usize,
) -> Vec<ImplementationLogEntry> {
    entries.iter().rev().take(limit).cloned().collect()
}

pub fn completion_stats(items: &[CheckboxItem]) -> CompletionStats {
    let total = items.len();
    let completed = items.iter().filter(|i| i.checked).count();
    let percent = if total > 0 {
        completed as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    CompletionStats {
        completed,
        total,
        percent,
    }
}

/// Checkboxes grouped under their nearest level-3/4 heading; items before
/// any such heading go under `General`.
pub fn group_checkboxes_by_heading(text: &str) -> Vec<(String, Vec<CheckboxItem>)> {
    let mut groups: Vec<(String, Vec<CheckboxItem>)> = Vec::new();
    let mut category = "General".to_string();

    for line in scan(text) {
        if let Some((level, title)) = line.heading {
            if level == 3 || level == 4 {
                category = title.to_string();
            }
            continue;
        }
        if let Some(item) = parse_checkbox_line(line.text, line.number) {
            match groups.iter_mut().find(|(name, _)| *name == category) {
                Some((_, items)) => items.push(item),
                None => groups.push((category.clone(), vec![item])),
            }
        }
    }
    groups
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"# Plan: Auth Overhaul

## Overview

Replace session cookies.

## Strides

### **Stride 1: Schema**

**Purpose:** Lay down tables.

**Tasks:**
- [x] Create users table
- [X] Create sessions table

**Completion Definition:**
Migrations apply cleanly.

---

### **Stride 2: API**

**Purpose:**
Expose login endpoints
for the web client.

**Tasks:**
- [ ] POST /login
- [x] POST /logout

**Completion Definition:** Endpoints return 200.

## Risks

- [ ] Not a stride task
"#;

    const IMPLEMENTATION: &str = r#"# Implementation: Auth Overhaul

## [Timestamp: 2026-01-10 09:00] Stride: Schema

### Tasks Addressed
- [x] Create users table
- Create sessions table
- [Task placeholder]

### Decisions
- Use UUID primary keys

### Notes
- Blocked: waiting for DBA review

### Changes Made
- migrations/001_users.sql

---

## [Timestamp: 2026-01-11 14:30] Stride: API

### Notes
- Went smoothly

## Summary

- not part of any entry
"#;

    #[test]
    fn checkboxes_in_document_order() {
        let text = "- [ ] one\n  - [x] two\n* [X] three\nnot - [ ] four\n- [] five\n";
        let items = parse_checkboxes(text);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].text, "one");
        assert!(!items[0].checked);
        assert_eq!(items[1].line, 2);
        assert!(items[1].checked);
        assert!(items[2].checked);
    }

    #[test]
    fn checkbox_parsing_is_idempotent_and_counts_matching_lines() {
        let items = parse_checkboxes(PLAN);
        assert_eq!(items, parse_checkboxes(PLAN));
        let matching = PLAN.lines().filter(|l| checkbox_re().is_match(l)).count();
        assert_eq!(items.len(), matching);
        assert_eq!(items.len(), 5);
    }

    #[test]
    fn strides_are_scoped_to_section() {
        let strides = parse_strides(PLAN);
        assert_eq!(strides.len(), 2);

        assert_eq!(strides[0].number, 1);
        assert_eq!(strides[0].name, "Schema");
        assert_eq!(strides[0].purpose, "Lay down tables.");
        assert_eq!(strides[0].tasks.len(), 2);
        assert!(strides[0].is_complete());
        assert_eq!(strides[0].completion_definition, "Migrations apply cleanly.");

        assert_eq!(strides[1].name, "API");
        assert_eq!(strides[1].purpose, "Expose login endpoints for the web client.");
        assert_eq!(strides[1].completed_tasks(), 1);
        assert_eq!(strides[1].total_tasks(), 2);
        assert_eq!(strides[1].completion_definition, "Endpoints return 200.");
        // Line numbers refer to the whole document.
        assert_eq!(strides[1].tasks[0].line, 29);
    }

    #[test]
    fn strides_without_section_scan_whole_document() {
        let text = "### Stride 1: Only\n- [ ] a\n";
        let strides = parse_strides(text);
        assert_eq!(strides.len(), 1);
        assert_eq!(strides[0].name, "Only");
        assert_eq!(strides[0].tasks.len(), 1);
    }

    #[test]
    fn partial_documents_yield_empty_results() {
        assert!(parse_strides("").is_empty());
        assert!(parse_strides("## Strides\n\n### Stride").is_empty());
        assert!(parse_log_entries("## [Timestamp: 2026").is_empty());
        assert!(parse_checkboxes("- [").is_empty());
        assert_eq!(extract_title(""), "");
        assert_eq!(extract_section("# a", "b"), None);
    }

    #[test]
    fn log_entries_collect_sub_blocks() {
        let entries = parse_log_entries(IMPLEMENTATION);
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.timestamp, "2026-01-10 09:00");
        assert_eq!(first.stride_name, "Schema");
        assert_eq!(
            first.tasks_addressed,
            vec!["Create users table", "Create sessions table"]
        );
        assert_eq!(first.decisions, vec!["Use UUID primary keys"]);
        assert_eq!(first.notes, vec!["Blocked: waiting for DBA review"]);
        assert_eq!(first.changes, vec!["migrations/001_users.sql"]);

        let second = &entries[1];
        assert_eq!(second.stride_name, "API");
        assert_eq!(second.notes, vec!["Went smoothly"]);
        assert!(second.changes.is_empty());
    }

    #[test]
    fn deeper_headings_stay_in_sub_block() {
        let text = "## [Timestamp: t1] Stride: A\n\n### Decisions\n- one\n\n#### Rationale\n- two\n\n### Notes\n- three\n";
        let entries = parse_log_entries(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].decisions, vec!["one", "two"]);
        assert_eq!(entries[0].notes, vec!["three"]);
    }

    #[test]
    fn fenced_log_headings_do_not_start_entries() {
        let text = "## [Timestamp: t1] Stride: Real\n\n### Notes\n- a\n\n```\n## [Timestamp: t2] Stride: Ghost\n```\n- b\n";
        let entries = parse_log_entries(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].stride_name, "Real");
        assert_eq!(entries[0].notes, vec!["a", "b"]);
    }

    #[test]
    fn recent_entries_newest_first() {
        let entries = parse_log_entries(IMPLEMENTATION);
        let recent = recent_log_entries(&entries, 1);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].stride_name, "API");
    }

    #[test]
    fn section_extraction_respects_depth() {
        let text = "# T\n\n## Acceptance Criteria\n\n- [x] a\n\n### Detail\n\n- [ ] b\n\n## Next\n\nother";
        let section = extract_section(text, "acceptance criteria").unwrap();
        assert!(section.starts_with("- [x] a"));
        assert!(section.contains("### Detail"));
        assert!(section.ends_with("- [ ] b"));
        assert!(!section.contains("other"));
        assert_eq!(extract_section(text, "Next").unwrap(), "other");
    }

    #[test]
    fn headings_in_code_fences_are_ignored() {
        let text = "## Notes\n\n```md\n## Not a heading\n```\n\nafter\n\n## End";
        let section = extract_section(text, "Notes").unwrap();
        assert!(section.contains("## Not a heading"));
        assert!(section.ends_with("after"));
        assert_eq!(section_titles(text, 2), vec!["Notes", "End"]);
    }

    #[test]
    fn titles() {
        assert_eq!(extract_title(PLAN), "Plan: Auth Overhaul");
        assert_eq!(sprint_title(PLAN), "Auth Overhaul");
        assert_eq!(extract_title("## no h1\n"), "");
    }

    #[test]
    fn completion_stats_counts() {
        let stats = completion_stats(&parse_checkboxes(PLAN));
        assert_eq!(stats.completed, 3);
        assert_eq!(stats.total, 5);
        assert!((stats.percent - 60.0).abs() < f64::EPSILON);
        assert_eq!(completion_stats(&[]).percent, 0.0);
    }

    #[test]
    fn grouping_by_heading() {
        let text = "- [ ] loose\n### Backend\n- [x] api\n- [ ] db\n#### Frontend\n- [ ] ui\n### Backend\n- [ ] more";
        let groups = group_checkboxes_by_heading(text);
        let names: Vec<&str> = groups.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["General", "Backend", "Frontend"]);
        assert_eq!(groups[1].1.len(), 3);
    }
}
