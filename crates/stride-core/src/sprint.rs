//! Sprint lifecycle state and progress, derived from a snapshot of the
//! sprint's documents. Nothing here touches the file system; callers load
//! the documents and hand them in.

use crate::config::StrideConfig;
use crate::error::{Result, StrideError};
use crate::markdown::{
    self, CompletionStats, ImplementationLogEntry, StrideBlock,
};
use crate::types::{DocumentKind, SprintState};
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::OnceLock;

const SNIPPET_MAX_CHARS: usize = 120;

// ---------------------------------------------------------------------------
// Document snapshot
// ---------------------------------------------------------------------------

/// Raw text of each document a caller loaded for one sprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintDocuments {
    pub proposal: Option<String>,
    pub plan: Option<String>,
    pub design: Option<String>,
    pub implementation: Option<String>,
    pub retrospective: Option<String>,
}

impl SprintDocuments {
    pub fn get(&self, kind: DocumentKind) -> Option<&str> {
        let slot = match kind {
            DocumentKind::Proposal => &self.proposal,
            DocumentKind::Plan => &self.plan,
            DocumentKind::Design => &self.design,
            DocumentKind::Implementation => &self.implementation,
            DocumentKind::Retrospective => &self.retrospective,
        };
        slot.as_deref()
    }

    pub fn set(&mut self, kind: DocumentKind, text: impl Into<String>) {
        let slot = match kind {
            DocumentKind::Proposal => &mut self.proposal,
            DocumentKind::Plan => &mut self.plan,
            DocumentKind::Design => &mut self.design,
            DocumentKind::Implementation => &mut self.implementation,
            DocumentKind::Retrospective => &mut self.retrospective,
        };
        *slot = Some(text.into());
    }

    pub fn with(mut self, kind: DocumentKind, text: impl Into<String>) -> Self {
        self.set(kind, text);
        self
    }
}

/// Which documents exist for a sprint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintDocumentSet {
    pub proposal: bool,
    pub plan: bool,
    pub design: bool,
    pub implementation: bool,
    pub retrospective: bool,
}

impl SprintDocumentSet {
    /// A document is present when its text was loaded, even if empty.
    pub fn from_documents(docs: &SprintDocuments) -> Self {
        DocumentKind::all()
            .iter()
            .filter(|&&kind| docs.get(kind).is_some())
            .copied()
            .collect()
    }

    pub fn contains(&self, kind: DocumentKind) -> bool {
        match kind {
            DocumentKind::Proposal => self.proposal,
            DocumentKind::Plan => self.plan,
            DocumentKind::Design => self.design,
            DocumentKind::Implementation => self.implementation,
            DocumentKind::Retrospective => self.retrospective,
        }
    }

    pub fn insert(&mut self, kind: DocumentKind) {
        match kind {
            DocumentKind::Proposal => self.proposal = true,
            DocumentKind::Plan => self.plan = true,
            DocumentKind::Design => self.design = true,
            DocumentKind::Implementation => self.implementation = true,
            DocumentKind::Retrospective => self.retrospective = true,
        }
    }
}

impl FromIterator<DocumentKind> for SprintDocumentSet {
    fn from_iter<I: IntoIterator<Item = DocumentKind>>(iter: I) -> Self {
        let mut set = SprintDocumentSet::default();
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Snapshot classification; the latest lifecycle document present wins.
pub fn derive_status(docs: &SprintDocumentSet) -> SprintState {
    if docs.retrospective {
        SprintState::Completed
    } else if docs.implementation {
        SprintState::Active
    } else if docs.proposal || docs.plan {
        SprintState::Proposed
    } else {
        SprintState::Uninitialized
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintProgress {
    pub completed_strides: usize,
    pub total_strides: usize,
    /// Rounded, in `0..=100`.
    pub percent: u32,
}

pub fn compute_progress<L: AsRef<str>, K: AsRef<str>>(
    total_strides: usize,
    logged_stride_names: &[L],
    known_stride_names: &[K],
) -> SprintProgress {
    let known: BTreeSet<&str> = known_stride_names.iter().map(AsRef::as_ref).collect();
    let completed = logged_stride_names
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| known.contains(name))
        .collect::<BTreeSet<&str>>()
        .len()
        .min(total_strides);
    let percent = if total_strides > 0 {
        (completed as f64 / total_strides as f64 * 100.0).round() as u32
    } else {
        0
    };
    SprintProgress {
        completed_strides: completed,
        total_strides,
        percent,
    }
}

static STRIDE_PREFIX_RE: OnceLock<Regex> = OnceLock::new();

fn stride_prefix_re() -> &'static Regex {
    STRIDE_PREFIX_RE.get_or_init(|| Regex::new(r"(?i)^stride\s+\d+\s*[:.\-]\s*").unwrap())
}

/// Matching key for a stride name: `Stride 2: Build API` and `build  api`
/// both become `build api`.
pub fn stride_key(name: &str) -> String {
    let cleaned = name.replace("**", "");
    let stripped = stride_prefix_re().replace(cleaned.trim(), "");
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Strides in `plan` that have at least one log entry in `implementation`.
pub fn stride_progress(plan: &str, implementation: Option<&str>) -> Result<SprintProgress> {
    let strides = markdown::parse_strides(plan);
    if strides.is_empty() {
        return Err(StrideError::Validation("strides section".to_string()));
    }
    let entries = implementation
        .map(markdown::parse_log_entries)
        .unwrap_or_default();
    Ok(progress_for(&strides, &entries))
}

fn progress_for(strides: &[StrideBlock], entries: &[ImplementationLogEntry]) -> SprintProgress {
    let known: Vec<String> = strides.iter().map(|s| stride_key(&s.name)).collect();
    let logged: Vec<String> = entries.iter().map(|e| stride_key(&e.stride_name)).collect();
    compute_progress(strides.len(), &logged, &known)
}

// ---------------------------------------------------------------------------
// Blockers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blocker {
    pub stride_name: Option<String>,
    pub timestamp: Option<String>,
    pub keyword: String,
    /// 1-based line in the implementation log.
    pub line: usize,
    pub snippet: String,
}

/// One entry per non-heading line containing a keyword (case-insensitive).
/// The first keyword in list order wins when several match.
pub fn detect_blockers<S: AsRef<str>>(log_text: &str, keywords: &[S]) -> Vec<Blocker> {
    let lowered: Vec<(String, &str)> = keywords
        .iter()
        .map(AsRef::as_ref)
        .filter(|k| !k.trim().is_empty())
        .map(|k| (k.to_lowercase(), k))
        .collect();

    let mut blockers = Vec::new();
    let mut entry: Option<(String, String)> = None;

    for line in markdown::scan(log_text) {
        if let Some((level, _)) = line.heading {
            if let Some(heading) = markdown::log_heading(line.text) {
                entry = Some(heading);
            } else if level <= 2 {
                entry = None;
            }
            continue;
        }

        let haystack = line.text.to_lowercase();
        let Some((_, keyword)) = lowered.iter().find(|(k, _)| haystack.contains(k.as_str()))
        else {
            continue;
        };
        blockers.push(Blocker {
            stride_name: entry.as_ref().map(|(_, name)| name.clone()),
            timestamp: entry.as_ref().map(|(ts, _)| ts.clone()),
            keyword: keyword.to_string(),
            line: line.number,
            snippet: snippet(line.text),
        });
    }
    blockers
}

fn snippet(line: &str) -> String {
    let mut text = line.trim();
    for marker in ["- [ ] ", "- [x] ", "- [X] ", "- ", "* ", "+ "] {
        if let Some(rest) = text.strip_prefix(marker) {
            text = rest.trim_start();
            break;
        }
    }
    text.chars().take(SNIPPET_MAX_CHARS).collect()
}

// ---------------------------------------------------------------------------
// Staleness
// ---------------------------------------------------------------------------

pub fn detect_staleness(
    last_modified: DateTime<Utc>,
    now: DateTime<Utc>,
    threshold_days: u32,
) -> bool {
    now - last_modified > Duration::days(i64::from(threshold_days))
}

// ---------------------------------------------------------------------------
// SprintReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprintReport {
    pub title: String,
    pub state: SprintState,
    pub documents: SprintDocumentSet,
    pub strides: Vec<StrideBlock>,
    pub progress: SprintProgress,
    pub tasks: CompletionStats,
    pub acceptance_criteria: CompletionStats,
    /// First plan stride with no log entry yet.
    pub current_stride: Option<String>,
    pub log_entries: usize,
    pub recent_logs: Vec<ImplementationLogEntry>,
    pub blockers: Vec<Blocker>,
    pub stale: bool,
}

pub fn analyze(
    docs: &SprintDocuments,
    config: &StrideConfig,
    last_modified: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> SprintReport {
    let documents = SprintDocumentSet::from_documents(docs);
    let state = derive_status(&documents);

    let title = docs
        .get(DocumentKind::Proposal)
        .map(markdown::sprint_title)
        .filter(|t| !t.is_empty())
        .or_else(|| {
            docs.get(DocumentKind::Plan)
                .map(markdown::sprint_title)
                .filter(|t| !t.is_empty())
        })
        .unwrap_or_default();

    let strides = docs
        .get(DocumentKind::Plan)
        .map(markdown::parse_strides)
        .unwrap_or_default();
    let implementation = docs.get(DocumentKind::Implementation).unwrap_or("");
    let entries = markdown::parse_log_entries(implementation);
    let progress = progress_for(&strides, &entries);

    let all_tasks: Vec<_> = strides.iter().flat_map(|s| s.tasks.iter().cloned()).collect();
    let tasks = markdown::completion_stats(&all_tasks);

    let criteria = docs
        .get(DocumentKind::Proposal)
        .and_then(|p| markdown::extract_section(p, "Acceptance Criteria"))
        .map(|section| markdown::parse_checkboxes(&section))
        .unwrap_or_default();
    let acceptance_criteria = markdown::completion_stats(&criteria);

    let logged: BTreeSet<String> = entries.iter().map(|e| stride_key(&e.stride_name)).collect();
    let current_stride = if state == SprintState::Completed {
        None
    } else {
        strides
            .iter()
            .find(|s| !logged.contains(&stride_key(&s.name)))
            .map(|s| s.name.clone())
    };

    let blockers = detect_blockers(implementation, &config.blocker_keywords);
    let stale = state != SprintState::Completed
        && last_modified
            .map(|t| detect_staleness(t, now, config.staleness_days))
            .unwrap_or(false);

    tracing::debug!(
        state = %state,
        strides = strides.len(),
        completed = progress.completed_strides,
        blockers = blockers.len(),
        stale,
        "sprint analyzed"
    );

    SprintReport {
        title,
        state,
        documents,
        strides,
        progress,
        tasks,
        acceptance_criteria,
        current_stride,
        log_entries: entries.len(),
        recent_logs: markdown::recent_log_entries(&entries, config.recent_log_limit),
        blockers,
        stale,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
