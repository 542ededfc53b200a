use crate::markdown;
use crate::sprint::{derive_status, stride_key, SprintDocumentSet, SprintDocuments};
use crate::types::{DocumentKind, SprintState};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Finding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub level: Severity,
    /// `None` for sprint-level findings.
    pub document: Option<DocumentKind>,
    pub message: String,
}

impl Finding {
    fn new(level: Severity, document: Option<DocumentKind>, message: impl Into<String>) -> Self {
        Self {
            level,
            document,
            message: message.into(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.document {
            Some(doc) => write!(f, "[{}] {}: {}", self.level, doc.filename(), self.message),
            None => write!(f, "[{}] {}", self.level, self.message),
        }
    }
}

pub fn has_errors(findings: &[Finding]) -> bool {
    findings.iter().any(|f| f.level == Severity::Error)
}

// ---------------------------------------------------------------------------
// Required structure
// ---------------------------------------------------------------------------

pub fn required_sections(kind: DocumentKind) -> &'static [&'static str] {
    match kind {
        DocumentKind::Proposal => &[
            "Why",
            "What",
            "Acceptance Criteria",
            "Success Definition",
            "Impact",
        ],
        DocumentKind::Plan => &["Overview", "Strides", "Approach", "Dependencies", "Risks"],
        DocumentKind::Design => &["Architecture", "Data Flow", "APIs / Interfaces", "Data Models"],
        DocumentKind::Retrospective => &[
            "What Worked",
            "What Didn't",
            "Lessons Learned",
            "Recommendations",
        ],
        // Checked through its timestamped log entries instead.
        DocumentKind::Implementation => &[],
    }
}

static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();

fn placeholder_re() -> &'static Regex {
    PLACEHOLDER_RE
        .get_or_init(|| Regex::new(r"\[(?:Explain|Describe|State|List|Brief)[^\]]*\]").unwrap())
}

fn level_two_sections(text: &str) -> BTreeSet<String> {
    markdown::section_titles(text, 2)
        .into_iter()
        .map(|t| t.replace("**", "").trim().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// validate_document
// ---------------------------------------------------------------------------

pub fn validate_document(kind: DocumentKind, text: &str) -> Vec<Finding> {
    let doc = Some(kind);
    let mut findings = Vec::new();

    let sections = level_two_sections(text);
    let missing: Vec<&str> = required_sections(kind)
        .iter()
        .copied()
        .filter(|s| !sections.contains(*s))
        .collect();
    if !missing.is_empty() {
        findings.push(Finding::new(
            Severity::Error,
            doc,
            format!("missing required sections: {}", missing.join(", ")),
        ));
    }

    let placeholders = placeholder_re().find_iter(text).count();
    if placeholders > 0 {
        findings.push(Finding::new(
            Severity::Warning,
            doc,
            format!("contains {placeholders} unfilled template placeholder(s)"),
        ));
    }

    match kind {
        DocumentKind::Proposal => {
            if let Some(section) = markdown::extract_section(text, "Acceptance Criteria") {
                if markdown::parse_checkboxes(&section).is_empty() {
                    findings.push(Finding::new(
                        Severity::Warning,
                        doc,
                        "Acceptance Criteria section has no checkboxes",
                    ));
                }
            }
        }
        DocumentKind::Plan => {
            let strides = markdown::parse_strides(text);
            if strides.is_empty() {
                findings.push(Finding::new(
                    Severity::Warning,
                    doc,
                    "no strides defined (expected ### Stride N: Name)",
                ));
            } else {
                findings.push(Finding::new(
                    Severity::Info,
                    doc,
                    format!("found {} stride(s)", strides.len()),
                ));
            }
            for stride in strides.iter().filter(|s| s.tasks.is_empty()) {
                findings.push(Finding::new(
                    Severity::Warning,
                    doc,
                    format!("stride {} ({}) has no tasks", stride.number, stride.name),
                ));
            }
        }
        DocumentKind::Implementation => {
            let entries = markdown::parse_log_entries(text);
            if entries.is_empty() {
                findings.push(Finding::new(
                    Severity::Error,
                    doc,
                    "no timestamped log entries (expected ## [Timestamp: ...] Stride: ...)",
                ));
            } else {
                findings.push(Finding::new(
                    Severity::Info,
                    doc,
                    format!("found {} log entr(ies)", entries.len()),
                ));
            }
        }
        DocumentKind::Design | DocumentKind::Retrospective => {}
    }

    findings
}

// ---------------------------------------------------------------------------
// validate_sprint
// ---------------------------------------------------------------------------

pub fn validate_sprint(docs: &SprintDocuments) -> Vec<Finding> {
    let present = SprintDocumentSet::from_documents(docs);
    let state = derive_status(&present);
    let mut findings = Vec::new();

    for kind in [DocumentKind::Proposal, DocumentKind::Plan] {
        if !present.contains(kind) {
            findings.push(Finding::new(
                Severity::Error,
                None,
                format!("missing required file: {}", kind.filename()),
            ));
        }
    }
    if state == SprintState::Completed && !present.implementation {
        findings.push(Finding::new(
            Severity::Error,
            None,
            format!(
                "sprint is completed but missing {}",
                DocumentKind::Implementation.filename()
            ),
        ));
    }
    if !present.design {
        findings.push(Finding::new(
            Severity::Info,
            None,
            format!(
                "optional file missing: {}",
                DocumentKind::Design.filename()
            ),
        ));
    }

    for &kind in DocumentKind::all() {
        if let Some(text) = docs.get(kind) {
            findings.extend(validate_document(kind, text));
        }
    }

    if let (Some(plan), Some(implementation)) = (
        docs.get(DocumentKind::Plan),
        docs.get(DocumentKind::Implementation),
    ) {
        let known: BTreeSet<String> = markdown::parse_strides(plan)
            .iter()
            .map(|s| stride_key(&s.name))
            .collect();
        if !known.is_empty() {
            for entry in markdown::parse_log_entries(implementation) {
                if !known.contains(&stride_key(&entry.stride_name)) {
                    findings.push(Finding::new(
                        Severity::Warning,
                        Some(DocumentKind::Implementation),
                        format!(
                            "log entry at {} names unknown stride '{}'",
                            entry.timestamp, entry.stride_name
                        ),
                    ));
                }
            }
        }
    }

    findings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
