use crate::types::DocumentKind;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const STRIDE_DIR: &str = ".stride";
pub const SPRINTS_DIR: &str = ".stride/sprints";
pub const CONFIG_FILE: &str = ".stride/config.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn sprints_dir(root: &Path) -> PathBuf {
    root.join(SPRINTS_DIR)
}

pub fn sprint_dir(root: &Path, sprint_id: &str) -> PathBuf {
    sprints_dir(root).join(sprint_id)
}

pub fn document_path(root: &Path, sprint_id: &str, kind: DocumentKind) -> PathBuf {
    sprint_dir(root, sprint_id).join(kind.filename())
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

// ---------------------------------------------------------------------------
// Sprint ids
// ---------------------------------------------------------------------------

static SPRINT_ID_RE: OnceLock<Regex> = OnceLock::new();

fn sprint_id_re() -> &'static Regex {
    SPRINT_ID_RE.get_or_init(|| Regex::new(r"^sprint-(\d+)(?:-[a-z0-9][a-z0-9\-]*)?$").unwrap())
}

/// Numeric part of `sprint-042` style ids; `None` for anything else.
pub fn sprint_number(sprint_id: &str) -> Option<u32> {
    sprint_id_re()
        .captures(sprint_id)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Sort sprint ids by their number; ids without one sort first, by name.
pub fn sort_sprint_ids(ids: &mut [String]) {
    ids.sort_by(|a, b| {
        sprint_number(a)
            .unwrap_or(0)
            .cmp(&sprint_number(b).unwrap_or(0))
            .then_with(|| a.cmp(b))
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/proj/.stride/config.yaml")
        );
        assert_eq!(
            document_path(root, "sprint-001", DocumentKind::Plan),
            PathBuf::from("/tmp/proj/.stride/sprints/sprint-001/plan.md")
        );
    }

    #[test]
    fn sprint_numbers() {
        assert_eq!(sprint_number("sprint-007"), Some(7));
        assert_eq!(sprint_number("sprint-12-auth-flow"), Some(12));
        assert_eq!(sprint_number("sprint-"), None);
        assert_eq!(sprint_number("notes"), None);
    }

    #[test]
    fn sprint_ids_sort_numerically() {
        let mut ids = vec![
            "sprint-10".to_string(),
            "sprint-2".to_string(),
            "sprint-1".to_string(),
        ];
        sort_sprint_ids(&mut ids);
        assert_eq!(ids, vec!["sprint-1", "sprint-2", "sprint-10"]);
    }
}
