//! File-system side of the CLI: locating sprints and reading their documents.

use anyhow::Context;
use chrono::{DateTime, Utc};
use std::path::Path;
use stride_core::config::{StrideConfig, WarnLevel};
use stride_core::paths;
use stride_core::sprint::{analyze, SprintDocuments, SprintReport};
use stride_core::types::DocumentKind;

/// Load the config from `explicit` or `.stride/config.yaml`. A missing
/// default config yields the defaults; a missing explicit one is an error,
/// as is any error-level validation finding.
pub fn load_config(root: &Path, explicit: Option<&Path>) -> anyhow::Result<StrideConfig> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let default = paths::config_path(root);
            if !default.exists() {
                tracing::debug!(path = %default.display(), "no config file, using defaults");
                return Ok(StrideConfig::default());
            }
            default
        }
    };

    let data = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = StrideConfig::from_yaml_str(&data)
        .with_context(|| format!("invalid config {}", path.display()))?;

    let warnings = config.validate();
    for warning in &warnings {
        match warning.level {
            WarnLevel::Error => tracing::error!("config: {}", warning.message),
            WarnLevel::Warning => tracing::warn!("config: {}", warning.message),
        }
    }
    let errors: Vec<&str> = warnings
        .iter()
        .filter(|w| w.level == WarnLevel::Error)
        .map(|w| w.message.as_str())
        .collect();
    if !errors.is_empty() {
        anyhow::bail!(
            "config validation found errors in {}: {}",
            path.display(),
            errors.join("; ")
        );
    }
    Ok(config)
}

/// Sprint directory names, ordered by sprint number.
pub fn list_sprints(root: &Path) -> anyhow::Result<Vec<String>> {
    let dir = paths::sprints_dir(root);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut ids = Vec::new();
    for entry in std::fs::read_dir(&dir)
        .with_context(|| format!("failed to read {}", dir.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        ids.push(name);
    }
    paths::sort_sprint_ids(&mut ids);
    Ok(ids)
}

/// A sprint's documents plus the newest modification time among them.
pub struct LoadedSprint {
    pub id: String,
    pub documents: SprintDocuments,
    pub last_modified: Option<DateTime<Utc>>,
}

pub fn load_sprint(root: &Path, sprint_id: &str) -> anyhow::Result<LoadedSprint> {
    let dir = paths::sprint_dir(root, sprint_id);
    if !dir.is_dir() {
        anyhow::bail!("sprint '{sprint_id}' not found in {}", paths::SPRINTS_DIR);
    }

    let mut documents = SprintDocuments::default();
    let mut last_modified: Option<DateTime<Utc>> = None;

    for &kind in DocumentKind::all() {
        let path = paths::document_path(root, sprint_id, kind);
        if !path.is_file() {
            continue;
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        documents.set(kind, text);

        let modified = std::fs::metadata(&path)
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .ok();
        last_modified = last_modified.max(modified);
    }

    tracing::debug!(sprint = %sprint_id, "sprint documents loaded");
    Ok(LoadedSprint {
        id: sprint_id.to_string(),
        documents,
        last_modified,
    })
}

/// Analyze every sprint under the root. Sprints that fail to load are
/// logged and skipped.
pub fn analyze_sprints(
    root: &Path,
    config: &StrideConfig,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<(String, SprintReport)>> {
    let mut reports = Vec::new();
    for id in list_sprints(root)? {
        let loaded = match load_sprint(root, &id) {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!(sprint = %id, error = %format!("{e:#}"), "skipping sprint");
                continue;
            }
        };
        let report = analyze(&loaded.documents, config, loaded.last_modified, now);
        reports.push((loaded.id, report));
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn missing_default_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = load_config(dir.path(), None).unwrap();
        assert_eq!(cfg.staleness_days, 7);
    }

    #[test]
    fn missing_explicit_config_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(load_config(dir.path(), Some(&dir.path().join("nope.yaml"))).is_err());
    }

    #[test]
    fn reads_config_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".stride/config.yaml", "staleness_days: 3\n");
        assert_eq!(load_config(dir.path(), None).unwrap().staleness_days, 3);
    }

    #[test]
    fn error_level_config_findings_fail() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".stride/config.yaml", "placeholder: \"\"\n");
        let err = load_config(dir.path(), None).err().unwrap();
        assert!(err.to_string().contains("placeholder must not be empty"));
    }

    #[test]
    fn warning_level_config_findings_load() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".stride/config.yaml", "staleness_days: 0\n");
        assert_eq!(load_config(dir.path(), None).unwrap().staleness_days, 0);
    }

    #[test]
    fn lists_sprints_in_numeric_order() {
        let dir = TempDir::new().unwrap();
        for id in ["sprint-10", "sprint-2", ".hidden"] {
            std::fs::create_dir_all(dir.path().join(".stride/sprints").join(id)).unwrap();
        }
        write(dir.path(), ".stride/sprints/README.md", "not a sprint");
        assert_eq!(list_sprints(dir.path()).unwrap(), vec!["sprint-2", "sprint-10"]);
    }

    #[test]
    fn loads_present_documents_only() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".stride/sprints/sprint-1/proposal.md", "# Proposal: A\n");
        write(dir.path(), ".stride/sprints/sprint-1/implementation.md", "");

        let loaded = load_sprint(dir.path(), "sprint-1").unwrap();
        assert_eq!(loaded.id, "sprint-1");
        assert_eq!(loaded.documents.get(DocumentKind::Proposal), Some("# Proposal: A\n"));
        assert_eq!(loaded.documents.get(DocumentKind::Implementation), Some(""));
        assert!(loaded.documents.get(DocumentKind::Plan).is_none());
        assert!(loaded.last_modified.is_some());
    }

    #[test]
    fn analyzes_every_sprint() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".stride/sprints/sprint-1/proposal.md", "# Proposal: A\n");
        write(dir.path(), ".stride/sprints/sprint-2/retrospective.md", "# Retro\n");
        let reports =
            analyze_sprints(dir.path(), &StrideConfig::default(), Utc::now()).unwrap();
        let ids: Vec<&str> = reports.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["sprint-1", "sprint-2"]);
        assert_eq!(reports[0].1.title, "A");
    }

    #[test]
    fn unknown_sprint_is_error() {
        let dir = TempDir::new().unwrap();
        let err = load_sprint(dir.path(), "sprint-9").err().unwrap();
        assert!(err.to_string().contains("sprint 'sprint-9' not found"));
    }
}
