use crate::output::print_json;
use crate::workspace;
use serde::Serialize;
use std::path::Path;
use stride_core::validate::{validate_sprint, Finding, Severity};

#[derive(Serialize)]
struct SprintFindings {
    sprint: String,
    errors: usize,
    warnings: usize,
    findings: Vec<Finding>,
}

pub fn run(
    root: &Path,
    config_path: Option<&Path>,
    sprint: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    // Surfaces config problems even though validation does not use it.
    workspace::load_config(root, config_path)?;

    let ids = match sprint {
        Some(id) => vec![id.to_string()],
        None => workspace::list_sprints(root)?,
    };

    let mut results = Vec::new();
    for id in ids {
        let findings = match workspace::load_sprint(root, &id) {
            Ok(loaded) => validate_sprint(&loaded.documents),
            Err(e) if sprint.is_some() => return Err(e),
            Err(e) => {
                tracing::warn!(sprint = %id, error = %format!("{e:#}"), "failed to load sprint");
                vec![Finding {
                    level: Severity::Error,
                    document: None,
                    message: format!("{e:#}"),
                }]
            }
        };
        let count = |level| findings.iter().filter(|f| f.level == level).count();
        results.push(SprintFindings {
            errors: count(Severity::Error),
            warnings: count(Severity::Warning),
            sprint: id,
            findings,
        });
    }

    let total_errors: usize = results.iter().map(|r| r.errors).sum();

    if json {
        print_json(&results)?;
    } else if results.is_empty() {
        println!("No sprints.");
    } else {
        for result in &results {
            println!(
                "{}: {} error(s), {} warning(s)",
                result.sprint, result.errors, result.warnings
            );
            for finding in &result.findings {
                println!("  {finding}");
            }
        }
    }

    if total_errors > 0 {
        anyhow::bail!("validation failed with {total_errors} error(s)");
    }
    Ok(())
}
