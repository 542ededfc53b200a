use crate::output::{print_json, progress_bar};
use crate::workspace;
use chrono::Utc;
use serde::Serialize;
use std::path::Path;
use stride_core::sprint::{analyze, SprintReport};
use stride_core::types::DocumentKind;

pub fn run(root: &Path, config_path: Option<&Path>, sprint: &str, json: bool) -> anyhow::Result<()> {
    let config = workspace::load_config(root, config_path)?;
    let loaded = workspace::load_sprint(root, sprint)?;
    let report = analyze(&loaded.documents, &config, loaded.last_modified, Utc::now());

    if json {
        #[derive(Serialize)]
        struct ShowOutput<'a> {
            id: &'a str,
            #[serde(flatten)]
            report: &'a SprintReport,
        }

        print_json(&ShowOutput {
            id: &loaded.id,
            report: &report,
        })?;
        return Ok(());
    }

    let title = if report.title.is_empty() {
        loaded.id.as_str()
    } else {
        report.title.as_str()
    };
    println!("{}: {}", loaded.id, title);
    println!("State:      {}", report.state);

    let documents: Vec<&str> = DocumentKind::all()
        .iter()
        .filter(|&&k| report.documents.contains(k))
        .map(|k| k.as_str())
        .collect();
    println!(
        "Documents:  {}",
        if documents.is_empty() {
            "none".to_string()
        } else {
            documents.join(", ")
        }
    );

    println!(
        "Progress:   {} {}/{} strides",
        progress_bar(report.progress.percent, 20),
        report.progress.completed_strides,
        report.progress.total_strides
    );
    println!(
        "Tasks:      {}/{} ({:.0}%)",
        report.tasks.completed, report.tasks.total, report.tasks.percent
    );
    if report.acceptance_criteria.total > 0 {
        println!(
            "Acceptance: {}/{} ({:.0}%)",
            report.acceptance_criteria.completed,
            report.acceptance_criteria.total,
            report.acceptance_criteria.percent
        );
    }
    if let Some(current) = &report.current_stride {
        println!("Current:    {current}");
    }
    if let Some(modified) = loaded.last_modified {
        println!(
            "Updated:    {}{}",
            modified.format("%Y-%m-%d %H:%M"),
            if report.stale { " (stale)" } else { "" }
        );
    }

    if !report.strides.is_empty() {
        println!();
        println!("Strides:");
        for stride in &report.strides {
            let mark = if stride.is_complete() { "x" } else { " " };
            println!(
                "  [{mark}] {}. {} ({}/{} tasks)",
                stride.number,
                stride.name,
                stride.completed_tasks(),
                stride.total_tasks()
            );
        }
    }

    if !report.recent_logs.is_empty() {
        println!();
        println!(
            "Recent log entries ({} of {}):",
            report.recent_logs.len(),
            report.log_entries
        );
        for entry in &report.recent_logs {
            println!("  {}  {}", entry.timestamp, entry.stride_name);
            for task in &entry.tasks_addressed {
                println!("      - {task}");
            }
        }
    }

    if !report.blockers.is_empty() {
        println!();
        println!("Blockers:");
        for blocker in &report.blockers {
            let stride = blocker.stride_name.as_deref().unwrap_or("-");
            println!(
                "  line {} [{}] {}: {}",
                blocker.line, stride, blocker.keyword, blocker.snippet
            );
        }
    }

    Ok(())
}
